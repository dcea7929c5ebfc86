//! Shared helpers composed into every provider
//!
//! Token expiry checking, timestamp formatting/parsing and duration
//! arithmetic live here so adapters only carry vendor-specific mapping.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use tracing::warn;

use crate::models::{AuthToken, EldVendor};

/// Tokens are treated as expired this many minutes before their nominal expiry
pub const TOKEN_EXPIRY_BUFFER_MINUTES: i64 = 5;

/// Whether `token` should be considered expired at `now`.
///
/// A missing token is always expired.
pub fn is_token_expired_at(token: Option<&AuthToken>, now: DateTime<Utc>) -> bool {
    match token {
        Some(token) => now >= token.expires_at - Duration::minutes(TOKEN_EXPIRY_BUFFER_MINUTES),
        None => true,
    }
}

/// Format an instant as RFC 3339 UTC with millisecond precision (`...Z`)
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format an instant as a calendar date (`YYYY-MM-DD`)
pub fn format_date(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d").to_string()
}

/// Parse a vendor timestamp into a UTC instant.
///
/// Accepts RFC 3339, naive ISO-8601 date-times (assumed UTC) and bare
/// dates (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parse the timestamp a vendor record cannot exist without.
///
/// Returns `None` and logs when the value is unparseable; callers drop
/// the record rather than invent a time for it.
pub fn vendor_timestamp(vendor: EldVendor, field: &str, value: &str) -> Option<DateTime<Utc>> {
    let parsed = parse_timestamp(value);
    if parsed.is_none() {
        warn!(vendor = %vendor, field, value, "Dropping record with unparseable timestamp");
    }
    parsed
}

/// Convert epoch milliseconds to an instant
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Whole minutes from `start` to `end` (negative when `end` precedes `start`)
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_minutes()
}

/// Milliseconds to whole minutes, clamped at zero
pub fn millis_to_minutes(millis: i64) -> u32 {
    (millis.max(0) / 60_000) as u32
}

/// Seconds to whole minutes, clamped at zero
pub fn seconds_to_minutes(seconds: f64) -> u32 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds / 60.0).floor() as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_expiring(at: DateTime<Utc>) -> AuthToken {
        AuthToken {
            access_token: "t".to_string(),
            token_type: "Bearer".to_string(),
            expires_at: at,
            refresh_token: None,
        }
    }

    #[test]
    fn test_missing_token_is_expired() {
        assert!(is_token_expired_at(None, Utc::now()));
    }

    #[test]
    fn test_expiry_buffer() {
        let now = Utc::now();
        let token = token_expiring(now + Duration::minutes(10));
        assert!(!is_token_expired_at(Some(&token), now));
        assert!(!is_token_expired_at(Some(&token), now + Duration::minutes(4)));
        assert!(is_token_expired_at(Some(&token), now + Duration::minutes(5)));
        assert!(is_token_expired_at(Some(&token), now + Duration::minutes(11)));
    }

    #[test]
    fn test_format_timestamp() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(format_timestamp(dt), "2024-03-05T14:07:09.000Z");
        assert_eq!(format_date(dt), "2024-03-05");
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(parse_timestamp("2024-03-05T14:07:09Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T09:07:09-05:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T14:07:09.000"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05 14:07:09"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-05"),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_vendor_timestamp_rejects_garbage() {
        assert_eq!(
            vendor_timestamp(EldVendor::Samsara, "time", "2020-01-01T00:00:00Z"),
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(vendor_timestamp(EldVendor::Geotab, "dateTime", "not a time"), None);
        assert_eq!(vendor_timestamp(EldVendor::Motive, "located_at", ""), None);
    }

    #[test]
    fn test_minutes_between() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let end = start + Duration::minutes(90) + Duration::seconds(59);
        assert_eq!(minutes_between(start, end), 90);
        assert_eq!(minutes_between(end, start), -90);
    }

    #[test]
    fn test_duration_helpers() {
        assert_eq!(millis_to_minutes(3_600_000), 60);
        assert_eq!(millis_to_minutes(119_999), 1);
        assert_eq!(millis_to_minutes(-5), 0);
        assert_eq!(seconds_to_minutes(660.0), 11);
        assert_eq!(seconds_to_minutes(f64::NAN), 0);
    }
}
