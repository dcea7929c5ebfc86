//! Hours-of-service models

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Coordinates, EldVendor};

/// Canonical duty status.
///
/// Every vendor vocabulary maps onto this closed set; unknown vendor
/// values become [`DutyStatus::OffDuty`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyStatus {
    #[default]
    OffDuty,
    SleeperBerth,
    Driving,
    OnDuty,
    YardMove,
    PersonalConveyance,
}

impl DutyStatus {
    /// All duty statuses
    pub const ALL: [DutyStatus; 6] = [
        DutyStatus::OffDuty,
        DutyStatus::SleeperBerth,
        DutyStatus::Driving,
        DutyStatus::OnDuty,
        DutyStatus::YardMove,
        DutyStatus::PersonalConveyance,
    ];

    /// Look up a vendor status code (case-insensitive) in `table`.
    ///
    /// Codes missing from the table fall back to [`DutyStatus::OffDuty`].
    pub fn from_vendor_code(
        vendor: EldVendor,
        code: &str,
        table: &[(&str, DutyStatus)],
    ) -> DutyStatus {
        let code = code.trim();
        match table.iter().find(|(name, _)| name.eq_ignore_ascii_case(code)) {
            Some((_, status)) => *status,
            None => {
                debug!(vendor = %vendor, code, "Unknown duty status, using off_duty");
                DutyStatus::OffDuty
            }
        }
    }

    /// Whether time in this status counts against the driving limit
    pub fn is_driving(&self) -> bool {
        matches!(self, DutyStatus::Driving)
    }
}

impl fmt::Display for DutyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DutyStatus::OffDuty => "off_duty",
            DutyStatus::SleeperBerth => "sleeper_berth",
            DutyStatus::Driving => "driving",
            DutyStatus::OnDuty => "on_duty",
            DutyStatus::YardMove => "yard_move",
            DutyStatus::PersonalConveyance => "personal_conveyance",
        };
        f.write_str(s)
    }
}

/// A recorded HOS rule violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HosViolation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub driver_id: String,
    /// Vendor violation type label (e.g. "shift_driving_limit")
    pub violation_type: String,
    pub description: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
}

/// Current HOS clock for a driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HosClock {
    pub driver_id: String,
    pub driver_name: String,
    pub current_status: DutyStatus,
    /// When the current status began
    pub status_started_at: DateTime<Utc>,
    pub drive_remaining_minutes: u32,
    pub shift_remaining_minutes: u32,
    pub cycle_remaining_minutes: u32,
    /// Minutes until a 30-minute break is required
    pub break_remaining_minutes: u32,
    #[serde(default)]
    pub violations: Vec<HosViolation>,
    pub updated_at: DateTime<Utc>,
}

/// One duty-status interval in a driver's log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HosLog {
    pub id: String,
    pub driver_id: String,
    pub driver_name: String,
    pub status: DutyStatus,
    pub start_time: DateTime<Utc>,
    /// `None` while the interval is still open
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub certified: bool,
    #[serde(default)]
    pub edited: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duty_status_serde_matches_display() {
        for status in DutyStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::String(status.to_string()));
        }
    }

    #[test]
    fn test_default_is_off_duty() {
        assert_eq!(DutyStatus::default(), DutyStatus::OffDuty);
    }

    #[test]
    fn test_from_vendor_code() {
        let table = [("D", DutyStatus::Driving), ("SB", DutyStatus::SleeperBerth)];
        assert_eq!(
            DutyStatus::from_vendor_code(EldVendor::Geotab, " sb ", &table),
            DutyStatus::SleeperBerth
        );
        assert_eq!(
            DutyStatus::from_vendor_code(EldVendor::Geotab, "WT", &table),
            DutyStatus::OffDuty
        );
    }
}
