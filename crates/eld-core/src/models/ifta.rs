//! International Fuel Tax Agreement summaries

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EldError, EldResult};
use crate::units::{round_2, round_whole};

/// A calendar reporting quarter.
///
/// Only constructible through [`IftaQuarter::new`] (or deserialization,
/// which runs the same checks), so its bounds always exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "QuarterFields", into = "QuarterFields")]
pub struct IftaQuarter {
    year: i32,
    quarter: u8,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct QuarterFields {
    year: i32,
    quarter: u8,
}

/// Midnight UTC on the first day of `quarter`
fn quarter_start(year: i32, quarter: u8) -> Option<DateTime<Utc>> {
    let month = u32::from(quarter - 1) * 3 + 1;
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()
}

impl IftaQuarter {
    /// Create a quarter, rejecting quarters outside 1-4 and years chrono
    /// cannot represent
    pub fn new(year: i32, quarter: u8) -> EldResult<Self> {
        if !(1..=4).contains(&quarter) {
            return Err(EldError::InvalidRequest(format!(
                "IFTA quarter must be 1-4, got {}",
                quarter
            )));
        }
        let (next_year, next_quarter) = if quarter == 4 {
            (year.checked_add(1), 1)
        } else {
            (Some(year), quarter + 1)
        };
        let bounds = quarter_start(year, quarter).zip(
            next_year.and_then(|y| quarter_start(y, next_quarter)),
        );
        let Some((start, end)) = bounds else {
            return Err(EldError::InvalidRequest(format!(
                "IFTA year {} is out of range",
                year
            )));
        };
        Ok(Self {
            year,
            quarter,
            start,
            end,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// 1-4
    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    /// Reporting label, e.g. "2024-Q1"
    pub fn label(&self) -> String {
        format!("{}-Q{}", self.year, self.quarter)
    }

    /// First instant of the quarter
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// First instant after the quarter
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

impl TryFrom<QuarterFields> for IftaQuarter {
    type Error = EldError;

    fn try_from(fields: QuarterFields) -> EldResult<Self> {
        Self::new(fields.year, fields.quarter)
    }
}

impl From<IftaQuarter> for QuarterFields {
    fn from(quarter: IftaQuarter) -> Self {
        Self {
            year: quarter.year,
            quarter: quarter.quarter,
        }
    }
}

/// Per-jurisdiction line of an IFTA summary.
///
/// Tax fields stay at zero when the vendor does not expose them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionSummary {
    /// State/province code ("CA", "ON", ...)
    pub jurisdiction: String,
    pub miles: f64,
    pub taxable_miles: f64,
    pub gallons: f64,
    pub tax_rate: f64,
    pub tax_owed: f64,
    pub tax_paid: f64,
    pub net_tax: f64,
}

impl JurisdictionSummary {
    /// Line with distance and fuel only
    pub fn new(jurisdiction: impl Into<String>, miles: f64, gallons: f64) -> Self {
        Self {
            jurisdiction: jurisdiction.into(),
            miles,
            taxable_miles: miles,
            gallons,
            ..Default::default()
        }
    }
}

/// Fuel-tax summary for one quarter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IftaSummary {
    /// Quarter label ("2024-Q1")
    pub quarter: String,
    pub total_miles: f64,
    pub total_gallons: f64,
    pub jurisdictions: Vec<JurisdictionSummary>,
}

impl IftaSummary {
    /// Build a summary whose totals are the sum of `jurisdictions`.
    ///
    /// Rows are sorted by jurisdiction code.
    pub fn from_jurisdictions(
        quarter: &IftaQuarter,
        mut jurisdictions: Vec<JurisdictionSummary>,
    ) -> Self {
        jurisdictions.sort_by(|a, b| a.jurisdiction.cmp(&b.jurisdiction));
        let total_miles = round_whole(jurisdictions.iter().map(|j| j.miles).sum());
        let total_gallons = round_2(jurisdictions.iter().map(|j| j.gallons).sum());
        Self {
            quarter: quarter.label(),
            total_miles,
            total_gallons,
            jurisdictions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_bounds() {
        let q = IftaQuarter::new(2024, 1).unwrap();
        assert_eq!(q.label(), "2024-Q1");
        assert_eq!(q.start(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(q.end(), Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());

        let q4 = IftaQuarter::new(2023, 4).unwrap();
        assert_eq!(q4.start(), Utc.with_ymd_and_hms(2023, 10, 1, 0, 0, 0).unwrap());
        assert_eq!(q4.end(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_quarter_rejects_out_of_range() {
        assert!(IftaQuarter::new(2024, 0).is_err());
        assert!(IftaQuarter::new(2024, 5).is_err());
    }

    #[test]
    fn test_quarter_rejects_unrepresentable_year() {
        assert!(matches!(
            IftaQuarter::new(i32::MAX, 1),
            Err(EldError::InvalidRequest(_))
        ));
        assert!(IftaQuarter::new(300_000, 2).is_err());
        assert!(IftaQuarter::new(i32::MIN, 4).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let q: IftaQuarter = serde_json::from_str(r#"{"year": 2024, "quarter": 3}"#).unwrap();
        assert_eq!((q.year(), q.quarter()), (2024, 3));
        assert_eq!(q.start(), Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap());
        assert_eq!(
            serde_json::to_value(q).unwrap(),
            serde_json::json!({"year": 2024, "quarter": 3})
        );
        assert!(serde_json::from_str::<IftaQuarter>(r#"{"year": 2024, "quarter": 7}"#).is_err());
    }

    #[test]
    fn test_summary_totals() {
        let q = IftaQuarter::new(2024, 2).unwrap();
        let summary = IftaSummary::from_jurisdictions(
            &q,
            vec![
                JurisdictionSummary::new("TX", 420.0, 60.55),
                JurisdictionSummary::new("CA", 180.0, 25.1),
            ],
        );
        assert_eq!(summary.quarter, "2024-Q2");
        assert_eq!(summary.total_miles, 600.0);
        assert_eq!(summary.total_gallons, 85.65);
        assert_eq!(summary.jurisdictions[0].jurisdiction, "CA");
        assert_eq!(summary.jurisdictions[0].tax_owed, 0.0);
    }
}
