//! Driver vehicle inspection reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// When the inspection was performed relative to the trip
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionType {
    #[default]
    PreTrip,
    PostTrip,
}

/// Defect severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefectSeverity {
    #[default]
    Minor,
    Major,
}

/// A single defect noted on a DVIR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DvirDefect {
    pub category: String,
    pub description: String,
    pub severity: DefectSeverity,
    pub repaired: bool,
}

/// Driver vehicle inspection report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dvir {
    pub id: String,
    pub vehicle_id: String,
    pub driver_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer_id: Option<String>,
    pub inspection_type: InspectionType,
    pub inspected_at: DateTime<Utc>,
    #[serde(default)]
    pub defects: Vec<DvirDefect>,
    pub safe_to_operate: bool,
    pub driver_signed: bool,
    pub mechanic_signed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Dvir {
    /// Defects that have not been repaired yet
    pub fn open_defects(&self) -> impl Iterator<Item = &DvirDefect> {
        self.defects.iter().filter(|d| !d.repaired)
    }
}
