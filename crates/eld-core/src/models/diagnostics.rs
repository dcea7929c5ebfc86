//! Fault codes and maintenance alerts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized fault severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultSeverity {
    Info,
    #[default]
    Warning,
    Critical,
}

impl FaultSeverity {
    /// Severity from the J1939 lamp flags reported by most ECUs
    pub fn from_lamps(red_stop: bool, amber_or_mil: bool) -> Self {
        if red_stop {
            FaultSeverity::Critical
        } else if amber_or_mil {
            FaultSeverity::Warning
        } else {
            FaultSeverity::Info
        }
    }
}

/// A diagnostic trouble code reported by a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultCode {
    pub id: String,
    pub vehicle_id: String,
    /// Normalized code ("P0420", "SPN 110 FMI 0", ...)
    pub code: String,
    pub description: String,
    pub severity: FaultSeverity,
    pub occurred_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleared_at: Option<DateTime<Utc>>,
    /// Reporting subsystem ("j1939", "obdii", "engine", ...)
    pub source: String,
}

impl FaultCode {
    /// Whether the fault is still open
    pub fn is_active(&self) -> bool {
        self.cleared_at.is_none()
    }
}

/// Format a J1939 SPN/FMI pair as a normalized code
pub fn j1939_code(spn: u32, fmi: u32) -> String {
    format!("SPN {} FMI {}", spn, fmi)
}

/// Upcoming or overdue maintenance item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceAlert {
    pub id: String,
    pub vehicle_id: String,
    pub alert_type: String,
    pub description: String,
    pub severity: FaultSeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_odometer_miles: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_lamps() {
        assert_eq!(FaultSeverity::from_lamps(true, true), FaultSeverity::Critical);
        assert_eq!(FaultSeverity::from_lamps(false, true), FaultSeverity::Warning);
        assert_eq!(FaultSeverity::from_lamps(false, false), FaultSeverity::Info);
    }

    #[test]
    fn test_j1939_code() {
        assert_eq!(j1939_code(110, 0), "SPN 110 FMI 0");
    }
}
