//! Vehicles, drivers and trailers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Availability-style status shared by vehicles and trailers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    #[default]
    Available,
    InUse,
    Maintenance,
    Inactive,
}

/// Driver account status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    #[default]
    Active,
    Inactive,
}

/// A power unit known to the ELD vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    pub status: AssetStatus,
    /// Serial number of the installed ELD device
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eld_device_serial: Option<String>,
}

/// Point-in-time engine/odometer statistics for a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleStats {
    pub vehicle_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odometer_miles: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_level_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_mph: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_running: Option<bool>,
}

impl VehicleStats {
    /// Empty stats sample for `vehicle_id` at `timestamp`
    pub fn new(vehicle_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            timestamp,
            odometer_miles: None,
            engine_hours: None,
            fuel_level_percent: None,
            speed_mph: None,
            engine_running: None,
        }
    }
}

/// A driver account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_state: Option<String>,
    pub status: DriverStatus,
}

/// A trailer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trailer {
    pub id: String,
    pub name: String,
    /// Free-form type ("dry_van", "reefer", "flatbed", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    pub status: AssetStatus,
}

/// Join a first and last name, skipping empty parts
pub fn full_name(first: Option<&str>, last: Option<&str>) -> String {
    [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name() {
        assert_eq!(full_name(Some("Ana"), Some("Lopez")), "Ana Lopez");
        assert_eq!(full_name(Some("Ana"), None), "Ana");
        assert_eq!(full_name(Some(" "), Some("Lopez")), "Lopez");
        assert_eq!(full_name(None, None), "");
    }
}
