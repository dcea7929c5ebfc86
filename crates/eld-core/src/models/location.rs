//! Vehicle position models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Last known (or historical) position of a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleLocation {
    /// Vendor vehicle identifier
    pub vehicle_id: String,
    /// Vehicle display name / unit number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_name: Option<String>,
    /// Driver currently assigned, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Compass heading, 0-359
    pub heading: u16,
    /// Speed in whole miles per hour
    pub speed_mph: f64,
    /// When the fix was recorded
    pub timestamp: DateTime<Utc>,
    /// Reverse-geocoded address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Odometer in whole miles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odometer_miles: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_running: Option<bool>,
}

impl VehicleLocation {
    /// Coordinates of this fix
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}
