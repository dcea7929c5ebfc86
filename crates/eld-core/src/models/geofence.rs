//! Geofences and enter/exit events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Coordinates;

/// Geometry of a geofence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeofenceShape {
    Circle {
        center: Coordinates,
        radius_meters: f64,
    },
    Polygon {
        vertices: Vec<Coordinates>,
    },
}

/// A named zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub id: String,
    pub name: String,
    pub shape: GeofenceShape,
}

/// Direction of a geofence crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeofenceEventType {
    Enter,
    Exit,
}

/// A vehicle entering or leaving a geofence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceEvent {
    pub id: String,
    pub geofence_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geofence_name: Option<String>,
    pub vehicle_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    pub event_type: GeofenceEventType,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
}
