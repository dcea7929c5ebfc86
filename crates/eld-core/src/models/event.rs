//! Webhook event envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EldVendor;

/// Normalized webhook event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EldEventType {
    LocationUpdate,
    HosStatusChange,
    HosViolation,
    FaultCode,
    DvirSubmitted,
    GeofenceEntry,
    GeofenceExit,
    VehicleUpdated,
    DriverUpdated,
    Unknown,
}

/// Vendor-tagged event produced by webhook parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EldEvent {
    pub id: String,
    pub vendor: EldVendor,
    pub event_type: EldEventType,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    /// Untouched vendor payload
    pub payload: serde_json::Value,
}
