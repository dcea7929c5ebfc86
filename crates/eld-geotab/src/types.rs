//! MyGeotab entity wire format

use serde::Deserialize;

/// Ids Geotab uses in place of a real entity reference
const SENTINEL_IDS: &[&str] = &["UnknownDriverId", "NoDriverId", "NoDeviceId", "NoUserId"];

/// Reference to another entity; Geotab sends either `{"id": ...}` or a
/// bare sentinel string such as `"UnknownDriverId"`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Object {
        id: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        code: Option<serde_json::Value>,
    },
    Bare(String),
}

impl EntityRef {
    pub fn id(&self) -> &str {
        match self {
            EntityRef::Object { id, .. } => id,
            EntityRef::Bare(id) => id,
        }
    }

    /// Id, unless it is one of Geotab's "no entity" sentinels
    pub fn known_id(&self) -> Option<String> {
        let id = self.id();
        (!id.is_empty() && !SENTINEL_IDS.contains(&id)).then(|| id.to_string())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            EntityRef::Object { name, .. } => name.as_deref(),
            EntityRef::Bare(_) => None,
        }
    }

    /// Numeric code (SPN for diagnostics, FMI for failure modes)
    pub fn code(&self) -> Option<u32> {
        match self {
            EntityRef::Object {
                code: Some(serde_json::Value::Number(n)),
                ..
            } => n.as_u64().and_then(|c| u32::try_from(c).ok()),
            EntityRef::Object {
                code: Some(serde_json::Value::String(s)),
                ..
            } => s.trim().parse().ok(),
            _ => None,
        }
    }
}

pub fn known_id(entity: Option<&EntityRef>) -> Option<String> {
    entity.and_then(EntityRef::known_id)
}

/// Geotab coordinates: `x` is longitude, `y` is latitude
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogLocation {
    #[serde(default)]
    pub location: Option<Point>,
}

// =========================================================================
// Location
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusInfo {
    pub device: EntityRef,
    #[serde(default)]
    pub driver: Option<EntityRef>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub bearing: f64,
    /// km/h
    #[serde(default)]
    pub speed: f64,
    pub date_time: String,
    #[serde(default)]
    pub is_driving: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub device: EntityRef,
    pub latitude: f64,
    pub longitude: f64,
    /// km/h
    #[serde(default)]
    pub speed: f64,
    pub date_time: String,
}

// =========================================================================
// Fleet
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub vehicle_identification_number: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub license_state: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub active_to: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// Login name, usually an e-mail address
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub license_province: Option<String>,
    #[serde(default)]
    pub active_to: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeotabTrailer {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    pub data: f64,
    pub date_time: String,
    pub diagnostic: EntityRef,
    #[serde(default)]
    pub device: Option<EntityRef>,
}

// =========================================================================
// Hours of service
// =========================================================================

/// Remaining durations are .NET TimeSpan strings (`[d.]hh:mm:ss[.fffffff]`)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyStatusAvailability {
    pub driver: EntityRef,
    #[serde(default)]
    pub driving: Option<String>,
    #[serde(default)]
    pub duty: Option<String>,
    #[serde(default)]
    pub cycle: Option<String>,
    #[serde(default)]
    pub driving_break_duration: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyStatusLog {
    #[serde(default)]
    pub id: Option<String>,
    pub driver: EntityRef,
    pub status: String,
    pub date_time: String,
    #[serde(default)]
    pub location: Option<LogLocation>,
    #[serde(default)]
    pub verify_date_time: Option<String>,
    #[serde(default)]
    pub edit_date_time: Option<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyStatusViolation {
    #[serde(default)]
    pub id: Option<String>,
    pub driver: EntityRef,
    #[serde(rename = "type")]
    pub violation_type: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub from_date: String,
    #[serde(default)]
    pub to_date: Option<String>,
}

// =========================================================================
// Diagnostics
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultData {
    pub id: String,
    pub device: EntityRef,
    pub diagnostic: EntityRef,
    #[serde(default)]
    pub failure_mode: Option<EntityRef>,
    pub date_time: String,
    #[serde(default)]
    pub dismiss_date_time: Option<String>,
    #[serde(default)]
    pub red_stop_lamp: bool,
    #[serde(default)]
    pub amber_warning_lamp: bool,
    #[serde(default)]
    pub malfunction_lamp: bool,
    #[serde(default)]
    pub protect_warning_lamp: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceReminder {
    pub id: String,
    pub device: EntityRef,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub due_date_time: Option<String>,
    /// Meters
    #[serde(default)]
    pub due_odometer: Option<f64>,
    #[serde(default)]
    pub is_overdue: bool,
}

// =========================================================================
// Inspections
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DvirLog {
    pub id: String,
    #[serde(default)]
    pub device: Option<EntityRef>,
    #[serde(default)]
    pub driver: Option<EntityRef>,
    #[serde(default)]
    pub trailer: Option<EntityRef>,
    /// "PreTrip", "PostTrip" or "Intrip"
    #[serde(default)]
    pub log_type: Option<String>,
    pub date_time: String,
    #[serde(default)]
    pub is_safe_to_operate: Option<bool>,
    #[serde(default)]
    pub certify_date: Option<String>,
    #[serde(default)]
    pub repair_date: Option<String>,
    #[serde(default)]
    pub location: Option<LogLocation>,
    #[serde(rename = "dVIRDefects", default)]
    pub dvir_defects: Vec<DvirDefectRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DvirDefectRecord {
    #[serde(default)]
    pub defect: Option<EntityRef>,
    #[serde(default)]
    pub part: Option<EntityRef>,
    #[serde(default)]
    pub comment: Option<String>,
    /// "NotRepaired", "Repaired" or "NotNecessary"
    #[serde(default)]
    pub repair_status: Option<String>,
    /// "Normal" or "Critical"
    #[serde(default)]
    pub defect_severity: Option<String>,
}

// =========================================================================
// Fuel tax
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelTaxDetail {
    pub device: EntityRef,
    pub jurisdiction: String,
    /// Kilometers
    pub enter_odometer: f64,
    /// Kilometers
    pub exit_odometer: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelTransaction {
    #[serde(default)]
    pub device: Option<EntityRef>,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    /// Liters
    #[serde(default)]
    pub volume: f64,
}

// =========================================================================
// Zones
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub points: Vec<Point>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionEvent {
    pub id: String,
    pub rule: EntityRef,
    pub device: EntityRef,
    #[serde(default)]
    pub driver: Option<EntityRef>,
    pub active_from: String,
    #[serde(default)]
    pub active_to: Option<String>,
}
