//! Samsara wire format
//!
//! Only the fields the adapter reads are declared; everything else in
//! the vendor payload is ignored.

use serde::{Deserialize, Serialize};

// =========================================================================
// Envelopes
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
pub struct ItemResponse<T> {
    pub data: T,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub end_cursor: String,
    #[serde(default)]
    pub has_next_page: bool,
}

impl Pagination {
    /// Cursor of the next page, if any
    pub fn next_cursor(&self) -> Option<String> {
        (self.has_next_page && !self.end_cursor.is_empty()).then(|| self.end_cursor.clone())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

// =========================================================================
// Fleet
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireVehicle {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// String in the vendor payload ("2019"), tolerated as a number
    #[serde(default)]
    pub year: Option<serde_json::Value>,
    #[serde(default)]
    pub serial: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDriver {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub license_state: Option<String>,
    /// "active" or "deactivated"
    #[serde(default)]
    pub driver_activation_status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTrailer {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub trailer_serial_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

// =========================================================================
// Vehicle stats
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsSample {
    pub time: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub heading_degrees: f64,
    #[serde(default)]
    pub speed_miles_per_hour: f64,
    #[serde(default)]
    pub reverse_geo: Option<ReverseGeo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseGeo {
    #[serde(default)]
    pub formatted_location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NumberSample {
    pub time: String,
    pub value: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextSample {
    pub time: String,
    pub value: String,
}

/// Latest-value stats of one vehicle (`/fleet/vehicles/stats`)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStatsSnapshot {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub gps: Option<GpsSample>,
    #[serde(default)]
    pub engine_state: Option<TextSample>,
    #[serde(default)]
    pub obd_odometer_meters: Option<NumberSample>,
    #[serde(default)]
    pub fuel_percent: Option<NumberSample>,
    #[serde(default)]
    pub obd_engine_seconds: Option<NumberSample>,
    #[serde(default)]
    pub ecu_speed_mph: Option<NumberSample>,
    #[serde(default)]
    pub fault_codes: Option<FaultCodeStats>,
}

/// Time series of one vehicle (`/fleet/vehicles/stats/history`)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStatsSeries {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub gps: Vec<GpsSample>,
    #[serde(default)]
    pub engine_states: Vec<TextSample>,
    #[serde(default)]
    pub obd_odometer_meters: Vec<NumberSample>,
    #[serde(default)]
    pub fuel_percents: Vec<NumberSample>,
    #[serde(default)]
    pub obd_engine_seconds: Vec<NumberSample>,
    #[serde(default)]
    pub ecu_speed_mph: Vec<NumberSample>,
}

// =========================================================================
// Fault codes
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultCodeStats {
    pub time: String,
    #[serde(default)]
    pub obdii: Option<ObdiiFaults>,
    #[serde(default)]
    pub j1939: Option<J1939Faults>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObdiiFaults {
    #[serde(default)]
    pub check_engine_light_is_on: bool,
    #[serde(default)]
    pub diagnostic_trouble_codes: Vec<ObdiiTroubleCodes>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObdiiTroubleCodes {
    #[serde(default)]
    pub tx_id: Option<u32>,
    #[serde(default)]
    pub confirmed_dtcs: Vec<ObdiiDtc>,
    #[serde(default)]
    pub pending_dtcs: Vec<ObdiiDtc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObdiiDtc {
    pub dtc_short_code: String,
    #[serde(default)]
    pub dtc_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct J1939Faults {
    #[serde(default)]
    pub check_engine_lights: Option<J1939Lamps>,
    #[serde(default)]
    pub diagnostic_trouble_codes: Vec<J1939Dtc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct J1939Lamps {
    #[serde(default)]
    pub stop_is_on: bool,
    #[serde(default)]
    pub warning_is_on: bool,
    #[serde(default)]
    pub emissions_is_on: bool,
    #[serde(default)]
    pub protect_is_on: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct J1939Dtc {
    pub spn_id: u32,
    pub fmi_id: u32,
    #[serde(default)]
    pub spn_description: Option<String>,
    #[serde(default)]
    pub fmi_description: Option<String>,
    #[serde(default)]
    pub tx_id: Option<u32>,
}

// =========================================================================
// Hours of service
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireHosClock {
    pub driver: IdRef,
    #[serde(default)]
    pub current_duty_status: Option<CurrentDutyStatus>,
    #[serde(default)]
    pub clocks: Option<Clocks>,
    #[serde(default)]
    pub violations: Option<ClockViolations>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentDutyStatus {
    pub hos_status_type: String,
    #[serde(default)]
    pub start_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clocks {
    #[serde(default)]
    pub drive: Option<DriveClock>,
    #[serde(default)]
    pub shift: Option<ShiftClock>,
    #[serde(default)]
    pub cycle: Option<CycleClock>,
    #[serde(rename = "break", default)]
    pub break_clock: Option<BreakClock>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveClock {
    #[serde(default)]
    pub drive_remaining_duration_ms: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftClock {
    #[serde(default)]
    pub shift_remaining_duration_ms: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleClock {
    #[serde(default)]
    pub cycle_remaining_duration_ms: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakClock {
    #[serde(default)]
    pub time_until_break_duration_ms: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockViolations {
    #[serde(default)]
    pub shift_driving_violation_duration_ms: i64,
    #[serde(default)]
    pub cycle_violation_duration_ms: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverHosLogs {
    pub driver: IdRef,
    #[serde(default)]
    pub hos_logs: Vec<WireHosLog>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireHosLog {
    pub hos_status_type: String,
    pub log_start_time: String,
    #[serde(default)]
    pub log_end_time: Option<String>,
    #[serde(default)]
    pub log_recorded_location: Option<RecordedLocation>,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub is_certified: bool,
    #[serde(default)]
    pub is_edited: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub formatted_location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverViolations {
    pub driver: IdRef,
    #[serde(default)]
    pub violations: Vec<WireViolation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireViolation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub violation_type: String,
    #[serde(default)]
    pub description: Option<String>,
    pub violation_start_time: String,
    #[serde(default)]
    pub duration_ms: Option<i64>,
}

// =========================================================================
// Maintenance & inspections
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDefect {
    pub id: String,
    #[serde(default)]
    pub defect_type: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub is_resolved: bool,
    #[serde(default)]
    pub created_at_time: Option<String>,
    #[serde(default)]
    pub vehicle: Option<IdRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDvir {
    pub id: String,
    /// "preTrip" / "postTrip"
    #[serde(rename = "type", default)]
    pub inspection_type: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub vehicle: Option<IdRef>,
    #[serde(default)]
    pub trailer: Option<IdRef>,
    #[serde(default)]
    pub author_signature: Option<Signature>,
    #[serde(default)]
    pub mechanic_or_agent_signature: Option<Signature>,
    /// "safe", "unsafe" or "resolved"
    #[serde(default)]
    pub safety_status: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub vehicle_defects: Vec<WireDefect>,
    #[serde(default)]
    pub trailer_defects: Vec<WireDefect>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    #[serde(default)]
    pub signatory_user: Option<IdRef>,
    #[serde(default)]
    pub signed_at_time: Option<String>,
}

// =========================================================================
// IFTA
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IftaReport {
    #[serde(default)]
    pub jurisdiction_reports: Vec<WireJurisdiction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireJurisdiction {
    pub jurisdiction: String,
    #[serde(default)]
    pub total_meters: f64,
    #[serde(default)]
    pub taxable_meters: Option<f64>,
    #[serde(default)]
    pub tax_paid_liters: f64,
}

// =========================================================================
// Geofencing
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAddress {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub geofence: Option<WireGeofence>,
}

#[derive(Debug, Deserialize)]
pub struct WireGeofence {
    #[serde(default)]
    pub circle: Option<WireCircle>,
    #[serde(default)]
    pub polygon: Option<WirePolygon>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCircle {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}

#[derive(Debug, Deserialize)]
pub struct WirePolygon {
    #[serde(default)]
    pub vertices: Vec<LatLng>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFleetEvent {
    pub id: String,
    pub event_type: String,
    pub time: String,
    #[serde(default)]
    pub vehicle: Option<IdRef>,
    #[serde(default)]
    pub driver: Option<IdRef>,
    #[serde(default)]
    pub address: Option<IdRef>,
    #[serde(default)]
    pub location: Option<LatLng>,
}

// =========================================================================
// Webhooks
// =========================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebhook<'a> {
    pub name: String,
    pub url: &'a str,
    pub event_types: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookCreated {
    pub id: String,
}
