//! Motive wire format
//!
//! Collections come back as `{"<plural>": [{"<singular>": {...}}], "pagination": {...}}`
//! and single lookups as `{"<singular>": {...}}`. Ids are integers on the
//! wire and strings in the domain model.

use serde::{Deserialize, Deserializer, Serialize};

// =========================================================================
// Ids and envelopes
// =========================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

/// Integer or string id, as a string
pub fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

/// Optional integer or string id, as a string
pub fn opt_id_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub page_no: u32,
    #[serde(default)]
    pub total: u64,
}

impl Pagination {
    /// Number of the following page, if the total says there is one
    pub fn next_page(&self) -> Option<u32> {
        let seen = u64::from(self.page_no) * u64::from(self.per_page);
        (self.per_page > 0 && seen < self.total).then(|| self.page_no + 1)
    }
}

/// A list envelope split into its records and pagination block
pub trait ListPage {
    type Item;

    fn into_parts(self) -> (Vec<Self::Item>, Option<Pagination>);
}

macro_rules! list_page {
    ($page:ident, $list:ident, $entry:ident, $item:ident, $ty:ty) => {
        #[derive(Debug, Deserialize)]
        pub struct $entry {
            pub $item: $ty,
        }

        #[derive(Debug, Deserialize)]
        pub struct $page {
            #[serde(default)]
            pub $list: Vec<$entry>,
            #[serde(default)]
            pub pagination: Option<Pagination>,
        }

        impl ListPage for $page {
            type Item = $ty;

            fn into_parts(self) -> (Vec<$ty>, Option<Pagination>) {
                (
                    self.$list.into_iter().map(|e| e.$item).collect(),
                    self.pagination,
                )
            }
        }
    };
}

list_page!(VehiclesPage, vehicles, VehicleEntry, vehicle, MotiveVehicle);
list_page!(UsersPage, users, UserEntry, user, MotiveUser);
list_page!(AssetsPage, assets, AssetEntry, asset, MotiveAsset);
list_page!(VehicleLocationsPage, vehicles, LocatedVehicleEntry, vehicle, LocatedVehicle);
list_page!(LocationHistoryPage, vehicle_locations, LocationPointEntry, vehicle_location, LocationPoint);
list_page!(AvailableTimePage, users, AvailabilityEntry, user, DriverAvailability);
list_page!(HosLogsPage, hos_logs, HosLogEntry, hos_log, MotiveHosLog);
list_page!(HosViolationsPage, hos_violations, HosViolationEntry, hos_violation, MotiveHosViolation);
list_page!(FaultCodesPage, fault_codes, FaultCodeEntry, fault_code, MotiveFaultCode);
list_page!(InspectionsPage, inspection_reports, InspectionEntry, inspection_report, InspectionReport);

/// Nested `{id, ...}` reference to a user or vehicle
#[derive(Debug, Clone, Deserialize)]
pub struct Ref {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
}

// =========================================================================
// Fleet
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct EldDevice {
    #[serde(default)]
    pub identifier: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MotiveVehicle {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<serde_json::Value>,
    #[serde(default)]
    pub license_plate_number: Option<String>,
    #[serde(default)]
    pub license_plate_state: Option<String>,
    #[serde(default)]
    pub eld_device: Option<EldDevice>,
}

#[derive(Debug, Deserialize)]
pub struct MotiveUser {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub drivers_license_number: Option<String>,
    #[serde(default)]
    pub drivers_license_state: Option<String>,
    /// "active" or "deactivated"
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MotiveAsset {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub license_plate_no: Option<String>,
    #[serde(default)]
    pub vin: Option<String>,
}

// =========================================================================
// Location
// =========================================================================

/// Position sample; speed in km/h, odometer in km
#[derive(Debug, Clone, Deserialize)]
pub struct LocationPoint {
    #[serde(default, deserialize_with = "opt_id_string")]
    pub id: Option<String>,
    pub located_at: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub bearing: f64,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub odometer: Option<f64>,
    #[serde(default)]
    pub engine_hours: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub driver: Option<Ref>,
}

#[derive(Debug, Deserialize)]
pub struct LocatedVehicle {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub current_location: Option<LocationPoint>,
    #[serde(default)]
    pub current_driver: Option<Ref>,
}

// =========================================================================
// Hours of service
// =========================================================================

/// Remaining time in seconds
#[derive(Debug, Default, Deserialize)]
pub struct AvailableTime {
    #[serde(default)]
    pub drive: f64,
    #[serde(default)]
    pub shift: f64,
    #[serde(default)]
    pub cycle: f64,
    #[serde(rename = "break", default)]
    pub break_time: f64,
}

#[derive(Debug, Deserialize)]
pub struct DriverAvailability {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub duty_status: Option<String>,
    #[serde(default)]
    pub duty_status_started_at: Option<String>,
    #[serde(default)]
    pub available_time: AvailableTime,
}

#[derive(Debug, Deserialize)]
pub struct MotiveHosLog {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub status: String,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    /// Seconds
    #[serde(default)]
    pub duration: Option<f64>,
    pub driver: Ref,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub certified: bool,
    #[serde(default)]
    pub edited: bool,
}

#[derive(Debug, Deserialize)]
pub struct MotiveHosViolation {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub violation_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    pub user: Ref,
}

// =========================================================================
// Diagnostics and inspections
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct MotiveFaultCode {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub code_label: Option<String>,
    #[serde(default)]
    pub code_description: Option<String>,
    #[serde(rename = "type", default)]
    pub code_type: Option<String>,
    /// "open" or "closed"
    #[serde(default)]
    pub status: Option<String>,
    pub first_observed_at: String,
    #[serde(default)]
    pub last_observed_at: Option<String>,
    pub vehicle: Ref,
}

#[derive(Debug, Deserialize)]
pub struct InspectionDefect {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub resolved: bool,
}

#[derive(Debug, Deserialize)]
pub struct InspectionReport {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    /// "pre_trip" or "post_trip"
    #[serde(rename = "type", default)]
    pub inspection_type: Option<String>,
    pub time: String,
    /// "safe", "unsafe" or "corrected"
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub vehicle: Option<Ref>,
    #[serde(default)]
    pub driver: Option<Ref>,
    #[serde(default)]
    pub asset: Option<Ref>,
    #[serde(default)]
    pub defects: Vec<InspectionDefect>,
    #[serde(default)]
    pub driver_signed_at: Option<String>,
    #[serde(default)]
    pub mechanic_signed_at: Option<String>,
}

// =========================================================================
// Fuel tax
// =========================================================================

/// Jurisdiction totals; distance in km, fuel in liters
#[derive(Debug, Deserialize)]
pub struct IftaJurisdiction {
    pub jurisdiction: String,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub fuel: f64,
}

#[derive(Debug, Deserialize)]
pub struct IftaSummaryResponse {
    #[serde(default)]
    pub ifta_summary: Vec<IftaJurisdiction>,
}

// =========================================================================
// Webhooks
// =========================================================================

#[derive(Debug, Serialize)]
pub struct CreateWebhook<'a> {
    pub url: &'a str,
    pub format: &'static str,
    pub actions: Vec<&'static str>,
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct CompanyWebhook {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct CompanyWebhookEntry {
    pub company_webhook: CompanyWebhook,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_ids_become_strings() {
        let page: VehiclesPage = serde_json::from_str(
            r#"{"vehicles": [{"vehicle": {"id": 42, "number": "T-42"}}],
                "pagination": {"per_page": 25, "page_no": 1, "total": 60}}"#,
        )
        .unwrap();
        let (vehicles, pagination) = page.into_parts();
        assert_eq!(vehicles[0].id, "42");
        assert_eq!(pagination.and_then(|p| p.next_page()), Some(2));
    }

    #[test]
    fn test_last_page_has_no_next() {
        let p = Pagination {
            per_page: 25,
            page_no: 3,
            total: 60,
        };
        assert_eq!(p.next_page(), None);
        assert_eq!(Pagination::default().next_page(), None);
    }
}
