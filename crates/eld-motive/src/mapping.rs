//! Motive → domain model mapping
//!
//! Pure functions. Motive reports metric units (km, km/h, liters) and
//! durations in seconds.

use chrono::{DateTime, Utc};
use eld_core::base::{self, seconds_to_minutes};
use eld_core::units::{km_to_miles, kph_to_mph, liters_to_gallons, normalize_heading, round_2};
use eld_core::{
    full_name, AssetStatus, Coordinates, DefectSeverity, Driver, DriverStatus, Dvir, DvirDefect,
    DutyStatus, EldEvent, EldEventType, EldVendor, FaultCode, FaultSeverity, HosClock, HosLog,
    HosViolation, IftaQuarter, IftaSummary, InspectionType, JurisdictionSummary, Trailer, Vehicle,
    VehicleLocation, VehicleStats,
};
use serde_json::Value;

use crate::types::*;

const DUTY_STATUSES: &[(&str, DutyStatus)] = &[
    ("off_duty", DutyStatus::OffDuty),
    ("sleeper", DutyStatus::SleeperBerth),
    ("driving", DutyStatus::Driving),
    ("on_duty", DutyStatus::OnDuty),
    ("yard_moves", DutyStatus::YardMove),
    ("personal_conveyance", DutyStatus::PersonalConveyance),
];

/// Webhook actions; the first action listed for a type is the one subscribed
const WEBHOOK_ACTIONS: &[(EldEventType, &str)] = &[
    (EldEventType::LocationUpdate, "vehicle_location_updated"),
    (EldEventType::HosStatusChange, "user_duty_status_updated"),
    (EldEventType::HosViolation, "hos_violation_upserted"),
    (EldEventType::FaultCode, "fault_code_opened"),
    (EldEventType::DvirSubmitted, "inspection_report_created"),
    (EldEventType::VehicleUpdated, "vehicle_updated"),
    (EldEventType::VehicleUpdated, "vehicle_created"),
    (EldEventType::DriverUpdated, "user_updated"),
    (EldEventType::DriverUpdated, "user_created"),
];

/// Timestamp fields tried, in order, for a webhook event time
const WEBHOOK_TIME_FIELDS: &[&str] = &["located_at", "start_time", "updated_at", "created_at"];

pub fn duty_status(value: &str) -> DutyStatus {
    DutyStatus::from_vendor_code(EldVendor::Motive, value, DUTY_STATUSES)
}

pub fn event_type(action: &str) -> EldEventType {
    WEBHOOK_ACTIONS
        .iter()
        .find(|(_, name)| *name == action)
        .map(|(t, _)| *t)
        .unwrap_or(EldEventType::Unknown)
}

/// Webhook action to subscribe to for a canonical event type
pub fn webhook_action(event_type: EldEventType) -> Option<&'static str> {
    WEBHOOK_ACTIONS
        .iter()
        .find(|(t, _)| *t == event_type)
        .map(|(_, name)| *name)
}

fn ts(field: &str, value: &str) -> Option<DateTime<Utc>> {
    base::vendor_timestamp(EldVendor::Motive, field, value)
}

fn opt_ts(value: Option<&str>) -> Option<DateTime<Utc>> {
    value.and_then(base::parse_timestamp)
}

fn asset_status(value: Option<&str>) -> AssetStatus {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("inactive" | "deactivated" | "retired") => AssetStatus::Inactive,
        Some("in_shop" | "maintenance") => AssetStatus::Maintenance,
        Some("in_use") => AssetStatus::InUse,
        _ => AssetStatus::Available,
    }
}

fn year(value: Option<&Value>) -> Option<u16> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|y| u16::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn ref_name(r: &Ref) -> String {
    full_name(r.first_name.as_deref(), r.last_name.as_deref())
}

// =========================================================================
// Fleet
// =========================================================================

pub fn vehicle(wire: MotiveVehicle) -> Vehicle {
    Vehicle {
        name: wire.number.unwrap_or_else(|| wire.id.clone()),
        year: year(wire.year.as_ref()),
        status: asset_status(wire.status.as_deref()),
        eld_device_serial: wire.eld_device.and_then(|d| d.identifier),
        id: wire.id,
        vin: wire.vin,
        license_plate: wire.license_plate_number,
        license_state: wire.license_plate_state,
        make: wire.make,
        model: wire.model,
    }
}

pub fn driver(wire: MotiveUser) -> Driver {
    let status = match wire.status.as_deref() {
        Some("deactivated" | "inactive") => DriverStatus::Inactive,
        _ => DriverStatus::Active,
    };
    Driver {
        name: full_name(wire.first_name.as_deref(), wire.last_name.as_deref()),
        id: wire.id,
        username: wire.username,
        email: wire.email,
        phone: wire.phone,
        license_number: wire.drivers_license_number,
        license_state: wire.drivers_license_state,
        status,
    }
}

pub fn trailer(wire: MotiveAsset) -> Trailer {
    Trailer {
        name: wire.name.unwrap_or_else(|| wire.id.clone()),
        status: asset_status(wire.status.as_deref()),
        id: wire.id,
        trailer_type: wire.asset_type,
        license_plate: wire.license_plate_no,
        vin: wire.vin,
    }
}

// =========================================================================
// Location & stats
// =========================================================================

pub fn location_point(
    vehicle_id: &str,
    vehicle_name: Option<&str>,
    point: LocationPoint,
) -> Option<VehicleLocation> {
    let speed = point.speed.unwrap_or(0.0);
    Some(VehicleLocation {
        vehicle_id: vehicle_id.to_string(),
        vehicle_name: vehicle_name.map(str::to_string),
        driver_id: point.driver.map(|d| d.id),
        latitude: point.lat,
        longitude: point.lon,
        heading: normalize_heading(point.bearing),
        speed_mph: kph_to_mph(speed),
        timestamp: ts("located_at", &point.located_at)?,
        address: point.description,
        odometer_miles: point.odometer.map(km_to_miles),
        engine_running: point.speed.map(|s| s > 0.0),
    })
}

/// Current location; vehicles that never reported are skipped
pub fn current_location(wire: LocatedVehicle) -> Option<VehicleLocation> {
    let point = wire.current_location?;
    let driver_id = wire.current_driver.map(|d| d.id);
    let mut location = location_point(&wire.id, wire.number.as_deref(), point)?;
    if location.driver_id.is_none() {
        location.driver_id = driver_id;
    }
    Some(location)
}

/// Stats snapshot built from the current location sample
pub fn vehicle_stats(wire: LocatedVehicle) -> Option<VehicleStats> {
    let point = wire.current_location?;
    let mut stats = VehicleStats::new(wire.id, ts("located_at", &point.located_at)?);
    stats.odometer_miles = point.odometer.map(km_to_miles);
    stats.engine_hours = point.engine_hours.map(round_2);
    stats.speed_mph = point.speed.map(kph_to_mph);
    stats.engine_running = point.speed.map(|s| s > 0.0);
    Some(stats)
}

// =========================================================================
// Hours of service
// =========================================================================

pub fn hos_clock(wire: DriverAvailability, now: DateTime<Utc>) -> HosClock {
    let available = &wire.available_time;
    HosClock {
        driver_name: full_name(wire.first_name.as_deref(), wire.last_name.as_deref()),
        current_status: wire.duty_status.as_deref().map(duty_status).unwrap_or_default(),
        status_started_at: wire
            .duty_status_started_at
            .as_deref()
            .and_then(|t| ts("duty_status_started_at", t))
            .unwrap_or(now),
        drive_remaining_minutes: seconds_to_minutes(available.drive),
        shift_remaining_minutes: seconds_to_minutes(available.shift),
        cycle_remaining_minutes: seconds_to_minutes(available.cycle),
        break_remaining_minutes: seconds_to_minutes(available.break_time),
        violations: Vec::new(),
        updated_at: now,
        driver_id: wire.id,
    }
}

pub fn hos_log(wire: MotiveHosLog) -> Option<HosLog> {
    let start_time = ts("start_time", &wire.start_time)?;
    let end_time = opt_ts(wire.end_time.as_deref());
    let duration_minutes = match (wire.duration, end_time) {
        (Some(seconds), _) => i64::from(seconds_to_minutes(seconds)),
        (None, Some(end)) => base::minutes_between(start_time, end).max(0),
        (None, None) => 0,
    };
    let coordinates = match (wire.lat, wire.lon) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
        _ => None,
    };
    Some(HosLog {
        driver_name: ref_name(&wire.driver),
        driver_id: wire.driver.id,
        id: wire.id,
        status: duty_status(&wire.status),
        start_time,
        end_time,
        duration_minutes,
        location: wire.location,
        coordinates,
        notes: wire.notes.filter(|n| !n.trim().is_empty()),
        certified: wire.certified,
        edited: wire.edited,
    })
}

pub fn hos_violation(wire: MotiveHosViolation) -> Option<HosViolation> {
    let started_at = ts("start_time", &wire.start_time)?;
    let ended_at = opt_ts(wire.end_time.as_deref());
    let violation_type = wire.violation_type.unwrap_or_else(|| "unknown".to_string());
    Some(HosViolation {
        id: Some(wire.id),
        driver_id: wire.user.id,
        description: wire.name.unwrap_or_else(|| violation_type.clone()),
        violation_type,
        started_at,
        ended_at,
        duration_minutes: ended_at.map(|end| base::minutes_between(started_at, end)),
    })
}

// =========================================================================
// Diagnostics & inspections
// =========================================================================

/// Motive sends no lamp data, so every fault is a warning
pub fn fault_code(wire: MotiveFaultCode) -> Option<FaultCode> {
    let occurred_at = ts("first_observed_at", &wire.first_observed_at)?;
    let closed = wire
        .status
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("closed"));
    let cleared_at = if closed {
        // Closed no earlier than first observed
        opt_ts(wire.last_observed_at.as_deref()).or(Some(occurred_at))
    } else {
        None
    };
    let code = wire.code_label.unwrap_or_else(|| wire.id.clone());
    Some(FaultCode {
        description: wire.code_description.unwrap_or_else(|| code.clone()),
        id: wire.id,
        vehicle_id: wire.vehicle.id,
        code,
        severity: FaultSeverity::Warning,
        occurred_at,
        cleared_at,
        source: wire.code_type.unwrap_or_else(|| "motive".to_string()),
    })
}

pub fn dvir(wire: InspectionReport) -> Option<Dvir> {
    let inspected_at = ts("time", &wire.time)?;
    let safe_to_operate = !wire
        .status
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("unsafe"));
    let inspection_type = match wire.inspection_type.as_deref() {
        Some("post_trip") => InspectionType::PostTrip,
        _ => InspectionType::PreTrip,
    };
    let defects = wire
        .defects
        .into_iter()
        .map(|d| DvirDefect {
            description: d
                .notes
                .clone()
                .or_else(|| d.category.clone())
                .unwrap_or_default(),
            category: d.category.unwrap_or_else(|| "general".to_string()),
            severity: match d.severity.as_deref() {
                Some("major" | "critical") => DefectSeverity::Major,
                _ if !safe_to_operate => DefectSeverity::Major,
                _ => DefectSeverity::Minor,
            },
            repaired: d.resolved,
        })
        .collect();

    Some(Dvir {
        id: wire.id,
        vehicle_id: wire.vehicle.map(|v| v.id).unwrap_or_default(),
        driver_id: wire.driver.map(|d| d.id).unwrap_or_default(),
        trailer_id: wire.asset.map(|a| a.id),
        inspection_type,
        inspected_at,
        defects,
        safe_to_operate,
        driver_signed: wire.driver_signed_at.is_some(),
        mechanic_signed: wire.mechanic_signed_at.is_some(),
        location: wire.location,
    })
}

// =========================================================================
// Fuel tax
// =========================================================================

pub fn ifta_summary(quarter: &IftaQuarter, rows: Vec<IftaJurisdiction>) -> IftaSummary {
    let jurisdictions = rows
        .into_iter()
        .map(|row| {
            JurisdictionSummary::new(
                row.jurisdiction,
                km_to_miles(row.distance),
                liters_to_gallons(row.fuel),
            )
        })
        .collect();
    IftaSummary::from_jurisdictions(quarter, jurisdictions)
}

// =========================================================================
// Webhooks
// =========================================================================

fn id_field(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// `<key>_id` at the top level, or `<key>.id` nested
fn entity_id(payload: &Value, key: &str) -> Option<String> {
    payload
        .get(format!("{}_id", key))
        .and_then(id_field)
        .or_else(|| payload.get(key).and_then(|v| v.get("id")).and_then(id_field))
}

/// One event per webhook delivery.
///
/// Deliveries without any time field are stamped on receipt; a time field
/// that does not parse drops the delivery.
pub fn webhook_event(payload: &Value) -> Option<EldEvent> {
    let action = payload.get("action").and_then(Value::as_str);
    let event_type = action.map(event_type).unwrap_or(EldEventType::Unknown);
    let time_field = WEBHOOK_TIME_FIELDS
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str).map(|v| (*key, v)));
    let timestamp = match time_field {
        Some((field, value)) => ts(field, value)?,
        None => Utc::now(),
    };

    let driver_id = entity_id(payload, "driver").or_else(|| entity_id(payload, "user"));
    let vehicle_id = entity_id(payload, "vehicle").or_else(|| match event_type {
        EldEventType::VehicleUpdated => payload.get("id").and_then(id_field),
        _ => None,
    });

    Some(EldEvent {
        id: payload
            .get("id")
            .and_then(id_field)
            .map(|id| format!("{}-{}", action.unwrap_or("event"), id))
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        vendor: EldVendor::Motive,
        event_type,
        timestamp,
        vehicle_id,
        driver_id,
        payload: payload.clone(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn from_json<T: serde::de::DeserializeOwned>(value: Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_duty_status_is_total() {
        assert_eq!(duty_status("off_duty"), DutyStatus::OffDuty);
        assert_eq!(duty_status("sleeper"), DutyStatus::SleeperBerth);
        assert_eq!(duty_status("driving"), DutyStatus::Driving);
        assert_eq!(duty_status("on_duty"), DutyStatus::OnDuty);
        assert_eq!(duty_status("yard_moves"), DutyStatus::YardMove);
        assert_eq!(duty_status("personal_conveyance"), DutyStatus::PersonalConveyance);
        assert_eq!(duty_status("waiting"), DutyStatus::OffDuty);
    }

    #[test]
    fn test_webhook_actions() {
        assert_eq!(event_type("vehicle_created"), EldEventType::VehicleUpdated);
        assert_eq!(webhook_action(EldEventType::VehicleUpdated), Some("vehicle_updated"));
        assert_eq!(webhook_action(EldEventType::GeofenceEntry), None);
        assert_eq!(event_type("message_received"), EldEventType::Unknown);
    }

    #[test]
    fn test_current_location_metric_units() {
        let wire: LocatedVehicle = from_json(json!({
            "id": 1001,
            "number": "T-7",
            "current_location": {
                "lat": 41.88, "lon": -87.63, "bearing": 359.6,
                "located_at": "2024-05-01T12:00:00Z",
                "speed": 100.0, "odometer": 160934.0,
                "description": "Chicago, IL"
            },
            "current_driver": {"id": 55, "first_name": "Dee", "last_name": "Ray"}
        }));
        let location = current_location(wire).unwrap();
        assert_eq!(location.vehicle_id, "1001");
        assert_eq!(location.speed_mph, 62.0);
        assert_eq!(location.odometer_miles, Some(100000.0));
        assert_eq!(location.heading, 0);
        assert_eq!(location.driver_id.as_deref(), Some("55"));
        assert_eq!(location.engine_running, Some(true));
    }

    #[test]
    fn test_vehicle_without_fix_is_skipped() {
        let wire: LocatedVehicle = from_json(json!({"id": 1002, "current_location": null}));
        assert!(current_location(wire).is_none());
    }

    #[test]
    fn test_stats_from_location() {
        let wire: LocatedVehicle = from_json(json!({
            "id": 1001,
            "current_location": {
                "lat": 0.0, "lon": 0.0, "located_at": "2024-05-01T12:00:00Z",
                "speed": 0.0, "odometer": 1000.0, "engine_hours": 1520.456
            }
        }));
        let stats = vehicle_stats(wire).unwrap();
        assert_eq!(stats.odometer_miles, Some(621.0));
        assert_eq!(stats.engine_hours, Some(1520.46));
        assert_eq!(stats.engine_running, Some(false));
        assert_eq!(stats.fuel_level_percent, None);
    }

    #[test]
    fn test_hos_clock_seconds_to_minutes() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let wire: DriverAvailability = from_json(json!({
            "id": 55, "first_name": "Dee", "last_name": "Ray",
            "duty_status": "driving",
            "available_time": {"drive": 19800, "shift": 30600, "cycle": 151200, "break": 7199}
        }));
        let clock = hos_clock(wire, now);
        assert_eq!(clock.driver_name, "Dee Ray");
        assert_eq!(clock.current_status, DutyStatus::Driving);
        assert_eq!(clock.drive_remaining_minutes, 330);
        assert_eq!(clock.shift_remaining_minutes, 510);
        assert_eq!(clock.cycle_remaining_minutes, 2520);
        assert_eq!(clock.break_remaining_minutes, 119);
        assert_eq!(clock.status_started_at, now);
    }

    #[test]
    fn test_hos_log_duration_from_end_time() {
        let wire: MotiveHosLog = from_json(json!({
            "id": 9, "status": "on_duty",
            "start_time": "2024-05-01T08:00:00Z", "end_time": "2024-05-01T09:30:00Z",
            "driver": {"id": 55, "first_name": "Dee", "last_name": "Ray"},
            "notes": "  "
        }));
        let log = hos_log(wire).unwrap();
        assert_eq!(log.duration_minutes, 90);
        assert_eq!(log.status, DutyStatus::OnDuty);
        assert_eq!(log.driver_name, "Dee Ray");
        assert_eq!(log.notes, None);
    }

    #[test]
    fn test_closed_fault_is_cleared() {
        let wire: MotiveFaultCode = from_json(json!({
            "id": 3, "code_label": "P0420", "status": "closed",
            "first_observed_at": "2024-05-01T08:00:00Z",
            "last_observed_at": "2024-05-02T08:00:00Z",
            "vehicle": {"id": 1001}
        }));
        let fault = fault_code(wire).unwrap();
        assert!(!fault.is_active());
        assert_eq!(fault.severity, FaultSeverity::Warning);
        assert_eq!(fault.description, "P0420");
        assert_eq!(fault.source, "motive");
    }

    #[test]
    fn test_unsafe_inspection() {
        let wire: InspectionReport = from_json(json!({
            "id": 77, "type": "post_trip", "time": "2024-05-01T18:00:00Z",
            "status": "unsafe",
            "vehicle": {"id": 1001}, "driver": {"id": 55},
            "defects": [{"category": "Brakes", "notes": "air leak"}],
            "driver_signed_at": "2024-05-01T18:05:00Z"
        }));
        let report = dvir(wire).unwrap();
        assert!(!report.safe_to_operate);
        assert_eq!(report.inspection_type, InspectionType::PostTrip);
        assert_eq!(report.defects[0].severity, DefectSeverity::Major);
        assert_eq!(report.defects[0].description, "air leak");
        assert!(report.driver_signed);
        assert!(!report.mechanic_signed);
    }

    #[test]
    fn test_ifta_metric_conversion() {
        let q = IftaQuarter::new(2024, 1).unwrap();
        let summary = ifta_summary(
            &q,
            vec![
                IftaJurisdiction {
                    jurisdiction: "IL".to_string(),
                    distance: 1000.0,
                    fuel: 378.54,
                },
                IftaJurisdiction {
                    jurisdiction: "IN".to_string(),
                    distance: 100.0,
                    fuel: 0.0,
                },
            ],
        );
        assert_eq!(summary.jurisdictions[0].miles, 621.0);
        assert_eq!(summary.jurisdictions[0].gallons, 100.0);
        assert_eq!(summary.total_miles, 683.0);
    }

    #[test]
    fn test_webhook_event() {
        let payload = json!({
            "action": "vehicle_location_updated",
            "id": 8812,
            "vehicle_id": 1001,
            "driver": {"id": 55},
            "located_at": "2024-05-01T12:00:00Z"
        });
        let event = webhook_event(&payload).unwrap();
        assert_eq!(event.vendor, EldVendor::Motive);
        assert_eq!(event.event_type, EldEventType::LocationUpdate);
        assert_eq!(event.id, "vehicle_location_updated-8812");
        assert_eq!(event.vehicle_id.as_deref(), Some("1001"));
        assert_eq!(event.driver_id.as_deref(), Some("55"));
        assert_eq!(
            event.timestamp,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_unparseable_times_drop_records() {
        let log: MotiveHosLog = from_json(json!({
            "id": 10, "status": "driving", "start_time": "yesterday",
            "driver": {"id": 55}
        }));
        assert!(hos_log(log).is_none());

        let fault: MotiveFaultCode = from_json(json!({
            "id": 4, "first_observed_at": "", "vehicle": {"id": 1001}
        }));
        assert!(fault_code(fault).is_none());

        assert!(webhook_event(&json!({
            "action": "vehicle_updated", "id": 1, "updated_at": "n/a"
        }))
        .is_none());
    }

    #[test]
    fn test_closed_fault_without_last_seen_clears_at_first_seen() {
        let wire: MotiveFaultCode = from_json(json!({
            "id": 5, "status": "closed",
            "first_observed_at": "2024-05-01T08:00:00Z",
            "vehicle": {"id": 1001}
        }));
        let fault = fault_code(wire).unwrap();
        assert_eq!(fault.cleared_at, Some(fault.occurred_at));
    }
}
