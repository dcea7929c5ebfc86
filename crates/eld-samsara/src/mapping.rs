//! Samsara → domain model mapping
//!
//! Pure functions; no I/O. Every timestamp Samsara sends is RFC 3339.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use eld_core::base::{self, millis_to_minutes};
use eld_core::units::{liters_to_gallons, meters_to_miles, normalize_heading, round_2, round_whole};
use eld_core::{
    j1939_code, AssetStatus, Coordinates, DefectSeverity, Driver, DriverStatus, Dvir, DvirDefect,
    DutyStatus, EldEvent, EldEventType, EldVendor, FaultCode, FaultSeverity, Geofence,
    GeofenceEvent, GeofenceEventType, GeofenceShape, HosClock, HosLog, HosViolation,
    InspectionType, JurisdictionSummary, MaintenanceAlert, Trailer, Vehicle, VehicleLocation,
    VehicleStats,
};
use tracing::warn;

use crate::types::*;

/// Samsara duty-status vocabulary
const DUTY_STATUSES: &[(&str, DutyStatus)] = &[
    ("offDuty", DutyStatus::OffDuty),
    ("sleeperBerth", DutyStatus::SleeperBerth),
    ("driving", DutyStatus::Driving),
    ("onDuty", DutyStatus::OnDuty),
    ("yardMove", DutyStatus::YardMove),
    ("personalConveyance", DutyStatus::PersonalConveyance),
];

/// Webhook event names, canonical type first
const EVENT_TYPES: &[(EldEventType, &str)] = &[
    (EldEventType::LocationUpdate, "VehicleLocationUpdated"),
    (EldEventType::HosStatusChange, "DriverDutyStatusChanged"),
    (EldEventType::HosViolation, "HosViolationDetected"),
    (EldEventType::FaultCode, "EngineFaultOn"),
    (EldEventType::DvirSubmitted, "DvirSubmitted"),
    (EldEventType::GeofenceEntry, "GeofenceEntry"),
    (EldEventType::GeofenceExit, "GeofenceExit"),
    (EldEventType::VehicleUpdated, "VehicleUpdated"),
    (EldEventType::DriverUpdated, "DriverUpdated"),
];

/// Unrecognized statuses map to off-duty
pub fn duty_status(value: &str) -> DutyStatus {
    DutyStatus::from_vendor_code(EldVendor::Samsara, value, DUTY_STATUSES)
}

pub fn event_type(value: &str) -> EldEventType {
    EVENT_TYPES
        .iter()
        .find(|(_, name)| *name == value)
        .map(|(t, _)| *t)
        .unwrap_or(EldEventType::Unknown)
}

/// Vendor name for a canonical event type (`None` for `Unknown`)
pub fn event_type_name(event_type: EldEventType) -> Option<&'static str> {
    EVENT_TYPES
        .iter()
        .find(|(t, _)| *t == event_type)
        .map(|(_, name)| *name)
}

fn ts(field: &str, value: &str) -> Option<DateTime<Utc>> {
    base::vendor_timestamp(EldVendor::Samsara, field, value)
}

fn opt_ts(value: Option<&str>) -> Option<DateTime<Utc>> {
    value.and_then(base::parse_timestamp)
}

fn year(value: Option<&serde_json::Value>) -> Option<u16> {
    match value? {
        serde_json::Value::Number(n) => n.as_u64().and_then(|y| u16::try_from(y).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// =========================================================================
// Fleet
// =========================================================================

pub fn vehicle(wire: WireVehicle) -> Vehicle {
    Vehicle {
        name: wire.name.unwrap_or_else(|| wire.id.clone()),
        year: year(wire.year.as_ref()),
        id: wire.id,
        vin: wire.vin,
        license_plate: wire.license_plate,
        license_state: None,
        make: wire.make,
        model: wire.model,
        status: AssetStatus::Available,
        eld_device_serial: wire.serial,
    }
}

pub fn driver(wire: WireDriver) -> Driver {
    let status = match wire.driver_activation_status.as_deref() {
        Some("deactivated") => DriverStatus::Inactive,
        _ => DriverStatus::Active,
    };
    Driver {
        name: wire.name.unwrap_or_default(),
        id: wire.id,
        username: wire.username,
        email: wire.email,
        phone: wire.phone,
        license_number: wire.license_number,
        license_state: wire.license_state,
        status,
    }
}

pub fn trailer(wire: WireTrailer) -> Trailer {
    Trailer {
        name: wire.name.unwrap_or_else(|| wire.id.clone()),
        id: wire.id,
        trailer_type: wire.notes,
        license_plate: wire.license_plate,
        vin: wire.trailer_serial_number,
        status: AssetStatus::Available,
    }
}

// =========================================================================
// Location & stats
// =========================================================================

fn location_from_gps(
    vehicle_id: &str,
    vehicle_name: Option<&str>,
    gps: &GpsSample,
) -> Option<VehicleLocation> {
    Some(VehicleLocation {
        vehicle_id: vehicle_id.to_string(),
        vehicle_name: vehicle_name.map(str::to_string),
        driver_id: None,
        latitude: gps.latitude,
        longitude: gps.longitude,
        heading: normalize_heading(gps.heading_degrees),
        speed_mph: round_whole(gps.speed_miles_per_hour),
        timestamp: ts("gps.time", &gps.time)?,
        address: gps
            .reverse_geo
            .as_ref()
            .and_then(|g| g.formatted_location.clone()),
        odometer_miles: None,
        engine_running: None,
    })
}

fn engine_running(state: &str) -> bool {
    state.eq_ignore_ascii_case("on")
}

/// Current location; vehicles without a GPS fix are skipped
pub fn location(snapshot: &VehicleStatsSnapshot) -> Option<VehicleLocation> {
    let gps = snapshot.gps.as_ref()?;
    let mut location = location_from_gps(&snapshot.id, snapshot.name.as_deref(), gps)?;
    location.odometer_miles = snapshot
        .obd_odometer_meters
        .as_ref()
        .map(|o| meters_to_miles(o.value));
    location.engine_running = snapshot
        .engine_state
        .as_ref()
        .map(|e| engine_running(&e.value));
    Some(location)
}

pub fn location_history(series: &VehicleStatsSeries) -> Vec<VehicleLocation> {
    series
        .gps
        .iter()
        .filter_map(|gps| location_from_gps(&series.id, series.name.as_deref(), gps))
        .collect()
}

/// Snapshot stamped with its newest sample; `None` when no sample carries
/// a parseable time
pub fn vehicle_stats(snapshot: &VehicleStatsSnapshot) -> Option<VehicleStats> {
    let latest = [
        snapshot.obd_odometer_meters.as_ref().map(|s| s.time.as_str()),
        snapshot.fuel_percent.as_ref().map(|s| s.time.as_str()),
        snapshot.obd_engine_seconds.as_ref().map(|s| s.time.as_str()),
        snapshot.ecu_speed_mph.as_ref().map(|s| s.time.as_str()),
        snapshot.engine_state.as_ref().map(|s| s.time.as_str()),
    ]
    .into_iter()
    .flatten()
    .filter_map(base::parse_timestamp)
    .max()?;

    let mut stats = VehicleStats::new(&snapshot.id, latest);
    stats.odometer_miles = snapshot
        .obd_odometer_meters
        .as_ref()
        .map(|s| meters_to_miles(s.value));
    stats.engine_hours = snapshot
        .obd_engine_seconds
        .as_ref()
        .map(|s| round_2(s.value / 3600.0));
    stats.fuel_level_percent = snapshot.fuel_percent.as_ref().map(|s| s.value);
    stats.speed_mph = snapshot.ecu_speed_mph.as_ref().map(|s| round_whole(s.value));
    stats.engine_running = snapshot
        .engine_state
        .as_ref()
        .map(|s| engine_running(&s.value));
    Some(stats)
}

fn sample_at<'a>(
    samples: &'a mut BTreeMap<DateTime<Utc>, VehicleStats>,
    vehicle_id: &str,
    time: &str,
) -> Option<&'a mut VehicleStats> {
    let at = base::parse_timestamp(time)?;
    Some(
        samples
            .entry(at)
            .or_insert_with(|| VehicleStats::new(vehicle_id, at)),
    )
}

/// Merge the per-stat series into one sample per distinct timestamp
pub fn vehicle_stats_history(series: &VehicleStatsSeries) -> Vec<VehicleStats> {
    let mut samples = BTreeMap::new();
    let id = series.id.as_str();

    for s in &series.obd_odometer_meters {
        if let Some(stats) = sample_at(&mut samples, id, &s.time) {
            stats.odometer_miles = Some(meters_to_miles(s.value));
        }
    }
    for s in &series.obd_engine_seconds {
        if let Some(stats) = sample_at(&mut samples, id, &s.time) {
            stats.engine_hours = Some(round_2(s.value / 3600.0));
        }
    }
    for s in &series.fuel_percents {
        if let Some(stats) = sample_at(&mut samples, id, &s.time) {
            stats.fuel_level_percent = Some(s.value);
        }
    }
    for s in &series.ecu_speed_mph {
        if let Some(stats) = sample_at(&mut samples, id, &s.time) {
            stats.speed_mph = Some(round_whole(s.value));
        }
    }
    for s in &series.engine_states {
        if let Some(stats) = sample_at(&mut samples, id, &s.time) {
            stats.engine_running = Some(engine_running(&s.value));
        }
    }

    samples.into_values().collect()
}

// =========================================================================
// Hours of service
// =========================================================================

pub fn hos_clock(wire: WireHosClock, now: DateTime<Utc>) -> HosClock {
    let clocks = wire.clocks.unwrap_or_default();
    let (status, started) = match wire.current_duty_status {
        Some(current) => (
            duty_status(&current.hos_status_type),
            opt_ts(current.start_time.as_deref()),
        ),
        None => (DutyStatus::OffDuty, None),
    };

    let mut violations = Vec::new();
    if let Some(v) = wire.violations {
        if v.shift_driving_violation_duration_ms > 0 {
            violations.push(clock_violation(
                &wire.driver.id,
                "shift_driving",
                "Driving beyond the shift driving limit",
                v.shift_driving_violation_duration_ms,
                now,
            ));
        }
        if v.cycle_violation_duration_ms > 0 {
            violations.push(clock_violation(
                &wire.driver.id,
                "cycle",
                "Driving beyond the cycle limit",
                v.cycle_violation_duration_ms,
                now,
            ));
        }
    }

    HosClock {
        driver_name: wire.driver.name.unwrap_or_default(),
        driver_id: wire.driver.id,
        current_status: status,
        status_started_at: started.unwrap_or(now),
        drive_remaining_minutes: millis_to_minutes(
            clocks.drive.map_or(0, |c| c.drive_remaining_duration_ms),
        ),
        shift_remaining_minutes: millis_to_minutes(
            clocks.shift.map_or(0, |c| c.shift_remaining_duration_ms),
        ),
        cycle_remaining_minutes: millis_to_minutes(
            clocks.cycle.map_or(0, |c| c.cycle_remaining_duration_ms),
        ),
        break_remaining_minutes: millis_to_minutes(
            clocks.break_clock.map_or(0, |c| c.time_until_break_duration_ms),
        ),
        violations,
        updated_at: now,
    }
}

fn clock_violation(
    driver_id: &str,
    kind: &str,
    description: &str,
    duration_ms: i64,
    now: DateTime<Utc>,
) -> HosViolation {
    let minutes = i64::from(millis_to_minutes(duration_ms));
    HosViolation {
        id: None,
        driver_id: driver_id.to_string(),
        violation_type: kind.to_string(),
        description: description.to_string(),
        started_at: now - chrono::Duration::minutes(minutes),
        ended_at: None,
        duration_minutes: Some(minutes),
    }
}

pub fn hos_logs(wire: DriverHosLogs) -> Vec<HosLog> {
    let driver_id = wire.driver.id;
    let driver_name = wire.driver.name.unwrap_or_default();
    wire.hos_logs
        .into_iter()
        .filter_map(|log| {
            let start = ts("logStartTime", &log.log_start_time)?;
            let end = opt_ts(log.log_end_time.as_deref());
            let duration = base::minutes_between(start, end.unwrap_or_else(Utc::now)).max(0);
            let (location, coordinates) = match log.log_recorded_location {
                Some(loc) => (
                    loc.formatted_location,
                    Some(Coordinates::new(loc.latitude, loc.longitude)),
                ),
                None => (None, None),
            };
            Some(HosLog {
                id: format!("{}-{}", driver_id, start.timestamp()),
                driver_id: driver_id.clone(),
                driver_name: driver_name.clone(),
                status: duty_status(&log.hos_status_type),
                start_time: start,
                end_time: end,
                duration_minutes: duration,
                location,
                coordinates,
                notes: log.remark,
                certified: log.is_certified,
                edited: log.is_edited,
            })
        })
        .collect()
}

pub fn hos_violations(wire: DriverViolations) -> Vec<HosViolation> {
    let driver_id = wire.driver.id;
    wire.violations
        .into_iter()
        .filter_map(|v| {
            let started = ts("violationStartTime", &v.violation_start_time)?;
            let minutes = v.duration_ms.map(|ms| i64::from(millis_to_minutes(ms)));
            Some(HosViolation {
                id: v.id,
                driver_id: driver_id.clone(),
                description: v.description.unwrap_or_else(|| v.violation_type.clone()),
                violation_type: v.violation_type,
                started_at: started,
                ended_at: minutes.map(|m| started + chrono::Duration::minutes(m)),
                duration_minutes: minutes,
            })
        })
        .collect()
}

// =========================================================================
// Diagnostics
// =========================================================================

/// Flatten the OBD-II and J1939 trouble codes reported for one vehicle.
///
/// Samsara reports only currently active codes, so none are cleared.
pub fn fault_codes(snapshot: &VehicleStatsSnapshot) -> Vec<FaultCode> {
    let Some(stats) = snapshot.fault_codes.as_ref() else {
        return Vec::new();
    };
    let Some(occurred) = ts("faultCodes.time", &stats.time) else {
        return Vec::new();
    };
    let mut faults = Vec::new();

    if let Some(j1939) = &stats.j1939 {
        let lamps = j1939.check_engine_lights.as_ref();
        let severity = FaultSeverity::from_lamps(
            lamps.is_some_and(|l| l.stop_is_on),
            lamps.is_some_and(|l| l.warning_is_on || l.emissions_is_on || l.protect_is_on),
        );
        for dtc in &j1939.diagnostic_trouble_codes {
            let code = j1939_code(dtc.spn_id, dtc.fmi_id);
            let description = [dtc.spn_description.as_deref(), dtc.fmi_description.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" - ");
            faults.push(FaultCode {
                id: format!("{}-{}-{}", snapshot.id, dtc.spn_id, dtc.fmi_id),
                vehicle_id: snapshot.id.clone(),
                description: if description.is_empty() {
                    code.clone()
                } else {
                    description
                },
                code,
                severity,
                occurred_at: occurred,
                cleared_at: None,
                source: "j1939".to_string(),
            });
        }
    }

    if let Some(obdii) = &stats.obdii {
        let severity = FaultSeverity::from_lamps(false, obdii.check_engine_light_is_on);
        for group in &obdii.diagnostic_trouble_codes {
            for dtc in group.confirmed_dtcs.iter().chain(&group.pending_dtcs) {
                faults.push(FaultCode {
                    id: format!("{}-{}", snapshot.id, dtc.dtc_short_code),
                    vehicle_id: snapshot.id.clone(),
                    code: dtc.dtc_short_code.clone(),
                    description: dtc
                        .dtc_description
                        .clone()
                        .unwrap_or_else(|| dtc.dtc_short_code.clone()),
                    severity,
                    occurred_at: occurred,
                    cleared_at: None,
                    source: "obdii".to_string(),
                });
            }
        }
    }

    faults
}

pub fn maintenance_alert(defect: WireDefect) -> Option<MaintenanceAlert> {
    let vehicle_id = defect.vehicle?.id;
    let alert_type = defect.defect_type.unwrap_or_else(|| "defect".to_string());
    Some(MaintenanceAlert {
        id: defect.id,
        vehicle_id,
        description: defect.comment.unwrap_or_else(|| alert_type.clone()),
        alert_type,
        severity: FaultSeverity::Warning,
        due_at: opt_ts(defect.created_at_time.as_deref()),
        due_odometer_miles: None,
    })
}

// =========================================================================
// Inspections
// =========================================================================

fn dvir_defect(defect: WireDefect, severity: DefectSeverity) -> DvirDefect {
    let category = defect.defect_type.unwrap_or_else(|| "other".to_string());
    DvirDefect {
        description: defect.comment.unwrap_or_else(|| category.clone()),
        category,
        severity,
        repaired: defect.is_resolved,
    }
}

/// Reports without a parseable start or end time are dropped
pub fn dvir(wire: WireDvir) -> Option<Dvir> {
    let safe = !matches!(wire.safety_status.as_deref(), Some("unsafe"));
    // Defects on an unsafe report kept the vehicle off the road.
    let severity = if safe {
        DefectSeverity::Minor
    } else {
        DefectSeverity::Major
    };
    let inspected_at = match (wire.end_time.as_deref(), wire.start_time.as_deref()) {
        (Some(end), _) => ts("endTime", end)?,
        (None, Some(start)) => ts("startTime", start)?,
        (None, None) => {
            warn!(dvir_id = %wire.id, "Dropping DVIR without an inspection time");
            return None;
        }
    };
    let inspection_type = match wire.inspection_type.as_deref() {
        Some("postTrip") => InspectionType::PostTrip,
        _ => InspectionType::PreTrip,
    };

    let driver_id = wire
        .author_signature
        .as_ref()
        .and_then(|s| s.signatory_user.as_ref())
        .map(|u| u.id.clone())
        .unwrap_or_default();

    let defects = wire
        .vehicle_defects
        .into_iter()
        .chain(wire.trailer_defects)
        .map(|d| dvir_defect(d, severity))
        .collect();

    Some(Dvir {
        id: wire.id,
        vehicle_id: wire.vehicle.map(|v| v.id).unwrap_or_default(),
        driver_id,
        trailer_id: wire.trailer.map(|t| t.id),
        inspection_type,
        inspected_at,
        defects,
        safe_to_operate: safe,
        driver_signed: wire
            .author_signature
            .is_some_and(|s| s.signed_at_time.is_some()),
        mechanic_signed: wire
            .mechanic_or_agent_signature
            .is_some_and(|s| s.signed_at_time.is_some()),
        location: wire.location,
    })
}

// =========================================================================
// IFTA
// =========================================================================

pub fn jurisdiction(wire: WireJurisdiction) -> JurisdictionSummary {
    let mut summary = JurisdictionSummary::new(
        wire.jurisdiction,
        meters_to_miles(wire.total_meters),
        liters_to_gallons(wire.tax_paid_liters),
    );
    if let Some(taxable) = wire.taxable_meters {
        summary.taxable_miles = meters_to_miles(taxable);
    }
    summary
}

// =========================================================================
// Geofencing
// =========================================================================

/// Addresses without a geofence are not geofences
pub fn geofence(address: WireAddress) -> Option<Geofence> {
    let fence = address.geofence?;
    let shape = if let Some(circle) = fence.circle {
        GeofenceShape::Circle {
            center: Coordinates::new(circle.latitude, circle.longitude),
            radius_meters: circle.radius_meters,
        }
    } else {
        let vertices = fence.polygon?.vertices;
        GeofenceShape::Polygon {
            vertices: vertices
                .into_iter()
                .map(|v| Coordinates::new(v.latitude, v.longitude))
                .collect(),
        }
    };
    Some(Geofence {
        id: address.id,
        name: address.name,
        shape,
    })
}

pub fn geofence_event(wire: WireFleetEvent) -> Option<GeofenceEvent> {
    let event_type = match wire.event_type.as_str() {
        "geofenceEntry" => GeofenceEventType::Enter,
        "geofenceExit" => GeofenceEventType::Exit,
        _ => return None,
    };
    let address = wire.address?;
    Some(GeofenceEvent {
        id: wire.id,
        geofence_id: address.id,
        geofence_name: address.name,
        vehicle_id: wire.vehicle.map(|v| v.id).unwrap_or_default(),
        driver_id: wire.driver.map(|d| d.id),
        event_type,
        timestamp: ts("time", &wire.time)?,
        location: wire
            .location
            .map(|l| Coordinates::new(l.latitude, l.longitude)),
    })
}

// =========================================================================
// Webhooks
// =========================================================================

fn nested_id(data: &serde_json::Value, object: &str, flat: &str) -> Option<String> {
    data.get(object)
        .and_then(|o| o.get("id"))
        .or_else(|| data.get(flat))
        .and_then(|v| match v {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// One webhook delivery carries exactly one event; deliveries without a
/// parseable `eventTime` yield none
pub fn webhook_event(payload: &serde_json::Value) -> Option<EldEvent> {
    let str_field = |key: &str| payload.get(key).and_then(|v| v.as_str());
    let data = payload
        .get("data")
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    let timestamp = ts("eventTime", str_field("eventTime").unwrap_or_default())?;

    Some(EldEvent {
        id: str_field("eventId")
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        vendor: EldVendor::Samsara,
        event_type: str_field("eventType")
            .map(event_type)
            .unwrap_or(EldEventType::Unknown),
        timestamp,
        vehicle_id: nested_id(&data, "vehicle", "vehicleId"),
        driver_id: nested_id(&data, "driver", "driverId"),
        payload: data,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn from_json<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_duty_status_is_total() {
        assert_eq!(duty_status("driving"), DutyStatus::Driving);
        assert_eq!(duty_status("sleeperBerth"), DutyStatus::SleeperBerth);
        assert_eq!(duty_status("yardMove"), DutyStatus::YardMove);
        assert_eq!(duty_status("personalConveyance"), DutyStatus::PersonalConveyance);
        assert_eq!(duty_status("onDuty"), DutyStatus::OnDuty);
        assert_eq!(duty_status("waitingTime"), DutyStatus::OffDuty);
        assert_eq!(duty_status(""), DutyStatus::OffDuty);
    }

    #[test]
    fn test_event_type_table() {
        assert_eq!(event_type("GeofenceEntry"), EldEventType::GeofenceEntry);
        assert_eq!(event_type("RouteStopArrival"), EldEventType::Unknown);
        assert_eq!(event_type_name(EldEventType::DvirSubmitted), Some("DvirSubmitted"));
        assert_eq!(event_type_name(EldEventType::Unknown), None);
    }

    #[test]
    fn test_location_units() {
        let snapshot: VehicleStatsSnapshot = from_json(json!({
            "id": "281474977075402",
            "name": "Truck 12",
            "gps": {
                "time": "2024-05-01T12:00:00Z",
                "latitude": 37.77,
                "longitude": -122.41,
                "headingDegrees": 361.4,
                "speedMilesPerHour": 54.6,
                "reverseGeo": {"formattedLocation": "San Francisco, CA"}
            },
            "engineState": {"time": "2024-05-01T12:00:00Z", "value": "On"},
            "obdOdometerMeters": {"time": "2024-05-01T12:00:00Z", "value": 160934.0}
        }));
        let loc = location(&snapshot).unwrap();
        assert_eq!(loc.heading, 1);
        assert_eq!(loc.speed_mph, 55.0);
        assert_eq!(loc.odometer_miles, Some(100.0));
        assert_eq!(loc.engine_running, Some(true));
        assert_eq!(loc.address.as_deref(), Some("San Francisco, CA"));
        assert_eq!(loc.vehicle_name.as_deref(), Some("Truck 12"));
    }

    #[test]
    fn test_location_requires_gps() {
        let snapshot: VehicleStatsSnapshot = from_json(json!({"id": "1"}));
        assert!(location(&snapshot).is_none());
    }

    #[test]
    fn test_stats_history_merges_series() {
        let series: VehicleStatsSeries = from_json(json!({
            "id": "v1",
            "obdOdometerMeters": [
                {"time": "2024-05-01T10:00:00Z", "value": 1609.34},
                {"time": "2024-05-01T11:00:00Z", "value": 3218.68}
            ],
            "fuelPercents": [{"time": "2024-05-01T10:00:00Z", "value": 75.0}],
            "engineStates": [{"time": "2024-05-01T11:00:00Z", "value": "Off"}]
        }));
        let samples = vehicle_stats_history(&series);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].odometer_miles, Some(1.0));
        assert_eq!(samples[0].fuel_level_percent, Some(75.0));
        assert_eq!(samples[1].odometer_miles, Some(2.0));
        assert_eq!(samples[1].engine_running, Some(false));
        assert!(samples[0].timestamp < samples[1].timestamp);
    }

    #[test]
    fn test_hos_clock_minutes() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let clock = hos_clock(
            from_json(json!({
                "driver": {"id": "d1", "name": "Ana Lopez"},
                "currentDutyStatus": {"hosStatusType": "driving"},
                "clocks": {
                    "drive": {"driveRemainingDurationMs": 16_200_000},
                    "shift": {"shiftRemainingDurationMs": 25_200_000},
                    "cycle": {"cycleRemainingDurationMs": 126_000_000},
                    "break": {"timeUntilBreakDurationMs": 7_199_999}
                },
                "violations": {"shiftDrivingViolationDurationMs": 600_000}
            })),
            now,
        );
        assert_eq!(clock.current_status, DutyStatus::Driving);
        assert_eq!(clock.drive_remaining_minutes, 270);
        assert_eq!(clock.shift_remaining_minutes, 420);
        assert_eq!(clock.cycle_remaining_minutes, 2100);
        assert_eq!(clock.break_remaining_minutes, 119);
        assert_eq!(clock.status_started_at, now);
        assert_eq!(clock.violations.len(), 1);
        assert_eq!(clock.violations[0].duration_minutes, Some(10));
    }

    #[test]
    fn test_hos_logs_duration() {
        let logs = hos_logs(from_json(json!({
            "driver": {"id": "d1", "name": "Ana"},
            "hosLogs": [{
                "hosStatusType": "onDuty",
                "logStartTime": "2024-05-01T08:00:00Z",
                "logEndTime": "2024-05-01T09:30:00Z",
                "logRecordedLocation": {"latitude": 1.0, "longitude": 2.0}
            }]
        })));
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, DutyStatus::OnDuty);
        assert_eq!(logs[0].duration_minutes, 90);
        assert_eq!(logs[0].coordinates, Some(Coordinates::new(1.0, 2.0)));
    }

    #[test]
    fn test_fault_codes_severity_and_format() {
        let snapshot: VehicleStatsSnapshot = from_json(json!({
            "id": "v1",
            "faultCodes": {
                "time": "2024-05-01T12:00:00Z",
                "j1939": {
                    "checkEngineLights": {"stopIsOn": true},
                    "diagnosticTroubleCodes": [
                        {"spnId": 110, "fmiId": 0, "spnDescription": "Engine Coolant Temperature"}
                    ]
                },
                "obdii": {
                    "checkEngineLightIsOn": false,
                    "diagnosticTroubleCodes": [
                        {"confirmedDtcs": [{"dtcShortCode": "P0171"}]}
                    ]
                }
            }
        }));
        let faults = fault_codes(&snapshot);
        assert_eq!(faults.len(), 2);
        assert_eq!(faults[0].code, "SPN 110 FMI 0");
        assert_eq!(faults[0].severity, FaultSeverity::Critical);
        assert_eq!(faults[0].description, "Engine Coolant Temperature");
        assert_eq!(faults[1].code, "P0171");
        assert_eq!(faults[1].severity, FaultSeverity::Info);
        assert!(faults.iter().all(FaultCode::is_active));
    }

    #[test]
    fn test_unsafe_dvir() {
        let report = dvir(from_json(json!({
            "id": "dvir-1",
            "type": "postTrip",
            "endTime": "2024-05-01T18:00:00Z",
            "vehicle": {"id": "v1"},
            "authorSignature": {"signatoryUser": {"id": "d1"}, "signedAtTime": "2024-05-01T18:00:00Z"},
            "safetyStatus": "unsafe",
            "vehicleDefects": [{"id": "x", "defectType": "Brakes", "comment": "soft pedal"}]
        })))
        .unwrap();
        assert_eq!(report.inspection_type, InspectionType::PostTrip);
        assert!(!report.safe_to_operate);
        assert!(report.driver_signed);
        assert!(!report.mechanic_signed);
        assert_eq!(report.driver_id, "d1");
        assert_eq!(report.defects[0].severity, DefectSeverity::Major);
        assert_eq!(report.open_defects().count(), 1);
    }

    #[test]
    fn test_jurisdiction_units() {
        let row = jurisdiction(from_json(json!({
            "jurisdiction": "CA",
            "totalMeters": 160934.0,
            "taxPaidLiters": 50.0
        })));
        assert_eq!(row.miles, 100.0);
        assert_eq!(row.taxable_miles, 100.0);
        assert_eq!(row.gallons, 13.21);
    }

    #[test]
    fn test_geofence_shapes() {
        let circle = geofence(from_json(json!({
            "id": "a1", "name": "Yard",
            "geofence": {"circle": {"latitude": 1.0, "longitude": 2.0, "radiusMeters": 150.0}}
        })))
        .unwrap();
        assert!(matches!(circle.shape, GeofenceShape::Circle { radius_meters, .. } if radius_meters == 150.0));

        let polygon = geofence(from_json(json!({
            "id": "a2", "name": "Depot",
            "geofence": {"polygon": {"vertices": [
                {"latitude": 0.0, "longitude": 0.0},
                {"latitude": 0.0, "longitude": 1.0},
                {"latitude": 1.0, "longitude": 1.0}
            ]}}
        })))
        .unwrap();
        assert!(matches!(polygon.shape, GeofenceShape::Polygon { ref vertices } if vertices.len() == 3));

        assert!(geofence(from_json(json!({"id": "a3", "name": "Customer"}))).is_none());
    }

    #[test]
    fn test_webhook_event() {
        let event = webhook_event(&json!({
            "eventId": "evt-1",
            "eventTime": "2024-05-01T12:34:56.789Z",
            "eventType": "GeofenceExit",
            "data": {"vehicle": {"id": "v1"}, "driver": {"id": 42}}
        }))
        .unwrap();
        assert_eq!(event.id, "evt-1");
        assert_eq!(event.vendor, EldVendor::Samsara);
        assert_eq!(event.event_type, EldEventType::GeofenceExit);
        assert_eq!(
            event.timestamp,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 34, 56).unwrap() + chrono::Duration::milliseconds(789)
        );
        assert_eq!(event.vehicle_id.as_deref(), Some("v1"));
        assert_eq!(event.driver_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_unparseable_times_drop_records() {
        let logs = hos_logs(from_json(json!({
            "driver": {"id": "d1"},
            "hosLogs": [
                {"hosStatusType": "driving", "logStartTime": "sometime"},
                {"hosStatusType": "onDuty", "logStartTime": "2024-05-01T08:00:00Z",
                 "logEndTime": "2024-05-01T08:30:00Z"}
            ]
        })));
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, DutyStatus::OnDuty);

        assert!(dvir(from_json(json!({"id": "dvir-2", "endTime": "n/a"}))).is_none());
        assert!(dvir(from_json(json!({"id": "dvir-3"}))).is_none());
        assert!(webhook_event(&json!({"eventId": "evt-2", "eventType": "DvirSubmitted"})).is_none());
    }
}
