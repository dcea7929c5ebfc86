//! Geotab → domain model mapping
//!
//! Geotab is metric: speeds in km/h, odometers in meters or kilometers
//! depending on the entity, fuel in liters.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use eld_core::base;
use eld_core::units::{
    km_to_miles, kph_to_mph, liters_to_gallons, meters_to_miles, normalize_heading, round_2,
};
use eld_core::{
    full_name, j1939_code, AssetStatus, Coordinates, DefectSeverity, Driver, DriverStatus, Dvir,
    DvirDefect, DutyStatus, EldEvent, EldEventType, EldVendor, FaultCode, FaultSeverity,
    Geofence, GeofenceEvent, GeofenceEventType, GeofenceShape, HosClock, HosLog, HosViolation,
    IftaQuarter, IftaSummary, InspectionType, JurisdictionSummary, MaintenanceAlert, Trailer,
    Vehicle, VehicleLocation, VehicleStats,
};

use crate::types::*;

pub const DIAGNOSTIC_ODOMETER: &str = "DiagnosticOdometerId";
pub const DIAGNOSTIC_ENGINE_HOURS: &str = "DiagnosticEngineHoursId";
pub const DIAGNOSTIC_FUEL_LEVEL: &str = "DiagnosticFuelLevelId";

pub const STATS_DIAGNOSTICS: [&str; 3] = [
    DIAGNOSTIC_ODOMETER,
    DIAGNOSTIC_ENGINE_HOURS,
    DIAGNOSTIC_FUEL_LEVEL,
];

/// Geotab duty-status codes
const DUTY_STATUSES: &[(&str, DutyStatus)] = &[
    ("D", DutyStatus::Driving),
    ("ON", DutyStatus::OnDuty),
    ("OFF", DutyStatus::OffDuty),
    ("SB", DutyStatus::SleeperBerth),
    ("YM", DutyStatus::YardMove),
    ("PC", DutyStatus::PersonalConveyance),
];

/// Entity type names pushed by Geotab data feeds
const EVENT_TYPES: &[(&str, EldEventType)] = &[
    ("LogRecord", EldEventType::LocationUpdate),
    ("DeviceStatusInfo", EldEventType::LocationUpdate),
    ("DutyStatusLog", EldEventType::HosStatusChange),
    ("DutyStatusViolation", EldEventType::HosViolation),
    ("FaultData", EldEventType::FaultCode),
    ("DVIRLog", EldEventType::DvirSubmitted),
    ("Device", EldEventType::VehicleUpdated),
    ("User", EldEventType::DriverUpdated),
];

/// Unrecognized codes map to off-duty
pub fn duty_status(value: &str) -> DutyStatus {
    DutyStatus::from_vendor_code(EldVendor::Geotab, value, DUTY_STATUSES)
}

/// Whole minutes in a .NET TimeSpan string (`[-][d.]hh:mm:ss[.fffffff]`).
///
/// Negative or malformed spans count as zero. Spans beyond `u32::MAX`
/// minutes saturate.
pub fn timespan_minutes(value: &str) -> u32 {
    let value = value.trim();
    if value.starts_with('-') {
        return 0;
    }

    let mut parts = value.split(':');
    let (Some(head), Some(minutes), Some(_seconds)) = (parts.next(), parts.next(), parts.next())
    else {
        return 0;
    };
    let (days, hours) = match head.split_once('.') {
        Some((days, hours)) => (days, hours),
        None => ("0", head),
    };

    let (Ok(d), Ok(h), Ok(m)) = (
        days.parse::<u64>(),
        hours.parse::<u64>(),
        minutes.parse::<u64>(),
    ) else {
        return 0;
    };
    d.checked_mul(24 * 60)
        .and_then(|total| total.checked_add(h.checked_mul(60)?))
        .and_then(|total| total.checked_add(m))
        .map_or(u32::MAX, |total| u32::try_from(total).unwrap_or(u32::MAX))
}

fn ts(field: &str, value: &str) -> Option<DateTime<Utc>> {
    base::vendor_timestamp(EldVendor::Geotab, field, value)
}

fn opt_ts(value: Option<&str>) -> Option<DateTime<Utc>> {
    value.and_then(base::parse_timestamp)
}

fn point(location: Option<&LogLocation>) -> Option<Coordinates> {
    let p = location?.location?;
    Some(Coordinates::new(p.y, p.x))
}

/// Entities with an `activeTo` in the past are retired
fn is_retired(active_to: Option<&str>, now: DateTime<Utc>) -> bool {
    opt_ts(active_to).is_some_and(|to| to <= now)
}

// =========================================================================
// Location
// =========================================================================

pub fn location(status: DeviceStatusInfo) -> Option<VehicleLocation> {
    Some(VehicleLocation {
        vehicle_id: status.device.id().to_string(),
        vehicle_name: status.device.name().map(str::to_string),
        driver_id: known_id(status.driver.as_ref()),
        latitude: status.latitude,
        longitude: status.longitude,
        heading: normalize_heading(status.bearing),
        speed_mph: kph_to_mph(status.speed),
        timestamp: ts("dateTime", &status.date_time)?,
        address: None,
        odometer_miles: None,
        engine_running: None,
    })
}

pub fn log_record(record: LogRecord) -> Option<VehicleLocation> {
    Some(VehicleLocation {
        vehicle_id: record.device.id().to_string(),
        vehicle_name: None,
        driver_id: None,
        latitude: record.latitude,
        longitude: record.longitude,
        heading: 0,
        speed_mph: kph_to_mph(record.speed),
        timestamp: ts("dateTime", &record.date_time)?,
        address: None,
        odometer_miles: None,
        engine_running: None,
    })
}

// =========================================================================
// Fleet
// =========================================================================

pub fn vehicle(device: Device, now: DateTime<Utc>) -> Vehicle {
    let status = if is_retired(device.active_to.as_deref(), now) {
        AssetStatus::Inactive
    } else {
        AssetStatus::Available
    };
    Vehicle {
        name: device.name.unwrap_or_else(|| device.id.clone()),
        id: device.id,
        vin: device.vehicle_identification_number.filter(|v| !v.is_empty()),
        license_plate: device.license_plate.filter(|v| !v.is_empty()),
        license_state: device.license_state.filter(|v| !v.is_empty()),
        make: None,
        model: None,
        year: None,
        status,
        eld_device_serial: device.serial_number,
    }
}

pub fn driver(user: User, now: DateTime<Utc>) -> Driver {
    let status = if is_retired(user.active_to.as_deref(), now) {
        DriverStatus::Inactive
    } else {
        DriverStatus::Active
    };
    let display = full_name(user.first_name.as_deref(), user.last_name.as_deref());
    let email = user.name.clone().filter(|n| n.contains('@'));
    Driver {
        name: if display.is_empty() {
            user.name.clone().unwrap_or_default()
        } else {
            display
        },
        id: user.id,
        username: user.name,
        email,
        phone: user.phone_number,
        license_number: user.license_number,
        license_state: user.license_province,
        status,
    }
}

/// Display name of a user, for HOS records
pub fn user_display_name(user: &User) -> String {
    let display = full_name(user.first_name.as_deref(), user.last_name.as_deref());
    if display.is_empty() {
        user.name.clone().unwrap_or_default()
    } else {
        display
    }
}

pub fn trailer(wire: GeotabTrailer) -> Trailer {
    Trailer {
        name: wire.name.unwrap_or_else(|| wire.id.clone()),
        id: wire.id,
        trailer_type: wire.comment.filter(|c| !c.is_empty()),
        license_plate: None,
        vin: None,
        status: AssetStatus::Available,
    }
}

// =========================================================================
// Vehicle stats
// =========================================================================

fn apply_status_data(stats: &mut VehicleStats, record: &StatusData) {
    match record.diagnostic.id() {
        DIAGNOSTIC_ODOMETER => stats.odometer_miles = Some(meters_to_miles(record.data)),
        DIAGNOSTIC_ENGINE_HOURS => stats.engine_hours = Some(round_2(record.data / 3600.0)),
        DIAGNOSTIC_FUEL_LEVEL => stats.fuel_level_percent = Some(record.data),
        _ => {}
    }
}

/// One sample per distinct timestamp, oldest first
pub fn vehicle_stats_history(vehicle_id: &str, records: &[StatusData]) -> Vec<VehicleStats> {
    let mut samples: BTreeMap<DateTime<Utc>, VehicleStats> = BTreeMap::new();
    for record in records {
        let Some(at) = base::parse_timestamp(&record.date_time) else {
            continue;
        };
        let stats = samples
            .entry(at)
            .or_insert_with(|| VehicleStats::new(vehicle_id, at));
        apply_status_data(stats, record);
    }
    samples.into_values().collect()
}

/// Latest value of each diagnostic folded into one snapshot
pub fn latest_vehicle_stats(vehicle_id: &str, records: &[StatusData]) -> Option<VehicleStats> {
    let mut latest: HashMap<&str, (DateTime<Utc>, &StatusData)> = HashMap::new();
    for record in records {
        let Some(at) = base::parse_timestamp(&record.date_time) else {
            continue;
        };
        let entry = latest.entry(record.diagnostic.id()).or_insert((at, record));
        if at > entry.0 {
            *entry = (at, record);
        }
    }

    let timestamp = latest.values().map(|(at, _)| *at).max()?;
    let mut stats = VehicleStats::new(vehicle_id, timestamp);
    for (_, record) in latest.values() {
        apply_status_data(&mut stats, record);
    }
    Some(stats)
}

// =========================================================================
// Hours of service
// =========================================================================

pub fn hos_clock(
    availability: DutyStatusAvailability,
    driver_name: Option<&str>,
    current: Option<&DutyStatusLog>,
    now: DateTime<Utc>,
) -> HosClock {
    let minutes = |span: &Option<String>| span.as_deref().map_or(0, timespan_minutes);
    HosClock {
        driver_id: availability.driver.id().to_string(),
        driver_name: driver_name.unwrap_or_default().to_string(),
        current_status: current.map_or(DutyStatus::OffDuty, |log| duty_status(&log.status)),
        status_started_at: current
            .and_then(|log| ts("dateTime", &log.date_time))
            .unwrap_or(now),
        drive_remaining_minutes: minutes(&availability.driving),
        shift_remaining_minutes: minutes(&availability.duty),
        cycle_remaining_minutes: minutes(&availability.cycle),
        break_remaining_minutes: minutes(&availability.driving_break_duration),
        violations: Vec::new(),
        updated_at: now,
    }
}

/// Turn status-change records into intervals.
///
/// Each log ends where the next one starts; the last one is open and its
/// duration runs to `until`. Records without a parseable time are dropped
/// before the intervals are built.
pub fn hos_logs(
    logs: Vec<DutyStatusLog>,
    driver_name: &str,
    until: DateTime<Utc>,
) -> Vec<HosLog> {
    let mut timed: Vec<(DateTime<Utc>, DutyStatusLog)> = logs
        .into_iter()
        .filter_map(|log| Some((ts("dateTime", &log.date_time)?, log)))
        .collect();
    timed.sort_by_key(|(start, _)| *start);
    let starts: Vec<DateTime<Utc>> = timed.iter().map(|(start, _)| *start).collect();

    timed
        .into_iter()
        .enumerate()
        .map(|(i, (start, log))| {
            let end = starts.get(i + 1).copied();
            let duration = base::minutes_between(start, end.unwrap_or(until)).max(0);
            let notes = log
                .annotations
                .iter()
                .filter_map(|a| a.comment.as_deref())
                .collect::<Vec<_>>()
                .join("; ");
            HosLog {
                id: log
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("{}-{}", log.driver.id(), start.timestamp())),
                driver_id: log.driver.id().to_string(),
                driver_name: driver_name.to_string(),
                status: duty_status(&log.status),
                start_time: start,
                end_time: end,
                duration_minutes: duration,
                location: None,
                coordinates: point(log.location.as_ref()),
                notes: (!notes.is_empty()).then_some(notes),
                certified: log.verify_date_time.is_some(),
                edited: log.edit_date_time.is_some(),
            }
        })
        .collect()
}

pub fn hos_violation(wire: DutyStatusViolation) -> Option<HosViolation> {
    let started = ts("fromDate", &wire.from_date)?;
    let ended = opt_ts(wire.to_date.as_deref());
    Some(HosViolation {
        id: wire.id,
        driver_id: wire.driver.id().to_string(),
        description: wire
            .reason
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| wire.violation_type.clone()),
        violation_type: wire.violation_type,
        started_at: started,
        ended_at: ended,
        duration_minutes: ended.map(|end| base::minutes_between(started, end).max(0)),
    })
}

// =========================================================================
// Diagnostics
// =========================================================================

pub fn fault_code(wire: FaultData) -> Option<FaultCode> {
    let occurred_at = ts("dateTime", &wire.date_time)?;
    let spn = wire.diagnostic.code();
    let fmi = wire.failure_mode.as_ref().and_then(EntityRef::code);
    let (code, source) = match (spn, fmi) {
        (Some(spn), Some(fmi)) => (j1939_code(spn, fmi), "j1939"),
        _ => (wire.diagnostic.id().to_string(), "geotab"),
    };
    let description = [
        wire.diagnostic.name(),
        wire.failure_mode.as_ref().and_then(EntityRef::name),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" - ");

    Some(FaultCode {
        id: wire.id,
        vehicle_id: wire.device.id().to_string(),
        description: if description.is_empty() {
            code.clone()
        } else {
            description
        },
        code,
        severity: FaultSeverity::from_lamps(
            wire.red_stop_lamp,
            wire.amber_warning_lamp || wire.malfunction_lamp || wire.protect_warning_lamp,
        ),
        occurred_at,
        cleared_at: opt_ts(wire.dismiss_date_time.as_deref()),
        source: source.to_string(),
    })
}

pub fn maintenance_alert(wire: MaintenanceReminder) -> MaintenanceAlert {
    let alert_type = wire.name.unwrap_or_else(|| "maintenance".to_string());
    MaintenanceAlert {
        id: wire.id,
        vehicle_id: wire.device.id().to_string(),
        description: wire
            .comment
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| alert_type.clone()),
        alert_type,
        severity: if wire.is_overdue {
            FaultSeverity::Critical
        } else {
            FaultSeverity::Warning
        },
        due_at: opt_ts(wire.due_date_time.as_deref()),
        due_odometer_miles: wire.due_odometer.map(meters_to_miles),
    }
}

// =========================================================================
// Inspections
// =========================================================================

fn dvir_defect(record: DvirDefectRecord) -> DvirDefect {
    let category = record
        .part
        .as_ref()
        .and_then(EntityRef::name)
        .or_else(|| record.defect.as_ref().and_then(EntityRef::name))
        .unwrap_or("other")
        .to_string();
    let description = record
        .comment
        .clone()
        .filter(|c| !c.is_empty())
        .or_else(|| record.defect.as_ref().and_then(EntityRef::name).map(str::to_string))
        .unwrap_or_else(|| category.clone());
    DvirDefect {
        category,
        description,
        severity: match record.defect_severity.as_deref() {
            Some("Critical") => DefectSeverity::Major,
            _ => DefectSeverity::Minor,
        },
        repaired: matches!(
            record.repair_status.as_deref(),
            Some("Repaired") | Some("NotNecessary")
        ),
    }
}

pub fn dvir(wire: DvirLog) -> Option<Dvir> {
    let inspected_at = ts("dateTime", &wire.date_time)?;
    let defects: Vec<DvirDefect> = wire.dvir_defects.into_iter().map(dvir_defect).collect();
    let safe = wire
        .is_safe_to_operate
        .unwrap_or_else(|| defects.iter().all(|d| d.severity == DefectSeverity::Minor));
    Some(Dvir {
        id: wire.id,
        vehicle_id: known_id(wire.device.as_ref()).unwrap_or_default(),
        driver_signed: known_id(wire.driver.as_ref()).is_some(),
        driver_id: known_id(wire.driver.as_ref()).unwrap_or_default(),
        trailer_id: known_id(wire.trailer.as_ref()),
        inspection_type: match wire.log_type.as_deref() {
            Some("PostTrip") => InspectionType::PostTrip,
            _ => InspectionType::PreTrip,
        },
        inspected_at,
        defects,
        safe_to_operate: safe,
        mechanic_signed: wire.certify_date.is_some() || wire.repair_date.is_some(),
        location: point(wire.location.as_ref())
            .map(|c| format!("{:.5}, {:.5}", c.latitude, c.longitude)),
    })
}

// =========================================================================
// IFTA
// =========================================================================

/// Aggregate per-jurisdiction odometer deltas (km) and fuel purchases
/// (liters).
///
/// Purchases without a jurisdiction cannot be attributed and are dropped.
pub fn ifta_summary(
    quarter: &IftaQuarter,
    details: &[FuelTaxDetail],
    fuel: &[FuelTransaction],
) -> IftaSummary {
    let mut km: BTreeMap<&str, f64> = BTreeMap::new();
    let mut liters: BTreeMap<&str, f64> = BTreeMap::new();

    for detail in details {
        let delta = (detail.exit_odometer - detail.enter_odometer).max(0.0);
        *km.entry(detail.jurisdiction.as_str()).or_default() += delta;
    }
    for purchase in fuel {
        if let Some(jurisdiction) = purchase.jurisdiction.as_deref() {
            *liters.entry(jurisdiction).or_default() += purchase.volume;
            km.entry(jurisdiction).or_default();
        }
    }

    let rows = km
        .into_iter()
        .map(|(jurisdiction, distance)| {
            JurisdictionSummary::new(
                jurisdiction,
                km_to_miles(distance),
                liters_to_gallons(liters.get(jurisdiction).copied().unwrap_or_default()),
            )
        })
        .collect();
    IftaSummary::from_jurisdictions(quarter, rows)
}

// =========================================================================
// Zones
// =========================================================================

pub fn geofence(zone: Zone) -> Geofence {
    Geofence {
        id: zone.id,
        name: zone.name,
        shape: GeofenceShape::Polygon {
            vertices: zone
                .points
                .into_iter()
                .map(|p| Coordinates::new(p.y, p.x))
                .collect(),
        },
    }
}

/// An exception on a zone rule is an entry at `activeFrom` and, once
/// closed, an exit at `activeTo`
pub fn geofence_events(
    event: ExceptionEvent,
    zone_names: &HashMap<String, String>,
) -> Vec<GeofenceEvent> {
    let Some(entered) = ts("activeFrom", &event.active_from) else {
        return Vec::new();
    };
    let geofence_id = event.rule.id().to_string();
    let base = GeofenceEvent {
        id: format!("{}-enter", event.id),
        geofence_name: zone_names.get(&geofence_id).cloned(),
        geofence_id,
        vehicle_id: event.device.id().to_string(),
        driver_id: known_id(event.driver.as_ref()),
        event_type: GeofenceEventType::Enter,
        timestamp: entered,
        location: None,
    };

    let exit = opt_ts(event.active_to.as_deref()).map(|at| GeofenceEvent {
        id: format!("{}-exit", event.id),
        event_type: GeofenceEventType::Exit,
        timestamp: at,
        ..base.clone()
    });

    std::iter::once(base).chain(exit).collect()
}

// =========================================================================
// Webhooks
// =========================================================================

pub fn event_type(type_name: &str, item: &serde_json::Value) -> EldEventType {
    if type_name == "ExceptionEvent" {
        return match item.get("activeTo") {
            Some(serde_json::Value::String(_)) => EldEventType::GeofenceExit,
            _ => EldEventType::GeofenceEntry,
        };
    }
    EVENT_TYPES
        .iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, t)| *t)
        .unwrap_or(EldEventType::Unknown)
}

fn ref_id(item: &serde_json::Value, key: &str) -> Option<String> {
    let entity: EntityRef = serde_json::from_value(item.get(key)?.clone()).ok()?;
    entity.known_id()
}

/// One event per entity in the feed's `data` array.
///
/// Entities without a time field (devices, users) are stamped on receipt;
/// a time field that does not parse drops the entity.
pub fn webhook_events(payload: &serde_json::Value) -> Vec<EldEvent> {
    let type_name = payload
        .get("typeName")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let Some(items) = payload.get("data").and_then(|d| d.as_array()) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let time = ["dateTime", "activeFrom"]
                .iter()
                .find_map(|key| item.get(*key).and_then(|v| v.as_str()).map(|v| (*key, v)));
            let timestamp = match time {
                Some((field, value)) => ts(field, value)?,
                None => Utc::now(),
            };
            Some(EldEvent {
                id: item
                    .get("id")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                vendor: EldVendor::Geotab,
                event_type: event_type(type_name, item),
                timestamp,
                vehicle_id: ref_id(item, "device"),
                driver_id: ref_id(item, "driver").or_else(|| {
                    (type_name == "User")
                        .then(|| item.get("id").and_then(|v| v.as_str()).map(str::to_string))
                        .flatten()
                }),
                payload: item.clone(),
            })
        })
        .collect()
}

/// Start of the look-back window used for fault and reminder queries
pub fn lookback(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days.max(0))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn from_json<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_duty_status_is_total() {
        assert_eq!(duty_status("D"), DutyStatus::Driving);
        assert_eq!(duty_status("ON"), DutyStatus::OnDuty);
        assert_eq!(duty_status("SB"), DutyStatus::SleeperBerth);
        assert_eq!(duty_status("YM"), DutyStatus::YardMove);
        assert_eq!(duty_status("PC"), DutyStatus::PersonalConveyance);
        assert_eq!(duty_status("OFF"), DutyStatus::OffDuty);
        assert_eq!(duty_status("WT"), DutyStatus::OffDuty);
        assert_eq!(duty_status("ExemptionOff"), DutyStatus::OffDuty);
    }

    #[test]
    fn test_timespan_minutes() {
        assert_eq!(timespan_minutes("05:30:00"), 330);
        assert_eq!(timespan_minutes("1.10:00:00"), 2040);
        assert_eq!(timespan_minutes("00:10:59.9990000"), 10);
        assert_eq!(timespan_minutes("-00:10:00"), 0);
        assert_eq!(timespan_minutes("garbage"), 0);
        assert_eq!(timespan_minutes(""), 0);
    }

    #[test]
    fn test_timespan_minutes_saturates() {
        // TimeSpan.MaxValue
        assert_eq!(timespan_minutes("10675199.02:48:05.4775807"), u32::MAX);
        assert_eq!(timespan_minutes("3000000.00:00:00"), u32::MAX);
        assert_eq!(timespan_minutes("2982616.04:15:00"), u32::MAX);
        assert_eq!(timespan_minutes("2982616.00:00:00"), 4_294_967_040);
    }

    #[test]
    fn test_location_converts_kph() {
        let loc = location(from_json(json!({
            "device": {"id": "b1"},
            "driver": "UnknownDriverId",
            "latitude": 43.1,
            "longitude": -79.2,
            "bearing": 90,
            "speed": 100.0,
            "dateTime": "2024-05-01T12:00:00.000Z"
        })))
        .unwrap();
        assert_eq!(loc.vehicle_id, "b1");
        assert_eq!(loc.driver_id, None);
        assert_eq!(loc.speed_mph, 62.0);
        assert_eq!(loc.heading, 90);
    }

    #[test]
    fn test_retired_device() {
        let now = at(12, 0);
        let active = vehicle(
            from_json(json!({"id": "b1", "name": "T1", "activeTo": "2050-01-01T00:00:00.000Z"})),
            now,
        );
        assert_eq!(active.status, AssetStatus::Available);
        let retired = vehicle(
            from_json(json!({"id": "b2", "activeTo": "2020-01-01T00:00:00.000Z"})),
            now,
        );
        assert_eq!(retired.status, AssetStatus::Inactive);
        assert_eq!(retired.name, "b2");
    }

    #[test]
    fn test_driver_names() {
        let d = driver(
            from_json(json!({
                "id": "u1", "name": "ana@fleet.com", "firstName": "Ana", "lastName": "Lopez"
            })),
            at(12, 0),
        );
        assert_eq!(d.name, "Ana Lopez");
        assert_eq!(d.email.as_deref(), Some("ana@fleet.com"));
        assert_eq!(d.status, DriverStatus::Active);
    }

    #[test]
    fn test_latest_stats_picks_newest_values() {
        let records: Vec<StatusData> = from_json(json!([
            {"data": 1609.34, "dateTime": "2024-05-01T10:00:00Z", "diagnostic": {"id": "DiagnosticOdometerId"}},
            {"data": 3218.68, "dateTime": "2024-05-01T11:00:00Z", "diagnostic": {"id": "DiagnosticOdometerId"}},
            {"data": 7200.0, "dateTime": "2024-05-01T09:00:00Z", "diagnostic": {"id": "DiagnosticEngineHoursId"}},
            {"data": 40.5, "dateTime": "2024-05-01T10:30:00Z", "diagnostic": {"id": "DiagnosticFuelLevelId"}}
        ]));
        let stats = latest_vehicle_stats("b1", &records).unwrap();
        assert_eq!(stats.odometer_miles, Some(2.0));
        assert_eq!(stats.engine_hours, Some(2.0));
        assert_eq!(stats.fuel_level_percent, Some(40.5));
        assert_eq!(stats.timestamp, at(11, 0));

        assert!(latest_vehicle_stats("b1", &[]).is_none());
        assert_eq!(vehicle_stats_history("b1", &records).len(), 4);
    }

    #[test]
    fn test_hos_logs_are_contiguous() {
        let logs: Vec<DutyStatusLog> = from_json(json!([
            {"driver": {"id": "u1"}, "status": "D", "dateTime": "2024-05-01T09:00:00Z"},
            {"driver": {"id": "u1"}, "status": "ON", "dateTime": "2024-05-01T08:00:00Z",
             "verifyDateTime": "2024-05-02T00:00:00Z",
             "annotations": [{"comment": "pre-trip"}]},
            {"driver": {"id": "u1"}, "status": "OFF", "dateTime": "2024-05-01T11:30:00Z"}
        ]));
        let intervals = hos_logs(logs, "Ana", at(12, 0));
        assert_eq!(intervals.len(), 3);
        assert_eq!(intervals[0].status, DutyStatus::OnDuty);
        assert_eq!(intervals[0].duration_minutes, 60);
        assert!(intervals[0].certified);
        assert_eq!(intervals[0].notes.as_deref(), Some("pre-trip"));
        assert_eq!(intervals[1].duration_minutes, 150);
        assert_eq!(intervals[1].end_time, Some(at(11, 30)));
        assert_eq!(intervals[2].end_time, None);
        assert_eq!(intervals[2].duration_minutes, 30);
    }

    #[test]
    fn test_hos_logs_skip_unparseable_times() {
        let logs: Vec<DutyStatusLog> = from_json(json!([
            {"driver": {"id": "u1"}, "status": "D", "dateTime": "2024-05-01T09:00:00Z"},
            {"driver": {"id": "u1"}, "status": "SB", "dateTime": "0001-13-01"},
            {"driver": {"id": "u1"}, "status": "OFF", "dateTime": "2024-05-01T10:00:00Z"}
        ]));
        let intervals = hos_logs(logs, "Ana", at(12, 0));
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].status, DutyStatus::Driving);
        assert_eq!(intervals[0].end_time, Some(at(10, 0)));
        assert_eq!(intervals[1].status, DutyStatus::OffDuty);

        assert!(location(from_json(json!({
            "device": {"id": "b1"},
            "latitude": 43.1,
            "longitude": -79.2,
            "dateTime": "soon"
        })))
        .is_none());
    }

    #[test]
    fn test_fault_code_j1939_and_dismissed() {
        let fault = fault_code(from_json(json!({
            "id": "f1",
            "device": {"id": "b1"},
            "diagnostic": {"id": "DiagnosticCoolantId", "name": "Coolant temperature", "code": 110},
            "failureMode": {"id": "fm0", "code": 0},
            "dateTime": "2024-05-01T10:00:00Z",
            "dismissDateTime": "2024-05-01T11:00:00Z",
            "amberWarningLamp": true
        })))
        .unwrap();
        assert_eq!(fault.code, "SPN 110 FMI 0");
        assert_eq!(fault.source, "j1939");
        assert_eq!(fault.severity, FaultSeverity::Warning);
        assert!(!fault.is_active());

        let generic = fault_code(from_json(json!({
            "id": "f2",
            "device": {"id": "b1"},
            "diagnostic": {"id": "DiagnosticDeviceRestartedId"},
            "failureMode": "NoFailureModeId",
            "dateTime": "2024-05-01T10:00:00Z"
        })))
        .unwrap();
        assert_eq!(generic.code, "DiagnosticDeviceRestartedId");
        assert_eq!(generic.severity, FaultSeverity::Info);
        assert!(generic.is_active());
    }

    #[test]
    fn test_ifta_aggregation() {
        let q = IftaQuarter::new(2024, 2).unwrap();
        let details: Vec<FuelTaxDetail> = from_json(json!([
            {"device": {"id": "b1"}, "jurisdiction": "ON", "enterOdometer": 1000.0, "exitOdometer": 1060.0},
            {"device": {"id": "b2"}, "jurisdiction": "ON", "enterOdometer": 500.0, "exitOdometer": 540.0},
            {"device": {"id": "b1"}, "jurisdiction": "NY", "enterOdometer": 1060.0, "exitOdometer": 1160.0}
        ]));
        let fuel: Vec<FuelTransaction> = from_json(json!([
            {"device": {"id": "b1"}, "jurisdiction": "ON", "volume": 50.0},
            {"device": {"id": "b1"}, "volume": 10.0}
        ]));
        let summary = ifta_summary(&q, &details, &fuel);
        assert_eq!(summary.quarter, "2024-Q2");
        assert_eq!(summary.jurisdictions.len(), 2);
        assert_eq!(summary.jurisdictions[0].jurisdiction, "NY");
        assert_eq!(summary.jurisdictions[0].miles, 62.0);
        assert_eq!(summary.jurisdictions[1].miles, 62.0);
        assert_eq!(summary.jurisdictions[1].gallons, 13.21);
        assert_eq!(summary.total_miles, 124.0);
        assert_eq!(summary.total_gallons, 13.21);
    }

    #[test]
    fn test_zone_points_swap_axes() {
        let fence = geofence(from_json(json!({
            "id": "z1", "name": "Yard",
            "points": [{"x": -79.0, "y": 43.0}, {"x": -79.1, "y": 43.0}, {"x": -79.1, "y": 43.1}]
        })));
        match fence.shape {
            GeofenceShape::Polygon { vertices } => {
                assert_eq!(vertices[0], Coordinates::new(43.0, -79.0));
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_exception_event_enter_and_exit() {
        let names = HashMap::from([("z1".to_string(), "Yard".to_string())]);
        let events = geofence_events(
            from_json(json!({
                "id": "e1", "rule": {"id": "z1"}, "device": {"id": "b1"},
                "activeFrom": "2024-05-01T10:00:00Z", "activeTo": "2024-05-01T10:20:00Z"
            })),
            &names,
        );
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, GeofenceEventType::Enter);
        assert_eq!(events[1].event_type, GeofenceEventType::Exit);
        assert_eq!(events[1].timestamp, at(10, 20));
        assert_eq!(events[0].geofence_name.as_deref(), Some("Yard"));
    }

    #[test]
    fn test_webhook_events_one_per_item() {
        let events = webhook_events(&json!({
            "typeName": "DutyStatusLog",
            "data": [
                {"id": "a", "driver": {"id": "u1"}, "device": {"id": "b1"}, "dateTime": "2024-05-01T10:00:00Z"},
                {"id": "b", "driver": "UnknownDriverId", "dateTime": "2024-05-01T11:00:00Z"}
            ]
        }));
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.vendor == EldVendor::Geotab));
        assert!(events.iter().all(|e| e.event_type == EldEventType::HosStatusChange));
        assert_eq!(events[0].driver_id.as_deref(), Some("u1"));
        assert_eq!(events[0].vehicle_id.as_deref(), Some("b1"));
        assert_eq!(events[1].driver_id, None);
        assert_eq!(events[1].timestamp, at(11, 0));

        assert!(webhook_events(&json!({"typeName": "LogRecord"})).is_empty());

        let events = webhook_events(&json!({
            "typeName": "FaultData",
            "data": [
                {"id": "f1", "device": {"id": "b1"}, "dateTime": "garbled"},
                {"id": "f2", "device": {"id": "b1"}, "dateTime": "2024-05-01T11:00:00Z"}
            ]
        }));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "f2");
    }
}
