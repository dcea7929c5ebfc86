//! Output formatting for eld-cli (table, json, csv)

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use eld_core::{
    Driver, Dvir, EldEvent, FaultCode, FaultSeverity, Geofence, GeofenceShape, HosClock, HosLog,
    HosViolation, JurisdictionSummary, ProviderInfo, Trailer, Vehicle, VehicleLocation,
};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print rows in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    self.info("No data");
                } else {
                    println!("{}", Table::new(data));
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
            OutputFormat::Csv => print_csv(data),
        }
    }

    /// Print a domain value as JSON regardless of format (webhook events, raw records)
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
        );
    }

    /// Print key-value pairs
    pub fn print_kv(&self, pairs: &[(&str, String)]) {
        match self.format {
            OutputFormat::Table => {
                for (key, value) in pairs {
                    println!("{}: {}", key.bold(), value);
                }
            }
            OutputFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                    .collect();
                self.print_json(&map);
            }
            OutputFormat::Csv => {
                let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
                println!("{}", keys.join(","));
                let values: Vec<String> = pairs.iter().map(|(_, v)| escape_csv(v)).collect();
                println!("{}", values.join(","));
            }
        }
    }
}

fn print_csv<T: Serialize>(data: &[T]) {
    let Some(first) = data.first() else {
        return;
    };

    if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(first) {
        let headers: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
        println!("{}", headers.join(","));

        for item in data {
            if let Ok(serde_json::Value::Object(row)) = serde_json::to_value(item) {
                let values: Vec<String> = headers
                    .iter()
                    .map(|h| match row.get(*h) {
                        Some(serde_json::Value::String(s)) => escape_csv(s),
                        Some(other) => escape_csv(&other.to_string()),
                        None => String::new(),
                    })
                    .collect();
                println!("{}", values.join(","));
            }
        }
    }
}

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// =============================================================================
// Cell formatting
// =============================================================================

fn or_dash(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn time(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

fn yes_no(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_string()
}

/// Minutes as "5h 30m"
pub fn hours_minutes(minutes: u32) -> String {
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

fn severity(value: FaultSeverity) -> String {
    match value {
        FaultSeverity::Critical => "critical".red().to_string(),
        FaultSeverity::Warning => "warning".yellow().to_string(),
        FaultSeverity::Info => "info".to_string(),
    }
}

// =============================================================================
// Display types for various commands
// =============================================================================

#[derive(Debug, Tabled, Serialize)]
pub struct ProviderRow {
    #[tabled(rename = "Vendor")]
    pub vendor: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Auth")]
    pub auth: String,
    #[tabled(rename = "Sandbox")]
    pub sandbox: String,
    #[tabled(rename = "Features")]
    pub features: String,
}

impl From<&ProviderInfo> for ProviderRow {
    fn from(info: &ProviderInfo) -> Self {
        Self {
            vendor: info.vendor.to_string(),
            name: info.name.to_string(),
            auth: format!("{:?}", info.auth_type),
            sandbox: yes_no(info.sandbox_available),
            features: info
                .features
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct LocationRow {
    #[tabled(rename = "Vehicle")]
    pub vehicle: String,
    #[tabled(rename = "Lat")]
    pub latitude: String,
    #[tabled(rename = "Lon")]
    pub longitude: String,
    #[tabled(rename = "Speed (mph)")]
    pub speed_mph: String,
    #[tabled(rename = "Heading")]
    pub heading: u16,
    #[tabled(rename = "Odometer (mi)")]
    pub odometer_miles: String,
    #[tabled(rename = "Time")]
    pub timestamp: String,
    #[tabled(rename = "Address")]
    pub address: String,
}

impl From<VehicleLocation> for LocationRow {
    fn from(l: VehicleLocation) -> Self {
        Self {
            vehicle: l.vehicle_name.unwrap_or(l.vehicle_id),
            latitude: format!("{:.5}", l.latitude),
            longitude: format!("{:.5}", l.longitude),
            speed_mph: l.speed_mph.to_string(),
            heading: l.heading,
            odometer_miles: or_dash(l.odometer_miles),
            timestamp: time(l.timestamp),
            address: or_dash(l.address),
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct HosClockRow {
    #[tabled(rename = "Driver")]
    pub driver: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Drive")]
    pub drive: String,
    #[tabled(rename = "Shift")]
    pub shift: String,
    #[tabled(rename = "Cycle")]
    pub cycle: String,
    #[tabled(rename = "Break")]
    pub break_time: String,
}

impl From<HosClock> for HosClockRow {
    fn from(c: HosClock) -> Self {
        Self {
            driver: if c.driver_name.is_empty() {
                c.driver_id
            } else {
                c.driver_name
            },
            status: c.current_status.to_string(),
            drive: hours_minutes(c.drive_remaining_minutes),
            shift: hours_minutes(c.shift_remaining_minutes),
            cycle: hours_minutes(c.cycle_remaining_minutes),
            break_time: hours_minutes(c.break_remaining_minutes),
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct HosLogRow {
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Start")]
    pub start: String,
    #[tabled(rename = "End")]
    pub end: String,
    #[tabled(rename = "Minutes")]
    pub minutes: i64,
    #[tabled(rename = "Location")]
    pub location: String,
    #[tabled(rename = "Certified")]
    pub certified: String,
}

impl From<HosLog> for HosLogRow {
    fn from(l: HosLog) -> Self {
        Self {
            status: l.status.to_string(),
            start: time(l.start_time),
            end: or_dash(l.end_time.map(time)),
            minutes: l.duration_minutes,
            location: or_dash(l.location),
            certified: yes_no(l.certified),
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct ViolationRow {
    #[tabled(rename = "Driver")]
    pub driver_id: String,
    #[tabled(rename = "Type")]
    pub violation_type: String,
    #[tabled(rename = "Description")]
    pub description: String,
    #[tabled(rename = "Started")]
    pub started: String,
    #[tabled(rename = "Minutes")]
    pub minutes: String,
}

impl From<HosViolation> for ViolationRow {
    fn from(v: HosViolation) -> Self {
        Self {
            driver_id: v.driver_id,
            violation_type: v.violation_type,
            description: v.description,
            started: time(v.started_at),
            minutes: or_dash(v.duration_minutes),
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct VehicleRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "VIN")]
    pub vin: String,
    #[tabled(rename = "Plate")]
    pub plate: String,
    #[tabled(rename = "Make/Model")]
    pub make_model: String,
    #[tabled(rename = "Year")]
    pub year: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl From<Vehicle> for VehicleRow {
    fn from(v: Vehicle) -> Self {
        let make_model = [v.make.as_deref(), v.model.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            id: v.id,
            name: v.name,
            vin: or_dash(v.vin),
            plate: or_dash(v.license_plate),
            make_model: if make_model.is_empty() { "-".to_string() } else { make_model },
            year: or_dash(v.year),
            status: format!("{:?}", v.status),
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct DriverRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Username")]
    pub username: String,
    #[tabled(rename = "License")]
    pub license: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl From<Driver> for DriverRow {
    fn from(d: Driver) -> Self {
        let license = match (d.license_number, d.license_state) {
            (Some(number), Some(state)) => format!("{} ({})", number, state),
            (Some(number), None) => number,
            _ => "-".to_string(),
        };
        Self {
            id: d.id,
            name: d.name,
            username: or_dash(d.username),
            license,
            status: format!("{:?}", d.status),
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct TrailerRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub trailer_type: String,
    #[tabled(rename = "Plate")]
    pub plate: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl From<Trailer> for TrailerRow {
    fn from(t: Trailer) -> Self {
        Self {
            id: t.id,
            name: t.name,
            trailer_type: or_dash(t.trailer_type),
            plate: or_dash(t.license_plate),
            status: format!("{:?}", t.status),
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct FaultRow {
    #[tabled(rename = "Vehicle")]
    pub vehicle_id: String,
    #[tabled(rename = "Code")]
    pub code: String,
    #[tabled(rename = "Description")]
    pub description: String,
    #[tabled(rename = "Severity")]
    pub severity: String,
    #[tabled(rename = "Active")]
    pub active: String,
    #[tabled(rename = "Since")]
    pub since: String,
}

impl From<FaultCode> for FaultRow {
    fn from(f: FaultCode) -> Self {
        Self {
            active: yes_no(f.is_active()),
            vehicle_id: f.vehicle_id,
            code: f.code,
            description: f.description,
            severity: severity(f.severity),
            since: time(f.occurred_at),
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct DvirRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Vehicle")]
    pub vehicle_id: String,
    #[tabled(rename = "Driver")]
    pub driver_id: String,
    #[tabled(rename = "Type")]
    pub inspection_type: String,
    #[tabled(rename = "Inspected")]
    pub inspected: String,
    #[tabled(rename = "Open defects")]
    pub open_defects: usize,
    #[tabled(rename = "Safe")]
    pub safe: String,
}

impl From<Dvir> for DvirRow {
    fn from(d: Dvir) -> Self {
        let open_defects = d.open_defects().count();
        let safe = if d.safe_to_operate {
            "Yes".green().to_string()
        } else {
            "No".red().to_string()
        };
        Self {
            id: d.id,
            vehicle_id: d.vehicle_id,
            driver_id: d.driver_id,
            inspection_type: format!("{:?}", d.inspection_type),
            inspected: time(d.inspected_at),
            open_defects,
            safe,
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct IftaRow {
    #[tabled(rename = "Jurisdiction")]
    pub jurisdiction: String,
    #[tabled(rename = "Miles")]
    pub miles: f64,
    #[tabled(rename = "Gallons")]
    pub gallons: f64,
}

impl From<JurisdictionSummary> for IftaRow {
    fn from(j: JurisdictionSummary) -> Self {
        Self {
            jurisdiction: j.jurisdiction,
            miles: j.miles,
            gallons: j.gallons,
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct GeofenceRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Shape")]
    pub shape: String,
}

impl From<Geofence> for GeofenceRow {
    fn from(g: Geofence) -> Self {
        let shape = match &g.shape {
            GeofenceShape::Circle {
                center,
                radius_meters,
            } => format!(
                "circle r={}m @ {:.5},{:.5}",
                radius_meters, center.latitude, center.longitude
            ),
            GeofenceShape::Polygon { vertices } => format!("polygon ({} points)", vertices.len()),
        };
        Self {
            id: g.id,
            name: g.name,
            shape,
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct EventRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Type")]
    pub event_type: String,
    #[tabled(rename = "Time")]
    pub timestamp: String,
    #[tabled(rename = "Vehicle")]
    pub vehicle_id: String,
    #[tabled(rename = "Driver")]
    pub driver_id: String,
}

impl From<EldEvent> for EventRow {
    fn from(e: EldEvent) -> Self {
        Self {
            id: e.id,
            event_type: format!("{:?}", e.event_type),
            timestamp: time(e.timestamp),
            vehicle_id: or_dash(e.vehicle_id),
            driver_id: or_dash(e.driver_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hours_minutes() {
        assert_eq!(hours_minutes(330), "5h 30m");
        assert_eq!(hours_minutes(5), "0h 05m");
        assert_eq!(hours_minutes(0), "0h 00m");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("Chicago, IL"), "\"Chicago, IL\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_provider_row_lists_features() {
        let row = ProviderRow::from(eld_core::provider_info(eld_core::EldVendor::Motive));
        assert_eq!(row.vendor, "motive");
        assert!(row.features.contains("hours_of_service"));
        assert!(!row.features.contains("geofencing"));
    }
}
