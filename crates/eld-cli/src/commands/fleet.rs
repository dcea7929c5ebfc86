//! Fleet commands - vehicles, drivers and trailers

use anyhow::Result;
use eld_core::{PageRequest, PaginatedResponse};
use eld_gateway::EldConnectionManager;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{DriverRow, OutputContext, TrailerRow, VehicleRow};

fn page_request(limit: Option<u32>, cursor: Option<&str>) -> PageRequest {
    PageRequest {
        limit,
        cursor: cursor.map(str::to_string),
    }
}

fn print_page<T, R>(page: PaginatedResponse<T>, ctx: &OutputContext)
where
    R: From<T> + Tabled + Serialize,
{
    let cursor = page.cursor.clone();
    let rows: Vec<R> = page.data.into_iter().map(R::from).collect();
    ctx.print(&rows);
    if let Some(cursor) = cursor {
        ctx.info(&format!("More results: --cursor {}", cursor));
    }
}

pub async fn vehicles(
    manager: &EldConnectionManager,
    limit: Option<u32>,
    cursor: Option<&str>,
    ctx: &OutputContext,
) -> Result<()> {
    let page = manager.get_vehicles(&page_request(limit, cursor)).await?;
    print_page::<_, VehicleRow>(page, ctx);
    Ok(())
}

/// One vehicle with its latest statistics
pub async fn vehicle(
    manager: &EldConnectionManager,
    vehicle_id: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let Some(vehicle) = manager.get_vehicle(vehicle_id).await? else {
        ctx.warn(&format!("Vehicle not found: {}", vehicle_id));
        return Ok(());
    };
    let stats = manager.get_vehicle_stats(vehicle_id).await?;

    let dash = || "-".to_string();
    let mut pairs = vec![
        ("ID", vehicle.id),
        ("Name", vehicle.name),
        ("VIN", vehicle.vin.unwrap_or_else(dash)),
        ("Plate", vehicle.license_plate.unwrap_or_else(dash)),
        ("Make", vehicle.make.unwrap_or_else(dash)),
        ("Model", vehicle.model.unwrap_or_else(dash)),
        ("Year", vehicle.year.map_or_else(dash, |y| y.to_string())),
        ("Status", format!("{:?}", vehicle.status)),
    ];
    if let Some(stats) = stats {
        pairs.push((
            "Odometer (mi)",
            stats.odometer_miles.map_or_else(dash, |v| v.to_string()),
        ));
        pairs.push((
            "Engine hours",
            stats.engine_hours.map_or_else(dash, |v| v.to_string()),
        ));
        pairs.push((
            "Fuel (%)",
            stats.fuel_level_percent.map_or_else(dash, |v| v.to_string()),
        ));
        pairs.push(("Stats time", stats.timestamp.to_rfc3339()));
    }

    ctx.print_kv(&pairs);
    Ok(())
}

pub async fn drivers(
    manager: &EldConnectionManager,
    limit: Option<u32>,
    cursor: Option<&str>,
    ctx: &OutputContext,
) -> Result<()> {
    let page = manager.get_drivers(&page_request(limit, cursor)).await?;
    print_page::<_, DriverRow>(page, ctx);
    Ok(())
}

pub async fn trailers(
    manager: &EldConnectionManager,
    limit: Option<u32>,
    cursor: Option<&str>,
    ctx: &OutputContext,
) -> Result<()> {
    let page = manager.get_trailers(&page_request(limit, cursor)).await?;
    print_page::<_, TrailerRow>(page, ctx);
    Ok(())
}
