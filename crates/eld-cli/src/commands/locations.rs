//! Locations command - latest vehicle positions

use anyhow::Result;
use eld_gateway::EldConnectionManager;

use crate::output::{LocationRow, OutputContext};

pub async fn locations(
    manager: &EldConnectionManager,
    vehicle_ids: &[String],
    ctx: &OutputContext,
) -> Result<()> {
    let ids = (!vehicle_ids.is_empty()).then_some(vehicle_ids);
    let locations = manager.get_vehicle_locations(ids).await?;

    let rows: Vec<LocationRow> = locations.into_iter().map(LocationRow::from).collect();
    ctx.print(&rows);
    Ok(())
}
