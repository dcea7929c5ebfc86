//! Geofences command

use anyhow::Result;
use eld_core::ProviderFeature;
use eld_gateway::EldConnectionManager;

use crate::output::{GeofenceRow, OutputContext};

pub async fn geofences(manager: &EldConnectionManager, ctx: &OutputContext) -> Result<()> {
    if !manager.supports(ProviderFeature::Geofencing)? {
        ctx.warn("This provider does not expose geofences");
        return Ok(());
    }

    let geofences = manager.get_geofences().await?;
    let rows: Vec<GeofenceRow> = geofences.into_iter().map(GeofenceRow::from).collect();
    ctx.print(&rows);
    Ok(())
}
