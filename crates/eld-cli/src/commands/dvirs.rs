//! DVIRs command - inspection reports in a time range

use anyhow::Result;
use chrono::{DateTime, Utc};
use eld_gateway::EldConnectionManager;

use crate::output::{DvirRow, OutputContext};

pub async fn dvirs(
    manager: &EldConnectionManager,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    vehicle_ids: &[String],
    ctx: &OutputContext,
) -> Result<()> {
    let ids = (!vehicle_ids.is_empty()).then_some(vehicle_ids);
    let dvirs = manager.get_dvirs(start, end, ids).await?;

    let unsafe_count = dvirs.iter().filter(|d| !d.safe_to_operate).count();
    let rows: Vec<DvirRow> = dvirs.into_iter().map(DvirRow::from).collect();
    ctx.print(&rows);
    if unsafe_count > 0 {
        ctx.warn(&format!("{} report(s) marked unsafe to operate", unsafe_count));
    }
    Ok(())
}
