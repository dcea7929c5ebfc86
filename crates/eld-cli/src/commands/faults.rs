//! Faults command - engine fault codes

use anyhow::Result;
use eld_gateway::EldConnectionManager;

use crate::output::{FaultRow, OutputContext};

pub async fn faults(
    manager: &EldConnectionManager,
    vehicle_ids: &[String],
    active_only: bool,
    ctx: &OutputContext,
) -> Result<()> {
    let ids = (!vehicle_ids.is_empty()).then_some(vehicle_ids);
    let mut faults = manager.get_fault_codes(ids, active_only).await?;

    if faults.is_empty() {
        ctx.info("No faults found");
        return Ok(());
    }

    // Most severe first, newest first within a severity
    faults.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then(b.occurred_at.cmp(&a.occurred_at))
    });
    let rows: Vec<FaultRow> = faults.into_iter().map(FaultRow::from).collect();
    ctx.print(&rows);
    Ok(())
}
