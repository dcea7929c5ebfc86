//! HOS commands - clocks, duty-status logs and violations

use anyhow::Result;
use chrono::{DateTime, Utc};
use eld_gateway::EldConnectionManager;

use crate::output::{HosClockRow, HosLogRow, OutputContext, ViolationRow};

/// Remaining drive/shift/cycle/break time per driver
pub async fn clocks(
    manager: &EldConnectionManager,
    driver_ids: &[String],
    ctx: &OutputContext,
) -> Result<()> {
    let ids = (!driver_ids.is_empty()).then_some(driver_ids);
    let clocks = manager.get_hos_clocks(ids).await?;

    let rows: Vec<HosClockRow> = clocks.into_iter().map(HosClockRow::from).collect();
    ctx.print(&rows);
    Ok(())
}

/// Duty-status intervals of one driver
pub async fn logs(
    manager: &EldConnectionManager,
    driver_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    ctx: &OutputContext,
) -> Result<()> {
    let logs = manager.get_hos_logs(driver_id, start, end).await?;
    if logs.is_empty() {
        ctx.info(&format!("No duty-status records for driver {}", driver_id));
        return Ok(());
    }

    let total: i64 = logs.iter().map(|l| l.duration_minutes).sum();
    let rows: Vec<HosLogRow> = logs.into_iter().map(HosLogRow::from).collect();
    ctx.print(&rows);
    ctx.info(&format!("{} record(s), {} minute(s)", rows.len(), total));
    Ok(())
}

pub async fn violations(
    manager: &EldConnectionManager,
    driver_ids: &[String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    ctx: &OutputContext,
) -> Result<()> {
    let ids = (!driver_ids.is_empty()).then_some(driver_ids);
    let violations = manager.get_hos_violations(ids, start, end).await?;
    if violations.is_empty() {
        ctx.success("No violations");
        return Ok(());
    }

    let rows: Vec<ViolationRow> = violations.into_iter().map(ViolationRow::from).collect();
    ctx.print(&rows);
    Ok(())
}
