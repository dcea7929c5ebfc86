//! IFTA command - quarterly fuel-tax summary

use anyhow::Result;
use eld_core::IftaQuarter;
use eld_gateway::EldConnectionManager;

use crate::output::{IftaRow, OutputContext};

pub async fn ifta(
    manager: &EldConnectionManager,
    year: i32,
    quarter: u8,
    vehicle_ids: &[String],
    ctx: &OutputContext,
) -> Result<()> {
    let quarter = IftaQuarter::new(year, quarter)?;
    let ids = (!vehicle_ids.is_empty()).then_some(vehicle_ids);
    let summary = manager.get_ifta_summary(quarter, ids).await?;

    let (quarter_label, total_miles, total_gallons) =
        (summary.quarter.clone(), summary.total_miles, summary.total_gallons);
    let rows: Vec<IftaRow> = summary
        .jurisdictions
        .into_iter()
        .map(IftaRow::from)
        .collect();
    ctx.print(&rows);
    ctx.info(&format!(
        "{}: {} mi, {} gal",
        quarter_label, total_miles, total_gallons
    ));
    Ok(())
}
