//! Parse-webhook command - decode a saved webhook body offline

use std::path::Path;

use anyhow::{Context, Result};
use eld_core::EldVendor;
use eld_gateway::EldConnectionManager;

use crate::output::{EventRow, OutputContext, OutputFormat};

pub fn parse_webhook(
    manager: &EldConnectionManager,
    vendor: EldVendor,
    file: &Path,
    ctx: &OutputContext,
) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read webhook file: {}", file.display()))?;
    let payload: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Webhook file is not JSON: {}", file.display()))?;

    let events = manager.parse_webhook_payload(vendor, &payload)?;
    if ctx.format == OutputFormat::Json {
        ctx.print_json(&events);
    } else {
        let rows: Vec<EventRow> = events.into_iter().map(EventRow::from).collect();
        ctx.print(&rows);
    }
    Ok(())
}
