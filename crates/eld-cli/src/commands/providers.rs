//! Providers command - list the integration catalog

use eld_gateway::EldConnectionManager;

use crate::output::{OutputContext, ProviderRow};

/// Show every known provider and the features it declares
pub fn providers(manager: &EldConnectionManager, ctx: &OutputContext) {
    let rows: Vec<ProviderRow> = manager.catalog().iter().map(ProviderRow::from).collect();
    ctx.print(&rows);
}
