//! Test command - verify credentials against the vendor

use anyhow::{bail, Result};
use eld_gateway::EldConnectionManager;

use crate::output::OutputContext;

/// Probe the active connection and report the session
pub async fn test(manager: &EldConnectionManager, ctx: &OutputContext) -> Result<()> {
    let ok = manager.test_connection(None).await?;
    let vendor = manager
        .active_vendor()
        .map_or_else(|| "-".to_string(), |v| v.to_string());

    if !ok {
        ctx.error(&format!("Connection to {} failed", vendor));
        bail!("connection test failed");
    }

    let expires = manager
        .auth_token()?
        .map_or_else(|| "-".to_string(), |t| t.expires_at.to_rfc3339());
    ctx.success(&format!("Connected to {}", vendor));
    ctx.print_kv(&[("Vendor", vendor), ("Token expires", expires)]);
    Ok(())
}
