//! ELD CLI - Command-line tool for ELD telematics providers
//!
//! Connects to Samsara, Geotab or Motive through the connection manager and
//! prints locations, hours of service, fleet, diagnostics and fuel-tax data.

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, Utc};
use clap::{Parser, Subcommand};
use eld_core::base::parse_timestamp;
use eld_core::EldVendor;
use eld_gateway::EldConnectionManager;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, CredentialArgs};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "eld-cli")]
#[command(author, version, about = "ELD Telematics CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Vendor to connect to: samsara, geotab, motive
    #[arg(long, env = "ELD_VENDOR", global = true)]
    vendor: Option<EldVendor>,

    /// Configuration file path
    #[arg(short, long, env = "ELD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    credentials: CredentialArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported providers and their features
    Providers,

    /// Authenticate and check the selected vendor connection
    Test,

    /// Latest vehicle locations
    Locations {
        /// Vehicle ID(s); all vehicles when omitted
        vehicle_ids: Vec<String>,
    },

    /// Hours-of-service data
    Hos {
        #[command(subcommand)]
        command: HosCommands,
    },

    /// List vehicles
    Vehicles {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one vehicle with its latest statistics
    Vehicle {
        /// Vehicle ID
        id: String,
    },

    /// List drivers
    Drivers {
        #[command(flatten)]
        page: PageArgs,
    },

    /// List trailers
    Trailers {
        #[command(flatten)]
        page: PageArgs,
    },

    /// List engine fault codes
    Faults {
        /// Show only active faults
        #[arg(long)]
        active: bool,

        /// Vehicle ID(s); all vehicles when omitted
        vehicle_ids: Vec<String>,
    },

    /// List driver vehicle inspection reports
    Dvirs {
        #[command(flatten)]
        range: RangeArgs,

        /// Vehicle ID(s); all vehicles when omitted
        vehicle_ids: Vec<String>,
    },

    /// Quarterly IFTA summary
    Ifta {
        /// Reporting year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,

        /// Quarter 1-4 (defaults to the current quarter)
        #[arg(long)]
        quarter: Option<u8>,

        /// Vehicle ID(s); all vehicles when omitted
        vehicle_ids: Vec<String>,
    },

    /// List geofences
    Geofences,

    /// Decode a saved webhook body into canonical events
    ParseWebhook {
        /// JSON file containing the webhook body
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum HosCommands {
    /// Remaining drive, shift, cycle and break time
    Clocks {
        /// Driver ID(s); all drivers when omitted
        driver_ids: Vec<String>,
    },

    /// Duty-status log of one driver
    Logs {
        /// Driver ID
        driver: String,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// HOS violations
    Violations {
        #[command(flatten)]
        range: RangeArgs,

        /// Driver ID(s); all drivers when omitted
        driver_ids: Vec<String>,
    },
}

#[derive(clap::Args)]
struct PageArgs {
    /// Maximum number of results
    #[arg(long)]
    limit: Option<u32>,

    /// Cursor printed by the previous page
    #[arg(long)]
    cursor: Option<String>,
}

#[derive(clap::Args)]
struct RangeArgs {
    /// Range start (RFC 3339); defaults to 24 hours ago
    #[arg(long)]
    from: Option<String>,

    /// Range end (RFC 3339); defaults to now
    #[arg(long)]
    to: Option<String>,
}

impl RangeArgs {
    fn resolve(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let now = Utc::now();
        let end = match &self.to {
            Some(value) => parse_time(value)?,
            None => now,
        };
        let start = match &self.from {
            Some(value) => parse_time(value)?,
            None => end - Duration::hours(24),
        };
        if start > end {
            anyhow::bail!("--from must not be after --to");
        }
        Ok((start, end))
    }
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(value).with_context(|| format!("Invalid timestamp: {}", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    let format = config.resolve_output(cli.output)?;
    let no_color = cli.no_color || config.no_color.unwrap_or(false);
    let ctx = OutputContext::new(format, no_color, cli.quiet);

    let manager = EldConnectionManager::from_config(&config.adapters)?;

    // Commands that need no vendor session
    match &cli.command {
        Commands::Providers => {
            commands::providers(&manager, &ctx);
            return Ok(());
        }
        Commands::ParseWebhook { file } => {
            let vendor = config.resolve_vendor(cli.vendor)?;
            return commands::parse_webhook(&manager, vendor, file, &ctx);
        }
        _ => {}
    }

    let vendor = config.resolve_vendor(cli.vendor)?;
    let credentials = config.credentials(vendor, &cli.credentials)?;
    manager
        .connect(vendor, &credentials)
        .await
        .with_context(|| format!("Failed to connect to {}", vendor))?;

    let result = run(&cli.command, &manager, &ctx).await;

    if let Err(e) = manager.disconnect().await {
        tracing::warn!(vendor = %vendor, error = %e, "Failed to revoke session");
    }
    result
}

/// Execute a command that needs an active connection
async fn run(command: &Commands, manager: &EldConnectionManager, ctx: &OutputContext) -> Result<()> {
    match command {
        Commands::Providers | Commands::ParseWebhook { .. } => Ok(()),
        Commands::Test => commands::test(manager, ctx).await,
        Commands::Locations { vehicle_ids } => commands::locations(manager, vehicle_ids, ctx).await,
        Commands::Hos { command } => match command {
            HosCommands::Clocks { driver_ids } => commands::clocks(manager, driver_ids, ctx).await,
            HosCommands::Logs { driver, range } => {
                let (start, end) = range.resolve()?;
                commands::logs(manager, driver, start, end, ctx).await
            }
            HosCommands::Violations { range, driver_ids } => {
                let (start, end) = range.resolve()?;
                commands::violations(manager, driver_ids, start, end, ctx).await
            }
        },
        Commands::Vehicles { page } => {
            commands::vehicles(manager, page.limit, page.cursor.as_deref(), ctx).await
        }
        Commands::Vehicle { id } => commands::vehicle(manager, id, ctx).await,
        Commands::Drivers { page } => {
            commands::drivers(manager, page.limit, page.cursor.as_deref(), ctx).await
        }
        Commands::Trailers { page } => {
            commands::trailers(manager, page.limit, page.cursor.as_deref(), ctx).await
        }
        Commands::Faults {
            active,
            vehicle_ids,
        } => commands::faults(manager, vehicle_ids, *active, ctx).await,
        Commands::Dvirs { range, vehicle_ids } => {
            let (start, end) = range.resolve()?;
            commands::dvirs(manager, start, end, vehicle_ids, ctx).await
        }
        Commands::Ifta {
            year,
            quarter,
            vehicle_ids,
        } => {
            let today = Utc::now();
            let year = year.unwrap_or_else(|| today.year());
            let quarter = quarter.unwrap_or_else(|| (today.month0() / 3 + 1) as u8);
            commands::ifta(manager, year, quarter, vehicle_ids, ctx).await
        }
        Commands::Geofences => commands::geofences(manager, ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_hos_logs() {
        let cli = Cli::try_parse_from([
            "eld-cli",
            "--vendor",
            "motive",
            "hos",
            "logs",
            "drv-1",
            "--from",
            "2024-03-01T00:00:00Z",
        ])
        .unwrap();
        assert_eq!(cli.vendor, Some(EldVendor::Motive));
        match cli.command {
            Commands::Hos {
                command: HosCommands::Logs { driver, range },
            } => {
                assert_eq!(driver, "drv-1");
                let (start, end) = range.resolve().unwrap();
                assert_eq!(start, parse_time("2024-03-01T00:00:00Z").unwrap());
                assert!(end > start);
            }
            _ => panic!("expected hos logs"),
        }
    }

    #[test]
    fn test_range_rejects_reversed_bounds() {
        let range = RangeArgs {
            from: Some("2024-03-02T00:00:00Z".to_string()),
            to: Some("2024-03-01T00:00:00Z".to_string()),
        };
        assert!(range.resolve().is_err());
    }

    #[test]
    fn test_invalid_timestamp() {
        assert!(parse_time("yesterday").is_err());
    }
}
