//! Configuration file handling for eld-cli
//!
//! ```toml
//! vendor = "samsara"
//! output = "table"
//!
//! [credentials]
//! samsara_api_key = "samsara_api_..."
//!
//! [geotab]
//! fault_lookback_days = 14
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use eld_core::{Credentials, EldVendor};
use eld_gateway::EldConfig;
use serde::Deserialize;

use crate::output::OutputFormat;

/// Credentials stored in the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsSection {
    pub samsara_api_key: Option<String>,
    pub motive_api_key: Option<String>,
    pub geotab_username: Option<String>,
    pub geotab_password: Option<String>,
    pub geotab_database: Option<String>,
    pub geotab_server: Option<String>,
}

/// Credentials given on the command line or through the environment
#[derive(Debug, Clone, Default, Args)]
pub struct CredentialArgs {
    /// Samsara API token
    #[arg(long, env = "SAMSARA_API_KEY", hide_env_values = true, global = true)]
    pub samsara_api_key: Option<String>,

    /// Motive API key
    #[arg(long, env = "MOTIVE_API_KEY", hide_env_values = true, global = true)]
    pub motive_api_key: Option<String>,

    /// MyGeotab user name
    #[arg(long, env = "GEOTAB_USERNAME", global = true)]
    pub geotab_username: Option<String>,

    /// MyGeotab password
    #[arg(long, env = "GEOTAB_PASSWORD", hide_env_values = true, global = true)]
    pub geotab_password: Option<String>,

    /// MyGeotab database
    #[arg(long, env = "GEOTAB_DATABASE", global = true)]
    pub geotab_database: Option<String>,

    /// MyGeotab federation server (e.g. my.geotab.com)
    #[arg(long, env = "GEOTAB_SERVER", global = true)]
    pub geotab_server: Option<String>,
}

/// Configuration for the CLI tool
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default vendor
    pub vendor: Option<String>,
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
    pub credentials: CredentialsSection,
    /// Per-vendor adapter sections (`[samsara]`, `[geotab]`, `[motive]`)
    #[serde(flatten)]
    pub adapters: EldConfig,
}

impl Config {
    /// Load the default config file, if there is one
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("eld-cli");

        Ok(config_dir.join("config.toml"))
    }

    /// `--vendor` if given, otherwise the config file's vendor
    pub fn resolve_vendor(&self, arg: Option<EldVendor>) -> Result<EldVendor> {
        if let Some(vendor) = arg {
            return Ok(vendor);
        }
        match &self.vendor {
            Some(name) => name.parse().map_err(anyhow::Error::msg),
            None => bail!("No vendor selected; pass --vendor or set `vendor` in the config file"),
        }
    }

    /// `--output` if given, otherwise the config file's format
    pub fn resolve_output(&self, arg: Option<OutputFormat>) -> Result<OutputFormat> {
        if let Some(format) = arg {
            return Ok(format);
        }
        match &self.output {
            Some(name) => OutputFormat::from_str(name, true).map_err(anyhow::Error::msg),
            None => Ok(OutputFormat::default()),
        }
    }

    /// Build the credentials for `vendor`; command-line values win over the file
    pub fn credentials(&self, vendor: EldVendor, args: &CredentialArgs) -> Result<Credentials> {
        let file = &self.credentials;
        let pick = |arg: &Option<String>, stored: &Option<String>| {
            arg.clone().or_else(|| stored.clone())
        };

        match vendor {
            EldVendor::Samsara => {
                let api_key = pick(&args.samsara_api_key, &file.samsara_api_key)
                    .context("Missing Samsara API key (--samsara-api-key or SAMSARA_API_KEY)")?;
                Ok(Credentials::Samsara { api_key })
            }
            EldVendor::Motive => {
                let api_key = pick(&args.motive_api_key, &file.motive_api_key)
                    .context("Missing Motive API key (--motive-api-key or MOTIVE_API_KEY)")?;
                Ok(Credentials::Motive { api_key })
            }
            EldVendor::Geotab => Ok(Credentials::Geotab {
                username: pick(&args.geotab_username, &file.geotab_username)
                    .context("Missing Geotab user name (--geotab-username or GEOTAB_USERNAME)")?,
                password: pick(&args.geotab_password, &file.geotab_password)
                    .context("Missing Geotab password (--geotab-password or GEOTAB_PASSWORD)")?,
                database: pick(&args.geotab_database, &file.geotab_database)
                    .context("Missing Geotab database (--geotab-database or GEOTAB_DATABASE)")?,
                server: pick(&args.geotab_server, &file.geotab_server),
            }),
        }
    }
}
