//! Facade configuration

use std::path::Path;

use eld_core::{EldError, EldResult};
use eld_geotab::GeotabConfig;
use eld_motive::MotiveConfig;
use eld_samsara::SamsaraConfig;
use serde::Deserialize;

/// Adapter settings, one optional section per vendor.
///
/// ```toml
/// [samsara]
/// base_url = "https://api.eu.samsara.com"
///
/// [geotab]
/// fault_lookback_days = 14
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EldConfig {
    pub samsara: SamsaraConfig,
    pub geotab: GeotabConfig,
    pub motive: MotiveConfig,
}

impl EldConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> EldResult<Self> {
        toml::from_str(content)
            .map_err(|e| EldError::Configuration(format!("invalid ELD config: {}", e)))
    }

    /// Load a TOML file
    pub fn load(path: impl AsRef<Path>) -> EldResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EldError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}
