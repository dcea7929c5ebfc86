//! Motive adapter configuration

use std::time::Duration;

use serde::Deserialize;

/// Connection settings for the Motive API
#[derive(Debug, Clone, Deserialize)]
pub struct MotiveConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.keeptruckin.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for MotiveConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl MotiveConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MotiveConfig::default();
        assert_eq!(config.base_url, "https://api.keeptruckin.com/v1");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: MotiveConfig =
            serde_json::from_str(r#"{"base_url": "http://127.0.0.1:9000/v1"}"#).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000/v1");
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    }
}
