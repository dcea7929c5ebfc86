//! Geotab adapter configuration

use std::collections::HashMap;
use std::time::Duration;

use eld_core::{EldError, EldEventType, EldResult};
use serde::Deserialize;

/// Connection settings for the MyGeotab API
#[derive(Debug, Clone, Deserialize)]
pub struct GeotabConfig {
    /// JSON-RPC endpoint used when the credentials name no server
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Look-back window, in days, for fault and maintenance queries
    #[serde(default = "default_fault_lookback_days")]
    pub fault_lookback_days: i64,
    /// Exception rule ids that trigger notifications for each event type.
    ///
    /// Rules live in the customer's database, so there are no defaults;
    /// subscribing to a type with no rules here is rejected.
    ///
    /// ```toml
    /// [geotab.event_rules]
    /// geofence_entry = ["aZoneEntryRule"]
    /// hos_violation = ["aHosRule", "aBreakRule"]
    /// ```
    #[serde(default)]
    pub event_rules: HashMap<EldEventType, Vec<String>>,
}

fn default_base_url() -> String {
    "https://my.geotab.com/apiv1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_fault_lookback_days() -> i64 {
    30
}

impl Default for GeotabConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            fault_lookback_days: default_fault_lookback_days(),
            event_rules: HashMap::new(),
        }
    }
}

impl GeotabConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Rule ids for every requested type, in request order and without
    /// duplicates; fails naming the types that have no rules configured
    pub fn rules_for(&self, event_types: &[EldEventType]) -> EldResult<Vec<String>> {
        let mut rules: Vec<String> = Vec::new();
        let mut unmapped = Vec::new();
        for event_type in event_types {
            match self.event_rules.get(event_type) {
                Some(ids) if !ids.is_empty() => {
                    for id in ids {
                        if !rules.contains(id) {
                            rules.push(id.clone());
                        }
                    }
                }
                _ => unmapped.push(format!("{:?}", event_type)),
            }
        }

        if !unmapped.is_empty() {
            return Err(EldError::InvalidRequest(format!(
                "no Geotab exception rules configured for {}",
                unmapped.join(", ")
            )));
        }
        if rules.is_empty() {
            return Err(EldError::InvalidRequest(
                "at least one event type is required".to_string(),
            ));
        }
        Ok(rules)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// JSON-RPC endpoint on a named federation server
pub fn server_endpoint(server: &str) -> String {
    let host = server
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    format!("https://{}/apiv1", host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: GeotabConfig = serde_json::from_str(r#"{"timeout_secs": 5}"#).unwrap();
        assert_eq!(config.base_url, "https://my.geotab.com/apiv1");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.fault_lookback_days, 30);
    }

    #[test]
    fn test_rules_for_event_types() {
        let config: GeotabConfig = serde_json::from_str(
            r#"{"event_rules": {
                "hos_violation": ["RuleHos1", "RuleHos2"],
                "geofence_entry": ["RuleYard"],
                "geofence_exit": ["RuleYard"],
                "fault_code": []
            }}"#,
        )
        .unwrap();

        let rules = config
            .rules_for(&[
                EldEventType::GeofenceEntry,
                EldEventType::HosViolation,
                EldEventType::GeofenceExit,
            ])
            .unwrap();
        assert_eq!(rules, ["RuleYard", "RuleHos1", "RuleHos2"]);

        let err = config
            .rules_for(&[EldEventType::HosViolation, EldEventType::FaultCode])
            .unwrap_err();
        match err {
            EldError::InvalidRequest(message) => assert!(message.contains("FaultCode")),
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(matches!(
            config.rules_for(&[]),
            Err(EldError::InvalidRequest(_))
        ));
        assert!(GeotabConfig::default()
            .rules_for(&[EldEventType::LocationUpdate])
            .is_err());
    }

    #[test]
    fn test_server_endpoint() {
        assert_eq!(server_endpoint("my3.geotab.com"), "https://my3.geotab.com/apiv1");
        assert_eq!(
            server_endpoint("https://my3.geotab.com/"),
            "https://my3.geotab.com/apiv1"
        );
    }
}
