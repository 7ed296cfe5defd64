//! Telemetry configuration from environment variables.

use std::env;

use serde::{Deserialize, Serialize};

/// How a node writes its logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name attached to every event
    pub service_name: String,

    /// Filter directives (trace, debug, info, or `lw_04_transfer=debug,...`)
    pub log_level: String,

    /// One JSON object per event instead of human readable lines
    pub json_logs: bool,

    /// Include file and line of each event
    pub with_source: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "ledger-world".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_source: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LW_SERVICE_NAME`: Service name (default: ledger-world)
    /// - `LW_LOG_LEVEL` or `RUST_LOG`: Filter directives (default: info)
    /// - `LW_LOG_JSON`: JSON logs (default: false, true in containers)
    /// - `LW_LOG_SOURCE`: Include file and line (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`TelemetryConfig::from_env`] over any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            json_logs: lookup("KUBERNETES_SERVICE_HOST").is_some()
                || lookup("DOCKER_CONTAINER").is_some(),
            ..Self::default()
        };
        config.apply_overrides(lookup);
        config
    }

    /// Overwrite fields for which `lookup` has a value.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("LW_SERVICE_NAME") {
            self.service_name = name;
        }
        if let Some(level) = lookup("LW_LOG_LEVEL").or_else(|| lookup("RUST_LOG")) {
            self.log_level = level;
        }
        if let Some(json) = lookup("LW_LOG_JSON") {
            self.json_logs = is_truthy(&json);
        }
        if let Some(source) = lookup("LW_LOG_SOURCE") {
            self.with_source = is_truthy(&source);
        }
    }
}

fn is_truthy(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
