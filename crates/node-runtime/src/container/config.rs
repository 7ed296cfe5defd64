//! # Node Configuration
//!
//! Unified configuration for the transfer protocol, the courts, the
//! transport and logging.
//!
//! ## Sources, later wins
//!
//! 1. `Default` impls
//! 2. TOML file (`LW_CONFIG`)
//! 3. `LW_*` environment variables

use std::env;
use std::path::{Path, PathBuf};

use lw_01_ledger::LedgerKey;
use lw_04_transfer::TransferConfig;
use lw_05_courts::CourtsConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use world_telemetry::TelemetryConfig;

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Node identity.
    pub node: NodeConfig,
    /// Handshake timeouts.
    pub transfer: TransferConfig,
    /// Court content and respawn cadence.
    pub courts: CourtsConfig,
    /// In-memory transport.
    pub transport: TransportConfig,
    /// Logging.
    pub telemetry: TelemetryConfig,
}

/// Node identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// 32-byte hex seed of the node key. Passphrase ledgers are derived from
    /// it, so a node that restarts with the same seed finds its courts again.
    /// A random key is used when unset.
    pub key_seed: Option<String>,
}

impl NodeConfig {
    /// The node key described by this config.
    pub fn key(&self) -> Result<LedgerKey, ConfigError> {
        let Some(seed) = &self.key_seed else {
            return Ok(LedgerKey::generate());
        };
        let bytes = hex::decode(seed.trim_start_matches("0x"))
            .map_err(|e| ConfigError::InvalidSeed(e.to_string()))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| ConfigError::InvalidSeed(format!("{} bytes, need 32", b.len())))?;
        Ok(LedgerKey::from_seed(seed))
    }
}

/// In-memory transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Buffered messages per topic before slow subscribers lag.
    pub channel_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("invalid value {value:?} for {key}")]
    InvalidOverride { key: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("invalid node key seed: {0}")]
    InvalidSeed(String),
}

impl WorldConfig {
    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transfer.confirmation_timeout_secs == 0 {
            return Err(ConfigError::Zero("transfer.confirmation_timeout_secs"));
        }
        if self.transfer.local_supports_timeout_ms == 0 {
            return Err(ConfigError::Zero("transfer.local_supports_timeout_ms"));
        }
        if self.courts.backup_respawn_interval_secs == 0 {
            return Err(ConfigError::Zero("courts.backup_respawn_interval_secs"));
        }
        if self.transport.channel_capacity == 0 {
            return Err(ConfigError::Zero("transport.channel_capacity"));
        }
        self.node.key()?;
        world_telemetry::env_filter(&self.telemetry)
            .map_err(|e| ConfigError::InvalidOverride {
                key: "telemetry.log_level",
                value: e.to_string(),
            })?;
        Ok(())
    }

    /// Overwrite fields for which `lookup` has an `LW_*` value.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `LW_NODE_KEY_SEED` | `node.key_seed` |
    /// | `LW_CONFIRMATION_TIMEOUT_SECS` | `transfer.confirmation_timeout_secs` |
    /// | `LW_LOCAL_SUPPORTS_TIMEOUT_MS` | `transfer.local_supports_timeout_ms` |
    /// | `LW_COURT_CONTENT` | `courts.content_path` |
    /// | `LW_BACKUP_RESPAWN_INTERVAL_SECS` | `courts.backup_respawn_interval_secs` |
    /// | `LW_CHANNEL_CAPACITY` | `transport.channel_capacity` |
    ///
    /// plus the telemetry variables of [`TelemetryConfig::apply_overrides`].
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(seed) = lookup("LW_NODE_KEY_SEED") {
            self.node.key_seed = Some(seed);
        }
        if let Some(v) = parse_override(&lookup, "LW_CONFIRMATION_TIMEOUT_SECS")? {
            self.transfer.confirmation_timeout_secs = v;
        }
        if let Some(v) = parse_override(&lookup, "LW_LOCAL_SUPPORTS_TIMEOUT_MS")? {
            self.transfer.local_supports_timeout_ms = v;
        }
        if let Some(path) = lookup("LW_COURT_CONTENT") {
            self.courts.content_path = Some(PathBuf::from(path));
        }
        if let Some(v) = parse_override(&lookup, "LW_BACKUP_RESPAWN_INTERVAL_SECS")? {
            self.courts.backup_respawn_interval_secs = v;
        }
        if let Some(v) = parse_override(&lookup, "LW_CHANNEL_CAPACITY")? {
            self.transport.channel_capacity = v;
        }
        self.telemetry.apply_overrides(lookup);
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidOverride { key, value })
        })
        .transpose()
}

/// Read `path` when given, apply environment overrides and validate.
pub fn load_config(path: Option<&Path>) -> Result<WorldConfig, ConfigError> {
    load_config_with(path, |key| env::var(key).ok())
}

/// [`load_config`] over any key lookup.
pub fn load_config_with(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<WorldConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&text).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        }
        None => WorldConfig::default(),
    };
    config.apply_overrides(lookup)?;
    config.validate()?;
    Ok(config)
}
