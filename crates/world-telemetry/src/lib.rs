//! # World Telemetry
//!
//! Structured logging for Ledger World nodes. Libraries only emit `tracing`
//! events; the binary installs one subscriber at start-up through
//! [`init_telemetry`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use world_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     // ...
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LW_SERVICE_NAME` | `ledger-world` | Service name in logs |
//! | `LW_LOG_LEVEL` | `info` | Filter directives, falls back to `RUST_LOG` |
//! | `LW_LOG_JSON` | `false` | JSON output (`true` in containers) |
//! | `LW_LOG_SOURCE` | `false` | File and line of each event |

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod subscriber;

pub use config::TelemetryConfig;
pub use subscriber::env_filter;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter {0}")]
    Filter(String),

    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

/// Install the global subscriber described by `config`.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    subscriber::init_subscriber(config)
}
