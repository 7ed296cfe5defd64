//! # Node Container
//!
//! Configuration and the shared infrastructure every service is built on.

pub mod config;
pub mod infrastructure;

pub use config::{load_config, load_config_with, ConfigError, NodeConfig, TransportConfig, WorldConfig};
pub use infrastructure::{Infrastructure, InfrastructureError};
