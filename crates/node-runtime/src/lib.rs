//! # Node Runtime Library
//!
//! This library exposes the runtime's modules for the `node-runtime` binary
//! and for cross-crate tests.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and shared infrastructure (ledger,
//!   transport, service registry)
//! - `runtime` - Court start-up, fatal error handling and shutdown

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod container;
pub mod runtime;

pub use container::{load_config, ConfigError, Infrastructure, InfrastructureError, WorldConfig};
pub use runtime::{content_loader, StopReason, WorldRuntime};
