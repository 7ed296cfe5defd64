//! # Ledger World Node
//!
//! Runs the courts of one node on an in-memory ledger and transport.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`LW_CONFIG` file, then `LW_*` overrides)
//! 2. Install the tracing subscriber
//! 3. Build ledger, transport and service registry
//! 4. Load court content and start every court
//! 5. Run until ctrl-c, shutdown or a fatal court error
//!
//! A fatal court error ends the process with a non-zero exit status.

use std::path::PathBuf;

use anyhow::{Context, Result};
use node_runtime::{content_loader, load_config, StopReason, WorldRuntime};
use tracing::info;
use world_telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var_os("LW_CONFIG").map(PathBuf::from);
    let config = load_config(config_path.as_deref()).context("Failed to load configuration")?;

    init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;

    let loader = content_loader(&config);
    let mut runtime = WorldRuntime::new(config)?;
    runtime.start(loader.as_ref()).await?;

    info!("Node is running. Press Ctrl+C to stop.");
    let reason = runtime.run_until_stopped().await;
    runtime.shutdown().await;

    match reason {
        StopReason::Fatal(fatal) => Err(fatal).context("Court failed beyond recovery"),
        StopReason::Interrupted | StopReason::Shutdown => Ok(()),
    }
}
