//! # World Runtime
//!
//! Owns the node's infrastructure and courts from start-up to shutdown.
//!
//! ```text
//!  load_config ─→ WorldRuntime::new ─→ start(content) ─→ run_until_stopped
//!                                                            │
//!                     ctrl-c / shutdown() / FatalError ──────┘
//!                                                            ▼
//!                                                        shutdown
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use lw_05_courts::{
    ContentLoader, CourtContent, CourtContext, Courts, FatalError, StaticContentLoader,
    TomlContentLoader,
};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::container::{Infrastructure, WorldConfig};

/// Why [`WorldRuntime::run_until_stopped`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Ctrl-C.
    Interrupted,
    /// The shutdown signal was sent.
    Shutdown,
    /// A court failed beyond recovery.
    Fatal(FatalError),
}

/// Content loader for `config`: the TOML file when one is configured, no
/// courts otherwise.
pub fn content_loader(config: &WorldConfig) -> Box<dyn ContentLoader> {
    match &config.courts.content_path {
        Some(path) => Box::new(TomlContentLoader::new(path.clone())),
        None => Box::new(StaticContentLoader::new(CourtContent::default())),
    }
}

pub struct WorldRuntime {
    config: WorldConfig,
    infrastructure: Infrastructure,
    courts: Option<Courts>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    fatal_tx: mpsc::Sender<FatalError>,
    fatal_rx: mpsc::Receiver<FatalError>,
}

impl WorldRuntime {
    pub fn new(config: WorldConfig) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (fatal_tx, fatal_rx) = mpsc::channel(16);
        let infrastructure = Infrastructure::new(&config, shutdown_rx.clone())
            .context("Failed to build infrastructure")?;

        Ok(Self {
            config,
            infrastructure,
            courts: None,
            shutdown_tx,
            shutdown_rx,
            fatal_tx,
            fatal_rx,
        })
    }

    pub fn infrastructure(&self) -> &Infrastructure {
        &self.infrastructure
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Handle that stops [`WorldRuntime::run_until_stopped`] when sent `true`.
    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.shutdown_tx.clone()
    }

    /// Load court content and start every court.
    pub async fn start(&mut self, loader: &dyn ContentLoader) -> Result<()> {
        info!("===========================================");
        info!("  Ledger World Node v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let content = loader.load().await.context("Failed to load court content")?;
        let ctx = CourtContext {
            ledgers: self.infrastructure.ledger_service(),
            transport: self.infrastructure.transport(),
            registry: self.infrastructure.registry.as_ref(),
            shutdown: self.shutdown_rx.clone(),
            fatal: self.fatal_tx.clone(),
            config: self.config.courts.clone(),
            transfer: self.config.transfer.clone(),
        };
        let courts = Courts::start(ctx, content)
            .await
            .context("Failed to start courts")?;

        info!(
            courts = courts.ids().len(),
            services = self.infrastructure.registry.len(),
            "[node] Running"
        );
        self.courts = Some(courts);
        Ok(())
    }

    /// Wait for ctrl-c, the shutdown signal or a fatal court error.
    pub async fn run_until_stopped(&mut self) -> StopReason {
        let mut shutdown = self.shutdown_rx.clone();
        let mut listen_ctrl_c = true;
        loop {
            tokio::select! {
                fatal = self.fatal_rx.recv() => {
                    // The runtime holds a sender, so the channel never closes.
                    if let Some(fatal) = fatal {
                        error!(error = %fatal, "[node] Fatal court error");
                        return StopReason::Fatal(fatal);
                    }
                }
                signal = tokio::signal::ctrl_c(), if listen_ctrl_c => {
                    match signal {
                        Ok(()) => {
                            info!("[node] Interrupted");
                            return StopReason::Interrupted;
                        }
                        Err(e) => {
                            warn!(error = %e, "[node] Could not listen for ctrl-c");
                            listen_ctrl_c = false;
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return StopReason::Shutdown;
                    }
                }
            }
        }
    }

    /// Stop every service and court task and wait for them.
    pub async fn shutdown(self) {
        info!("[node] Initiating graceful shutdown");
        self.shutdown_tx.send_replace(true);

        if let Some(courts) = self.courts {
            courts.join().await;
        }
        self.infrastructure.registry.join_all().await;
        info!("[node] Shutdown complete");
    }
}
