//! Ledger, transport and service registry shared by every service.

use std::sync::Arc;

use lw_01_ledger::{InMemoryLedger, LedgerService};
use lw_03_handlers::{
    attach_handler, CompositeHandler, Handler, HandlerError, ServiceHandle, ServiceRegistry,
};
use lw_04_transfer::{
    Reconciler, TransferConfig, TransferError, UnrestrictedAddHandler, UnrestrictedRemoveHandler,
};
use shared_bus::{InMemoryTransport, Transport};
use shared_types::LedgerId;
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

use super::config::{ConfigError, WorldConfig};

/// Errors while putting a service in front of a ledger.
#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("sweeping inventory {inventory}: {source}")]
    Sweep {
        inventory: LedgerId,
        #[source]
        source: TransferError,
    },

    #[error(transparent)]
    Service(#[from] HandlerError),
}

pub struct Infrastructure {
    pub ledgers: Arc<InMemoryLedger>,
    pub transport: Arc<InMemoryTransport>,
    pub registry: Arc<ServiceRegistry>,
    transfer: TransferConfig,
}

impl Infrastructure {
    pub fn new(config: &WorldConfig, shutdown: watch::Receiver<bool>) -> Result<Self, ConfigError> {
        let ledgers = Arc::new(InMemoryLedger::new(config.node.key()?));
        let transport = Arc::new(InMemoryTransport::with_capacity(
            config.transport.channel_capacity,
        ));
        let registry = Arc::new(ServiceRegistry::new(
            ledgers.clone(),
            transport.clone(),
            shutdown,
        ));
        info!(node = %ledgers.node_address(), "[node] Infrastructure ready");
        Ok(Self {
            ledgers,
            transport,
            registry,
            transfer: config.transfer.clone(),
        })
    }

    pub fn ledger_service(&self) -> Arc<dyn LedgerService> {
        self.ledgers.clone()
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    /// Serve a plain inventory: objects can be taken from it and given to
    /// it without conditions. The inventory ledger becomes its own handler.
    /// Stale listings are swept first.
    pub async fn serve_inventory(
        &self,
        inventory: LedgerId,
    ) -> Result<ServiceHandle, InfrastructureError> {
        let removed = Reconciler::new(self.ledger_service())
            .sweep(&inventory)
            .await
            .map_err(|source| InfrastructureError::Sweep {
                inventory: inventory.clone(),
                source,
            })?;
        if !removed.is_empty() {
            info!(inventory = %inventory, removed = removed.len(), "[node] Swept inventory");
        }

        let handlers: Vec<Arc<dyn Handler>> = vec![
            Arc::new(UnrestrictedAddHandler::new(self.ledger_service())),
            Arc::new(UnrestrictedRemoveHandler::with_config(
                self.ledger_service(),
                self.transport(),
                self.transfer.clone(),
            )),
        ];
        let handler = CompositeHandler::new(handlers).await;
        let service = self
            .registry
            .start_service(inventory.clone(), Arc::new(handler))
            .await?;
        attach_handler(self.ledgers.as_ref(), &inventory, &inventory).await?;
        Ok(service)
    }
}
