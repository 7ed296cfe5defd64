//! Error types for the handler family.

use std::time::Duration;

use lw_01_ledger::LedgerError;
use lw_02_inventory::InventoryError;
use shared_bus::TransportError;
use shared_types::LedgerId;
use thiserror::Error;

/// Boxed error raised by a handler defined outside this crate.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum HandlerError {
    /// The message type is not in the handler's supported set.
    #[error("message type is not supported")]
    UnsupportedMessageType,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A request to a mailbox got no answer in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The service behind a mailbox has stopped.
    #[error("mailbox closed for {0}")]
    MailboxClosed(LedgerId),

    /// A service is already running for this ledger id.
    #[error("service already running for {0}")]
    DuplicateService(LedgerId),

    /// Failure inside a handler implemented by another crate.
    #[error(transparent)]
    Component(BoxError),

    #[error("{0}")]
    Other(String),
}

impl HandlerError {
    /// Wrap a component error.
    pub fn component<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HandlerError::Component(Box::new(error))
    }

    /// Downcast a component error back to its concrete type.
    pub fn as_component<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            HandlerError::Component(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}
