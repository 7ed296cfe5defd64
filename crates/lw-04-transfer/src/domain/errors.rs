//! Error types for the transfer handshake.

use std::time::Duration;

use lw_01_ledger::LedgerError;
use lw_02_inventory::InventoryError;
use lw_03_handlers::HandlerError;
use shared_types::LedgerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    /// The destination handler does not accept `TransferredObjectMessage`.
    #[error("transfer to inventory {0} is not supported")]
    NotSupported(LedgerId),

    /// A ledger needed by the handshake could not be resolved.
    #[error("error fetching {what} {id}: {reason}")]
    Resolution {
        what: &'static str,
        id: LedgerId,
        reason: String,
    },

    #[error("error changing object owner: {0}")]
    Ownership(LedgerError),

    #[error("error updating objects in inventory: {0}")]
    Inventory(#[from] InventoryError),

    #[error("error with target handler: {0}")]
    Target(HandlerError),

    /// The receiver did not act on the object in time.
    #[error("error transferring object, receiver never confirmed {object} within {timeout:?}")]
    NotConfirmed { object: LedgerId, timeout: Duration },

    /// A compensating action failed. Later rollbacks were not attempted.
    #[error("{original}; error on rollback: {rollback}")]
    Rollback {
        original: Box<TransferError>,
        rollback: Box<TransferError>,
    },
}

impl From<TransferError> for HandlerError {
    fn from(e: TransferError) -> Self {
        HandlerError::component(e)
    }
}
