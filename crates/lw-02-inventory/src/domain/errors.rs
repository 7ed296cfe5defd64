//! Error types for inventory and object views.

use lw_01_ledger::LedgerError;
use shared_types::LedgerId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The object ledger has no string at `world/name`.
    #[error("object {0} has no name")]
    MissingName(LedgerId),

    /// A value under a reserved path had the wrong shape.
    #[error("unexpected value at {path} on {id}: {reason}")]
    Malformed {
        id: LedgerId,
        path: String,
        reason: String,
    },
}

impl From<serde_json::Error> for InventoryError {
    fn from(e: serde_json::Error) -> Self {
        InventoryError::Ledger(LedgerError::from(e))
    }
}
