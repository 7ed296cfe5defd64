//! Error types for courts.

use lw_01_ledger::LedgerError;
use lw_02_inventory::InventoryError;
use lw_03_handlers::HandlerError;
use lw_04_transfer::TransferError;
use shared_types::LedgerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CourtError {
    /// Business rejection. The text is shown to the player.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Court content is missing or malformed.
    #[error("invalid court content: {0}")]
    Content(String),

    /// A location is already served by another handler.
    #[error("location {location} already has handler {existing}")]
    HandlerConflict { location: LedgerId, existing: String },

    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl CourtError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        CourtError::Rejected(reason.into())
    }
}

impl From<CourtError> for HandlerError {
    fn from(e: CourtError) -> Self {
        HandlerError::component(e)
    }
}

/// Errors the host process must not survive.
///
/// A court that cannot put a new object in place after handing one out
/// leaves the puzzle unsolvable for everyone else.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalError {
    #[error("error on respawn by {component} at {location}: {reason}")]
    RespawnFailed {
        component: String,
        location: LedgerId,
        reason: String,
    },
}
