//! Error types for the ledger facade.

use shared_types::LedgerId;
use thiserror::Error;

/// Ledger facade errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// No ledger with this id.
    #[error("ledger not found: {0}")]
    NotFound(LedgerId),

    /// A ledger with this id was already created.
    #[error("ledger already exists: {0}")]
    AlreadyExists(LedgerId),

    /// No key held by this node is in the ledger's authentication set.
    #[error("unauthorized append to {id}: {reason}")]
    Unauthorized {
        /// Ledger that rejected the append.
        id: LedgerId,
        /// Why no signer qualified.
        reason: String,
    },

    /// A path could not be used for addressing.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A transaction was malformed.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// No snapshot with this tip.
    #[error("unknown tip: {0}")]
    UnknownTip(String),

    /// Encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A block signature failed to verify.
    #[error("signature error: {0}")]
    Signature(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}
