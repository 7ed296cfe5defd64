//! Ledger transactions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{Address, LedgerId};

use super::errors::LedgerError;

/// A single state change carried by a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Transaction {
    /// Write `value` at `path` in the data tree.
    SetData {
        /// Slash-separated path. Empty replaces the root.
        path: String,
        /// New value.
        value: Value,
    },
    /// Replace the authentication set.
    SetOwnership {
        /// New set of addresses allowed to append.
        authentications: Vec<Address>,
    },
    /// Move tokens to another ledger. Recorded but carries no balance logic.
    TokenTransfer {
        /// Token name.
        token: String,
        /// Amount in base units.
        amount: u64,
        /// Receiving ledger.
        destination: LedgerId,
    },
}

impl Transaction {
    /// Build a SetData transaction from any serializable value.
    pub fn set_data<T: Serialize>(path: impl Into<String>, value: &T) -> Result<Self, LedgerError> {
        Ok(Transaction::SetData {
            path: path.into(),
            value: serde_json::to_value(value)?,
        })
    }

    /// Build a SetOwnership transaction.
    pub fn set_ownership(authentications: Vec<Address>) -> Self {
        Transaction::SetOwnership { authentications }
    }

    /// True for ownership changes.
    pub fn is_set_ownership(&self) -> bool {
        matches!(self, Transaction::SetOwnership { .. })
    }

    /// Check the transaction is well formed before it is signed.
    pub fn validate(&self) -> Result<(), LedgerError> {
        match self {
            Transaction::TokenTransfer { amount: 0, .. } => Err(LedgerError::InvalidTransaction(
                "token transfer amount must be positive".into(),
            )),
            Transaction::TokenTransfer { destination, .. } if destination.is_empty() => Err(
                LedgerError::InvalidTransaction("token transfer needs a destination".into()),
            ),
            _ => Ok(()),
        }
    }
}
