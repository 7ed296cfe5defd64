//! # Compensating Actions
//!
//! Each mutating handshake step pushes the action that undoes it. On
//! failure they run in registration order; the first failing rollback
//! stops the chain.

use lw_01_ledger::LedgerService;
use lw_02_inventory::InventoryLedger;
use shared_types::{Address, LedgerId};
use std::sync::Arc;
use tracing::warn;

use super::errors::TransferError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rollback {
    /// Give the object back to its previous owners.
    RestoreOwners {
        object: LedgerId,
        authentications: Vec<Address>,
    },
    /// List the object in the inventory again.
    ReAdd { inventory: LedgerId, object: LedgerId },
}

impl Rollback {
    async fn apply(&self, ledgers: &Arc<dyn LedgerService>) -> Result<(), TransferError> {
        match self {
            Rollback::RestoreOwners {
                object,
                authentications,
            } => ledgers
                .set_ownership(object, authentications.clone())
                .await
                .map(|_| ())
                .map_err(TransferError::Ownership),
            Rollback::ReAdd { inventory, object } => {
                InventoryLedger::new(ledgers.clone(), inventory.clone())
                    .add(object)
                    .await
                    .map_err(TransferError::from)
            }
        }
    }
}

/// Registered rollbacks for one handshake.
#[derive(Debug, Default)]
pub struct RollbackPlan {
    steps: Vec<Rollback>,
}

impl RollbackPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Rollback) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every rollback, then hand back `original`, wrapped when a
    /// rollback failed.
    pub async fn unwind(
        self,
        ledgers: &Arc<dyn LedgerService>,
        original: TransferError,
    ) -> TransferError {
        for step in &self.steps {
            if let Err(rollback) = step.apply(ledgers).await {
                warn!(step = ?step, error = %rollback, "[lw-04] Rollback failed");
                return TransferError::Rollback {
                    original: Box::new(original),
                    rollback: Box::new(rollback),
                };
            }
        }
        original
    }
}
