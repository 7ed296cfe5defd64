//! # Reconciliation Sweep
//!
//! A handshake interrupted between its ledger writes can leave an inventory
//! listing an object that has moved on. The sweep drops every listing whose
//! object is unknown or whose owners share no address with the inventory
//! owner.

use std::sync::Arc;

use lw_01_ledger::LedgerService;
use lw_02_inventory::InventoryLedger;
use shared_types::LedgerId;
use tracing::{info, warn};

use crate::domain::TransferError;

pub struct Reconciler {
    ledgers: Arc<dyn LedgerService>,
}

impl Reconciler {
    pub fn new(ledgers: Arc<dyn LedgerService>) -> Self {
        Self { ledgers }
    }

    /// Remove stale listings from `inventory`, returning the removed ids.
    pub async fn sweep(&self, inventory: &LedgerId) -> Result<Vec<LedgerId>, TransferError> {
        let inventory = InventoryLedger::new(self.ledgers.clone(), inventory.clone());
        let owner_auths = inventory.authentications().await?;

        let mut removed = Vec::new();
        for object in inventory.all().await?.into_keys() {
            let stale = match self.ledgers.get_ledger(&object).await {
                Ok(Some(snapshot)) => !snapshot
                    .authentications
                    .iter()
                    .any(|a| owner_auths.contains(a)),
                Ok(None) => true,
                Err(e) => {
                    warn!(object = %object, error = %e, "[lw-04] Skipping object during sweep");
                    false
                }
            };
            if stale {
                inventory.remove(&object).await?;
                removed.push(object);
            }
        }

        if !removed.is_empty() {
            info!(
                inventory = %inventory.id(),
                removed = removed.len(),
                "[lw-04] Reconciled inventory"
            );
        }
        Ok(removed)
    }
}
