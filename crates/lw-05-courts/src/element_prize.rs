//! Prize validator for element courts: the player must hold the winning
//! element, minted by this node.

use std::sync::Arc;

use async_trait::async_trait;
use lw_01_ledger::LedgerService;
use lw_02_inventory::InventoryLedger;
use shared_types::RequestObjectTransferMessage;
use tracing::debug;

use crate::domain::{element_name, CourtError};
use crate::origin::validate_element_origin;
use crate::ports::PrizeValidator;

pub struct ElementPrizeValidator {
    ledgers: Arc<dyn LedgerService>,
    winning_element: i64,
    fail_message: String,
}

impl ElementPrizeValidator {
    pub fn new(
        ledgers: Arc<dyn LedgerService>,
        winning_element: i64,
        fail_message: impl Into<String>,
    ) -> Self {
        Self {
            ledgers,
            winning_element,
            fail_message: fail_message.into(),
        }
    }
}

#[async_trait]
impl PrizeValidator for ElementPrizeValidator {
    async fn validate(&self, request: &RequestObjectTransferMessage) -> Result<bool, CourtError> {
        let inventory = InventoryLedger::new(self.ledgers.clone(), request.to.clone());
        let name = element_name(self.winning_element);
        let held = inventory.did_for_name(&name).await?;
        if held.is_empty() {
            debug!(player = %request.to, element = %name, "[lw-05] Winning element not held");
            return Err(CourtError::rejected(self.fail_message.clone()));
        }

        let origin = [self.ledgers.node_address()];
        if !validate_element_origin(self.ledgers.as_ref(), &held, &origin).await? {
            debug!(player = %request.to, object = %held, "[lw-05] Winning element is forged");
            return Err(CourtError::rejected(self.fail_message.clone()));
        }
        Ok(true)
    }
}
