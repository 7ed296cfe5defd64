//! # Unrestricted Add
//!
//! Receive side of the handshake. Accepts any object offered to the
//! inventory it serves.

use std::sync::Arc;

use async_trait::async_trait;
use lw_01_ledger::LedgerService;
use lw_02_inventory::InventoryLedger;
use lw_03_handlers::{Handler, HandlerError, SupportedMessages};
use shared_types::{GameMessage, MessageType, TransferredObjectMessage};
use tracing::info;

use crate::domain::TransferError;

pub struct UnrestrictedAddHandler {
    ledgers: Arc<dyn LedgerService>,
}

impl UnrestrictedAddHandler {
    pub fn new(ledgers: Arc<dyn LedgerService>) -> Self {
        Self { ledgers }
    }

    pub fn messages() -> SupportedMessages {
        SupportedMessages::new().with(MessageType::TransferredObject)
    }

    /// List the object and hand it to the inventory's owners. Does nothing
    /// when already listed or when the notice carries a rejection.
    pub async fn receive(&self, msg: &TransferredObjectMessage) -> Result<(), TransferError> {
        if msg.is_error() {
            info!(object = %msg.object, to = %msg.to, error = %msg.error, "[lw-04] Transfer refused");
            return Ok(());
        }

        let target = InventoryLedger::new(self.ledgers.clone(), msg.to.clone());
        let target_auths = target
            .authentications()
            .await
            .map_err(|e| TransferError::Resolution {
                what: "inventory",
                id: msg.to.clone(),
                reason: e.to_string(),
            })?;

        if target.exists(&msg.object).await? {
            return Ok(());
        }
        target.add(&msg.object).await?;

        self.ledgers
            .set_ownership(&msg.object, target_auths)
            .await
            .map_err(TransferError::Ownership)?;

        info!(object = %msg.object, to = %msg.to, "[lw-04] Object received");
        Ok(())
    }
}

#[async_trait]
impl Handler for UnrestrictedAddHandler {
    async fn handle(&self, message: &GameMessage) -> Result<(), HandlerError> {
        match message {
            GameMessage::TransferredObject(msg) => Ok(self.receive(msg).await?),
            _ => Err(HandlerError::UnsupportedMessageType),
        }
    }

    async fn supported_messages(&self) -> SupportedMessages {
        Self::messages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lw_01_ledger::{InMemoryLedger, LedgerKey};
    use lw_02_inventory::create_object;
    use shared_types::RequestObjectTransferMessage;

    #[tokio::test]
    async fn test_receive_lists_and_chowns() {
        let ledgers: Arc<InMemoryLedger> = Arc::new(InMemoryLedger::with_random_key());
        let player_key = LedgerKey::generate();
        let player = ledgers.create_ledger(&player_key).await.unwrap();
        let object = create_object(ledgers.clone(), "lamp").await.unwrap();
        ledgers
            .set_ownership(object.id(), vec![ledgers.node_address(), player_key.address()])
            .await
            .unwrap();

        let handler = UnrestrictedAddHandler::new(ledgers.clone());
        let msg: GameMessage = TransferredObjectMessage {
            from: "did:world:0xsource".into(),
            to: player.id.clone(),
            object: object.id().clone(),
            ..Default::default()
        }
        .into();
        handler.handle(&msg).await.unwrap();

        let inventory = InventoryLedger::new(ledgers.clone(), player.id.clone());
        assert!(inventory.exists(object.id()).await.unwrap());
        assert_eq!(
            object.authentications().await.unwrap(),
            vec![player_key.address()]
        );

        // second delivery is a no-op
        let height = object.snapshot().await.unwrap().height;
        handler.handle(&msg).await.unwrap();
        assert_eq!(object.snapshot().await.unwrap().height, height);
    }

    #[tokio::test]
    async fn test_rejection_notice_changes_nothing() {
        let ledgers: Arc<InMemoryLedger> = Arc::new(InMemoryLedger::with_random_key());
        let player = ledgers.find_or_create_passphrase_ledger("player").await.unwrap();
        let object = create_object(ledgers.clone(), "lamp").await.unwrap();
        let before = object.snapshot().await.unwrap().tip;

        let handler = UnrestrictedAddHandler::new(ledgers.clone());
        let msg: GameMessage = TransferredObjectMessage {
            from: "did:world:0xsource".into(),
            to: player.id.clone(),
            object: object.id().clone(),
            error: "error on pick up: current object has changed - try again".into(),
            ..Default::default()
        }
        .into();
        handler.handle(&msg).await.unwrap();

        let inventory = InventoryLedger::new(ledgers.clone(), player.id.clone());
        assert!(!inventory.exists(object.id()).await.unwrap());
        assert_eq!(object.snapshot().await.unwrap().tip, before);
    }

    #[tokio::test]
    async fn test_rejects_requests() {
        let handler = UnrestrictedAddHandler::new(Arc::new(InMemoryLedger::with_random_key()));
        let msg: GameMessage = RequestObjectTransferMessage {
            from: "a".into(),
            to: "b".into(),
            object: "c".into(),
        }
        .into();
        assert!(matches!(
            handler.handle(&msg).await,
            Err(HandlerError::UnsupportedMessageType)
        ));
    }
}
