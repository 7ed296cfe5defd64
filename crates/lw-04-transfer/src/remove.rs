//! # Unrestricted Remove
//!
//! Send side of the handshake. Releases any listed object to whoever asks,
//! as long as the destination can receive it.

use std::sync::Arc;

use async_trait::async_trait;
use lw_01_ledger::{CommitEvent, LedgerService};
use lw_02_inventory::InventoryLedger;
use lw_03_handlers::{find_handler_or_broadcast, Handler, HandlerError, SupportedMessages};
use shared_bus::Transport;
use shared_types::{
    GameMessage, LedgerId, MessageType, RequestObjectTransferMessage, Tip,
    TransferredObjectMessage,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::domain::{Rollback, RollbackPlan, TransferConfig, TransferError, TransferState};

pub struct UnrestrictedRemoveHandler {
    ledgers: Arc<dyn LedgerService>,
    transport: Arc<dyn Transport>,
    config: TransferConfig,
}

/// Progress of one handshake.
struct Transfer<'a> {
    request: &'a RequestObjectTransferMessage,
    state: TransferState,
    rollbacks: RollbackPlan,
}

impl<'a> Transfer<'a> {
    fn new(request: &'a RequestObjectTransferMessage) -> Self {
        Self {
            request,
            state: TransferState::Requested,
            rollbacks: RollbackPlan::new(),
        }
    }

    fn advance(&mut self, next: TransferState) {
        if !self.state.can_advance_to(next) {
            warn!(from = %self.state, to = %next, "[lw-04] Unexpected transfer state change");
        }
        debug!(
            object = %self.request.object,
            from = %self.state,
            to = %next,
            "[lw-04] Transfer state"
        );
        self.state = next;
    }

    /// Run the registered rollbacks and end in `Rejected`.
    async fn reject(
        mut self,
        ledgers: &Arc<dyn LedgerService>,
        error: TransferError,
    ) -> TransferError {
        let at = self.state;
        self.advance(TransferState::Rejected);
        let rollbacks = std::mem::take(&mut self.rollbacks);
        let steps = rollbacks.len();
        let error = rollbacks.unwind(ledgers, error).await;
        warn!(
            object = %self.request.object,
            from = %self.request.from,
            to = %self.request.to,
            failed_at = %at,
            rollbacks = steps,
            error = %error,
            "[lw-04] Transfer rejected"
        );
        error
    }
}

impl UnrestrictedRemoveHandler {
    pub fn new(ledgers: Arc<dyn LedgerService>, transport: Arc<dyn Transport>) -> Self {
        Self::with_config(ledgers, transport, TransferConfig::default())
    }

    pub fn with_config(
        ledgers: Arc<dyn LedgerService>,
        transport: Arc<dyn Transport>,
        config: TransferConfig,
    ) -> Self {
        Self {
            ledgers,
            transport,
            config,
        }
    }

    pub fn messages() -> SupportedMessages {
        SupportedMessages::new().with(MessageType::RequestObjectTransfer)
    }

    /// Run the send side of the handshake to completion.
    pub async fn transfer(&self, request: &RequestObjectTransferMessage) -> Result<(), TransferError> {
        let mut transfer = Transfer::new(request);

        let source = InventoryLedger::new(self.ledgers.clone(), request.from.clone());
        let source_auths = resolve("source inventory", &request.from, source.authentications().await)?;
        let target = InventoryLedger::new(self.ledgers.clone(), request.to.clone());
        let target_auths = resolve("target inventory", &request.to, target.authentications().await)?;
        resolve(
            "object",
            &request.object,
            self.ledgers.require_ledger(&request.object).await,
        )?;

        let target_handler = resolve(
            "handler for",
            &request.to,
            find_handler_or_broadcast(self.ledgers.as_ref(), self.transport.clone(), &request.to)
                .await,
        )?;

        if !target_handler.supports(MessageType::TransferredObject).await {
            return Err(TransferError::NotSupported(request.to.clone()));
        }

        // Both sides own the object while it is in flight.
        transfer.advance(TransferState::OwnershipReassigning);
        let joint: Vec<_> = source_auths.iter().chain(target_auths.iter()).cloned().collect();
        let joint_tip = match self.ledgers.set_ownership(&request.object, joint).await {
            Ok(snapshot) => snapshot.tip,
            Err(e) => return Err(transfer.reject(&self.ledgers, TransferError::Ownership(e)).await),
        };
        transfer.rollbacks.push(Rollback::RestoreOwners {
            object: request.object.clone(),
            authentications: source_auths,
        });

        transfer.advance(TransferState::SourceRemoving);
        if let Err(e) = source.remove(&request.object).await {
            return Err(transfer.reject(&self.ledgers, e.into()).await);
        }
        transfer.rollbacks.push(Rollback::ReAdd {
            inventory: request.from.clone(),
            object: request.object.clone(),
        });

        transfer.advance(TransferState::DestinationNotifying);
        let commits = self.ledgers.subscribe_commits();
        let notice: GameMessage = TransferredObjectMessage::for_request(request).into();
        if let Err(e) = target_handler.handle(&notice).await {
            return Err(transfer.reject(&self.ledgers, TransferError::Target(e)).await);
        }

        if !self.await_confirmation(commits, &request.object, joint_tip).await {
            let error = TransferError::NotConfirmed {
                object: request.object.clone(),
                timeout: self.config.confirmation_timeout(),
            };
            return Err(transfer.reject(&self.ledgers, error).await);
        }

        transfer.advance(TransferState::Accepted);
        info!(
            object = %request.object,
            from = %request.from,
            to = %request.to,
            "[lw-04] Transfer accepted"
        );
        Ok(())
    }

    /// Wait for any commit that moves the object past `joint_tip`.
    async fn await_confirmation(
        &self,
        mut commits: broadcast::Receiver<CommitEvent>,
        object: &LedgerId,
        joint_tip: Tip,
    ) -> bool {
        let wait = async {
            loop {
                match commits.recv().await {
                    Ok(event) if &event.id == object && event.tip != joint_tip => return true,
                    Ok(_) => {}
                    Err(RecvError::Lagged(_)) => {
                        if self.tip_moved(object, joint_tip).await {
                            return true;
                        }
                    }
                    Err(RecvError::Closed) => return self.tip_moved(object, joint_tip).await,
                }
            }
        };
        tokio::time::timeout(self.config.confirmation_timeout(), wait)
            .await
            .unwrap_or(false)
    }

    async fn tip_moved(&self, object: &LedgerId, joint_tip: Tip) -> bool {
        matches!(
            self.ledgers.get_ledger(object).await,
            Ok(Some(snapshot)) if snapshot.tip != joint_tip
        )
    }
}

fn resolve<T, E: std::fmt::Display>(
    what: &'static str,
    id: &LedgerId,
    result: Result<T, E>,
) -> Result<T, TransferError> {
    result.map_err(|e| TransferError::Resolution {
        what,
        id: id.clone(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl Handler for UnrestrictedRemoveHandler {
    async fn handle(&self, message: &GameMessage) -> Result<(), HandlerError> {
        match message {
            GameMessage::RequestObjectTransfer(request) => Ok(self.transfer(request).await?),
            _ => Err(HandlerError::UnsupportedMessageType),
        }
    }

    async fn supported_messages(&self) -> SupportedMessages {
        Self::messages()
    }
}
