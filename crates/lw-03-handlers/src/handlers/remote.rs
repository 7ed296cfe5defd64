//! # Remote Handler
//!
//! A handler resolved from the capability registry. Delivery is a publish on
//! the handler ledger's topic; whichever service owns that ledger's mailbox
//! picks it up.

use std::sync::Arc;

use async_trait::async_trait;
use shared_bus::{topic_for, Transport};
use shared_types::{GameMessage, LedgerId};
use tracing::debug;

use crate::domain::{HandlerError, SupportedMessages};
use crate::ports::Handler;

pub struct RemoteHandler {
    id: LedgerId,
    supported: SupportedMessages,
    peers: Vec<String>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for RemoteHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteHandler")
            .field("id", &self.id)
            .field("supported", &self.supported)
            .field("peers", &self.peers)
            .finish()
    }
}

impl RemoteHandler {
    pub fn new(
        id: LedgerId,
        supported: SupportedMessages,
        peers: Vec<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            id,
            supported,
            peers,
            transport,
        }
    }

    /// Handler ledger id.
    pub fn id(&self) -> &LedgerId {
        &self.id
    }

    /// Hex public keys of the peers serving this handler. Empty when none
    /// are declared.
    pub fn peer_public_keys(&self) -> &[String] {
        &self.peers
    }

    pub fn topic(&self) -> String {
        topic_for(&self.id)
    }
}

#[async_trait]
impl Handler for RemoteHandler {
    async fn handle(&self, message: &GameMessage) -> Result<(), HandlerError> {
        if !self.supported.contains(message.message_type()) {
            return Err(HandlerError::UnsupportedMessageType);
        }
        let topic = self.topic();
        let receivers = self.transport.publish(&topic, message.clone()).await?;
        if receivers == 0 {
            debug!(handler = %self.id, "[lw-03] No service listening on handler topic");
        }
        Ok(())
    }

    async fn supported_messages(&self) -> SupportedMessages {
        self.supported.clone()
    }
}
