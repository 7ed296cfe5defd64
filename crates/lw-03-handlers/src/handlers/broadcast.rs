//! # Topic Broadcast Handler
//!
//! Fallback used when a destination inventory has no handler attached: the
//! message is published on `<inventory id>/inventory`, where whoever holds
//! the inventory is expected to listen.
//!
//! It declares no messages but supports every type, so the transfer
//! capability check never blocks a broadcast destination.

use std::sync::Arc;

use async_trait::async_trait;
use shared_bus::{inventory_topic_for, Transport};
use shared_types::{GameMessage, LedgerId, MessageType};
use tracing::debug;

use crate::domain::{HandlerError, SupportedMessages};
use crate::ports::Handler;

pub struct TopicBroadcastHandler {
    topic: String,
    transport: Arc<dyn Transport>,
}

impl TopicBroadcastHandler {
    pub fn new(transport: Arc<dyn Transport>, topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            transport,
        }
    }

    /// Broadcast on the inventory topic of `inventory`.
    pub fn for_inventory(transport: Arc<dyn Transport>, inventory: &LedgerId) -> Self {
        Self::new(transport, inventory_topic_for(inventory))
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl Handler for TopicBroadcastHandler {
    async fn handle(&self, message: &GameMessage) -> Result<(), HandlerError> {
        let receivers = self.transport.publish(&self.topic, message.clone()).await?;
        debug!(
            topic = %self.topic,
            message_type = %message.message_type(),
            receivers,
            "[lw-03] Broadcast message"
        );
        Ok(())
    }

    async fn supported_messages(&self) -> SupportedMessages {
        SupportedMessages::new()
    }

    async fn supports(&self, _message_type: MessageType) -> bool {
        true
    }
}
