//! # Ports
//!
//! The [`Handler`] capability set shared by every handler in the world.

use async_trait::async_trait;
use shared_types::{GameMessage, MessageType};

use crate::domain::{HandlerError, SupportedMessages};

/// A unit that accepts typed messages for an entity.
///
/// Implementations must return [`HandlerError::UnsupportedMessageType`] for
/// any message whose type is absent from [`Handler::supported_messages`].
#[async_trait]
pub trait Handler: Send + Sync {
    /// Process one message.
    async fn handle(&self, message: &GameMessage) -> Result<(), HandlerError>;

    /// Message types this handler declares.
    async fn supported_messages(&self) -> SupportedMessages;

    /// Whether `message_type` is accepted.
    async fn supports(&self, message_type: MessageType) -> bool {
        self.supported_messages().await.contains(message_type)
    }
}
