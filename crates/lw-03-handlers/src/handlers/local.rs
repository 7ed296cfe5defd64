//! # Local Handler
//!
//! Reaches a service running in this process through its mailbox instead
//! of the transport.

use std::time::Duration;

use async_trait::async_trait;
use shared_types::{GameMessage, LedgerId};
use tracing::debug;

use crate::domain::{HandlerError, SupportedMessages};
use crate::ports::Handler;
use crate::service::ServiceHandle;

/// How long `supports` waits for the mailbox to answer.
pub const DEFAULT_SUPPORTS_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct LocalHandler {
    service: ServiceHandle,
    supports_timeout: Duration,
}

impl LocalHandler {
    pub fn new(service: ServiceHandle) -> Self {
        Self::with_timeout(service, DEFAULT_SUPPORTS_TIMEOUT)
    }

    pub fn with_timeout(service: ServiceHandle, supports_timeout: Duration) -> Self {
        Self {
            service,
            supports_timeout,
        }
    }

    pub fn id(&self) -> &LedgerId {
        self.service.id()
    }
}

#[async_trait]
impl Handler for LocalHandler {
    /// Fire-and-forget: returns once the message is queued. The mailbox is
    /// asked for its supported set first.
    async fn handle(&self, message: &GameMessage) -> Result<(), HandlerError> {
        let supported = self
            .service
            .supported_messages(self.supports_timeout)
            .await?;
        if !supported.contains(message.message_type()) {
            return Err(HandlerError::UnsupportedMessageType);
        }
        self.service.send(message.clone()).await
    }

    /// Empty when the mailbox does not answer in time.
    async fn supported_messages(&self) -> SupportedMessages {
        match self.service.supported_messages(self.supports_timeout).await {
            Ok(supported) => supported,
            Err(e) => {
                debug!(service = %self.service.id(), error = %e, "[lw-03] Supports query failed");
                SupportedMessages::new()
            }
        }
    }
}
