//! # Composite Handler
//!
//! Ordered children indexed by message type at construction:
//!
//! ```text
//! table: TransferredObject     → [0, 2]
//!        RequestObjectTransfer → [1]
//! ```
//!
//! `handle` runs every registered child in order and stops at the first
//! error. A type with no entry is rejected before any child runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{GameMessage, MessageType};

use crate::domain::{HandlerError, SupportedMessages};
use crate::ports::Handler;

pub struct CompositeHandler {
    handlers: Vec<Arc<dyn Handler>>,
    table: HashMap<MessageType, Vec<usize>>,
    supported: SupportedMessages,
}

impl CompositeHandler {
    /// Build the dispatch table from each child's declared set.
    pub async fn new(handlers: Vec<Arc<dyn Handler>>) -> Self {
        let mut table: HashMap<MessageType, Vec<usize>> = HashMap::new();
        let mut supported = SupportedMessages::new();

        for (index, handler) in handlers.iter().enumerate() {
            for message_type in handler.supported_messages().await.iter() {
                table.entry(message_type).or_default().push(index);
                supported.insert(message_type);
            }
        }

        Self {
            handlers,
            table,
            supported,
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl Handler for CompositeHandler {
    async fn handle(&self, message: &GameMessage) -> Result<(), HandlerError> {
        let Some(indexes) = self.table.get(&message.message_type()) else {
            return Err(HandlerError::UnsupportedMessageType);
        };
        for &index in indexes {
            self.handlers[index].handle(message).await?;
        }
        Ok(())
    }

    async fn supported_messages(&self) -> SupportedMessages {
        self.supported.clone()
    }
}
