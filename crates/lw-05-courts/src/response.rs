//! Replies to the player who asked for an object.
//!
//! Courts answer a `RequestObjectTransferMessage` with a
//! `TransferredObjectMessage` addressed to the requester's inventory,
//! through its handler or the inventory broadcast topic.

use std::sync::Arc;

use lw_01_ledger::LedgerService;
use lw_03_handlers::{find_handler_or_broadcast, Handler, HandlerError, TopicBroadcastHandler};
use shared_bus::Transport;
use shared_types::{GameMessage, RequestObjectTransferMessage, TransferredObjectMessage};
use tracing::{debug, warn};

pub struct ResponseSender {
    request: RequestObjectTransferMessage,
    handler: Arc<dyn Handler>,
}

impl ResponseSender {
    /// Reply channel for `request`. Lookup failures fall back to broadcast.
    pub async fn for_request(
        ledgers: &dyn LedgerService,
        transport: Arc<dyn Transport>,
        request: &RequestObjectTransferMessage,
    ) -> Self {
        let handler =
            match find_handler_or_broadcast(ledgers, transport.clone(), &request.to).await {
                Ok(handler) => handler,
                Err(e) => {
                    debug!(to = %request.to, error = %e, "[lw-05] Replying by broadcast");
                    Arc::new(TopicBroadcastHandler::for_inventory(transport, &request.to))
                }
            };
        Self {
            request: request.clone(),
            handler,
        }
    }

    /// Tell the requester the object is theirs.
    pub async fn send(&self, message: &str) -> Result<(), HandlerError> {
        let mut reply = TransferredObjectMessage::for_request(&self.request);
        reply.message = message.to_string();
        self.handler.handle(&GameMessage::from(reply)).await
    }

    /// Tell the requester why not. Delivery failures are logged.
    pub async fn reject(&self, error: &str) {
        let mut reply = TransferredObjectMessage::for_request(&self.request);
        reply.error = error.to_string();
        if let Err(e) = self.handler.handle(&GameMessage::from(reply)).await {
            warn!(to = %self.request.to, error = %e, "[lw-05] Could not deliver rejection");
        }
    }
}
