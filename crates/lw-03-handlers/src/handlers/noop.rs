//! Handler that accepts nothing.

use async_trait::async_trait;
use shared_types::GameMessage;

use crate::domain::{HandlerError, SupportedMessages};
use crate::ports::Handler;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

#[async_trait]
impl Handler for NoopHandler {
    async fn handle(&self, _message: &GameMessage) -> Result<(), HandlerError> {
        Err(HandlerError::UnsupportedMessageType)
    }

    async fn supported_messages(&self) -> SupportedMessages {
        SupportedMessages::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{MessageType, RequestObjectTransferMessage};

    #[tokio::test]
    async fn test_noop_rejects_everything() {
        let msg: GameMessage = RequestObjectTransferMessage {
            from: "a".into(),
            to: "b".into(),
            object: "c".into(),
        }
        .into();
        assert!(matches!(
            NoopHandler.handle(&msg).await,
            Err(HandlerError::UnsupportedMessageType)
        ));
        for t in MessageType::ALL {
            assert!(!NoopHandler.supports(t).await);
        }
    }
}
