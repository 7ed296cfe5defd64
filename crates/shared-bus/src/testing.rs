//! Test doubles for transport consumers.
//!
//! Available inside this crate's tests and, for other crates, with the
//! `test-utils` feature flag.

use std::sync::Mutex;

use async_trait::async_trait;
use shared_types::GameMessage;

use crate::publisher::{InMemoryTransport, MessageCallback, Transport, TransportError};
use crate::subscriber::{Subscription, SubscriptionHandle};

/// In-memory transport that keeps a log of every publish.
///
/// Delivery behaves exactly like [`InMemoryTransport`]; the log only adds
/// the topic and message of each call in publish order.
#[derive(Default)]
pub struct RecordingTransport {
    inner: InMemoryTransport,
    published: Mutex<Vec<(String, GameMessage)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(topic, message)` published so far.
    pub fn published(&self) -> Vec<(String, GameMessage)> {
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Messages published on `topic`, oldest first.
    pub fn published_on(&self, topic: &str) -> Vec<GameMessage> {
        self.published()
            .into_iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, message)| message)
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn publish(&self, topic: &str, message: GameMessage) -> Result<usize, TransportError> {
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((topic.to_string(), message.clone()));
        self.inner.publish(topic, message).await
    }

    fn subscribe(&self, topic: &str) -> Subscription {
        self.inner.subscribe(topic)
    }

    fn subscribe_with(&self, topic: &str, callback: MessageCallback) -> SubscriptionHandle {
        self.inner.subscribe_with(topic, callback)
    }

    fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        self.inner.unsubscribe(handle)
    }

    fn messages_published(&self) -> u64 {
        self.inner.messages_published()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::TransferredObjectMessage;

    #[tokio::test]
    async fn test_records_publishes_without_listeners() {
        let transport = RecordingTransport::new();
        let message: GameMessage = TransferredObjectMessage::default().into();

        let receivers = transport.publish("nobody", message.clone()).await.unwrap();

        assert_eq!(receivers, 0);
        assert_eq!(transport.published_on("nobody"), vec![message]);
        assert!(transport.published_on("elsewhere").is_empty());
        assert_eq!(transport.messages_published(), 1);
    }
}
