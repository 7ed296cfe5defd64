//! # Transport
//!
//! The publishing side of the bus and the in-memory implementation.

use crate::subscriber::{Registration, Subscription, SubscriptionHandle};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use shared_types::{Envelope, GameMessage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Callback invoked for every envelope on a topic.
pub type MessageCallback = Arc<dyn Fn(Envelope) + Send + Sync>;

/// Errors from transport operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The envelope could not be encoded or decoded for the wire.
    #[error("envelope codec error: {0}")]
    Codec(String),
}

/// Topic pub/sub used to reach handlers that live elsewhere.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish a message to a topic.
    ///
    /// # Returns
    ///
    /// The number of subscriptions on the topic at publish time. Zero means
    /// the message was dropped.
    async fn publish(&self, topic: &str, message: GameMessage) -> Result<usize, TransportError>;

    /// Subscribe to a topic, receiving envelopes through the returned handle.
    fn subscribe(&self, topic: &str) -> Subscription;

    /// Subscribe to a topic with a callback driven by a background task.
    ///
    /// Must be called from within a Tokio runtime.
    fn subscribe_with(&self, topic: &str, callback: MessageCallback) -> SubscriptionHandle;

    /// Stop a callback subscription. Returns false if it was already gone.
    fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool;

    /// Total messages published since creation.
    fn messages_published(&self) -> u64;
}

/// In-memory transport.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer delivery.
/// Every envelope is passed through its JSON wire encoding so that anything
/// published here would survive a real network hop.
pub struct InMemoryTransport {
    /// Broadcast sender for envelopes.
    sender: broadcast::Sender<Envelope>,

    /// Active subscription count by topic.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    /// Background tasks of callback subscriptions.
    callbacks: Mutex<HashMap<uuid::Uuid, JoinHandle<()>>>,

    /// Total messages published.
    messages_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryTransport {
    /// Create a new transport with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new transport with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            callbacks: Mutex::new(HashMap::new()),
            messages_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Number of live subscriptions on a topic.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscriptions
            .read()
            .ok()
            .and_then(|subs| subs.get(topic).copied())
            .unwrap_or(0)
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn wire_roundtrip(envelope: &Envelope) -> Result<Envelope, TransportError> {
        let bytes =
            serde_json::to_vec(envelope).map_err(|e| TransportError::Codec(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Codec(e.to_string()))
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn publish(&self, topic: &str, message: GameMessage) -> Result<usize, TransportError> {
        let message_type = message.message_type();
        let envelope = Self::wire_roundtrip(&Envelope::new(topic, message))?;

        // Always increment counter (publish was attempted)
        self.messages_published.fetch_add(1, Ordering::Relaxed);

        let receivers = self.subscriber_count(topic);
        if receivers == 0 {
            debug!(topic, message_type = %message_type, "Message dropped (no subscribers)");
            return Ok(0);
        }

        if let Err(e) = self.sender.send(envelope) {
            warn!(topic, error = %e, "Message dropped (channel closed)");
            return Ok(0);
        }

        debug!(topic, message_type = %message_type, receivers, "Message published");
        Ok(receivers)
    }

    fn subscribe(&self, topic: &str) -> Subscription {
        let receiver = self.sender.subscribe();
        let registration = Registration::new(self.subscriptions.clone(), topic);
        debug!(topic, "New subscription created");
        Subscription::new(receiver, registration)
    }

    fn subscribe_with(&self, topic: &str, callback: MessageCallback) -> SubscriptionHandle {
        let mut subscription = self.subscribe(topic);
        let handle = SubscriptionHandle::new(topic);

        let task = tokio::spawn(async move {
            while let Some(envelope) = subscription.recv().await {
                callback(envelope);
            }
        });

        if let Ok(mut callbacks) = self.callbacks.lock() {
            callbacks.insert(handle.id(), task);
        }
        handle
    }

    fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let task = self
            .callbacks
            .lock()
            .ok()
            .and_then(|mut callbacks| callbacks.remove(&handle.id()));

        match task {
            Some(task) => {
                task.abort();
                debug!(topic = %handle.topic(), "Callback subscription removed");
                true
            }
            None => false,
        }
    }

    fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::TransferredObjectMessage;
    use std::time::Duration;

    fn notice() -> GameMessage {
        TransferredObjectMessage {
            from: "from".into(),
            to: "to".into(),
            object: "obj".into(),
            ..Default::default()
        }
        .into()
    }

    #[tokio::test]
    async fn test_publish_no_subscribers() {
        let bus = InMemoryTransport::new();

        let receivers = bus.publish("nobody", notice()).await.unwrap();
        assert_eq!(receivers, 0);
        assert_eq!(bus.messages_published(), 1);
    }

    #[tokio::test]
    async fn test_publish_counts_only_matching_topic() {
        let bus = InMemoryTransport::new();

        let _a = bus.subscribe("a");
        let _a2 = bus.subscribe("a");
        let _b = bus.subscribe("b");

        assert_eq!(bus.publish("a", notice()).await.unwrap(), 2);
        assert_eq!(bus.publish("b", notice()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_callback_subscription_and_unsubscribe() {
        let bus = InMemoryTransport::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let handle = bus.subscribe_with(
            "topic",
            Arc::new(move |env: Envelope| {
                let _ = tx.send(env.message);
            }),
        );

        bus.publish("topic", notice()).await.unwrap();
        let got = tokio::time::timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("timeout")
            .expect("message");
        assert_eq!(got, notice());

        assert!(bus.unsubscribe(&handle));
        assert!(!bus.unsubscribe(&handle));

        // aborted task drops its subscription
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(bus.subscriber_count("topic"), 0);
    }

    #[tokio::test]
    async fn test_custom_capacity() {
        let bus = InMemoryTransport::with_capacity(100);
        assert_eq!(bus.capacity(), 100);
    }

    #[test]
    fn test_default_transport() {
        let bus = InMemoryTransport::default();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count("any"), 0);
        assert_eq!(bus.messages_published(), 0);
    }
}
