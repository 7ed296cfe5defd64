//! # Subscriber
//!
//! The subscription side of the transport.

use shared_types::Envelope;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::debug;
use uuid::Uuid;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The transport was dropped.
    #[error("Transport closed")]
    Closed,
}

/// Counts one live subscription on a topic for as long as it exists.
pub(crate) struct Registration {
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,
    topic: String,
}

impl Registration {
    pub(crate) fn new(subscriptions: Arc<RwLock<HashMap<String, usize>>>, topic: &str) -> Self {
        if let Ok(mut subs) = subscriptions.write() {
            *subs.entry(topic.to_string()).or_insert(0) += 1;
        }
        Self {
            subscriptions,
            topic: topic.to_string(),
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let Ok(mut subs) = self.subscriptions.write() else {
            return;
        };
        if let Some(count) = subs.get_mut(&self.topic) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                subs.remove(&self.topic);
            }
        }
        debug!(topic = %self.topic, "Subscription dropped");
    }
}

/// Identifies a callback subscription so it can be removed later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    id: Uuid,
    topic: String,
}

impl SubscriptionHandle {
    pub(crate) fn new(topic: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.to_string(),
        }
    }

    /// Unique id of the subscription.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Topic subscribed to.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// A subscription to one topic.
///
/// Dropping it unsubscribes.
pub struct Subscription {
    receiver: broadcast::Receiver<Envelope>,
    registration: Registration,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<Envelope>, registration: Registration) -> Self {
        Self {
            receiver,
            registration,
        }
    }

    /// Topic of this subscription.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.registration.topic
    }

    /// Receive the next envelope published on the topic.
    ///
    /// # Returns
    ///
    /// - `Some(envelope)` - The next envelope on the topic
    /// - `None` - The transport was dropped
    pub async fn recv(&mut self) -> Option<Envelope> {
        loop {
            let envelope = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "Subscriber lagged, some messages dropped");
                    continue;
                }
            };

            if envelope.topic == self.registration.topic {
                return Some(envelope);
            }
        }
    }

    /// Try to receive the next envelope without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(envelope))` - An envelope was available on the topic
    /// - `Ok(None)` - Nothing available (would block)
    /// - `Err(SubscriptionError::Closed)` - The transport was dropped
    pub fn try_recv(&mut self) -> Result<Option<Envelope>, SubscriptionError> {
        loop {
            let envelope = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };

            if envelope.topic == self.registration.topic {
                return Ok(Some(envelope));
            }
        }
    }

    /// Convert into a `Stream` of envelopes on the topic.
    #[must_use]
    pub fn into_stream(self) -> MessageStream {
        MessageStream {
            inner: Box::pin(BroadcastStream::new(self.receiver)),
            registration: self.registration,
        }
    }
}

/// A stream wrapper for subscriptions.
///
/// Implements `tokio_stream::Stream` for use with stream combinators.
pub struct MessageStream {
    inner: Pin<Box<BroadcastStream<Envelope>>>,
    registration: Registration,
}

impl MessageStream {
    /// Topic of the underlying subscription.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.registration.topic
    }
}

impl Stream for MessageStream {
    type Item = Envelope;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(envelope))) => {
                    if envelope.topic == self.registration.topic {
                        return Poll::Ready(Some(envelope));
                    }
                }
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(count)))) => {
                    debug!(lagged = count, "Stream lagged, some messages dropped");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::publisher::{InMemoryTransport, Transport};
    use shared_types::{GameMessage, RequestObjectTransferMessage};
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    fn request(object: &str) -> GameMessage {
        RequestObjectTransferMessage {
            from: "s".into(),
            to: "d".into(),
            object: object.into(),
        }
        .into()
    }

    #[tokio::test]
    async fn test_subscription_recv() {
        let bus = InMemoryTransport::new();
        let mut sub = bus.subscribe("t");

        bus.publish("t", request("o1")).await.unwrap();

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("envelope");

        assert_eq!(received.topic, "t");
        assert_eq!(received.message, request("o1"));
    }

    #[tokio::test]
    async fn test_subscription_filters_other_topics() {
        let bus = InMemoryTransport::new();
        let mut sub = bus.subscribe("mine");
        let _other = bus.subscribe("theirs");

        bus.publish("theirs", request("skip")).await.unwrap();
        bus.publish("mine", request("keep")).await.unwrap();

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("envelope");
        assert_eq!(received.message, request("keep"));
    }

    #[tokio::test]
    async fn test_subscription_drop_cleanup() {
        let bus = InMemoryTransport::new();

        {
            let _sub1 = bus.subscribe("t");
            let _sub2 = bus.subscribe("t");
            assert_eq!(bus.subscriber_count("t"), 2);
        }

        assert_eq!(bus.subscriber_count("t"), 0);
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = InMemoryTransport::new();
        let mut sub = bus.subscribe("t");

        assert!(matches!(sub.try_recv(), Ok(None)));
    }

    #[tokio::test]
    async fn test_stream_yields_topic_messages() {
        let bus = InMemoryTransport::new();
        let mut stream = bus.subscribe("t").into_stream();
        assert_eq!(stream.topic(), "t");

        bus.publish("t", request("a")).await.unwrap();
        bus.publish("t", request("b")).await.unwrap();

        let first = timeout(Duration::from_millis(100), stream.next())
            .await
            .expect("timeout")
            .expect("envelope");
        let second = timeout(Duration::from_millis(100), stream.next())
            .await
            .expect("timeout")
            .expect("envelope");
        assert_eq!(first.message, request("a"));
        assert_eq!(second.message, request("b"));
    }
}
