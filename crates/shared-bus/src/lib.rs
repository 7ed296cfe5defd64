//! # Shared Bus - Topic Transport for Handler Messages
//!
//! The pub/sub transport that carries [`GameMessage`]s to remote handlers.
//!
//! ## Addressing
//!
//! | Topic | Built by | Who listens |
//! |-------|----------|-------------|
//! | `<handler ledger id>` | [`topic_for`] | the service mailbox of that handler |
//! | `<inventory ledger id>/inventory` | [`inventory_topic_for`] | clients watching an inventory without a handler |
//!
//! ## Delivery
//!
//! ```text
//! ┌──────────────┐  publish(topic, msg)   ┌──────────────┐
//! │ Handler A    │ ─────────┐             │ Mailbox B    │
//! └──────────────┘          ▼             └──────────────┘
//!                   ┌──────────────┐              ↑
//!                   │  Transport   │ ─────────────┘
//!                   └──────────────┘  subscribe(topic)
//! ```
//!
//! Delivery is at-most-once and best effort. A publish to a topic nobody is
//! subscribed to is dropped and reported as zero receivers.
//!
//! [`GameMessage`]: shared_types::GameMessage

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod publisher;
pub mod subscriber;
pub mod topics;

/// Test doubles (RecordingTransport)
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export main types
pub use publisher::{InMemoryTransport, MessageCallback, Transport, TransportError};
pub use subscriber::{MessageStream, Subscription, SubscriptionError, SubscriptionHandle};
pub use topics::{inventory_topic_for, topic_for};

/// Current protocol version for transport envelopes.
pub const PROTOCOL_VERSION: u16 = shared_types::Envelope::CURRENT_VERSION;

/// Maximum envelopes buffered per subscriber before the slowest one lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_version() {
        assert_eq!(PROTOCOL_VERSION, 1);
    }

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
