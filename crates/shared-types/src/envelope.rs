//! # Transport Envelope
//!
//! Wrapper for every message published on the transport. The topic is kept
//! on the envelope so a single broadcast channel can serve all subscribers,
//! each filtering on the topics it asked for.

use crate::ipc::GameMessage;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// A message in flight on a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Protocol version for forward compatibility.
    pub version: u16,
    /// Unique id of this delivery, used for log correlation.
    pub correlation_id: Uuid,
    /// Topic the message was published on.
    pub topic: String,
    /// Unix timestamp (seconds) at publish time.
    pub timestamp: u64,
    /// The message itself.
    pub message: GameMessage,
}

impl Envelope {
    /// Current protocol version.
    pub const CURRENT_VERSION: u16 = 1;

    /// Wrap a message for a topic.
    pub fn new(topic: impl Into<String>, message: GameMessage) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            version: Self::CURRENT_VERSION,
            correlation_id: Uuid::new_v4(),
            topic: topic.into(),
            timestamp,
            message,
        }
    }
}
