//! # Wire Messages
//!
//! The two messages of the base transfer protocol, the [`GameMessage`] sum
//! type that carries them, and the [`MessageType`] tags handlers use to
//! declare what they accept.
//!
//! ## Flow
//!
//! ```text
//! requester ──RequestObjectTransferMessage──→ source handler
//!                                               │
//!                                               ▼
//!                 destination handler ←──TransferredObjectMessage
//! ```

use crate::entities::LedgerId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pull request sent to the holder of `object`, asking it to move the
/// object from the `from` inventory to the `to` inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestObjectTransferMessage {
    /// Source inventory ledger.
    pub from: LedgerId,
    /// Destination inventory ledger.
    pub to: LedgerId,
    /// Object ledger being moved.
    pub object: LedgerId,
}

/// Notification delivered to the destination once the source has released
/// the object, or a court's answer to a pickup attempt.
///
/// Exactly one of `message`/`error` is normally non-empty. Both empty is a
/// plain transfer notice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferredObjectMessage {
    /// Source inventory ledger.
    pub from: LedgerId,
    /// Destination inventory ledger.
    pub to: LedgerId,
    /// Object ledger that moved.
    pub object: LedgerId,
    /// Human readable success text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Human readable rejection text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl TransferredObjectMessage {
    /// A plain transfer notice for a request.
    pub fn for_request(req: &RequestObjectTransferMessage) -> Self {
        Self {
            from: req.from.clone(),
            to: req.to.clone(),
            object: req.object.clone(),
            ..Default::default()
        }
    }

    /// True when the message carries a rejection.
    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Tag identifying a message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MessageType {
    /// [`RequestObjectTransferMessage`]
    RequestObjectTransfer,
    /// [`TransferredObjectMessage`]
    TransferredObject,
}

impl MessageType {
    /// Every known message type.
    pub const ALL: [MessageType; 2] = [
        MessageType::RequestObjectTransfer,
        MessageType::TransferredObject,
    ];

    /// Stable wire name, as stored in capability declarations.
    pub const fn name(self) -> &'static str {
        match self {
            MessageType::RequestObjectTransfer => "world.RequestObjectTransferMessage",
            MessageType::TransferredObject => "world.TransferredObjectMessage",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MessageType {
    type Err = crate::errors::WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| crate::errors::WorldError::UnknownMessageType(s.to_string()))
    }
}

/// Every message that can travel between handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum GameMessage {
    /// Pull request for an object.
    #[serde(rename = "world.RequestObjectTransferMessage")]
    RequestObjectTransfer(RequestObjectTransferMessage),
    /// Transfer notification or court answer.
    #[serde(rename = "world.TransferredObjectMessage")]
    TransferredObject(TransferredObjectMessage),
}

impl GameMessage {
    /// The tag of this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            GameMessage::RequestObjectTransfer(_) => MessageType::RequestObjectTransfer,
            GameMessage::TransferredObject(_) => MessageType::TransferredObject,
        }
    }

    /// The object the message is about.
    pub fn object(&self) -> &LedgerId {
        match self {
            GameMessage::RequestObjectTransfer(m) => &m.object,
            GameMessage::TransferredObject(m) => &m.object,
        }
    }
}

impl From<RequestObjectTransferMessage> for GameMessage {
    fn from(msg: RequestObjectTransferMessage) -> Self {
        GameMessage::RequestObjectTransfer(msg)
    }
}

impl From<TransferredObjectMessage> for GameMessage {
    fn from(msg: TransferredObjectMessage) -> Self {
        GameMessage::TransferredObject(msg)
    }
}
