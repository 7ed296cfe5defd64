//! # Capability Sets
//!
//! [`SupportedMessages`] is what a handler declares and what is written to
//! `world/handler/supports`. On the ledger it is a list of stable message
//! type names.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shared_types::MessageType;
use tracing::warn;

/// Set of message types a handler accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportedMessages(BTreeSet<MessageType>);

impl SupportedMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, message_type: MessageType) -> Self {
        self.0.insert(message_type);
        self
    }

    pub fn insert(&mut self, message_type: MessageType) -> bool {
        self.0.insert(message_type)
    }

    pub fn contains(&self, message_type: MessageType) -> bool {
        self.0.contains(&message_type)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = MessageType> + '_ {
        self.0.iter().copied()
    }

    /// Union of two sets.
    pub fn union(&self, other: &SupportedMessages) -> SupportedMessages {
        SupportedMessages(self.0.union(&other.0).copied().collect())
    }

    /// Stable wire names in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(MessageType::name).collect()
    }

    /// Parse wire names. Unknown names are logged and skipped so an older
    /// node can still talk to a handler declaring newer messages.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut set = Self::new();
        for name in names {
            match name.as_ref().parse::<MessageType>() {
                Ok(t) => {
                    set.insert(t);
                }
                Err(e) => warn!(error = %e, "[lw-03] Skipping unknown supported message"),
            }
        }
        set
    }
}

impl FromIterator<MessageType> for SupportedMessages {
    fn from_iter<I: IntoIterator<Item = MessageType>>(iter: I) -> Self {
        SupportedMessages(iter.into_iter().collect())
    }
}

impl Serialize for SupportedMessages {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.names().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SupportedMessages {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        Ok(Self::from_names(&names))
    }
}
