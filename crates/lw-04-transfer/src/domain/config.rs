//! Transfer timeouts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// How long the source waits for the receiver to act on the object.
    pub confirmation_timeout_secs: u64,
    /// How long a local `supports` query waits for its mailbox.
    pub local_supports_timeout_ms: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: 20,
            local_supports_timeout_ms: 1000,
        }
    }
}

impl TransferConfig {
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn local_supports_timeout(&self) -> Duration {
        Duration::from_millis(self.local_supports_timeout_ms)
    }
}
