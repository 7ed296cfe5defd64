//! # Interactions
//!
//! Command descriptors stored under `world/interactions/<command>`. The
//! protocol only writes them; a client interprets them.

use serde::{Deserialize, Serialize};
use shared_types::LedgerId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Interaction {
    /// Print a fixed response.
    Respond { command: String, response: String },

    /// Ask the current holder to transfer `object` to its location.
    DropObject { command: String, object: LedgerId },

    /// Ask the location to transfer `object` to the player.
    PickUpObject { command: String, object: LedgerId },

    /// Print the value at `path` of ledger `ledger`.
    GetValue {
        command: String,
        ledger: LedgerId,
        path: String,
    },
}

impl Interaction {
    /// The command that triggers this interaction.
    pub fn command(&self) -> &str {
        match self {
            Interaction::Respond { command, .. }
            | Interaction::DropObject { command, .. }
            | Interaction::PickUpObject { command, .. }
            | Interaction::GetValue { command, .. } => command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tagged_encoding() {
        let i = Interaction::PickUpObject {
            command: "pick up object lamp".into(),
            object: "did:world:0x1".into(),
        };
        assert_eq!(
            serde_json::to_value(&i).unwrap(),
            json!({"kind": "pick-up-object", "command": "pick up object lamp", "object": "did:world:0x1"})
        );
        assert_eq!(i.command(), "pick up object lamp");
    }
}
