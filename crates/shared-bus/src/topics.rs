//! Topic naming.

use shared_types::LedgerId;

/// Suffix of inventory broadcast topics.
pub const INVENTORY_TOPIC_SUFFIX: &str = "/inventory";

/// Topic a handler ledger's service listens on.
pub fn topic_for(id: &LedgerId) -> String {
    id.as_str().to_string()
}

/// Broadcast topic of an inventory that has no handler attached.
pub fn inventory_topic_for(id: &LedgerId) -> String {
    format!("{}{INVENTORY_TOPIC_SUFFIX}", id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics_are_distinct_per_purpose() {
        let id = LedgerId::from("did:world:0x01");
        assert_eq!(topic_for(&id), "did:world:0x01");
        assert_eq!(inventory_topic_for(&id), "did:world:0x01/inventory");
    }
}
