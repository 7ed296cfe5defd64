//! Origin checks on objects the node minted.
//!
//! A genuine object was created under the origin authentications and kept
//! its name up to the first time it left the node. Anything else was forged
//! or tampered with by a player.

use lw_01_ledger::{ownership_changes, verify_ownership_at, LedgerService, LedgerSnapshot};
use lw_02_inventory::name_of;
use shared_types::{Address, LedgerId};
use tracing::debug;

use crate::domain::CourtError;

/// State of `snapshot`'s ledger right before its first transfer away from
/// the origin, or `None` when it never changed owner.
pub async fn origin_snapshot(
    ledgers: &dyn LedgerService,
    snapshot: &LedgerSnapshot,
) -> Result<Option<LedgerSnapshot>, CourtError> {
    let changes = ownership_changes(ledgers, snapshot).await?;
    if changes.len() < 2 {
        return Ok(None);
    }
    let before_transfer = &changes[changes.len() - 2];
    Ok(ledgers.get_ledger_by_tip(&before_transfer.tip).await?)
}

/// True when `object` was minted by `origin` and still carries the name it
/// had when it left.
pub async fn validate_element_origin(
    ledgers: &dyn LedgerService,
    object: &LedgerId,
    origin: &[Address],
) -> Result<bool, CourtError> {
    let snapshot = ledgers.require_ledger(object).await?;
    let Some(name) = name_of(&snapshot) else {
        return Err(CourtError::Content(format!("object {object} has no name")));
    };

    let Some(at_origin) = origin_snapshot(ledgers, &snapshot).await? else {
        debug!(object = %object, "[lw-05] Fewer than 2 ownership changes");
        return Ok(false);
    };

    if !verify_ownership_at(ledgers, &at_origin, 0, origin).await? {
        debug!(object = %object, "[lw-05] Genesis owner is not the origin");
        return Ok(false);
    }

    if name_of(&at_origin) != Some(name) {
        debug!(object = %object, "[lw-05] Name was modified");
        return Ok(false);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lw_01_ledger::{InMemoryLedger, LedgerKey};
    use lw_02_inventory::create_object;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_minted_object_after_first_transfer_is_genuine() {
        let ledgers = Arc::new(InMemoryLedger::with_random_key());
        let player = LedgerKey::generate();
        ledgers.import_key(player.clone());
        let object = create_object(ledgers.clone(), "element-64").await.unwrap();
        let origin = [ledgers.node_address()];

        assert!(!validate_element_origin(ledgers.as_ref(), object.id(), &origin).await.unwrap());

        object
            .change_owner(vec![ledgers.node_address(), player.address()])
            .await
            .unwrap();
        object.change_owner(vec![player.address()]).await.unwrap();
        assert!(validate_element_origin(ledgers.as_ref(), object.id(), &origin).await.unwrap());

        // renamed by its new owner
        object.set_name("element-12c").await.unwrap();
        assert!(!validate_element_origin(ledgers.as_ref(), object.id(), &origin).await.unwrap());
    }

    #[tokio::test]
    async fn test_player_minted_object_is_forged() {
        let ledgers = Arc::new(InMemoryLedger::with_random_key());
        let player = LedgerKey::generate();
        let forged = ledgers.create_ledger(&player).await.unwrap();
        ledgers
            .set_data(&forged.id, "world/name", serde_json::json!("element-12c"))
            .await
            .unwrap();
        ledgers
            .set_ownership(&forged.id, vec![player.address(), ledgers.node_address()])
            .await
            .unwrap();

        let origin = [ledgers.node_address()];
        assert!(!validate_element_origin(ledgers.as_ref(), &forged.id, &origin).await.unwrap());
    }
}
