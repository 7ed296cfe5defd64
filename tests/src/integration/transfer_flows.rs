//! # Transfer Flow Tests
//!
//! Pickup and drop between two plain inventories, each served by its own
//! service with the unrestricted add and remove handlers.
//!
//! ## Test Categories
//!
//! 1. **Happy Path**: pickup, then drop back
//! 2. **Refusal**: destination that cannot receive objects
//! 3. **Recovery**: unanswered notice rolls the transfer back

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lw_01_ledger::LedgerService;
    use lw_02_inventory::{create_object, InventoryLedger, ObjectLedger};
    use lw_03_handlers::{attach_handler, NoopHandler};
    use shared_types::{Address, LedgerId};

    use crate::integration::{eventually, player, request_transfer, runtime};

    async fn listed(ledgers: Arc<dyn LedgerService>, inventory: LedgerId, object: LedgerId) -> bool {
        InventoryLedger::new(ledgers, inventory)
            .exists(&object)
            .await
            .unwrap()
    }

    async fn owned_by(object: ObjectLedger, owners: Vec<Address>) -> bool {
        object.authentications().await.unwrap() == owners
    }

    // =========================================================================
    // HAPPY PATH
    // =========================================================================

    #[tokio::test]
    async fn test_pickup_moves_object_into_player_inventory() {
        let runtime = runtime();
        let infra = runtime.infrastructure();
        let ledgers = infra.ledger_service();

        let square = ledgers.find_or_create_passphrase_ledger("town square").await.unwrap().id;
        let (player, player_key) = player(&ledgers).await;
        let lamp = create_object(ledgers.clone(), "lamp").await.unwrap();
        InventoryLedger::new(ledgers.clone(), square.clone())
            .add(lamp.id())
            .await
            .unwrap();

        infra.serve_inventory(square.clone()).await.unwrap();
        infra.serve_inventory(player.clone()).await.unwrap();

        request_transfer(&runtime, &square, &player, lamp.id()).await;

        assert!(eventually(|| listed(ledgers.clone(), player.clone(), lamp.id().clone())).await);
        assert!(!listed(ledgers.clone(), square.clone(), lamp.id().clone()).await);
        assert!(
            eventually(|| owned_by(lamp.clone(), vec![player_key.address()])).await
        );
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_drop_returns_object_to_location() {
        let runtime = runtime();
        let infra = runtime.infrastructure();
        let ledgers = infra.ledger_service();

        let square = ledgers.find_or_create_passphrase_ledger("town square").await.unwrap().id;
        let (player, _) = player(&ledgers).await;
        let coin = create_object(ledgers.clone(), "coin").await.unwrap();
        InventoryLedger::new(ledgers.clone(), square.clone())
            .add(coin.id())
            .await
            .unwrap();
        infra.serve_inventory(square.clone()).await.unwrap();
        infra.serve_inventory(player.clone()).await.unwrap();

        request_transfer(&runtime, &square, &player, coin.id()).await;
        assert!(eventually(|| listed(ledgers.clone(), player.clone(), coin.id().clone())).await);

        request_transfer(&runtime, &player, &square, coin.id()).await;
        assert!(eventually(|| listed(ledgers.clone(), square.clone(), coin.id().clone())).await);
        assert!(!listed(ledgers.clone(), player.clone(), coin.id().clone()).await);
        assert!(
            eventually(|| owned_by(coin.clone(), vec![ledgers.node_address()])).await
        );
        runtime.shutdown().await;
    }

    // =========================================================================
    // REFUSAL
    // =========================================================================

    #[tokio::test]
    async fn test_destination_without_receive_support_changes_nothing() {
        let runtime = runtime();
        let infra = runtime.infrastructure();
        let ledgers = infra.ledger_service();

        let square = ledgers.find_or_create_passphrase_ledger("town square").await.unwrap().id;
        let (player, _) = player(&ledgers).await;
        let statue = create_object(ledgers.clone(), "statue").await.unwrap();
        InventoryLedger::new(ledgers.clone(), square.clone())
            .add(statue.id())
            .await
            .unwrap();
        infra.serve_inventory(square.clone()).await.unwrap();

        let noop = ledgers.find_or_create_passphrase_ledger("closed door").await.unwrap().id;
        infra
            .registry
            .start_service(noop.clone(), Arc::new(NoopHandler))
            .await
            .unwrap();
        attach_handler(ledgers.as_ref(), &player, &noop).await.unwrap();
        let before = statue.snapshot().await.unwrap().tip;

        request_transfer(&runtime, &square, &player, statue.id()).await;
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        assert!(listed(ledgers.clone(), square.clone(), statue.id().clone()).await);
        assert!(!listed(ledgers.clone(), player.clone(), statue.id().clone()).await);
        assert_eq!(statue.snapshot().await.unwrap().tip, before);
        runtime.shutdown().await;
    }

    // =========================================================================
    // RECOVERY
    // =========================================================================

    #[tokio::test]
    async fn test_unanswered_transfer_is_rolled_back() {
        let runtime = runtime();
        let infra = runtime.infrastructure();
        let ledgers = infra.ledger_service();

        let square = ledgers.find_or_create_passphrase_ledger("town square").await.unwrap().id;
        // No service for the player: the notice goes out on its inventory
        // topic and nobody confirms it.
        let (player, _) = player(&ledgers).await;
        let bell = create_object(ledgers.clone(), "bell").await.unwrap();
        InventoryLedger::new(ledgers.clone(), square.clone())
            .add(bell.id())
            .await
            .unwrap();
        infra.serve_inventory(square.clone()).await.unwrap();
        let owners = bell.authentications().await.unwrap();

        request_transfer(&runtime, &square, &player, bell.id()).await;

        // Confirmation window is one second; the rollback lands after it.
        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        assert!(eventually(|| listed(ledgers.clone(), square.clone(), bell.id().clone())).await);
        assert!(!listed(ledgers.clone(), player.clone(), bell.id().clone()).await);
        assert_eq!(bell.authentications().await.unwrap(), owners);
        runtime.shutdown().await;
    }
}
