//! # Pedestal Validator
//!
//! Spring court check: the player placed a page on each pedestal, and each
//! pedestal holds a page inscribed with exactly the text it expects.
//!
//! Pedestals are locations with per-player inventories, found through the
//! player's `world/location-inventories` map like altars are. Pages are
//! recognised by their `page-` name prefix.
//!
//! A wrong placement removes every placed page from the pedestals.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use lw_01_ledger::LedgerService;
use lw_02_inventory::{inscriptions_of, InventoryLedger, LOCATION_INVENTORIES_PATH};
use shared_types::{LedgerId, RequestObjectTransferMessage};
use tracing::{debug, info};

use crate::domain::CourtError;
use crate::ports::PrizeValidator;

pub const PAGE_PREFIX: &str = "page-";
pub const PEDESTAL_MISSING_MESSAGE: &str = "you must place one page on each pedestal";
pub const PEDESTAL_INCORRECT_MESSAGE: &str = "your pedestal placement is incorrect";

pub struct PedestalValidator {
    ledgers: Arc<dyn LedgerService>,
    /// Pedestal location → expected inscription.
    pedestals: BTreeMap<LedgerId, String>,
}

impl PedestalValidator {
    pub fn new(ledgers: Arc<dyn LedgerService>, pedestals: BTreeMap<LedgerId, String>) -> Self {
        Self { ledgers, pedestals }
    }

    /// The player's inventory on each pedestal, paired with the inscription
    /// that pedestal expects.
    async fn pedestal_inventories(
        &self,
        player: &LedgerId,
    ) -> Result<Vec<(InventoryLedger, &str)>, CourtError> {
        let snapshot = self.ledgers.require_ledger(player).await?;
        let Some(by_location) =
            snapshot.resolve_as::<BTreeMap<LedgerId, LedgerId>>(LOCATION_INVENTORIES_PATH)?
        else {
            return Err(CourtError::rejected(PEDESTAL_MISSING_MESSAGE));
        };

        self.pedestals
            .iter()
            .map(|(pedestal, expected)| match by_location.get(pedestal) {
                Some(inventory) if !inventory.is_empty() => Ok((
                    InventoryLedger::new(self.ledgers.clone(), inventory.clone()),
                    expected.as_str(),
                )),
                _ => Err(CourtError::rejected(PEDESTAL_MISSING_MESSAGE)),
            })
            .collect()
    }

    async fn pages_on(inventory: &InventoryLedger) -> Result<Vec<LedgerId>, CourtError> {
        Ok(inventory
            .all()
            .await?
            .into_iter()
            .filter(|(_, name)| name.starts_with(PAGE_PREFIX))
            .map(|(id, _)| id)
            .collect())
    }

    /// True when `page` carries exactly one inscription, equal to `expected`.
    pub async fn check_page(&self, page: &LedgerId, expected: &str) -> Result<bool, CourtError> {
        let snapshot = self.ledgers.require_ledger(page).await?;
        let inscriptions = inscriptions_of(&snapshot);
        let mut values = inscriptions.values();
        Ok(matches!((values.next(), values.next()), (Some(only), None) if only == expected))
    }
}

#[async_trait]
impl PrizeValidator for PedestalValidator {
    async fn validate(&self, request: &RequestObjectTransferMessage) -> Result<bool, CourtError> {
        let inventories = self.pedestal_inventories(&request.to).await?;

        let mut placed = Vec::with_capacity(inventories.len());
        for (inventory, _) in &inventories {
            placed.push(Self::pages_on(inventory).await?);
        }
        if placed.iter().any(Vec::is_empty) {
            return Err(CourtError::rejected(PEDESTAL_MISSING_MESSAGE));
        }

        let mut valid = 0;
        for ((_, expected), pages) in inventories.iter().zip(&placed) {
            for page in pages {
                if self.check_page(page, expected).await? {
                    valid += 1;
                    break;
                }
            }
        }

        if valid == self.pedestals.len() {
            info!(player = %request.to, "[lw-05] Pedestals solved");
            return Ok(true);
        }

        for ((inventory, _), pages) in inventories.iter().zip(&placed) {
            for page in pages {
                inventory.remove(page).await?;
            }
        }
        debug!(player = %request.to, valid, "[lw-05] Pedestal placement incorrect");
        Err(CourtError::rejected(PEDESTAL_INCORRECT_MESSAGE))
    }

    async fn cleanup(&self, request: &RequestObjectTransferMessage) -> Result<(), CourtError> {
        for (inventory, _) in self.pedestal_inventories(&request.to).await? {
            for page in Self::pages_on(&inventory).await? {
                inventory.remove(&page).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lw_01_ledger::InMemoryLedger;
    use lw_02_inventory::ObjectLedger;
    use serde_json::json;

    const PEDESTALS: usize = 3;

    fn expected(i: usize) -> String {
        format!("verse {i}")
    }

    struct World {
        ledgers: Arc<InMemoryLedger>,
        validator: PedestalValidator,
        player: LedgerId,
        inventories: Vec<InventoryLedger>,
    }

    async fn world() -> World {
        let ledgers = Arc::new(InMemoryLedger::with_random_key());
        let player = ledgers
            .find_or_create_passphrase_ledger("spring-player")
            .await
            .unwrap();

        let mut pedestals = BTreeMap::new();
        let mut inventories = Vec::new();
        let mut map = serde_json::Map::new();
        for i in 0..PEDESTALS {
            let pedestal = ledgers
                .find_or_create_passphrase_ledger(&format!("pedestal-{i}"))
                .await
                .unwrap();
            let inventory = ledgers
                .find_or_create_passphrase_ledger(&format!("pedestal-{i}-player"))
                .await
                .unwrap();
            map.insert(pedestal.id.to_string(), json!(inventory.id.as_str()));
            pedestals.insert(pedestal.id, expected(i));
            inventories.push(InventoryLedger::new(ledgers.clone(), inventory.id));
        }
        ledgers
            .set_data(&player.id, LOCATION_INVENTORIES_PATH, serde_json::Value::Object(map))
            .await
            .unwrap();

        World {
            validator: PedestalValidator::new(ledgers.clone(), pedestals),
            ledgers,
            player: player.id,
            inventories,
        }
    }

    /// Place a page carrying `inscriptions` on pedestal `i`.
    async fn place(w: &World, i: usize, name: &str, inscriptions: &[(&str, &str)]) -> LedgerId {
        let ledger = w.ledgers.find_or_create_passphrase_ledger(name).await.unwrap();
        let page = ObjectLedger::new(w.ledgers.clone(), ledger.id.clone());
        page.set_name(name).await.unwrap();
        for (key, value) in inscriptions {
            page.set_inscription(key, value).await.unwrap();
        }
        w.inventories[i].add(&ledger.id).await.unwrap();
        ledger.id
    }

    fn request(w: &World) -> RequestObjectTransferMessage {
        RequestObjectTransferMessage {
            from: "did:world:0xspring-court".into(),
            to: w.player.clone(),
            object: "did:world:0xprize".into(),
        }
    }

    fn rejection(result: Result<bool, CourtError>) -> String {
        match result {
            Err(CourtError::Rejected(reason)) => reason,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_correct_pages_pass_and_cleanup_clears() {
        let w = world().await;
        for i in 0..PEDESTALS {
            place(&w, i, &format!("page-{i}"), &[("text", expected(i).as_str())]).await;
        }

        assert!(w.validator.validate(&request(&w)).await.unwrap());

        w.validator.cleanup(&request(&w)).await.unwrap();
        for inventory in &w.inventories {
            assert!(inventory.all().await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_empty_pedestal_must_be_filled() {
        let w = world().await;
        for i in 0..PEDESTALS - 1 {
            place(&w, i, &format!("page-{i}"), &[("text", expected(i).as_str())]).await;
        }
        place(&w, PEDESTALS - 1, "lamp", &[("text", expected(PEDESTALS - 1).as_str())]).await;

        let reason = rejection(w.validator.validate(&request(&w)).await);
        assert_eq!(reason, PEDESTAL_MISSING_MESSAGE);
    }

    #[tokio::test]
    async fn test_missing_location_inventories() {
        let w = world().await;
        let stranger = w.ledgers.find_or_create_passphrase_ledger("stranger").await.unwrap();
        let mut req = request(&w);
        req.to = stranger.id;

        let reason = rejection(w.validator.validate(&req).await);
        assert_eq!(reason, PEDESTAL_MISSING_MESSAGE);
    }

    #[tokio::test]
    async fn test_wrong_page_clears_pedestals() {
        let w = world().await;
        for i in 0..PEDESTALS - 1 {
            place(&w, i, &format!("page-{i}"), &[("text", expected(i).as_str())]).await;
        }
        place(&w, PEDESTALS - 1, "page-wrong", &[("text", expected(0).as_str())]).await;

        let reason = rejection(w.validator.validate(&request(&w)).await);
        assert_eq!(reason, PEDESTAL_INCORRECT_MESSAGE);
        for inventory in &w.inventories {
            assert!(inventory.all().await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_page_needs_exactly_one_inscription() {
        let w = world().await;
        let blank = place(&w, 0, "page-blank", &[]).await;
        let crowded = place(
            &w,
            0,
            "page-crowded",
            &[("text", expected(0).as_str()), ("margin", "a doodle")],
        )
        .await;
        let single = place(&w, 0, "page-single", &[("text", expected(0).as_str())]).await;

        assert!(!w.validator.check_page(&blank, &expected(0)).await.unwrap());
        assert!(!w.validator.check_page(&crowded, &expected(0)).await.unwrap());
        assert!(w.validator.check_page(&single, &expected(0)).await.unwrap());
        assert!(!w.validator.check_page(&single, &expected(1)).await.unwrap());
    }
}
