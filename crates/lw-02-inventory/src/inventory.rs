//! # Inventory Ledger
//!
//! View of the `world/inventory` map inside an owner ledger.

use std::collections::BTreeMap;
use std::sync::Arc;

use lw_01_ledger::{LedgerService, LedgerSnapshot};
use serde_json::Value;
use shared_bus::inventory_topic_for;
use shared_types::{Address, LedgerId};
use tracing::debug;

use crate::domain::{InventoryError, INVENTORY_PATH, NAME_PATH};

/// Stored shape: display name to object id.
type StoredInventory = BTreeMap<String, LedgerId>;

/// Inventory held inside one owner ledger.
#[derive(Clone)]
pub struct InventoryLedger {
    ledgers: Arc<dyn LedgerService>,
    id: LedgerId,
}

impl std::fmt::Debug for InventoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryLedger").field("id", &self.id).finish()
    }
}

impl InventoryLedger {
    /// View over `id`. The ledger is not fetched until first use.
    pub fn new(ledgers: Arc<dyn LedgerService>, id: LedgerId) -> Self {
        Self { ledgers, id }
    }

    /// View over `id`, failing with `NotFound` if the ledger is unknown.
    pub async fn find(ledgers: Arc<dyn LedgerService>, id: LedgerId) -> Result<Self, InventoryError> {
        ledgers.require_ledger(&id).await?;
        Ok(Self::new(ledgers, id))
    }

    /// Owner ledger id.
    pub fn id(&self) -> &LedgerId {
        &self.id
    }

    /// Topic on which the inventory's holders listen when no handler is attached.
    pub fn broadcast_topic(&self) -> String {
        inventory_topic_for(&self.id)
    }

    /// Current owner ledger state.
    pub async fn snapshot(&self) -> Result<LedgerSnapshot, InventoryError> {
        Ok(self.ledgers.require_ledger(&self.id).await?)
    }

    /// Authentication set of the owner ledger.
    pub async fn authentications(&self) -> Result<Vec<Address>, InventoryError> {
        Ok(self.ledgers.authentications(&self.id).await?)
    }

    /// True when every address in `auths` owns this inventory.
    pub async fn is_owned_by(&self, auths: &[Address]) -> Result<bool, InventoryError> {
        Ok(self.snapshot().await?.is_owned_by(auths))
    }

    /// Every listed object, `object id → name`.
    pub async fn all(&self) -> Result<BTreeMap<LedgerId, String>, InventoryError> {
        Ok(self
            .stored()
            .await?
            .into_iter()
            .map(|(name, id)| (id, name))
            .collect())
    }

    /// True when `object` is listed.
    pub async fn exists(&self, object: &LedgerId) -> Result<bool, InventoryError> {
        Ok(self.stored().await?.values().any(|id| id == object))
    }

    /// Object listed under `name`, or the empty id.
    pub async fn did_for_name(&self, name: &str) -> Result<LedgerId, InventoryError> {
        Ok(self.stored().await?.remove(name).unwrap_or_default())
    }

    /// List `object` under its current name. Does nothing if already listed.
    pub async fn add(&self, object: &LedgerId) -> Result<(), InventoryError> {
        let stored = self.stored().await?;
        if stored.values().any(|id| id == object) {
            return Ok(());
        }
        self.insert(stored, object).await
    }

    /// List `object` under its current name, replacing any previous listing.
    pub async fn force_add(&self, object: &LedgerId) -> Result<(), InventoryError> {
        let mut stored = self.stored().await?;
        stored.retain(|_, id| id != object);
        self.insert(stored, object).await
    }

    /// Remove every listing of `object`. Does nothing if not listed.
    pub async fn remove(&self, object: &LedgerId) -> Result<(), InventoryError> {
        let mut stored = self.stored().await?;
        let before = stored.len();
        stored.retain(|_, id| id != object);
        if stored.len() == before {
            return Ok(());
        }
        self.write(&stored).await?;
        debug!(inventory = %self.id, object = %object, "[lw-02] Removed object");
        Ok(())
    }

    async fn insert(&self, mut stored: StoredInventory, object: &LedgerId) -> Result<(), InventoryError> {
        let name = self.object_name(object).await?;
        stored.insert(name.clone(), object.clone());
        self.write(&stored).await?;
        debug!(inventory = %self.id, object = %object, name = %name, "[lw-02] Added object");
        Ok(())
    }

    async fn object_name(&self, object: &LedgerId) -> Result<String, InventoryError> {
        match self.ledgers.resolve(object, NAME_PATH).await? {
            Some(Value::String(name)) if !name.is_empty() => Ok(name),
            _ => Err(InventoryError::MissingName(object.clone())),
        }
    }

    async fn stored(&self) -> Result<StoredInventory, InventoryError> {
        match self.ledgers.resolve(&self.id, INVENTORY_PATH).await? {
            None => Ok(StoredInventory::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| InventoryError::Malformed {
                id: self.id.clone(),
                path: INVENTORY_PATH.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn write(&self, stored: &StoredInventory) -> Result<(), InventoryError> {
        self.ledgers
            .set_data(&self.id, INVENTORY_PATH, serde_json::to_value(stored)?)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lw_01_ledger::{InMemoryLedger, LedgerError};
    use serde_json::json;

    async fn setup() -> (Arc<InMemoryLedger>, InventoryLedger, LedgerId) {
        let ledgers = Arc::new(InMemoryLedger::with_random_key());
        let owner = ledgers.find_or_create_passphrase_ledger("room").await.unwrap();
        let object = ledgers.find_or_create_passphrase_ledger("lamp").await.unwrap();
        ledgers
            .set_data(&object.id, NAME_PATH, json!("lamp"))
            .await
            .unwrap();
        let inventory = InventoryLedger::new(ledgers.clone(), owner.id);
        (ledgers, inventory, object.id)
    }

    #[tokio::test]
    async fn test_add_remove_round_trip() {
        let (_, inventory, object) = setup().await;

        inventory.add(&object).await.unwrap();
        assert!(inventory.exists(&object).await.unwrap());
        assert_eq!(inventory.all().await.unwrap().get(&object), Some(&"lamp".to_string()));
        assert_eq!(inventory.did_for_name("lamp").await.unwrap(), object);

        inventory.remove(&object).await.unwrap();
        assert!(!inventory.exists(&object).await.unwrap());
        assert!(inventory.all().await.unwrap().is_empty());
        assert!(inventory.did_for_name("lamp").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_and_remove_are_idempotent() {
        let (ledgers, inventory, object) = setup().await;

        inventory.add(&object).await.unwrap();
        let height = inventory.snapshot().await.unwrap().height;
        inventory.add(&object).await.unwrap();
        assert_eq!(inventory.snapshot().await.unwrap().height, height);
        assert_eq!(inventory.all().await.unwrap().len(), 1);

        inventory.remove(&object).await.unwrap();
        let height = inventory.snapshot().await.unwrap().height;
        inventory.remove(&object).await.unwrap();
        assert_eq!(ledgers.require_ledger(inventory.id()).await.unwrap().height, height);
    }

    #[tokio::test]
    async fn test_add_requires_string_name() {
        let (ledgers, inventory, _) = setup().await;
        let nameless = ledgers.find_or_create_passphrase_ledger("nameless").await.unwrap();
        assert!(matches!(
            inventory.add(&nameless.id).await,
            Err(InventoryError::MissingName(_))
        ));

        ledgers
            .set_data(&nameless.id, NAME_PATH, json!(42))
            .await
            .unwrap();
        assert!(matches!(
            inventory.add(&nameless.id).await,
            Err(InventoryError::MissingName(_))
        ));
    }

    #[tokio::test]
    async fn test_force_add_refreshes_name() {
        let (ledgers, inventory, object) = setup().await;
        inventory.add(&object).await.unwrap();

        ledgers
            .set_data(&object, NAME_PATH, json!("bright-lamp"))
            .await
            .unwrap();
        inventory.add(&object).await.unwrap();
        assert_eq!(inventory.did_for_name("lamp").await.unwrap(), object);

        inventory.force_add(&object).await.unwrap();
        assert!(inventory.did_for_name("lamp").await.unwrap().is_empty());
        assert_eq!(inventory.did_for_name("bright-lamp").await.unwrap(), object);
    }

    #[tokio::test]
    async fn test_ownership_and_topic() {
        let (ledgers, inventory, _) = setup().await;
        assert!(inventory.is_owned_by(&[ledgers.node_address()]).await.unwrap());
        assert_eq!(
            inventory.authentications().await.unwrap(),
            vec![ledgers.node_address()]
        );
        assert_eq!(
            inventory.broadcast_topic(),
            format!("{}/inventory", inventory.id())
        );
    }

    #[tokio::test]
    async fn test_find_unknown_ledger() {
        let ledgers: Arc<dyn LedgerService> = Arc::new(InMemoryLedger::with_random_key());
        let result = InventoryLedger::find(ledgers, "did:world:0xnone".into()).await;
        assert!(matches!(
            result,
            Err(InventoryError::Ledger(LedgerError::NotFound(_)))
        ));
    }
}
