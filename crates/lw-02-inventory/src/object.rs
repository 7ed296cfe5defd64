//! # Object View
//!
//! Accessors over an object's ledger: name, description, inscriptions,
//! interactions, arbitrary `world/...` paths and ownership.

use std::collections::BTreeMap;
use std::sync::Arc;

use lw_01_ledger::{validate_segment, LedgerService, LedgerSnapshot};
use serde_json::{json, Value};
use shared_types::{Address, LedgerId, Tip};

use crate::domain::{
    world_path, Interaction, InventoryError, DESCRIPTION_PATH, INSCRIPTIONS_PATH,
    INTERACTIONS_PATH, NAME_PATH, WORLD_ROOT,
};

/// View over one object ledger.
#[derive(Clone)]
pub struct ObjectLedger {
    ledgers: Arc<dyn LedgerService>,
    id: LedgerId,
}

impl std::fmt::Debug for ObjectLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectLedger").field("id", &self.id).finish()
    }
}

impl ObjectLedger {
    pub fn new(ledgers: Arc<dyn LedgerService>, id: LedgerId) -> Self {
        Self { ledgers, id }
    }

    pub fn id(&self) -> &LedgerId {
        &self.id
    }

    /// Current object state.
    pub async fn snapshot(&self) -> Result<LedgerSnapshot, InventoryError> {
        Ok(self.ledgers.require_ledger(&self.id).await?)
    }

    /// Object state at an earlier tip. The tip must belong to this object.
    pub async fn at_tip(&self, tip: &Tip) -> Result<LedgerSnapshot, InventoryError> {
        match self.ledgers.get_ledger_by_tip(tip).await? {
            Some(snapshot) if snapshot.id == self.id => Ok(snapshot),
            _ => Err(InventoryError::Ledger(lw_01_ledger::LedgerError::UnknownTip(
                tip.to_hex(),
            ))),
        }
    }

    /// Display name. Fails when unset or not a string.
    pub async fn name(&self) -> Result<String, InventoryError> {
        match self.ledgers.resolve(&self.id, NAME_PATH).await? {
            Some(Value::String(name)) => Ok(name),
            _ => Err(InventoryError::MissingName(self.id.clone())),
        }
    }

    pub async fn set_name(&self, name: &str) -> Result<(), InventoryError> {
        validate_segment(name)?;
        self.ledgers.set_data(&self.id, NAME_PATH, json!(name)).await?;
        Ok(())
    }

    /// Description, empty when unset.
    pub async fn description(&self) -> Result<String, InventoryError> {
        Ok(self
            .ledgers
            .resolve(&self.id, DESCRIPTION_PATH)
            .await?
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default())
    }

    pub async fn set_description(&self, description: &str) -> Result<(), InventoryError> {
        self.ledgers
            .set_data(&self.id, DESCRIPTION_PATH, json!(description))
            .await?;
        Ok(())
    }

    /// Inscriptions, empty when unset. Non-string values are skipped.
    pub async fn inscriptions(&self) -> Result<BTreeMap<String, String>, InventoryError> {
        Ok(inscriptions_of(&self.snapshot().await?))
    }

    pub async fn set_inscription(&self, key: &str, value: &str) -> Result<(), InventoryError> {
        validate_segment(key)?;
        let path = format!("{INSCRIPTIONS_PATH}/{key}");
        self.ledgers.set_data(&self.id, &path, json!(value)).await?;
        Ok(())
    }

    /// Store an interaction under its command.
    pub async fn add_interaction(&self, interaction: &Interaction) -> Result<(), InventoryError> {
        validate_segment(interaction.command())?;
        let path = format!("{INTERACTIONS_PATH}/{}", interaction.command());
        self.ledgers
            .set_data(&self.id, &path, serde_json::to_value(interaction)?)
            .await?;
        Ok(())
    }

    /// Every stored interaction. Entries that fail to decode are skipped.
    pub async fn interactions(&self) -> Result<Vec<Interaction>, InventoryError> {
        let Some(Value::Object(map)) = self.ledgers.resolve(&self.id, INTERACTIONS_PATH).await?
        else {
            return Ok(Vec::new());
        };
        Ok(map
            .into_iter()
            .filter_map(|(_, v)| serde_json::from_value(v).ok())
            .collect())
    }

    /// Value at a path relative to `world/`.
    pub async fn get_path(&self, relative: &str) -> Result<Option<Value>, InventoryError> {
        Ok(self.ledgers.resolve(&self.id, &world_path(relative)).await?)
    }

    /// Set a value at a path relative to `world/`.
    pub async fn update_path(&self, relative: &str, value: Value) -> Result<(), InventoryError> {
        self.ledgers
            .set_data(&self.id, &world_path(relative), value)
            .await?;
        Ok(())
    }

    /// Clear all game data.
    pub async fn reset(&self) -> Result<(), InventoryError> {
        self.ledgers
            .set_data(&self.id, WORLD_ROOT, Value::Object(Default::default()))
            .await?;
        Ok(())
    }

    /// Replace the object's owners.
    pub async fn change_owner(&self, auths: Vec<Address>) -> Result<LedgerSnapshot, InventoryError> {
        Ok(self.ledgers.set_ownership(&self.id, auths).await?)
    }

    /// Owners.
    pub async fn authentications(&self) -> Result<Vec<Address>, InventoryError> {
        Ok(self.ledgers.authentications(&self.id).await?)
    }
}

/// Inscriptions read from any snapshot.
pub fn inscriptions_of(snapshot: &LedgerSnapshot) -> BTreeMap<String, String> {
    match snapshot.resolve(INSCRIPTIONS_PATH) {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// Name read from any snapshot.
pub fn name_of(snapshot: &LedgerSnapshot) -> Option<&str> {
    snapshot.resolve_str(NAME_PATH)
}

/// Name an existing ledger and give it the default object interactions.
pub async fn create_object_on_ledger(
    ledgers: Arc<dyn LedgerService>,
    id: LedgerId,
    name: &str,
) -> Result<ObjectLedger, InventoryError> {
    let object = ObjectLedger::new(ledgers, id.clone());
    object.set_name(name).await?;

    let defaults = [
        Interaction::DropObject {
            command: format!("drop object {name}"),
            object: id.clone(),
        },
        Interaction::PickUpObject {
            command: format!("pick up object {name}"),
            object: id.clone(),
        },
        Interaction::GetValue {
            command: format!("examine object {name}"),
            ledger: id.clone(),
            path: DESCRIPTION_PATH.to_string(),
        },
    ];
    for interaction in &defaults {
        object.add_interaction(interaction).await?;
    }
    Ok(object)
}

/// Mint a new node-owned object ledger named `name`.
pub async fn create_object(
    ledgers: Arc<dyn LedgerService>,
    name: &str,
) -> Result<ObjectLedger, InventoryError> {
    let snapshot = ledgers.create_owned_ledger(vec![ledgers.node_address()]).await?;
    create_object_on_ledger(ledgers, snapshot.id, name).await
}
