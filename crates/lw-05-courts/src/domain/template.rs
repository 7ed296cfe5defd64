//! Object templates written onto spawned and awarded objects.

use std::collections::BTreeMap;
use std::sync::Arc;

use lw_01_ledger::LedgerService;
use lw_02_inventory::{create_object_on_ledger, Interaction, InventoryError, ObjectLedger};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::LedgerId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub inscriptions: BTreeMap<String, String>,
    /// Extra values keyed by path relative to `world/`.
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

impl ObjectTemplate {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            inscriptions: BTreeMap::new(),
            data: BTreeMap::new(),
            interactions: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_inscription(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inscriptions.insert(key.into(), value.into());
        self
    }

    /// Write the template onto `id`, on top of whatever the ledger holds.
    pub async fn apply(
        &self,
        ledgers: Arc<dyn LedgerService>,
        id: LedgerId,
    ) -> Result<ObjectLedger, InventoryError> {
        let object = create_object_on_ledger(ledgers, id, &self.name).await?;
        if !self.description.is_empty() {
            object.set_description(&self.description).await?;
        }
        for (key, value) in &self.inscriptions {
            object.set_inscription(key, value).await?;
        }
        for (path, value) in &self.data {
            object.update_path(path, value.clone()).await?;
        }
        for interaction in &self.interactions {
            object.add_interaction(interaction).await?;
        }
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lw_01_ledger::InMemoryLedger;
    use serde_json::json;

    #[tokio::test]
    async fn test_apply_writes_every_field() {
        let ledgers: Arc<dyn LedgerService> = Arc::new(InMemoryLedger::with_random_key());
        let ledger = ledgers.find_or_create_passphrase_ledger("spawn").await.unwrap();

        let mut template = ObjectTemplate::named("wire")
            .with_description("a coil of copper wire")
            .with_inscription("material", "copper");
        template.data.insert("glow".into(), json!(true));
        template.interactions.push(Interaction::Respond {
            command: "listen".into(),
            response: "it hums".into(),
        });

        let object = template.apply(ledgers, ledger.id).await.unwrap();
        assert_eq!(object.name().await.unwrap(), "wire");
        assert_eq!(object.description().await.unwrap(), "a coil of copper wire");
        assert_eq!(object.inscriptions().await.unwrap()["material"], "copper");
        assert_eq!(object.get_path("glow").await.unwrap(), Some(json!(true)));
        assert_eq!(object.interactions().await.unwrap().len(), 4);
    }

    #[test]
    fn test_parses_minimal_toml() {
        let template: ObjectTemplate = toml::from_str(r#"name = "medal""#).unwrap();
        assert_eq!(template, ObjectTemplate::named("medal"));
    }
}
