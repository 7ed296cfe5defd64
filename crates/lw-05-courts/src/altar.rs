//! # Altar Validator
//!
//! End-game check: the player placed exactly one genuine artifact on each
//! altar, with the inscriptions that altar expects.
//!
//! Altars are locations with per-player inventories. The player ledger maps
//! each location to the player's own inventory there under
//! `world/location-inventories`.
//!
//! | Check | Per artifact |
//! |-------|--------------|
//! | history | at least two ownership changes |
//! | creation | first owners are exactly the altar's `origin_auth`, no data |
//! | release | `origin_auth` still owned it right before the first transfer |
//! | inscriptions | `type`, `material`, `age`, `weight` as expected |
//! | forger | `forged by` as expected, and unchanged since release |
//!
//! A wrong placement sends every placed artifact back to nowhere: they are
//! removed from the altar inventories.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use lw_01_ledger::{ownership_changes, verify_ownership, LedgerError, LedgerService};
use lw_02_inventory::{inscriptions_of, InventoryLedger, LOCATION_INVENTORIES_PATH};
use shared_types::{LedgerId, RequestObjectTransferMessage};
use tracing::{debug, info};

use crate::domain::{AltarSpec, CourtError, ARTIFACT_PREFIX, FORGED_BY, INSCRIBABLE};
use crate::origin::origin_snapshot;
use crate::ports::PrizeValidator;

pub const ALTAR_MISSING_MESSAGE: &str = "you must place one artifact on each altar";
pub const ALTAR_INCORRECT_MESSAGE: &str = "your altar placement is incorrect";

pub struct AltarValidator {
    ledgers: Arc<dyn LedgerService>,
    altars: Vec<AltarSpec>,
}

impl AltarValidator {
    pub fn new(ledgers: Arc<dyn LedgerService>, altars: Vec<AltarSpec>) -> Self {
        Self { ledgers, altars }
    }

    /// The player's inventory on each altar, in altar order.
    async fn altar_inventories(&self, player: &LedgerId) -> Result<Vec<InventoryLedger>, CourtError> {
        let snapshot = self.ledgers.require_ledger(player).await?;
        let Some(by_location) =
            snapshot.resolve_as::<BTreeMap<LedgerId, LedgerId>>(LOCATION_INVENTORIES_PATH)?
        else {
            return Err(CourtError::rejected(ALTAR_MISSING_MESSAGE));
        };

        self.altars
            .iter()
            .map(|altar| match by_location.get(&altar.location) {
                Some(inventory) if !inventory.is_empty() => {
                    Ok(InventoryLedger::new(self.ledgers.clone(), inventory.clone()))
                }
                _ => Err(CourtError::rejected(ALTAR_MISSING_MESSAGE)),
            })
            .collect()
    }

    async fn artifacts_on(inventory: &InventoryLedger) -> Result<Vec<LedgerId>, CourtError> {
        Ok(inventory
            .all()
            .await?
            .into_iter()
            .filter(|(_, name)| name.starts_with(ARTIFACT_PREFIX))
            .map(|(id, _)| id)
            .collect())
    }

    /// True when `artifact` is a genuine match for `altar`.
    pub async fn check_artifact(
        &self,
        artifact: &LedgerId,
        altar: &AltarSpec,
    ) -> Result<bool, CourtError> {
        let snapshot = self.ledgers.require_ledger(artifact).await?;
        let changes = ownership_changes(self.ledgers.as_ref(), &snapshot).await?;
        let origin_auths = vec![altar.origin_auth.clone()];

        let Some(created) = changes.last() else {
            return Ok(false);
        };
        if created.authentications != origin_auths {
            debug!(artifact = %artifact, found = ?created.authentications, "[lw-05] Wrong creator");
            return Ok(false);
        }
        let at_creation = self
            .ledgers
            .get_ledger_by_tip(&created.tip)
            .await?
            .ok_or_else(|| LedgerError::UnknownTip(created.tip.to_hex()))?;
        if !at_creation.is_data_empty() {
            debug!(artifact = %artifact, "[lw-05] Created with data");
            return Ok(false);
        }

        let Some(released) = origin_snapshot(self.ledgers.as_ref(), &snapshot).await? else {
            debug!(artifact = %artifact, "[lw-05] Never left its creator");
            return Ok(false);
        };
        if !verify_ownership(&released, &origin_auths) {
            debug!(artifact = %artifact, "[lw-05] Creator did not release it");
            return Ok(false);
        }

        let current = inscriptions_of(&snapshot);
        let original = inscriptions_of(&released);
        let expected = &altar.inscriptions;

        let mut correct = INSCRIBABLE
            .iter()
            .filter(|key| current.get(**key).map(String::as_str) == expected.get(key))
            .count();
        let forger = expected.get(FORGED_BY);
        if current.get(FORGED_BY).map(String::as_str) == forger
            && original.get(FORGED_BY).map(String::as_str) == forger
        {
            correct += 1;
        }

        debug!(artifact = %artifact, correct, "[lw-05] Artifact inscriptions checked");
        Ok(correct == INSCRIBABLE.len() + 1)
    }
}

#[async_trait]
impl PrizeValidator for AltarValidator {
    async fn validate(&self, request: &RequestObjectTransferMessage) -> Result<bool, CourtError> {
        let inventories = self.altar_inventories(&request.to).await?;

        let mut placed = Vec::with_capacity(inventories.len());
        for inventory in &inventories {
            placed.push(Self::artifacts_on(inventory).await?);
        }
        if placed.iter().any(Vec::is_empty) {
            return Err(CourtError::rejected(ALTAR_MISSING_MESSAGE));
        }

        let mut valid = 0;
        if placed.iter().all(|artifacts| artifacts.len() == 1) {
            for (altar, artifacts) in self.altars.iter().zip(&placed) {
                match self.check_artifact(&artifacts[0], altar).await {
                    Ok(true) => valid += 1,
                    Ok(false) => break,
                    Err(e) => {
                        debug!(artifact = %artifacts[0], error = %e, "[lw-05] Artifact check failed");
                        break;
                    }
                }
            }
        }

        if valid == self.altars.len() {
            info!(player = %request.to, "[lw-05] Altars solved");
            return Ok(true);
        }

        for (inventory, artifacts) in inventories.iter().zip(&placed) {
            for artifact in artifacts {
                inventory.remove(artifact).await?;
            }
        }
        info!(player = %request.to, valid, "[lw-05] Altar placement incorrect");
        Err(CourtError::rejected(ALTAR_INCORRECT_MESSAGE))
    }

    async fn cleanup(&self, request: &RequestObjectTransferMessage) -> Result<(), CourtError> {
        for inventory in self.altar_inventories(&request.to).await? {
            for artifact in Self::artifacts_on(&inventory).await? {
                inventory.remove(&artifact).await?;
            }
        }
        Ok(())
    }
}
