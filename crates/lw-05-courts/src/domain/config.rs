//! Court settings and court content.
//!
//! [`CourtsConfig`] is part of the node configuration. [`CourtContent`] is
//! the puzzle data supplied by a content loader: which locations, which
//! templates, which tables.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared_types::{Address, LedgerId};

use crate::domain::{
    ArtifactInscriptions, ArtifactsConfig, CourtError, Element, ElementCombination,
    ObjectTemplate,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtsConfig {
    /// Court content file. No courts run when unset.
    pub content_path: Option<PathBuf>,
    /// Period of the backup respawn of every prize handler.
    pub backup_respawn_interval_secs: u64,
}

impl Default for CourtsConfig {
    fn default() -> Self {
        Self {
            content_path: None,
            backup_respawn_interval_secs: 60,
        }
    }
}

impl CourtsConfig {
    pub fn backup_respawn_interval(&self) -> Duration {
        Duration::from_secs(self.backup_respawn_interval_secs)
    }
}

/// Expected artifact on one altar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltarSpec {
    pub location: LedgerId,
    pub origin_auth: Address,
    pub inscriptions: ArtifactInscriptions,
}

/// Extra check a prize handler runs before handing out its prize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ValidatorConfig {
    /// One correct artifact on each altar.
    Altars { altars: Vec<AltarSpec> },
    /// The player holds a genuine winning element.
    Element {
        winning_element: i64,
        fail_message: String,
    },
    /// One page with the expected inscription on each pedestal, keyed by
    /// pedestal location.
    Pedestals { pedestals: BTreeMap<LedgerId, String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrizeConfig {
    /// Court name, used for the handler ledger passphrase.
    pub name: String,
    pub location: LedgerId,
    pub spawn: ObjectTemplate,
    pub prize: ObjectTemplate,
    #[serde(default)]
    pub validator: Option<ValidatorConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementCombinerConfig {
    pub name: String,
    pub location: LedgerId,
    pub elements: Vec<Element>,
    pub combinations: Vec<ElementCombination>,
    /// Element handed out when no combination matches.
    #[serde(default)]
    pub failure_element: Option<i64>,
}

impl ElementCombinerConfig {
    /// Fewest ingredients of any combination.
    pub fn min_required(&self) -> usize {
        self.combinations
            .iter()
            .map(|c| c.from.len())
            .min()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSpawnConfig {
    /// Court name, used for the spawn handler ledger passphrase.
    pub court: String,
    pub locations: Vec<LedgerId>,
    pub forgers: Vec<String>,
    #[serde(flatten)]
    pub pool: ArtifactsConfig,
}

/// Everything a content loader supplies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtContent {
    pub prizes: Vec<PrizeConfig>,
    pub element_combiners: Vec<ElementCombinerConfig>,
    pub artifacts: Option<ArtifactSpawnConfig>,
}

impl CourtContent {
    pub fn validate(&self) -> Result<(), CourtError> {
        self.prizes.iter().try_for_each(validate_prize)?;
        self.element_combiners.iter().try_for_each(validate_combiner)?;
        if let Some(artifacts) = &self.artifacts {
            if artifacts.locations.is_empty() {
                return Err(content("artifact spawn locations are empty"));
            }
            if artifacts.forgers.is_empty() {
                return Err(content("artifact forgers are empty"));
            }
            artifacts.pool.validate()?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.prizes.is_empty() && self.element_combiners.is_empty() && self.artifacts.is_none()
    }
}

fn content(reason: impl Into<String>) -> CourtError {
    CourtError::Content(reason.into())
}

fn validate_prize(prize: &PrizeConfig) -> Result<(), CourtError> {
    if prize.name.is_empty() {
        return Err(content("prize name is empty"));
    }
    if prize.location.is_empty() {
        return Err(content(format!("prize {} has no location", prize.name)));
    }
    if prize.spawn.name.is_empty() || prize.prize.name.is_empty() {
        return Err(content(format!("prize {} templates need names", prize.name)));
    }
    match &prize.validator {
        Some(ValidatorConfig::Altars { altars }) if altars.is_empty() => {
            Err(content(format!("prize {} has no altars", prize.name)))
        }
        Some(ValidatorConfig::Altars { altars }) => altars.iter().try_for_each(|altar| {
            if altar.location.is_empty() || altar.origin_auth.as_str().is_empty() {
                return Err(content(format!("prize {} has an incomplete altar", prize.name)));
            }
            Ok(())
        }),
        Some(ValidatorConfig::Element { fail_message, .. }) if fail_message.is_empty() => {
            Err(content(format!("prize {} needs a fail message", prize.name)))
        }
        Some(ValidatorConfig::Pedestals { pedestals }) if pedestals.is_empty() => {
            Err(content(format!("prize {} has no pedestals", prize.name)))
        }
        Some(ValidatorConfig::Pedestals { pedestals }) => pedestals.iter().try_for_each(
            |(location, inscription)| {
                if location.is_empty() || inscription.is_empty() {
                    return Err(content(format!("prize {} has an incomplete pedestal", prize.name)));
                }
                Ok(())
            },
        ),
        _ => Ok(()),
    }
}

fn validate_combiner(combiner: &ElementCombinerConfig) -> Result<(), CourtError> {
    if combiner.location.is_empty() {
        return Err(content(format!("element combiner {} has no location", combiner.name)));
    }
    if combiner.combinations.is_empty() || combiner.min_required() == 0 {
        return Err(content(format!(
            "element combiner {} needs non-empty combinations",
            combiner.name
        )));
    }
    if let Some(id) = combiner.failure_element {
        if !combiner.elements.iter().any(|e| e.id == id) {
            return Err(content(format!(
                "element combiner {} failure element {id} is not an element",
                combiner.name
            )));
        }
    }
    Ok(())
}
