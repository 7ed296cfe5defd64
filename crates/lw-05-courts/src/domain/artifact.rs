//! # Artifacts
//!
//! Inscribed objects placed at random spawn locations. Everything random
//! about an artifact is drawn from a generator seeded by a ledger tip, so
//! any node replaying the same ledger draws the same artifact.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared_types::{Address, LedgerId};

use crate::domain::CourtError;

pub const ARTIFACT_PREFIX: &str = "artifact-";

/// Inscription keys drawn from the configured artifacts' values.
pub const INSCRIBABLE: [&str; 4] = ["type", "material", "age", "weight"];

/// Inscription naming who forged the artifact.
pub const FORGED_BY: &str = "forged by";

/// Blank options added to every inscribable key.
pub const BLANKS_PER_KEY: usize = 2;

/// A generator seeded from `sha256(tip)`.
pub fn seed_from_tip(tip: &[u8]) -> StdRng {
    let seed: [u8; 32] = Sha256::digest(tip).into();
    StdRng::from_seed(seed)
}

/// The five inscriptions that identify an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactInscriptions {
    #[serde(rename = "type")]
    pub kind: String,
    pub material: String,
    pub age: String,
    pub weight: String,
    #[serde(rename = "forged by")]
    pub forged_by: String,
}

impl ArtifactInscriptions {
    /// Value for an inscription key.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "type" => Some(&self.kind),
            "material" => Some(&self.material),
            "age" => Some(&self.age),
            "weight" => Some(&self.weight),
            FORGED_BY => Some(&self.forged_by),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), CourtError> {
        for key in INSCRIBABLE.iter().chain(std::iter::once(&FORGED_BY)) {
            if self.get(key).map_or(true, str::is_empty) {
                return Err(CourtError::Content(format!("artifact inscription {key:?} is empty")));
            }
        }
        Ok(())
    }
}

/// One artifact that can be minted, and who mints it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub origin_auth: Address,
    pub inscriptions: ArtifactInscriptions,
}

impl ArtifactSpec {
    pub fn validate(&self) -> Result<(), CourtError> {
        if self.origin_auth.as_str().is_empty() {
            return Err(CourtError::Content("artifact origin_auth is empty".into()));
        }
        self.inscriptions.validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    #[serde(default)]
    pub artifacts: Vec<ArtifactSpec>,
    #[serde(default)]
    pub names_pool: Vec<String>,
}

impl ArtifactsConfig {
    pub fn validate(&self) -> Result<(), CourtError> {
        if self.artifacts.is_empty() {
            return Err(CourtError::Content("no artifacts configured".into()));
        }
        if self.names_pool.is_empty() {
            return Err(CourtError::Content("artifact names pool is empty".into()));
        }
        self.artifacts.iter().try_for_each(ArtifactSpec::validate)
    }

    /// Options for an inscribable key: every configured value plus blanks.
    fn options(&self, key: &str) -> Vec<&str> {
        self.artifacts
            .iter()
            .filter_map(|a| a.inscriptions.get(key))
            .chain(std::iter::repeat("").take(BLANKS_PER_KEY))
            .collect()
    }
}

/// An artifact drawn but not yet written to a ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub name: String,
    /// Blank draws are left out.
    pub inscriptions: BTreeMap<String, String>,
    pub location: LedgerId,
}

/// Draw an artifact: name, the inscribable keys in order, forger, location.
pub fn generate_artifact<R: Rng>(
    rng: &mut R,
    config: &ArtifactsConfig,
    forgers: &[String],
    locations: &[LedgerId],
) -> Result<GeneratedArtifact, CourtError> {
    let empty = |what: &str| CourtError::Content(format!("no {what} to draw from"));

    let name = config.names_pool.choose(rng).ok_or_else(|| empty("names"))?;

    let mut inscriptions = BTreeMap::new();
    for key in INSCRIBABLE {
        let value = config.options(key).choose(rng).copied().unwrap_or_default();
        if !value.is_empty() {
            inscriptions.insert(key.to_string(), value.to_string());
        }
    }

    let forger = forgers.choose(rng).ok_or_else(|| empty("forgers"))?;
    inscriptions.insert(FORGED_BY.to_string(), forger.clone());

    let location = locations.choose(rng).ok_or_else(|| empty("spawn locations"))?;

    Ok(GeneratedArtifact {
        name: format!("{ARTIFACT_PREFIX}{name}"),
        inscriptions,
        location: location.clone(),
    })
}
