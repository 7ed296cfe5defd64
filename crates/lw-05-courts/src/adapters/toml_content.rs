//! Content read from a TOML file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::domain::{CourtContent, CourtError};
use crate::ports::ContentLoader;

#[derive(Debug, Clone)]
pub struct TomlContentLoader {
    path: PathBuf,
}

impl TomlContentLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ContentLoader for TomlContentLoader {
    async fn load(&self) -> Result<CourtContent, CourtError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CourtError::Content(format!("reading {}: {e}", self.path.display()))
        })?;
        let content: CourtContent = toml::from_str(&raw).map_err(|e| {
            CourtError::Content(format!("parsing {}: {e}", self.path.display()))
        })?;
        content.validate()?;

        info!(
            path = %self.path.display(),
            prizes = content.prizes.len(),
            element_combiners = content.element_combiners.len(),
            artifacts = content.artifacts.is_some(),
            "[lw-05] Court content loaded"
        );
        Ok(content)
    }
}
