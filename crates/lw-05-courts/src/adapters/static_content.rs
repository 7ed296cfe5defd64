//! Content held in memory, for tests and embedded worlds.

use async_trait::async_trait;

use crate::domain::{CourtContent, CourtError};
use crate::ports::ContentLoader;

#[derive(Debug, Clone, Default)]
pub struct StaticContentLoader {
    content: CourtContent,
}

impl StaticContentLoader {
    pub fn new(content: CourtContent) -> Self {
        Self { content }
    }
}

#[async_trait]
impl ContentLoader for StaticContentLoader {
    async fn load(&self) -> Result<CourtContent, CourtError> {
        self.content.validate()?;
        Ok(self.content.clone())
    }
}
