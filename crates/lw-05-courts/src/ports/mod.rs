//! # Ports
//!
//! Seams of the courts: where content comes from and how a prize handler
//! decides whether a player has earned its prize.

use async_trait::async_trait;
use shared_types::RequestObjectTransferMessage;

use crate::domain::{CourtContent, CourtError};

/// Supplies court content. The court core never reads files itself.
#[async_trait]
pub trait ContentLoader: Send + Sync {
    async fn load(&self) -> Result<CourtContent, CourtError>;
}

/// Extra check run by a prize handler before any mutation.
#[async_trait]
pub trait PrizeValidator: Send + Sync {
    /// `Ok(false)` or an error rejects the pickup. Error text reaches the
    /// player.
    async fn validate(&self, request: &RequestObjectTransferMessage) -> Result<bool, CourtError>;

    /// Runs after the prize was handed out. Errors are only logged.
    async fn cleanup(&self, _request: &RequestObjectTransferMessage) -> Result<(), CourtError> {
        Ok(())
    }
}
