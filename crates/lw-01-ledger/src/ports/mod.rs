//! # Ports
//!
//! The ledger facade consumed by inventories, handlers and courts.

use async_trait::async_trait;
use serde_json::Value;
use shared_types::{Address, LedgerId, Tip};
use tokio::sync::broadcast;

use crate::domain::{LedgerError, LedgerKey, LedgerSnapshot, Transaction};

/// Announcement that a ledger committed a new block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEvent {
    /// Ledger that changed.
    pub id: LedgerId,
    /// Tip before the block. `None` for genesis.
    pub previous_tip: Option<Tip>,
    /// New tip.
    pub tip: Tip,
    /// New height.
    pub height: u64,
}

/// Opaque ledger service.
///
/// Implementations must serialize appends per ledger id and only accept
/// blocks signed by a member of the current authentication set.
#[async_trait]
pub trait LedgerService: Send + Sync {
    /// Address of this node's own key.
    fn node_address(&self) -> Address;

    /// Create a ledger owned by `owner`. The key is kept for later appends.
    async fn create_ledger(&self, owner: &LedgerKey) -> Result<LedgerSnapshot, LedgerError>;

    /// Create a ledger under a fresh genesis key, owned by `owners`.
    ///
    /// This is how the node mints objects: the genesis key is discarded and
    /// only the listed addresses can ever append.
    async fn create_owned_ledger(&self, owners: Vec<Address>)
        -> Result<LedgerSnapshot, LedgerError>;

    /// Fetch or create the ledger named by `passphrase`.
    ///
    /// The same passphrase always maps to the same ledger on this node. A new
    /// ledger is owned by the node key.
    async fn find_or_create_passphrase_ledger(
        &self,
        passphrase: &str,
    ) -> Result<LedgerSnapshot, LedgerError>;

    /// Current state of a ledger, `None` if unknown.
    async fn get_ledger(&self, id: &LedgerId) -> Result<Option<LedgerSnapshot>, LedgerError>;

    /// Historical state by tip, `None` if unknown.
    async fn get_ledger_by_tip(&self, tip: &Tip) -> Result<Option<LedgerSnapshot>, LedgerError>;

    /// Resolve a path in a ledger's current data.
    async fn resolve(&self, id: &LedgerId, path: &str) -> Result<Option<Value>, LedgerError>;

    /// Sign and append a block of transactions.
    async fn append_transactions(
        &self,
        id: &LedgerId,
        transactions: Vec<Transaction>,
    ) -> Result<LedgerSnapshot, LedgerError>;

    /// Receive an event for every committed block on any ledger.
    fn subscribe_commits(&self) -> broadcast::Receiver<CommitEvent>;

    /// Current state, failing with `NotFound` if unknown.
    async fn require_ledger(&self, id: &LedgerId) -> Result<LedgerSnapshot, LedgerError> {
        self.get_ledger(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(id.clone()))
    }

    /// Append a single SetData.
    async fn set_data(
        &self,
        id: &LedgerId,
        path: &str,
        value: Value,
    ) -> Result<LedgerSnapshot, LedgerError> {
        self.append_transactions(
            id,
            vec![Transaction::SetData {
                path: path.to_string(),
                value,
            }],
        )
        .await
    }

    /// Replace the authentication set.
    async fn set_ownership(
        &self,
        id: &LedgerId,
        authentications: Vec<Address>,
    ) -> Result<LedgerSnapshot, LedgerError> {
        self.append_transactions(id, vec![Transaction::set_ownership(authentications)])
            .await
    }

    /// Current authentication set.
    async fn authentications(&self, id: &LedgerId) -> Result<Vec<Address>, LedgerError> {
        Ok(self.require_ledger(id).await?.authentications)
    }
}
