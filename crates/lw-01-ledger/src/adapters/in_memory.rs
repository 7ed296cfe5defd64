//! # In-Memory Ledger
//!
//! Single-node ledger service. Every snapshot is retained so historical
//! lookups by tip always succeed.
//!
//! ## Keyring
//!
//! The node signs with whichever key it holds that is a member of the
//! target ledger's authentication set. Keys enter the keyring when a ledger
//! is created with them or through [`InMemoryLedger::import_key`].
//!
//! ## Ordering
//!
//! All appends take one write lock, so blocks on the same ledger are totally
//! ordered and commit events are emitted in that order.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use shared_types::{Address, LedgerId, Tip};
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::{Block, LedgerError, LedgerKey, LedgerSnapshot, Transaction};
use crate::ports::{CommitEvent, LedgerService};

/// Commit events buffered per subscriber.
pub const COMMIT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Default)]
struct Store {
    histories: HashMap<LedgerId, Vec<LedgerSnapshot>>,
    tips: HashMap<Tip, (LedgerId, usize)>,
}

impl Store {
    fn current(&self, id: &LedgerId) -> Option<&LedgerSnapshot> {
        self.histories.get(id).and_then(|h| h.last())
    }

    fn push(&mut self, snapshot: LedgerSnapshot) {
        let history = self.histories.entry(snapshot.id.clone()).or_default();
        self.tips
            .insert(snapshot.tip, (snapshot.id.clone(), history.len()));
        history.push(snapshot);
    }
}

/// Single-node ledger service.
pub struct InMemoryLedger {
    node_key: LedgerKey,
    keyring: RwLock<HashMap<Address, LedgerKey>>,
    store: RwLock<Store>,
    commits: broadcast::Sender<CommitEvent>,
}

impl InMemoryLedger {
    /// Create a ledger service signing as `node_key`.
    pub fn new(node_key: LedgerKey) -> Self {
        let (commits, _) = broadcast::channel(COMMIT_CHANNEL_CAPACITY);
        let mut keyring = HashMap::new();
        keyring.insert(node_key.address(), node_key.clone());
        Self {
            node_key,
            keyring: RwLock::new(keyring),
            store: RwLock::new(Store::default()),
            commits,
        }
    }

    /// Create a ledger service with a fresh random node key.
    pub fn with_random_key() -> Self {
        Self::new(LedgerKey::generate())
    }

    /// The node key.
    pub fn node_key(&self) -> &LedgerKey {
        &self.node_key
    }

    /// Allow this node to sign for ledgers owned by `key`.
    pub fn import_key(&self, key: LedgerKey) {
        self.keyring.write().insert(key.address(), key);
    }

    /// Number of ledgers held.
    pub fn ledger_count(&self) -> usize {
        self.store.read().histories.len()
    }

    fn insert_genesis(
        &self,
        id: LedgerId,
        genesis_key: &LedgerKey,
        owners: Vec<Address>,
    ) -> Result<LedgerSnapshot, LedgerError> {
        let (block, tip) = Block::sign(
            0,
            None,
            vec![Transaction::set_ownership(owners)],
            genesis_key,
        )?;
        let snapshot = LedgerSnapshot::genesis(id, block, tip);

        let mut store = self.store.write();
        if let Some(existing) = store.current(&snapshot.id) {
            return Err(LedgerError::AlreadyExists(existing.id.clone()));
        }
        store.push(snapshot.clone());
        self.announce(&snapshot);
        Ok(snapshot)
    }

    fn signer_for(&self, snapshot: &LedgerSnapshot) -> Result<LedgerKey, LedgerError> {
        if snapshot.authentications.is_empty() {
            return Err(LedgerError::Unauthorized {
                id: snapshot.id.clone(),
                reason: "ledger has no owners".into(),
            });
        }
        let keyring = self.keyring.read();
        snapshot
            .authentications
            .iter()
            .find_map(|addr| keyring.get(addr).cloned())
            .ok_or_else(|| LedgerError::Unauthorized {
                id: snapshot.id.clone(),
                reason: format!(
                    "no held key in authentication set {:?}",
                    snapshot.authentications
                ),
            })
    }

    fn announce(&self, snapshot: &LedgerSnapshot) {
        // No subscribers is fine
        let _ = self.commits.send(CommitEvent {
            id: snapshot.id.clone(),
            previous_tip: snapshot.block.previous_tip,
            tip: snapshot.tip,
            height: snapshot.height,
        });
        debug!(
            ledger = %snapshot.id,
            height = snapshot.height,
            tip = %snapshot.tip,
            "Block committed"
        );
    }
}

#[async_trait]
impl LedgerService for InMemoryLedger {
    fn node_address(&self) -> Address {
        self.node_key.address()
    }

    async fn create_ledger(&self, owner: &LedgerKey) -> Result<LedgerSnapshot, LedgerError> {
        self.import_key(owner.clone());
        let id = LedgerId::from_genesis(&owner.address());
        self.insert_genesis(id, owner, vec![owner.address()])
    }

    async fn create_owned_ledger(
        &self,
        owners: Vec<Address>,
    ) -> Result<LedgerSnapshot, LedgerError> {
        let genesis_key = LedgerKey::generate();
        let id = LedgerId::from_genesis(&genesis_key.address());
        self.insert_genesis(id, &genesis_key, owners)
    }

    async fn find_or_create_passphrase_ledger(
        &self,
        passphrase: &str,
    ) -> Result<LedgerSnapshot, LedgerError> {
        let key = LedgerKey::from_passphrase(&self.node_key, passphrase);
        let id = LedgerId::from_genesis(&key.address());

        if let Some(existing) = self.store.read().current(&id) {
            return Ok(existing.clone());
        }

        match self.insert_genesis(id.clone(), &key, vec![self.node_address()]) {
            Err(LedgerError::AlreadyExists(_)) => self.require_ledger(&id).await,
            other => other,
        }
    }

    async fn get_ledger(&self, id: &LedgerId) -> Result<Option<LedgerSnapshot>, LedgerError> {
        Ok(self.store.read().current(id).cloned())
    }

    async fn get_ledger_by_tip(&self, tip: &Tip) -> Result<Option<LedgerSnapshot>, LedgerError> {
        let store = self.store.read();
        Ok(store
            .tips
            .get(tip)
            .and_then(|(id, idx)| store.histories.get(id).and_then(|h| h.get(*idx)))
            .cloned())
    }

    async fn resolve(&self, id: &LedgerId, path: &str) -> Result<Option<Value>, LedgerError> {
        let store = self.store.read();
        let current = store
            .current(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        Ok(current.resolve(path).cloned())
    }

    async fn append_transactions(
        &self,
        id: &LedgerId,
        transactions: Vec<Transaction>,
    ) -> Result<LedgerSnapshot, LedgerError> {
        if transactions.is_empty() {
            return Err(LedgerError::InvalidTransaction("empty block".into()));
        }

        let mut store = self.store.write();
        let current = store
            .current(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?
            .clone();

        let signer = self.signer_for(&current)?;
        let (block, tip) = Block::sign(current.height + 1, Some(current.tip), transactions, &signer)?;
        let next = current.apply(block, tip);

        store.push(next.clone());
        self.announce(&next);
        Ok(next)
    }

    fn subscribe_commits(&self) -> broadcast::Receiver<CommitEvent> {
        self.commits.subscribe()
    }
}
