//! # Blocks and Snapshots
//!
//! A block is a signed batch of transactions. A snapshot is the full ledger
//! state right after one block was applied.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use shared_types::{normalize_auths, Address, LedgerId, PublicKey, Tip};

use super::errors::LedgerError;
use super::keys::{verify_signature, LedgerKey};
use super::path::{is_empty_data, resolve_path, set_path};
use super::transaction::Transaction;

/// A signed batch of transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Height this block produces.
    pub height: u64,
    /// Tip before this block. `None` for genesis.
    pub previous_tip: Option<Tip>,
    /// Transactions in application order.
    pub transactions: Vec<Transaction>,
    /// Public key of the signer.
    pub signer: PublicKey,
    /// Ed25519 signature over the resulting tip.
    pub signature: Vec<u8>,
}

impl Block {
    /// Content hash of a block body. This becomes the ledger tip.
    pub fn content_hash(
        height: u64,
        previous_tip: Option<&Tip>,
        transactions: &[Transaction],
    ) -> Result<Tip, LedgerError> {
        let mut hasher = Sha256::new();
        if let Some(prev) = previous_tip {
            hasher.update(prev.as_bytes());
        }
        hasher.update(height.to_le_bytes());
        hasher.update(serde_json::to_vec(transactions)?);
        Ok(Tip(hasher.finalize().into()))
    }

    /// Build and sign a block, returning it with the tip it produces.
    pub fn sign(
        height: u64,
        previous_tip: Option<Tip>,
        transactions: Vec<Transaction>,
        key: &LedgerKey,
    ) -> Result<(Self, Tip), LedgerError> {
        for txn in &transactions {
            txn.validate()?;
        }
        let tip = Self::content_hash(height, previous_tip.as_ref(), &transactions)?;
        let block = Self {
            height,
            previous_tip,
            transactions,
            signer: key.public_key(),
            signature: key.sign(tip.as_bytes()).to_vec(),
        };
        Ok((block, tip))
    }

    /// Recompute the tip and check the signature.
    pub fn verify(&self) -> Result<Tip, LedgerError> {
        let tip = Self::content_hash(self.height, self.previous_tip.as_ref(), &self.transactions)?;
        verify_signature(&self.signer, tip.as_bytes(), &self.signature)?;
        Ok(tip)
    }

    /// Address of the signer.
    pub fn signer_address(&self) -> Address {
        Address::from_public_key(&self.signer)
    }

    /// True when the block changes ownership.
    pub fn has_set_ownership(&self) -> bool {
        self.transactions.iter().any(Transaction::is_set_ownership)
    }
}

/// Ledger state after a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Ledger id.
    pub id: LedgerId,
    /// Content hash of this state.
    pub tip: Tip,
    /// Height of the block that produced this state.
    pub height: u64,
    /// Current authentication set, sorted.
    pub authentications: Vec<Address>,
    /// Data tree.
    pub data: Value,
    /// The block that produced this state.
    pub block: Block,
}

impl LedgerSnapshot {
    /// State after a genesis block.
    pub fn genesis(id: LedgerId, block: Block, tip: Tip) -> Self {
        let empty = Self {
            id,
            tip,
            height: 0,
            authentications: Vec::new(),
            data: Value::Null,
            block: block.clone(),
        };
        empty.apply(block, tip)
    }

    /// State after applying `block` on top of this one.
    pub fn apply(&self, block: Block, tip: Tip) -> Self {
        let mut data = self.data.clone();
        let mut authentications = self.authentications.clone();

        for txn in &block.transactions {
            match txn {
                Transaction::SetData { path, value } => set_path(&mut data, path, value.clone()),
                Transaction::SetOwnership { authentications: auths } => {
                    authentications = normalize_auths(auths);
                }
                Transaction::TokenTransfer { .. } => {}
            }
        }

        Self {
            id: self.id.clone(),
            tip,
            height: block.height,
            authentications,
            data,
            block,
        }
    }

    /// Resolve a path in the data tree.
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        resolve_path(&self.data, path)
    }

    /// Resolve and deserialize a path. Missing paths yield `Ok(None)`.
    pub fn resolve_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, LedgerError> {
        self.resolve(path)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(LedgerError::from)
    }

    /// Resolve a string value. Non-strings yield `None`.
    pub fn resolve_str(&self, path: &str) -> Option<&str> {
        self.resolve(path).and_then(Value::as_str)
    }

    /// True when the data tree carries nothing.
    pub fn is_data_empty(&self) -> bool {
        is_empty_data(&self.data)
    }

    /// True when every given address is in the authentication set.
    pub fn is_owned_by(&self, expected: &[Address]) -> bool {
        expected.iter().all(|a| self.authentications.contains(a))
    }
}
