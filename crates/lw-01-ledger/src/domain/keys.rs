//! # Ledger Keys
//!
//! Ed25519 keys that sign blocks. A key's address is what appears in
//! authentication sets.
//!
//! - Deterministic signatures (no RNG at signing time)
//! - Passphrase keys are derived from the node key, so two nodes using the
//!   same passphrase get different ledgers

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use shared_types::{Address, PublicKey};
use std::fmt;

use super::errors::LedgerError;

/// A signing key for ledger blocks.
#[derive(Clone)]
pub struct LedgerKey {
    signing_key: SigningKey,
}

impl LedgerKey {
    /// Generate a random key.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Create from a 32-byte secret seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Derive the key for a named ledger owned by `node`.
    pub fn from_passphrase(node: &LedgerKey, passphrase: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(node.signing_key.to_bytes());
        hasher.update(passphrase.as_bytes());
        Self::from_seed(hasher.finalize().into())
    }

    /// Raw public key.
    pub fn public_key(&self) -> PublicKey {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Address used in authentication sets.
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerKey")
            .field("address", &self.address())
            .finish()
    }
}

/// Verify a block signature against a public key.
pub fn verify_signature(
    public_key: &PublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), LedgerError> {
    let verifying_key =
        VerifyingKey::from_bytes(public_key).map_err(|e| LedgerError::Signature(e.to_string()))?;
    let bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| LedgerError::Signature("signature must be 64 bytes".into()))?;
    verifying_key
        .verify(message, &ed25519_dalek::Signature::from_bytes(&bytes))
        .map_err(|e| LedgerError::Signature(e.to_string()))
}
