//! # Core Identifiers
//!
//! Identifiers for ledgers, their versions and the keys that own them.
//!
//! ## Formats
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | `Address` | `0x` + hex(sha256(pubkey)[..20]) | `0x3f1a...` |
//! | `LedgerId` | `did:world:` + genesis owner address | `did:world:0x3f1a...` |
//! | `Tip` | 32-byte content hash, hex on the wire | `9c0e...` |

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte content hash.
pub type Hash = [u8; 32];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// Prefix of every ledger id.
pub const LEDGER_ID_PREFIX: &str = "did:world:";

/// Address of a key allowed to append to a ledger.
///
/// Authentication sets are lists of addresses. Ordering is lexical so that
/// sorted sets compare equal regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    /// Derive the address of an Ed25519 public key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let digest = Sha256::digest(public_key);
        Self(format!("0x{}", hex::encode(&digest[..20])))
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a ledger (player, location, object or service).
///
/// The empty id is used as "absent", matching how inventories report a
/// missing name.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerId(pub String);

impl LedgerId {
    /// Derive a ledger id from the genesis owner's address.
    pub fn from_genesis(owner: &Address) -> Self {
        Self(format!("{LEDGER_ID_PREFIX}{}", owner.0))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty "absent" id.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LedgerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for LedgerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Content hash identifying one version of a ledger.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Tip(pub Hash);

impl Tip {
    /// Raw hash bytes.
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hex rendering.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let hash: Hash = bytes.try_into().ok()?;
        Some(Self(hash))
    }
}

impl fmt::Debug for Tip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tip({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for Tip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Tip {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Tip {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Tip::from_hex(&s).ok_or_else(|| serde::de::Error::custom("invalid tip hex"))
    }
}

/// Sort an authentication set and drop duplicates.
pub fn normalize_auths(auths: &[Address]) -> Vec<Address> {
    let mut sorted = auths.to_vec();
    sorted.sort();
    sorted.dedup();
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_is_deterministic() {
        let key = [7u8; 32];
        let a = Address::from_public_key(&key);
        let b = Address::from_public_key(&key);
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("0x"));
        assert_eq!(a.as_str().len(), 2 + 40);
    }

    #[test]
    fn test_ledger_id_from_genesis() {
        let addr = Address::from("0xabc");
        assert_eq!(LedgerId::from_genesis(&addr).as_str(), "did:world:0xabc");
    }

    #[test]
    fn test_tip_hex_roundtrip_through_json() {
        let tip = Tip([9u8; 32]);
        let json = serde_json::to_string(&tip).unwrap();
        let back: Tip = serde_json::from_str(&json).unwrap();
        assert_eq!(tip, back);
    }

    #[test]
    fn test_normalize_auths_sorts_and_dedups() {
        let auths = vec![Address::from("0xb"), Address::from("0xa"), Address::from("0xb")];
        assert_eq!(
            normalize_auths(&auths),
            vec![Address::from("0xa"), Address::from("0xb")]
        );
    }
}
