//! # Ledger Facade
//!
//! The minimal ledger operations everything above relies on: create a ledger,
//! fetch it by id or tip, resolve a path in its data, and append signed
//! transactions.
//!
//! ## Model
//!
//! ```text
//!  genesis ──→ block 1 ──→ block 2 ──→ ... ──→ tip
//!  SetOwnership  SetData     SetOwnership
//!  [creator]     world/name  [new owner]
//! ```
//!
//! | Concept | Meaning |
//! |---------|---------|
//! | Authentication set | Addresses allowed to append. Doubles as ownership. |
//! | Tip | sha256 over previous tip, height and transactions |
//! | Snapshot | Full state after one block, retrievable by tip forever |
//!
//! ## Invariants
//!
//! - A block is accepted only when signed by a key whose address is in the
//!   ledger's current authentication set.
//! - `SetOwnership` replaces the set. An empty set freezes the ledger.
//! - Heights increase by exactly one per block.
//!
//! ## Layout
//!
//! - `domain`: transactions, snapshots, keys, path addressing, errors
//! - `ports`: the [`LedgerService`] trait consumed by every other crate
//! - `adapters`: [`InMemoryLedger`], a single-node reference implementation
//! - `history`: ownership history walks over any [`LedgerService`]

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod history;
pub mod ports;

pub use adapters::InMemoryLedger;
pub use domain::*;
pub use history::{
    ownership_changes, snapshot_at_height, verify_ownership, verify_ownership_at, OwnershipChange,
};
pub use ports::{CommitEvent, LedgerService};
