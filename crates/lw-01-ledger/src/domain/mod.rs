//! # Domain Layer - Ledger Facade
//!
//! ## Components
//!
//! - `transaction`: SetData / SetOwnership / TokenTransfer
//! - `snapshot`: Block and LedgerSnapshot
//! - `keys`: Ed25519 ledger keys and passphrase derivation
//! - `path`: slash-separated addressing into the JSON data tree
//! - `errors`: LedgerError enumeration

pub mod errors;
pub mod keys;
pub mod path;
pub mod snapshot;
pub mod transaction;

pub use errors::*;
pub use keys::*;
pub use path::*;
pub use snapshot::*;
pub use transaction::*;
