//! # Domain Layer - Transfer
//!
//! - `state`: handshake states
//! - `rollback`: compensating actions
//! - `config`: timeouts
//! - `errors`: TransferError

pub mod config;
pub mod errors;
pub mod rollback;
pub mod state;

pub use config::*;
pub use errors::*;
pub use rollback::*;
pub use state::*;
