//! # Domain Layer - Inventory
//!
//! - `paths`: reserved data paths
//! - `interaction`: command descriptors stored on objects
//! - `errors`: InventoryError

pub mod errors;
pub mod interaction;
pub mod paths;

pub use errors::*;
pub use interaction::*;
pub use paths::*;
