//! # Adapters
//!
//! - `in_memory`: single-node [`InMemoryLedger`]

pub mod in_memory;

pub use in_memory::InMemoryLedger;
