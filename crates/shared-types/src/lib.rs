//! # Shared Types Crate
//!
//! Identifiers, wire messages and error types shared by every crate taking
//! part in the object-transfer protocol.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Ledger ids, addresses, tips and the two
//!   transfer messages are defined here and nowhere else.
//! - **Tagged Dispatch**: Messages travel as the [`GameMessage`] sum type.
//!   Handlers declare capabilities as sets of [`MessageType`] tags, so
//!   dispatch is table driven and never a chain of downcasts.
//! - **Stable Names**: [`MessageType::name`] is the wire name stored in
//!   handler capability declarations. Renaming a variant must not change it.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod ipc;

pub use entities::*;
pub use envelope::Envelope;
pub use errors::*;
pub use ipc::*;
