//! # Error Types
//!
//! Errors shared across crates. Each crate layers its own enum on top.

use thiserror::Error;

/// Errors raised by shared types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    /// A capability declaration named a type this build does not know.
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    /// A value stored on a ledger had the wrong shape.
    #[error("unexpected value at {path}: expected {expected}")]
    UnexpectedValue {
        /// Path that was resolved.
        path: String,
        /// Expected shape.
        expected: &'static str,
    },
}
