//! # Domain Layer - Handlers
//!
//! - `supported`: capability sets
//! - `errors`: HandlerError

pub mod errors;
pub mod supported;

pub use errors::*;
pub use supported::*;
