//! # Ledger World Test Suite
//!
//! Cross-crate flows run against a whole node: in-memory ledger, transport,
//! service registry and courts wired the way `node-runtime` wires them.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── transfer_flows.rs   # Pickup and drop handshakes between services
//!     └── court_flows.rs      # Prize, combiner and artifact courts
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p lw-tests
//!
//! # By category
//! cargo test -p lw-tests integration::transfer_flows::
//! cargo test -p lw-tests integration::court_flows::
//! ```

#![allow(dead_code)]

pub mod integration;
