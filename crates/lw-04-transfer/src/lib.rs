//! # Transfer Protocol
//!
//! Moves an object ledger from one inventory to another with a two-message
//! handshake. There is no shared transaction across ledgers, so each step
//! that mutates registers a compensating rollback.
//!
//! ## Handshake
//!
//! ```text
//!  requester ──RequestObjectTransfer──→ source (UnrestrictedRemoveHandler)
//!                                          │ resolve inventories, object,
//!                                          │ destination handler
//!                                          │ capability check
//!                                          ▼
//!                         object owners := source ∪ destination   (rollback: source)
//!                         source inventory -= object              (rollback: re-add)
//!                                          │
//!                        ──TransferredObject──→ destination (UnrestrictedAddHandler)
//!                                          │      inventory += object
//!                                          │      object owners := destination
//!                                          ▼
//!                         object tip changed within timeout? ── no ──→ run rollbacks
//! ```
//!
//! ## States
//!
//! | State | Entered when |
//! |-------|--------------|
//! | `Requested` | request received |
//! | `OwnershipReassigning` | capability check passed |
//! | `SourceRemoving` | joint ownership committed |
//! | `DestinationNotifying` | source listing removed |
//! | `Accepted` | receiver changed the object |
//! | `Rejected` | any failure; rollbacks have run |
//!
//! ## Crash Recovery
//!
//! A crash between steps can leave a listing whose object has moved on.
//! [`Reconciler::sweep`] removes such listings.

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod add;
pub mod domain;
pub mod reconcile;
pub mod remove;

pub use add::UnrestrictedAddHandler;
pub use domain::*;
pub use reconcile::Reconciler;
pub use remove::UnrestrictedRemoveHandler;
