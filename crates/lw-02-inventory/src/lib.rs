//! # Inventory and Object Views
//!
//! Typed views over the reserved `world/...` paths of a ledger.
//!
//! ## Inventory
//!
//! An inventory lives at `world/inventory` inside its owner's ledger. It is
//! stored as `name → object id` and read back as `object id → name`.
//!
//! ```text
//!  player ledger                     object ledger
//!  ┌──────────────────────────┐      ┌──────────────────────┐
//!  │ world/inventory          │      │ world/name: "lamp"    │
//!  │   lamp: did:world:0xab.. │ ───→ │ world/description     │
//!  └──────────────────────────┘      │ world/interactions    │
//!                                    └──────────────────────┘
//! ```
//!
//! Every mutation rewrites the whole map in a single `SetData`. Concurrent
//! writers on the same inventory are prevented by running one service
//! mailbox per ledger id, not by this crate.
//!
//! ## Guarantees
//!
//! | Operation | Guarantee |
//! |-----------|-----------|
//! | `add` | Idempotent. Fails if the object has no string `world/name`. |
//! | `remove` | Idempotent. Removes every listing of the object. |
//! | `force_add` | Always rewrites, refreshing the listed name. |

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod inventory;
pub mod object;

pub use domain::*;
pub use inventory::InventoryLedger;
pub use object::{create_object, create_object_on_ledger, inscriptions_of, name_of, ObjectLedger};
