//! # Message Handlers
//!
//! Every entity in the world (player, location, court) is served by a
//! handler: a unit that declares which [`MessageType`]s it accepts and
//! handles them.
//!
//! ## Capability Model
//!
//! ```text
//!  entity ledger                handler ledger
//!  ┌─────────────────┐          ┌───────────────────────────────────┐
//!  │ handler: did:.. │ ───────→ │ world/handler/supports:           │
//!  └─────────────────┘          │   ["world.TransferredObjectMessage"]│
//!                               │ world/handler/peers: [hex keys]    │
//!                               └───────────────────────────────────┘
//!                                            │ topic = handler id
//!                                            ▼
//!                                     ServiceActor (one mailbox)
//! ```
//!
//! | Handler | Supports | Handle |
//! |---------|----------|--------|
//! | [`CompositeHandler`] | union of children | every child registered for the type, in order |
//! | [`NoopHandler`] | nothing | always `UnsupportedMessageType` |
//! | [`TopicBroadcastHandler`] | everything | publish on an inventory topic |
//! | [`RemoteHandler`] | declared list | publish on the handler topic |
//! | [`LocalHandler`] | asked of the mailbox | fire-and-forget into the mailbox |
//!
//! A handler given a message outside its declared set returns
//! [`HandlerError::UnsupportedMessageType`] without side effects.
//!
//! ## One Producer Per Ledger
//!
//! [`ServiceRegistry`] runs at most one [`ServiceActor`] per ledger id. The
//! actor handles messages strictly in order, so the read-modify-write
//! inventory updates of a single ledger never interleave.
//!
//! [`MessageType`]: shared_types::MessageType

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod handlers;
pub mod logger;
pub mod ports;
pub mod registry;
pub mod service;

pub use domain::*;
pub use handlers::{
    CompositeHandler, LocalHandler, NoopHandler, RemoteHandler, TopicBroadcastHandler,
};
pub use logger::ComponentLogger;
pub use ports::Handler;
pub use registry::{
    attach_handler, find_handler_for_ledger, find_handler_or_broadcast, get_remote_handler,
};
pub use service::{ServiceActor, ServiceCommand, ServiceHandle, ServiceRegistry};
