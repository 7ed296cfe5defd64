//! # Handler Implementations
//!
//! - `composite`: ordered, table-dispatched children
//! - `noop`: accepts nothing
//! - `broadcast`: publish on an inventory topic
//! - `remote`: publish on a handler ledger's topic
//! - `local`: in-process service mailbox

pub mod broadcast;
pub mod composite;
pub mod local;
pub mod noop;
pub mod remote;

pub use broadcast::TopicBroadcastHandler;
pub use composite::CompositeHandler;
pub use local::LocalHandler;
pub use noop::NoopHandler;
pub use remote::RemoteHandler;
