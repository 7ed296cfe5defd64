//! # Capability Registry
//!
//! Resolves the handler attached to an entity ledger:
//!
//! 1. read `handler` on the entity ledger;
//! 2. read `world/handler/supports` and `world/handler/peers` on the handler
//!    ledger (a missing list is empty);
//! 3. build a [`RemoteHandler`] that publishes on the handler topic.
//!
//! No `handler` path is not an error. Callers fall back to a
//! [`TopicBroadcastHandler`] on the inventory topic.

use std::sync::Arc;

use lw_01_ledger::{LedgerService, LedgerSnapshot};
use lw_02_inventory::{HANDLER_PATH, HANDLER_PEERS_PATH, HANDLER_SUPPORTS_PATH};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared_bus::Transport;
use shared_types::{LedgerId, WorldError};
use tracing::{debug, warn};

use crate::domain::{HandlerError, SupportedMessages};
use crate::handlers::{RemoteHandler, TopicBroadcastHandler};
use crate::ports::Handler;

/// Handler attached to `ledger`, or `None` when the ledger declares none.
pub async fn find_handler_for_ledger(
    ledgers: &dyn LedgerService,
    transport: Arc<dyn Transport>,
    ledger: &LedgerId,
) -> Result<Option<RemoteHandler>, HandlerError> {
    let handler_id = match ledgers.resolve(ledger, HANDLER_PATH).await? {
        None => return Ok(None),
        Some(Value::String(id)) if !id.is_empty() => LedgerId::from(id),
        Some(_) => {
            return Err(HandlerError::Other(
                WorldError::UnexpectedValue {
                    path: HANDLER_PATH.to_string(),
                    expected: "ledger id string",
                }
                .to_string(),
            ))
        }
    };
    get_remote_handler(ledgers, transport, &handler_id)
        .await
        .map(Some)
}

/// Build a handle for a handler ledger directly.
pub async fn get_remote_handler(
    ledgers: &dyn LedgerService,
    transport: Arc<dyn Transport>,
    handler_id: &LedgerId,
) -> Result<RemoteHandler, HandlerError> {
    let snapshot = ledgers.require_ledger(handler_id).await?;

    let supported = declared::<SupportedMessages>(&snapshot, HANDLER_SUPPORTS_PATH);
    let peers = declared::<Vec<String>>(&snapshot, HANDLER_PEERS_PATH);

    debug!(
        handler = %handler_id,
        supported = ?supported.names(),
        peers = peers.len(),
        "[lw-03] Resolved remote handler"
    );
    Ok(RemoteHandler::new(
        handler_id.clone(),
        supported,
        peers,
        transport,
    ))
}

/// Value declared at `path`. Missing is empty; malformed is empty and logged.
fn declared<T: DeserializeOwned + Default>(snapshot: &LedgerSnapshot, path: &str) -> T {
    match snapshot.resolve_as::<T>(path) {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            warn!(
                handler = %snapshot.id,
                path,
                error = %e,
                "[lw-03] Malformed handler declaration, treating as empty"
            );
            T::default()
        }
    }
}

/// The attached handler of `ledger`, or a broadcast on its inventory topic.
pub async fn find_handler_or_broadcast(
    ledgers: &dyn LedgerService,
    transport: Arc<dyn Transport>,
    ledger: &LedgerId,
) -> Result<Arc<dyn Handler>, HandlerError> {
    Ok(
        match find_handler_for_ledger(ledgers, transport.clone(), ledger).await? {
            Some(remote) => Arc::new(remote),
            None => Arc::new(TopicBroadcastHandler::for_inventory(transport, ledger)),
        },
    )
}

/// Point `ledger` at `handler_id`.
pub async fn attach_handler(
    ledgers: &dyn LedgerService,
    ledger: &LedgerId,
    handler_id: &LedgerId,
) -> Result<(), HandlerError> {
    ledgers
        .set_data(ledger, HANDLER_PATH, json!(handler_id.as_str()))
        .await?;
    Ok(())
}
