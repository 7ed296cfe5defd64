//! # Integration Flows
//!
//! Each test boots a [`WorldRuntime`] and talks to its services the way a
//! game client does: it resolves the handler attached to a ledger and sends
//! messages over the transport, then watches the ledgers converge.
//!
//! ```text
//!  client ──RequestObjectTransfer──→ [source service] ──TransferredObject──→ [target service]
//!                                          │                                      │
//!                                          └──────────── ledger commits ──────────┘
//! ```

pub mod court_flows;
pub mod transfer_flows;

// =============================================================================
// TEST FIXTURES (only compiled during tests)
// =============================================================================

#[cfg(test)]
use std::future::Future;
#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use lw_01_ledger::{LedgerKey, LedgerService};
#[cfg(test)]
use lw_03_handlers::{find_handler_for_ledger, Handler};
#[cfg(test)]
use node_runtime::{WorldConfig, WorldRuntime};
#[cfg(test)]
use shared_types::{LedgerId, RequestObjectTransferMessage};

/// Node configuration with a fixed key and a short confirmation window.
#[cfg(test)]
pub(crate) fn test_config() -> WorldConfig {
    let mut config = WorldConfig::default();
    config.node.key_seed = Some("42".repeat(32));
    config.transfer.confirmation_timeout_secs = 1;
    config
}

#[cfg(test)]
pub(crate) fn runtime() -> WorldRuntime {
    WorldRuntime::new(test_config()).unwrap()
}

/// A player ledger owned by its own key. The key lands in the node keyring.
#[cfg(test)]
pub(crate) async fn player(ledgers: &Arc<dyn LedgerService>) -> (LedgerId, LedgerKey) {
    let key = LedgerKey::generate();
    let snapshot = ledgers.create_ledger(&key).await.unwrap();
    (snapshot.id, key)
}

/// Ask whatever handler `from` declares to move `object` to `to`.
#[cfg(test)]
pub(crate) async fn request_transfer(
    runtime: &WorldRuntime,
    from: &LedgerId,
    to: &LedgerId,
    object: &LedgerId,
) {
    let infra = runtime.infrastructure();
    let handler = find_handler_for_ledger(infra.ledgers.as_ref(), infra.transport(), from)
        .await
        .unwrap()
        .expect("source inventory has no handler");
    let request = RequestObjectTransferMessage {
        from: from.clone(),
        to: to.clone(),
        object: object.clone(),
    };
    handler.handle(&request.into()).await.unwrap();
}

/// Poll `check` until it holds or two seconds pass.
#[cfg(test)]
pub(crate) async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}
