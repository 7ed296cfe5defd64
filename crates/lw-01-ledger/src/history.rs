//! # Ownership History
//!
//! Walks a ledger's block chain backwards through [`LedgerService::get_ledger_by_tip`]
//! to answer "who owned this, and when". Courts use it to verify that an
//! object really originated from the service that minted it.

use shared_types::{Address, Tip};

use crate::domain::{LedgerError, LedgerSnapshot};
use crate::ports::LedgerService;

/// One ownership change in a ledger's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipChange {
    /// Tip right after the change.
    pub tip: Tip,
    /// Authentication set after the change, sorted.
    pub authentications: Vec<Address>,
    /// Height of the block carrying the change.
    pub height: u64,
}

/// Every block carrying a `SetOwnership`, newest to oldest.
///
/// Genesis always sets ownership, so a ledger has at least one entry.
pub async fn ownership_changes<L>(
    ledgers: &L,
    snapshot: &LedgerSnapshot,
) -> Result<Vec<OwnershipChange>, LedgerError>
where
    L: LedgerService + ?Sized,
{
    let mut changes = Vec::new();
    let mut current = snapshot.clone();

    loop {
        if current.block.has_set_ownership() {
            changes.push(OwnershipChange {
                tip: current.tip,
                authentications: current.authentications.clone(),
                height: current.height,
            });
        }

        let Some(previous) = current.block.previous_tip else {
            break;
        };
        current = ledgers
            .get_ledger_by_tip(&previous)
            .await?
            .ok_or_else(|| LedgerError::UnknownTip(previous.to_hex()))?;
    }

    Ok(changes)
}

/// True when every expected address owns the snapshot.
pub fn verify_ownership(snapshot: &LedgerSnapshot, expected: &[Address]) -> bool {
    snapshot.is_owned_by(expected)
}

/// The state of the same ledger at an earlier height.
pub async fn snapshot_at_height<L>(
    ledgers: &L,
    snapshot: &LedgerSnapshot,
    height: u64,
) -> Result<LedgerSnapshot, LedgerError>
where
    L: LedgerService + ?Sized,
{
    if height > snapshot.height {
        return Err(LedgerError::InvalidPath(format!(
            "height {height} is above tip height {}",
            snapshot.height
        )));
    }

    let mut current = snapshot.clone();
    while current.height > height {
        let previous = current
            .block
            .previous_tip
            .ok_or_else(|| LedgerError::UnknownTip(format!("no block below {}", current.height)))?;
        current = ledgers
            .get_ledger_by_tip(&previous)
            .await?
            .ok_or_else(|| LedgerError::UnknownTip(previous.to_hex()))?;
    }
    Ok(current)
}

/// True when every expected address owned the ledger at `height`.
pub async fn verify_ownership_at<L>(
    ledgers: &L,
    snapshot: &LedgerSnapshot,
    height: u64,
    expected: &[Address],
) -> Result<bool, LedgerError>
where
    L: LedgerService + ?Sized,
{
    let at = snapshot_at_height(ledgers, snapshot, height).await?;
    Ok(verify_ownership(&at, expected))
}
