//! Court state kept on ledgers so services survive restarts.

use serde::{Deserialize, Serialize};
use shared_types::{LedgerId, Tip};

/// `{count}` prize counter on a prize handler ledger.
pub const PRIZE_PATH: &str = "world/prize";

/// Root of the winners record.
pub const WINNERS_PATH: &str = "world/winners";

/// Last artifact spawned by the respawner.
pub const RESPAWN_LAST_PATH: &str = "world/respawn/last";

pub const PRIZE_BUCKET_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeCounter {
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerRecord {
    /// Player ledger tip when the prize was awarded.
    pub player: Tip,
    /// Prize ledger tip after it was handed over.
    pub prize: Tip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastSpawn {
    pub id: LedgerId,
    pub location: LedgerId,
}

/// `world/winners/<bucket>/<n>`, bucket = ceil(n / 100) * 100.
pub fn winner_path(n: u64) -> String {
    let bucket = n.div_ceil(PRIZE_BUCKET_SIZE) * PRIZE_BUCKET_SIZE;
    format!("{WINNERS_PATH}/{bucket}/{n}")
}
