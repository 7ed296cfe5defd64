//! Reserved data paths shared by every crate that reads world data.

/// Root of all game data inside a ledger.
pub const WORLD_ROOT: &str = "world";

/// Handler ledger id of an entity.
pub const HANDLER_PATH: &str = "handler";

/// Supported message type names on a handler ledger.
pub const HANDLER_SUPPORTS_PATH: &str = "world/handler/supports";

/// Hex public keys of the peers serving a handler.
pub const HANDLER_PEERS_PATH: &str = "world/handler/peers";

/// Inventory map, `name → object id`.
pub const INVENTORY_PATH: &str = "world/inventory";

pub const NAME_PATH: &str = "world/name";
pub const DESCRIPTION_PATH: &str = "world/description";
pub const INSCRIPTIONS_PATH: &str = "world/inscriptions";
pub const INTERACTIONS_PATH: &str = "world/interactions";

/// On a player: `location id → per-player inventory id`.
pub const LOCATION_INVENTORIES_PATH: &str = "world/location-inventories";

/// On a location: whether players get their own inventory there.
pub const PER_PLAYER_INVENTORY_PATH: &str = "world/use-per-player-inventory";

/// Path relative to [`WORLD_ROOT`].
pub fn world_path(relative: &str) -> String {
    let relative = relative.trim_start_matches('/');
    if relative.is_empty() {
        WORLD_ROOT.to_string()
    } else {
        format!("{WORLD_ROOT}/{relative}")
    }
}
