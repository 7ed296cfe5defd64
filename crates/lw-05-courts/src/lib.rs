//! # Courts
//!
//! Puzzles built on the transfer protocol. Every court is a [`Handler`]
//! attached to one or more location ledgers.
//!
//! | Court | Serves | Answers |
//! |-------|--------|---------|
//! | [`PrizeHandler`] | one location with a spawned object | pickup → prize, or `error on pick up: …` |
//! | [`ElementCombinerHandler`] | a location with per-player inventories | drop → bowl, pickup → combined element |
//! | [`ArtifactSpawnHandler`] | artifact spawn locations | ordinary remove handshake |
//!
//! A prize handler may carry a [`PrizeValidator`]:
//!
//! - [`AltarValidator`]: one genuine artifact with the right inscriptions on
//!   each altar;
//! - [`ElementPrizeValidator`]: the player holds the winning element;
//! - [`PedestalValidator`]: a page with the expected inscription on each
//!   pedestal.
//!
//! ## Determinism
//!
//! Every ledger a court creates on the fly is a passphrase ledger named by
//! some tip (location tip for prize objects, inventory tip for bowls,
//! respawner tip for artifacts). Artifact draws are seeded from the same
//! tip through [`seed_from_tip`].
//!
//! ## Failure
//!
//! Business rejections are replied to the player and never fail the
//! service. A respawn that fails after an object was handed out is sent as
//! a [`FatalError`] on the channel given at start; the host decides how to
//! stop.
//!
//! [`Handler`]: lw_03_handlers::Handler

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod altar;
pub mod courts;
pub mod domain;
pub mod element_combiner;
pub mod element_prize;
pub mod origin;
pub mod pedestal;
pub mod ports;
pub mod prize;
pub mod respawner;
mod response;

pub use adapters::{StaticContentLoader, TomlContentLoader};
pub use altar::AltarValidator;
pub use courts::{CourtContext, Courts};
pub use domain::*;
pub use element_combiner::{Combination, ElementCombinerHandler};
pub use element_prize::ElementPrizeValidator;
pub use origin::{origin_snapshot, validate_element_origin};
pub use pedestal::PedestalValidator;
pub use ports::{ContentLoader, PrizeValidator};
pub use prize::PrizeHandler;
pub use respawner::{ArtifactRespawner, ArtifactSpawnHandler, Spawned};
