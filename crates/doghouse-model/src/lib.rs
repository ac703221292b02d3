//! Doghouse model -- deterministic simulation core for the dog/loot game.
//!
//! This crate holds everything that happens *inside* one simulation step:
//! static map geometry, the per-session loot store with recyclable slot ids,
//! the scarcity-aware loot generator, the road-constrained motion solver, the
//! swept-disk collision engine, and the [`Session`](session::Session) /
//! [`Game`](game::Game) containers that tie them together.
//!
//! The crate performs no I/O. Sessions advance only through
//! [`Game::tick`](game::Game::tick) with an explicit millisecond delta, so a
//! caller that feeds the same deltas (and the same RNG seeds) always observes
//! the same state.
//!
//! # Quick Start
//!
//! ```
//! use doghouse_model::prelude::*;
//!
//! let mut map = Map::new(MapId::new("town"), "Town");
//! map.add_road(Road::horizontal(Point { x: 0, y: 0 }, 10));
//! map.add_loot_type(LootType::new(10, serde_json::json!({"name": "key"})));
//! map.set_dog_speed(4.0);
//! map.set_bag_capacity(3);
//!
//! let mut game = Game::new(LootGeneratorConfig::new(5_000, 0.5), 60_000);
//! game.add_map(map).unwrap();
//!
//! let session = game.ensure_session_seeded(&MapId::new("town"), 42).unwrap();
//! assert_eq!(session.dogs().count(), 0);
//!
//! game.tick(1_000);
//! ```

#![deny(unsafe_code)]

pub mod collision;
pub mod dog;
pub mod game;
pub mod geom;
pub mod loot;
pub mod loot_gen;
pub mod map;
pub mod motion;
pub mod session;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by model operations.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A map with the same id was already registered.
    #[error("map '{id}' already exists")]
    DuplicateMap { id: map::MapId },

    /// The map id is not part of the game's catalog.
    #[error("unknown map '{id}'")]
    UnknownMap { id: map::MapId },

    /// The map has no roads, so nothing can be placed on it.
    #[error("map '{id}' has no roads")]
    NoRoads { id: map::MapId },

    /// The loot id does not refer to a live slot.
    #[error("loot id {id} is not live")]
    InvalidLootId { id: u64 },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common model usage.
pub mod prelude {
    pub use crate::collision::{find_gather_events, Gatherer, GatherEvent, Item};
    pub use crate::dog::{Bag, Dog, DOG_WIDTH};
    pub use crate::game::{Game, LootGeneratorConfig, DEFAULT_BAG_CAPACITY, DEFAULT_RETIREMENT_TIME_MS};
    pub use crate::geom::{Direction, Point, Vec2, EPSILON};
    pub use crate::loot::{Loot, LootStore, LOOT_WIDTH};
    pub use crate::loot_gen::LootGenerator;
    pub use crate::map::{Building, LootType, Map, MapId, Office, OfficeId, Road, OFFICE_WIDTH, ROAD_WIDTH};
    pub use crate::motion::MotionSolver;
    pub use crate::session::Session;
    pub use crate::ModelError;
}
