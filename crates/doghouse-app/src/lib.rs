//! Doghouse app -- session engine around the simulation core.
//!
//! Where [`doghouse_model`] simulates, this crate operates: it maps bearer
//! tokens to players, orchestrates joins/actions/ticks through a single
//! [`Application`](app::Application), snapshots live state to disk atomically,
//! drains retired players into the relational stats store, and drives the
//! whole thing from one serialization domain (an actor task) plus a
//! monotonic-clock ticker.
//!
//! The HTTP transport is a collaborator, not a resident: it talks to the
//! [`GameHandle`](domain::GameHandle) and maps [`AppError`] kinds onto status
//! codes.

#![deny(unsafe_code)]

pub mod app;
pub mod config;
pub mod domain;
pub mod registry;
pub mod snapshot;
pub mod stats;
pub mod ticker;

use doghouse_model::map::MapId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced by application operations. The transport maps these onto
/// HTTP statuses: `MapNotFound` is a 404, `UnknownToken` a 401,
/// `InvalidArgument`/`AutoTickActive` a 400, everything else a 500.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The map id is not part of the catalog.
    #[error("map '{id}' not found")]
    MapNotFound { id: MapId },

    /// A request carried a value the core refuses to act on.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The bearer token does not identify a live player.
    #[error("unknown token")]
    UnknownToken,

    /// Manual ticks are refused while the auto ticker owns the clock.
    #[error("manual tick is unavailable while the auto ticker is running")]
    AutoTickActive,

    /// The serialization domain has shut down.
    #[error("game loop is not running")]
    Stopped,

    /// Unexpected failure inside the core.
    #[error("internal error: {reason}")]
    Internal { reason: String },

    /// Snapshot file could not be written or read.
    #[error("state file error: {0}")]
    Snapshot(#[from] snapshot::SnapshotError),

    /// Stats store failure.
    #[error("database error: {0}")]
    Database(#[from] stats::StatsError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for embedding the engine.
pub mod prelude {
    pub use crate::app::{Application, GameStateView, JoinInfo, MoveCommand, PlayerListView};
    pub use crate::config::load_game;
    pub use crate::domain::GameHandle;
    pub use crate::registry::{PlayerRegistry, RetiredPlayer, Token};
    pub use crate::stats::{LeaderboardRow, PlayerStatsStore};
    pub use crate::AppError;
}
