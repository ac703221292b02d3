//! The application: every operation a client can cause, in one place.
//!
//! All methods are synchronous and expect to run on the serialization domain
//! (see [`crate::domain`]); nothing here is safe to call concurrently from
//! two threads, and nothing here needs to be. Retirement drainage hands the
//! final stats back to the caller instead of touching the database itself, so
//! the core stays free of I/O.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use doghouse_model::dog::{raise_dog_id_floor, Bag};
use doghouse_model::game::Game;
use doghouse_model::geom::{Direction, Vec2};
use doghouse_model::map::{Map, MapId};

use crate::registry::{PlayerRegistry, RetiredPlayer, Token};
use crate::snapshot::{self, DogRecord, LootRecord, StateSnapshot};
use crate::AppError;

/// Hard cap on leaderboard page size.
pub const MAX_RECORDS_LIMIT: u64 = 100;

// ---------------------------------------------------------------------------
// Client-facing value types
// ---------------------------------------------------------------------------

/// Result of a successful join.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinInfo {
    pub auth_token: Token,
    pub player_id: u64,
}

/// A movement order from the wire: a direction or a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveCommand {
    Up,
    Down,
    Left,
    Right,
    Stop,
}

impl MoveCommand {
    /// Parse the wire encoding: `U`/`D`/`L`/`R` or the empty string.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "U" => Some(Self::Up),
            "D" => Some(Self::Down),
            "L" => Some(Self::Left),
            "R" => Some(Self::Right),
            "" => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Names of everyone sharing a session, keyed by dog id.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct PlayerListView {
    pub players: BTreeMap<u64, PlayerNameView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerNameView {
    pub name: String,
}

/// The session as a client sees it. Only non-carried loot appears in
/// `lostObjects`.
#[derive(Debug, Clone, Serialize)]
pub struct GameStateView {
    pub players: BTreeMap<u64, PlayerStateView>,
    #[serde(rename = "lostObjects")]
    pub lost_objects: BTreeMap<u64, LootView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerStateView {
    pub pos: [f64; 2],
    pub speed: [f64; 2],
    pub dir: &'static str,
    pub bag: Vec<BagItemView>,
    pub score: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BagItemView {
    pub id: u64,
    #[serde(rename = "type")]
    pub type_index: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LootView {
    #[serde(rename = "type")]
    pub type_index: u64,
    pub pos: [f64; 2],
}

// ---------------------------------------------------------------------------
// Autosave listener
// ---------------------------------------------------------------------------

/// Accumulates tick deltas and fires when a save is due.
#[derive(Debug, Clone)]
struct AutosaveListener {
    save_period_ms: u64,
    since_last_save_ms: u64,
}

impl AutosaveListener {
    fn new(save_period_ms: u64) -> Self {
        Self { save_period_ms, since_last_save_ms: 0 }
    }

    /// Account for one tick; true means "save now" (and resets the clock).
    fn on_tick(&mut self, delta_ms: u64) -> bool {
        self.since_last_save_ms += delta_ms;
        if self.since_last_save_ms >= self.save_period_ms {
            self.since_last_save_ms = 0;
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Owns the game tree and the player registry and exposes the operations the
/// transport calls: join, action, state queries, ticks, and snapshot
/// save/restore.
#[derive(Debug)]
pub struct Application {
    game: Game,
    registry: PlayerRegistry,
    randomize_spawn_points: bool,
    state_path: Option<PathBuf>,
    auto_ticking: bool,
    autosave: Option<AutosaveListener>,
}

impl Application {
    pub fn new(game: Game, randomize_spawn_points: bool) -> Self {
        Self {
            game,
            registry: PlayerRegistry::new(),
            randomize_spawn_points,
            state_path: None,
            auto_ticking: false,
            autosave: None,
        }
    }

    /// Maps in catalog order.
    pub fn maps(&self) -> &[Map] {
        self.game.maps()
    }

    pub fn find_map(&self, id: &MapId) -> Option<&Map> {
        self.game.find_map(id)
    }

    /// Save state automatically every `save_period_ms` of simulated time.
    pub fn enable_autosave(&mut self, save_period_ms: u64) {
        self.autosave = Some(AutosaveListener::new(save_period_ms));
    }

    /// Marks the auto ticker as owner of the clock; manual ticks are refused
    /// while set.
    pub fn set_auto_ticking(&mut self, on: bool) {
        self.auto_ticking = on;
    }

    pub fn is_auto_ticking(&self) -> bool {
        self.auto_ticking
    }

    // -- player operations --------------------------------------------------

    /// Join `user_name` to `map_id`, creating the session on first use.
    /// Re-joining an existing `(map, name)` pair returns the original token.
    pub fn join_game(&mut self, map_id: &MapId, user_name: &str) -> Result<JoinInfo, AppError> {
        if user_name.is_empty() {
            return Err(AppError::InvalidArgument { reason: "user name is empty".into() });
        }
        if self.game.find_map(map_id).is_none() {
            return Err(AppError::MapNotFound { id: map_id.clone() });
        }
        let randomize = self.randomize_spawn_points;
        let Self { game, registry, .. } = self;
        game.ensure_session(map_id)
            .map_err(|e| AppError::Internal { reason: e.to_string() })?;
        let (map, session) = game
            .map_and_session_mut(map_id)
            .ok_or_else(|| AppError::Internal { reason: "session vanished".into() })?;
        let (token, dog_id) = registry.join(map, session, user_name, randomize, None);
        Ok(JoinInfo { auth_token: token, player_id: dog_id })
    }

    /// The `(map, dog)` pair behind a token, if it is live.
    pub fn find_player(&self, token: &Token) -> Option<(&MapId, u64)> {
        self.registry.find(token).map(|p| (&p.map_id, p.dog_id))
    }

    /// Everyone in the same session as `token`, ascending by dog id.
    pub fn players_visible_to(&self, token: &Token) -> Result<PlayerListView, AppError> {
        let player = self.registry.find(token).ok_or(AppError::UnknownToken)?;
        let session = self
            .game
            .session(&player.map_id)
            .ok_or_else(|| AppError::Internal { reason: "player has no session".into() })?;
        let players = session
            .dogs()
            .map(|dog| (dog.id(), PlayerNameView { name: dog.name().to_owned() }))
            .collect();
        Ok(PlayerListView { players })
    }

    /// The dynamic state of the session `token` plays in.
    pub fn game_state(&self, token: &Token) -> Result<GameStateView, AppError> {
        let player = self.registry.find(token).ok_or(AppError::UnknownToken)?;
        let session = self
            .game
            .session(&player.map_id)
            .ok_or_else(|| AppError::Internal { reason: "player has no session".into() })?;

        let players = session
            .dogs()
            .map(|dog| {
                let bag = dog
                    .bag()
                    .ids()
                    .iter()
                    .map(|&id| BagItemView {
                        id,
                        type_index: session
                            .loot()
                            .get(id)
                            .map(|l| l.type_index())
                            .unwrap_or_default(),
                    })
                    .collect();
                let view = PlayerStateView {
                    pos: [dog.position().x, dog.position().y],
                    speed: [dog.speed().x, dog.speed().y],
                    dir: dog.direction().as_str(),
                    bag,
                    score: dog.score(),
                };
                (dog.id(), view)
            })
            .collect();

        let lost_objects = session
            .loot()
            .visible()
            .map(|(id, loot)| {
                let view = LootView {
                    type_index: loot.type_index(),
                    pos: [loot.position().x, loot.position().y],
                };
                (id, view)
            })
            .collect();

        Ok(GameStateView { players, lost_objects })
    }

    /// Set the player's speed and facing from a movement order. A stop keeps
    /// the facing and zeroes the speed.
    pub fn move_player(&mut self, token: &Token, command: MoveCommand) -> Result<(), AppError> {
        let player = self.registry.find(token).ok_or(AppError::UnknownToken)?.clone();
        let speed = self
            .game
            .find_map(&player.map_id)
            .map(Map::dog_speed)
            .ok_or_else(|| AppError::Internal { reason: "player map vanished".into() })?;
        let dog = self
            .game
            .session_mut(&player.map_id)
            .and_then(|s| s.dog_mut(player.dog_id))
            .ok_or(AppError::UnknownToken)?;
        match command {
            MoveCommand::Up => {
                dog.set_speed(Vec2::new(0.0, -speed));
                dog.set_direction(Direction::North);
            }
            MoveCommand::Down => {
                dog.set_speed(Vec2::new(0.0, speed));
                dog.set_direction(Direction::South);
            }
            MoveCommand::Left => {
                dog.set_speed(Vec2::new(-speed, 0.0));
                dog.set_direction(Direction::West);
            }
            MoveCommand::Right => {
                dog.set_speed(Vec2::new(speed, 0.0));
                dog.set_direction(Direction::East);
            }
            MoveCommand::Stop => dog.stop(),
        }
        Ok(())
    }

    // -- ticking ------------------------------------------------------------

    /// A transport-requested tick. Refused while the auto ticker runs, so two
    /// clocks can never advance the same simulation.
    pub fn manual_tick(&mut self, delta_ms: u64) -> Result<Vec<RetiredPlayer>, AppError> {
        if self.auto_ticking {
            return Err(AppError::AutoTickActive);
        }
        Ok(self.tick(delta_ms))
    }

    /// Advance every session, drain retired players, then run autosave
    /// accounting. A zero delta changes nothing and fires nothing. The caller
    /// persists the returned stats in one unit of work.
    pub fn tick(&mut self, delta_ms: u64) -> Vec<RetiredPlayer> {
        if delta_ms == 0 {
            return Vec::new();
        }
        self.game.tick(delta_ms);

        let mut retired = Vec::new();
        let Self { game, registry, .. } = self;
        for map_id in game.session_map_ids() {
            if let Some(session) = game.session_mut(&map_id) {
                retired.extend(registry.remove_retired(session));
            }
        }

        let save_due = self.autosave.as_mut().map_or(false, |l| l.on_tick(delta_ms));
        if save_due {
            if let Err(e) = self.save_state() {
                tracing::warn!(error = %e, "autosave failed, continuing");
            }
        }
        retired
    }

    // -- persistence --------------------------------------------------------

    /// Write the snapshot, atomically. A quiet no-op when no state path is
    /// configured.
    pub fn save_state(&self) -> Result<(), AppError> {
        let Some(path) = &self.state_path else {
            return Ok(());
        };
        let state = self.capture_state();
        snapshot::write_atomic(path, &state)?;
        Ok(())
    }

    /// Remember `path` as the state file; restore from it when it holds
    /// usable state, otherwise leave an empty placeholder behind.
    pub fn recover_from_file(&mut self, path: &Path) -> Result<(), AppError> {
        self.state_path = Some(path.to_owned());
        match snapshot::read(path)? {
            Some(state) => self.restore_state(state),
            None => {
                if !path.exists() {
                    fs::write(path, b"").map_err(snapshot::SnapshotError::Io)?;
                }
                Ok(())
            }
        }
    }

    /// Snapshot every live session. Records are ordered (players by dog id,
    /// loot by map id) so identical states produce identical files.
    pub fn capture_state(&self) -> StateSnapshot {
        let mut players: Vec<DogRecord> = self
            .registry
            .players()
            .filter_map(|(token, player)| {
                let dog = self.game.session(&player.map_id)?.dog(player.dog_id)?;
                Some(DogRecord {
                    id: dog.id(),
                    name: dog.name().to_owned(),
                    token: token.clone(),
                    map_id: player.map_id.clone(),
                    position: dog.position(),
                    speed: dog.speed(),
                    direction: dog.direction(),
                    bag_capacity: dog.bag().capacity(),
                    bag: dog.bag().ids().to_vec(),
                    score: dog.score(),
                    game_time_ms: dog.game_time_ms(),
                    standing_time_ms: dog.standing_time_ms(),
                    retired: dog.is_retired(),
                })
            })
            .collect();
        players.sort_by_key(|record| record.id);

        let mut map_ids = self.game.session_map_ids();
        map_ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        let loot = map_ids
            .into_iter()
            .filter_map(|map_id| {
                let store = self.game.session(&map_id)?.loot().clone();
                Some(LootRecord { map_id, store })
            })
            .collect();

        StateSnapshot { players, loot }
    }

    /// Rebuild live state from a snapshot: loot stores first so every bag id
    /// resolves, then players, then the dog-id floor.
    fn restore_state(&mut self, state: StateSnapshot) -> Result<(), AppError> {
        for record in state.loot {
            match self.game.ensure_session(&record.map_id) {
                Ok(session) => session.set_loot(record.store),
                Err(e) => {
                    tracing::warn!(map = %record.map_id, error = %e, "dropping loot of unknown map");
                }
            }
        }

        let mut max_dog_id = 0u64;
        for record in state.players {
            let Self { game, registry, .. } = self;
            if game.ensure_session(&record.map_id).is_err() {
                tracing::warn!(map = %record.map_id, name = %record.name, "dropping player of unknown map");
                continue;
            }
            let Some((map, session)) = game.map_and_session_mut(&record.map_id) else {
                continue;
            };
            // The spawn position is irrelevant here, every field is about to
            // be overwritten from the record.
            let (token, joined_id) =
                registry.join(map, session, &record.name, false, Some(record.token.clone()));

            // Rewrite the freshly joined dog with its recorded identity. A
            // second record for the same (map, name) overwrites the first.
            if let Some(mut dog) = session.remove_dog(joined_id) {
                dog.set_id(record.id);
                dog.set_position(record.position);
                dog.set_speed(record.speed);
                dog.set_direction(record.direction);
                let mut bag = Bag::new(record.bag_capacity);
                for loot_id in &record.bag {
                    bag.try_add(*loot_id);
                }
                dog.set_bag(bag);
                dog.set_score(record.score);
                dog.set_game_time_ms(record.game_time_ms);
                dog.set_standing_time_ms(record.standing_time_ms);
                dog.set_retired(record.retired);
                session.insert_dog(dog);
                registry.rebind_dog_id(&token, record.id);
            }
            max_dog_id = max_dog_id.max(record.id);
        }
        raise_dog_id_floor(max_dog_id + 1);
        tracing::info!(players = self.registry.player_count(), "state restored");
        Ok(())
    }

    // -- test access --------------------------------------------------------

    /// The underlying game; used by integration tests and the status surface.
    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }
}
