//! The game: a map catalog plus lazily created sessions.

use std::collections::HashMap;

use rand::Rng;

use crate::map::{Map, MapId};
use crate::session::Session;
use crate::ModelError;

/// Bag capacity applied when a map does not override it.
pub const DEFAULT_BAG_CAPACITY: usize = 3;

/// Standing time after which a dog retires, unless the config overrides it.
pub const DEFAULT_RETIREMENT_TIME_MS: u64 = 60_000;

/// Tunables of the loot generator, shared by every session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LootGeneratorConfig {
    pub period_ms: u64,
    pub probability: f64,
}

impl LootGeneratorConfig {
    pub fn new(period_ms: u64, probability: f64) -> Self {
        Self { period_ms, probability }
    }
}

/// Owns the immutable maps and one [`Session`] per map that has players.
/// Sessions are created on first use and never destroyed.
#[derive(Debug)]
pub struct Game {
    maps: Vec<Map>,
    map_index: HashMap<MapId, usize>,
    sessions: HashMap<MapId, Session>,
    generator: LootGeneratorConfig,
    retirement_time_ms: u64,
}

impl Game {
    pub fn new(generator: LootGeneratorConfig, retirement_time_ms: u64) -> Self {
        Self {
            maps: Vec::new(),
            map_index: HashMap::new(),
            sessions: HashMap::new(),
            generator,
            retirement_time_ms,
        }
    }

    /// Register a map. Ids must be unique.
    pub fn add_map(&mut self, map: Map) -> Result<(), ModelError> {
        if self.map_index.contains_key(map.id()) {
            return Err(ModelError::DuplicateMap { id: map.id().clone() });
        }
        self.map_index.insert(map.id().clone(), self.maps.len());
        self.maps.push(map);
        Ok(())
    }

    /// Maps in registration order.
    pub fn maps(&self) -> &[Map] {
        &self.maps
    }

    pub fn find_map(&self, id: &MapId) -> Option<&Map> {
        self.map_index.get(id).map(|&index| &self.maps[index])
    }

    pub fn session(&self, id: &MapId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn session_mut(&mut self, id: &MapId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    /// Sessions that exist so far, in no particular order.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Map ids that currently have a session.
    pub fn session_map_ids(&self) -> Vec<MapId> {
        self.sessions.keys().cloned().collect()
    }

    /// The session for `id`, created on first use with an OS-entropy seed.
    pub fn ensure_session(&mut self, id: &MapId) -> Result<&mut Session, ModelError> {
        let seed = rand::thread_rng().gen();
        self.ensure_session_seeded(id, seed)
    }

    /// Like [`Game::ensure_session`] with a caller-chosen seed; an existing
    /// session keeps the seed it was created with.
    pub fn ensure_session_seeded(
        &mut self,
        id: &MapId,
        seed: u64,
    ) -> Result<&mut Session, ModelError> {
        let index = *self
            .map_index
            .get(id)
            .ok_or_else(|| ModelError::UnknownMap { id: id.clone() })?;
        let map = &self.maps[index];
        let generator = self.generator;
        Ok(self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| Session::new(map, &generator, seed)))
    }

    /// The map and its session together; the split borrow callers need when
    /// a registry mutates the session while reading the map.
    pub fn map_and_session_mut(&mut self, id: &MapId) -> Option<(&Map, &mut Session)> {
        let index = *self.map_index.get(id)?;
        let session = self.sessions.get_mut(id)?;
        Some((&self.maps[index], session))
    }

    pub fn retirement_time_ms(&self) -> u64 {
        self.retirement_time_ms
    }

    /// Advance every session by `delta_ms`.
    pub fn tick(&mut self, delta_ms: u64) {
        let Self { maps, map_index, sessions, retirement_time_ms, .. } = self;
        for (map_id, session) in sessions.iter_mut() {
            let Some(&index) = map_index.get(map_id) else {
                continue;
            };
            session.tick(&maps[index], delta_ms, *retirement_time_ms);
        }
    }
}
