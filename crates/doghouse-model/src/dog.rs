//! Dogs -- the player-controlled gatherers -- and their loot bags.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::geom::{Direction, Vec2};

/// Collision width of a dog.
pub const DOG_WIDTH: f64 = 0.6;

// Process-wide monotonic id source. Snapshot restore raises the floor past
// every id it has seen before new joins are accepted.
static NEXT_DOG_ID: AtomicU64 = AtomicU64::new(0);

/// Allocate the next dog id.
pub fn next_dog_id() -> u64 {
    NEXT_DOG_ID.fetch_add(1, Ordering::Relaxed)
}

/// Ensure future ids start at `floor` or later. Never lowers the counter.
pub fn raise_dog_id_floor(floor: u64) {
    NEXT_DOG_ID.fetch_max(floor, Ordering::Relaxed);
}

// ---------------------------------------------------------------------------
// Bag
// ---------------------------------------------------------------------------

/// Ordered list of carried loot ids, bounded by the map's bag capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bag {
    capacity: usize,
    items: Vec<u64>,
}

impl Bag {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, items: Vec::new() }
    }

    /// Add a loot id if there is room. Returns whether it was added.
    pub fn try_add(&mut self, loot_id: u64) -> bool {
        if self.has_room() {
            self.items.push(loot_id);
            true
        } else {
            false
        }
    }

    pub fn has_room(&self) -> bool {
        self.items.len() < self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ids(&self) -> &[u64] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

// ---------------------------------------------------------------------------
// Dog
// ---------------------------------------------------------------------------

/// One avatar. Mutated only by its session's tick (motion, timers, scoring)
/// and by player actions (speed and direction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dog {
    id: u64,
    name: String,
    position: Vec2,
    speed: Vec2,
    direction: Direction,
    bag: Bag,
    score: u64,
    game_time_ms: u64,
    standing_time_ms: u64,
    retired: bool,
}

impl Dog {
    /// Create a dog with a freshly allocated process-wide id.
    pub fn new(name: impl Into<String>, bag_capacity: usize) -> Self {
        Self {
            id: next_dog_id(),
            name: name.into(),
            position: Vec2::ZERO,
            speed: Vec2::ZERO,
            direction: Direction::North,
            bag: Bag::new(bag_capacity),
            score: 0,
            game_time_ms: 0,
            standing_time_ms: 0,
            retired: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Overwrite the id; used only when restoring a snapshot.
    pub fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn speed(&self) -> Vec2 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: Vec2) {
        self.speed = speed;
    }

    pub fn stop(&mut self) {
        self.speed = Vec2::ZERO;
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn bag(&self) -> &Bag {
        &self.bag
    }

    pub fn bag_mut(&mut self) -> &mut Bag {
        &mut self.bag
    }

    /// Replace the bag wholesale; used only when restoring a snapshot.
    pub fn set_bag(&mut self, bag: Bag) {
        self.bag = bag;
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn add_score(&mut self, value: u64) {
        self.score += value;
    }

    pub fn set_score(&mut self, score: u64) {
        self.score = score;
    }

    /// Total simulated play time in milliseconds.
    pub fn game_time_ms(&self) -> u64 {
        self.game_time_ms
    }

    pub fn set_game_time_ms(&mut self, ms: u64) {
        self.game_time_ms = ms;
    }

    pub fn add_game_time(&mut self, delta_ms: u64) {
        self.game_time_ms += delta_ms;
    }

    /// Consecutive milliseconds spent with zero speed.
    pub fn standing_time_ms(&self) -> u64 {
        self.standing_time_ms
    }

    pub fn set_standing_time_ms(&mut self, ms: u64) {
        self.standing_time_ms = ms;
    }

    pub fn add_standing_time(&mut self, delta_ms: u64) {
        self.standing_time_ms += delta_ms;
    }

    pub fn reset_standing_time(&mut self) {
        self.standing_time_ms = 0;
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub fn set_retired(&mut self, retired: bool) {
        self.retired = retired;
    }
}
