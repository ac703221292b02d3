//! Live loot items and the per-session slot store.
//!
//! Every loot item is addressed by a stable integer id equal to its slot
//! index in the store. Freed slots go into a FIFO queue and are recycled in
//! order before the store grows, so ids stay dense and small. A slot whose id
//! sits in the *busy* set is carried by some dog: it is still live (its type
//! is needed for scoring at drop-off) but invisible to clients and to the
//! collision item list, which is what prevents a second pickup between
//! collision resolution and drop-off.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::geom::Vec2;
use crate::ModelError;

/// Collision width of a loot item.
pub const LOOT_WIDTH: f64 = 0.0;

/// A single loot item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loot {
    type_index: u64,
    position: Vec2,
    width: f64,
}

impl Loot {
    pub fn new(type_index: u64, position: Vec2) -> Self {
        Self { type_index, position, width: LOOT_WIDTH }
    }

    /// Index into the owning map's loot-type catalog.
    pub fn type_index(&self) -> u64 {
        self.type_index
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn width(&self) -> f64 {
        self.width
    }
}

// ---------------------------------------------------------------------------
// LootStore
// ---------------------------------------------------------------------------

/// Slot-addressed container of a session's loot.
///
/// Invariants:
/// - a freed id is never in the busy set;
/// - [`LootStore::add`] recycles the oldest freed slot before growing;
/// - [`LootStore::pop`] frees the slot and clears its busy mark if set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LootStore {
    slots: Vec<Option<Loot>>,
    freed: VecDeque<u64>,
    busy: BTreeSet<u64>,
}

impl LootStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new item, recycling the oldest freed slot when one exists.
    /// Returns the item's id.
    pub fn add(&mut self, type_index: u64, position: Vec2) -> u64 {
        if let Some(id) = self.freed.pop_front() {
            self.slots[id as usize] = Some(Loot::new(type_index, position));
            id
        } else {
            self.slots.push(Some(Loot::new(type_index, position)));
            (self.slots.len() - 1) as u64
        }
    }

    /// Remove the item: the slot becomes free and any busy mark is cleared.
    pub fn pop(&mut self, id: u64) -> Result<(), ModelError> {
        match self.slots.get_mut(id as usize) {
            Some(slot @ Some(_)) => {
                *slot = None;
                self.freed.push_back(id);
                self.busy.remove(&id);
                Ok(())
            }
            _ => Err(ModelError::InvalidLootId { id }),
        }
    }

    /// The live item at `id`, busy or not.
    pub fn get(&self, id: u64) -> Option<&Loot> {
        self.slots.get(id as usize).and_then(|s| s.as_ref())
    }

    pub fn mark_busy(&mut self, id: u64) {
        self.busy.insert(id);
    }

    pub fn is_busy(&self, id: u64) -> bool {
        self.busy.contains(&id)
    }

    /// Number of items visible on the map: live slots minus carried ones.
    pub fn visible_count(&self) -> usize {
        self.slots.len() - self.freed.len() - self.busy.len()
    }

    /// Total slot count, including freed slots. Item ids are always smaller
    /// than this, which makes it the natural base for office indexing.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Live, not-carried items in slot order.
    pub fn visible(&self) -> impl Iterator<Item = (u64, &Loot)> {
        self.slots.iter().enumerate().filter_map(move |(i, slot)| {
            let id = i as u64;
            match slot {
                Some(loot) if !self.busy.contains(&id) => Some((id, loot)),
                _ => None,
            }
        })
    }
}
