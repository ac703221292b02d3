//! One live simulation per map.
//!
//! A session owns the dogs playing on its map, the loot store, the motion
//! solver, and the loot generator. It advances exclusively through
//! [`Session::tick`], whose phases run in a fixed order: loot generation,
//! per-dog timers and motion, item-list assembly, collision detection, and
//! in-order event resolution.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::collision::{find_gather_events, Gatherer, Item};
use crate::dog::{Dog, DOG_WIDTH};
use crate::game::LootGeneratorConfig;
use crate::geom::Vec2;
use crate::loot::LootStore;
use crate::loot_gen::LootGenerator;
use crate::map::{Map, MapId, Road, OFFICE_WIDTH};
use crate::motion::MotionSolver;

/// The live simulation state for a single map.
#[derive(Debug)]
pub struct Session {
    map_id: MapId,
    dogs: BTreeMap<u64, Dog>,
    loot: LootStore,
    motion: MotionSolver,
    loot_gen: LootGenerator,
    rng: Pcg64,
}

impl Session {
    /// Build a session for `map`. `seed` drives both the loot generator and
    /// item/spawn placement, so two sessions built with the same seed and fed
    /// the same ticks evolve identically.
    pub fn new(map: &Map, generator: &LootGeneratorConfig, seed: u64) -> Self {
        Self {
            map_id: map.id().clone(),
            dogs: BTreeMap::new(),
            loot: LootStore::new(),
            motion: MotionSolver::new(map),
            loot_gen: LootGenerator::new(generator.period_ms, generator.probability, seed),
            rng: Pcg64::seed_from_u64(seed.wrapping_add(1)),
        }
    }

    pub fn map_id(&self) -> &MapId {
        &self.map_id
    }

    pub fn dogs(&self) -> impl Iterator<Item = &Dog> {
        self.dogs.values()
    }

    pub fn dog(&self, id: u64) -> Option<&Dog> {
        self.dogs.get(&id)
    }

    pub fn dog_mut(&mut self, id: u64) -> Option<&mut Dog> {
        self.dogs.get_mut(&id)
    }

    pub fn dog_count(&self) -> usize {
        self.dogs.len()
    }

    pub fn remove_dog(&mut self, id: u64) -> Option<Dog> {
        self.dogs.remove(&id)
    }

    pub fn loot(&self) -> &LootStore {
        &self.loot
    }

    /// Replace the loot store wholesale; used only by snapshot restore.
    pub fn set_loot(&mut self, loot: LootStore) {
        self.loot = loot;
    }

    /// Insert a dog at a spawn position: the first road's start, or a random
    /// integer grid point along a random road when `randomize` is set.
    pub fn spawn_dog(&mut self, map: &Map, mut dog: Dog, randomize: bool) -> u64 {
        let position = if randomize {
            random_road_point(map, &mut self.rng).unwrap_or(Vec2::ZERO)
        } else {
            map.roads().first().map(|r| r.start().into()).unwrap_or(Vec2::ZERO)
        };
        dog.set_position(position);
        let id = dog.id();
        self.dogs.insert(id, dog);
        id
    }

    /// Insert a dog that already carries its full state (snapshot restore).
    pub fn insert_dog(&mut self, dog: Dog) {
        self.dogs.insert(dog.id(), dog);
    }

    /// Advance the session by `delta_ms`.
    ///
    /// Dogs that cross the `retirement_threshold_ms` of consecutive standing
    /// time are flagged retired; they still take part in this tick and are
    /// drained by the caller afterwards.
    pub fn tick(&mut self, map: &Map, delta_ms: u64, retirement_threshold_ms: u64) {
        self.generate_loot(map, delta_ms);

        // Per-dog timers and motion; capture the swept segments as we go.
        let motion = &self.motion;
        let mut gatherers = Vec::with_capacity(self.dogs.len());
        for (&id, dog) in self.dogs.iter_mut() {
            dog.add_game_time(delta_ms);
            if dog.speed().is_zero() {
                dog.add_standing_time(delta_ms);
                if dog.standing_time_ms() >= retirement_threshold_ms {
                    dog.set_retired(true);
                }
            } else {
                dog.reset_standing_time();
            }
            let start = dog.position();
            motion.advance(map, dog, delta_ms);
            gatherers.push(Gatherer { start, end: dog.position(), width: DOG_WIDTH, id });
        }

        // Visible loot first (id = slot), then offices, offset past the full
        // slot range so a freed or busy slot can never alias an office.
        let office_base = self.loot.slot_count() as u64;
        let mut items: Vec<Item> = self
            .loot
            .visible()
            .map(|(id, loot)| Item { position: loot.position(), width: loot.width(), id })
            .collect();
        for (index, office) in map.offices().iter().enumerate() {
            items.push(Item {
                position: office.position().into(),
                width: OFFICE_WIDTH,
                id: office_base + index as u64,
            });
        }

        let events = find_gather_events(&items, &gatherers, true);
        for event in events {
            let Some(dog) = self.dogs.get_mut(&event.gatherer_id) else {
                continue;
            };
            if event.item_id < office_base {
                let id = event.item_id;
                if self.loot.get(id).is_some() && !self.loot.is_busy(id) && dog.bag().has_room() {
                    dog.bag_mut().try_add(id);
                    self.loot.mark_busy(id);
                }
            } else if !dog.bag().is_empty() {
                let carried: Vec<u64> = dog.bag().ids().to_vec();
                for id in carried {
                    let Some(loot) = self.loot.get(id) else {
                        tracing::warn!(loot = id, "carried loot id has no live slot, skipping");
                        continue;
                    };
                    let value = map
                        .loot_types()
                        .get(loot.type_index() as usize)
                        .map(|t| t.value())
                        .unwrap_or(0);
                    dog.add_score(value);
                    let _ = self.loot.pop(id);
                }
                dog.bag_mut().clear();
            }
        }
    }

    fn generate_loot(&mut self, map: &Map, delta_ms: u64) {
        if map.loot_types().is_empty() || map.roads().is_empty() {
            return;
        }
        let count =
            self.loot_gen
                .generate(delta_ms, self.loot.visible_count(), self.dogs.len());
        for _ in 0..count {
            let Some(position) = random_road_point(map, &mut self.rng) else {
                break;
            };
            let type_index = self.rng.gen_range(0..map.loot_types().len() as u64);
            let id = self.loot.add(type_index, position);
            tracing::debug!(map = %self.map_id, loot = id, ty = type_index, "loot spawned");
        }
    }
}

/// Uniform random integer grid point along a uniform random road.
fn random_road_point(map: &Map, rng: &mut Pcg64) -> Option<Vec2> {
    let roads = map.roads();
    if roads.is_empty() {
        return None;
    }
    let road: &Road = &roads[rng.gen_range(0..roads.len())];
    if road.is_horizontal() {
        let (a, b) = ordered(road.start().x, road.end().x);
        Some(Vec2::new(rng.gen_range(a..=b) as f64, road.end().y as f64))
    } else {
        let (a, b) = ordered(road.start().y, road.end().y);
        Some(Vec2::new(road.end().x as f64, rng.gen_range(a..=b) as f64))
    }
}

fn ordered(a: i32, b: i32) -> (i32, i32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
