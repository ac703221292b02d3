//! Scarcity-aware loot spawner.
//!
//! The generator never lets the map hold more loot than there are looters:
//! each call may add at most `looter_count - loot_count` items. Within that
//! shortage it models one spawn opportunity per `base_interval` of elapsed
//! time with success probability `probability`, accumulating time across
//! ticks so slow tick rates still spawn at the configured rate:
//!
//! ```text
//! ratio = time_without_loot / base_interval
//! p     = clamp((1 - (1 - probability)^ratio) * roll, 0, 1)
//! count = round(shortage * p)
//! ```
//!
//! `roll` is a uniform draw from the generator's own [`Pcg64`], so the whole
//! sequence of counts is a pure function of the seed and the call arguments.
//! The elapsed-time accumulator resets only when something actually spawned.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// Probabilistic spawn-count generator. Owned by one session.
#[derive(Debug, Clone)]
pub struct LootGenerator {
    base_interval_ms: u64,
    probability: f64,
    time_without_loot_ms: u64,
    rng: Pcg64,
}

impl LootGenerator {
    /// `base_interval_ms` is the length of one spawn opportunity;
    /// `probability` its success chance in `[0, 1]`.
    pub fn new(base_interval_ms: u64, probability: f64, seed: u64) -> Self {
        Self {
            base_interval_ms: base_interval_ms.max(1),
            probability: probability.clamp(0.0, 1.0),
            time_without_loot_ms: 0,
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// Number of items to spawn this tick, `<= looter_count - loot_count`.
    pub fn generate(&mut self, delta_ms: u64, loot_count: usize, looter_count: usize) -> usize {
        self.time_without_loot_ms = self.time_without_loot_ms.saturating_add(delta_ms);
        let shortage = looter_count.saturating_sub(loot_count);
        if shortage == 0 {
            return 0;
        }
        let ratio = self.time_without_loot_ms as f64 / self.base_interval_ms as f64;
        let roll: f64 = self.rng.gen();
        let p = ((1.0 - (1.0 - self.probability).powf(ratio)) * roll).clamp(0.0, 1.0);
        let count = (shortage as f64 * p).round() as usize;
        if count > 0 {
            self.time_without_loot_ms = 0;
        }
        count
    }
}
