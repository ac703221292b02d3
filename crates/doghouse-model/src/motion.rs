//! Road-constrained motion solving.
//!
//! A dog may only ever stand inside a road strip, so its displacement during
//! a tick has to be clamped against the roads it travels along. Roads are
//! grouped at construction time by the integer coordinate of the axis they
//! lie on (`horizontal` keyed by y, `vertical` keyed by x); the row or column
//! a dog currently occupies is the grid cell of the transverse coordinate.
//!
//! Solving is iterative: clamp the target into the reachable extent of the
//! roads under the dog, move there, and re-resolve from the new point, which
//! may sit on a different road that extends the reachable range. Roads meet
//! at integer intersections, so each round of the loop "hands off" the
//! displacement to whatever continues in the travel direction; the loop ends
//! when the target is reached or no further progress is possible. If the dog
//! falls short of its target it stops dead and its speed is cleared.

use std::collections::HashMap;

use crate::dog::Dog;
use crate::geom::{grid_cell, Vec2};
use crate::map::{Map, Road, ROAD_WIDTH};

/// Per-session solver holding the precomputed road tables. Rebuilt only when
/// the session's map changes, which in practice means once at construction.
#[derive(Debug, Clone)]
pub struct MotionSolver {
    /// Road indices grouped by the y coordinate they run along.
    horizontal: HashMap<i32, Vec<usize>>,
    /// Road indices grouped by the x coordinate they run along.
    vertical: HashMap<i32, Vec<usize>>,
}

impl MotionSolver {
    pub fn new(map: &Map) -> Self {
        let mut horizontal: HashMap<i32, Vec<usize>> = HashMap::new();
        let mut vertical: HashMap<i32, Vec<usize>> = HashMap::new();
        for (index, road) in map.roads().iter().enumerate() {
            if road.is_horizontal() {
                horizontal.entry(road.start().y).or_default().push(index);
            } else {
                vertical.entry(road.start().x).or_default().push(index);
            }
        }
        Self { horizontal, vertical }
    }

    /// Advance `dog` by `delta_ms` worth of its current speed, clamped to the
    /// road network. Clears the speed when the dog hits a road boundary
    /// before reaching its target.
    pub fn advance(&self, map: &Map, dog: &mut Dog, delta_ms: u64) {
        let speed = dog.speed();
        if speed == Vec2::ZERO {
            return;
        }
        let start = dog.position();
        let seconds = delta_ms as f64 * 0.001;
        let target = Vec2::new(start.x + speed.x * seconds, start.y + speed.y * seconds);

        let mut finish = start;
        let mut prev = finish;
        let mut row = self.horizontal.get(&grid_cell(start.y));
        let mut column = self.vertical.get(&grid_cell(start.x));

        loop {
            if dog.direction().is_horizontal() {
                match row {
                    Some(roads) => {
                        if let Some(best) = farthest_on_roads(map, roads, start, finish, target, true) {
                            finish = best;
                        }
                    }
                    None => {
                        // Moving across a lone vertical road: nothing continues
                        // sideways, so x is limited to half a road width around
                        // the column center.
                        finish = clamp_across(start, target, dog.speed().x < 0.0, true);
                        prev = finish;
                    }
                }
            } else {
                match column {
                    Some(roads) => {
                        if let Some(best) = farthest_on_roads(map, roads, start, finish, target, false) {
                            finish = best;
                        }
                    }
                    None => {
                        finish = clamp_across(start, target, dog.speed().y < 0.0, false);
                        prev = finish;
                    }
                }
            }

            row = self.horizontal.get(&grid_cell(finish.y));
            column = self.vertical.get(&grid_cell(finish.x));

            if finish.approx_eq(target) {
                break; // target reached
            }
            if finish.approx_eq(prev) {
                break; // boundary reached, no further progress
            }
            prev = finish;
        }

        tracing::trace!(
            dog = dog.id(),
            from_x = start.x,
            from_y = start.y,
            to_x = finish.x,
            to_y = finish.y,
            "motion step"
        );
        dog.set_position(finish);
        if !finish.approx_eq(target) {
            dog.stop();
        }
    }
}

/// Of the row/column roads whose strip contains `from`, clamp `target` into
/// each strip's extent along the travel axis and keep the point farthest from
/// `start`. Returns `None` when `from` is on none of them.
fn farthest_on_roads(
    map: &Map,
    roads: &[usize],
    start: Vec2,
    from: Vec2,
    target: Vec2,
    horizontal: bool,
) -> Option<Vec2> {
    let mut best: Option<(Vec2, f64)> = None;
    for &index in roads {
        let road: &Road = &map.roads()[index];
        if !road.contains(from.x, from.y) {
            continue;
        }
        let lt = road.left_top();
        let rb = road.right_bottom();
        let candidate = if horizontal {
            Vec2::new(target.x.clamp(lt.x, rb.x), from.y)
        } else {
            Vec2::new(from.x, target.y.clamp(lt.y, rb.y))
        };
        let reach = start.distance(candidate);
        if best.map_or(true, |(_, best_reach)| reach >= best_reach) {
            best = Some((candidate, reach));
        }
    }
    best.map(|(point, _)| point)
}

/// Transverse clamp for a dog crossing a road it is not traveling along:
/// the reachable extent is half a road width either side of the center line
/// of the cell it stands in.
fn clamp_across(position: Vec2, target: Vec2, negative_travel: bool, horizontal: bool) -> Vec2 {
    let half = ROAD_WIDTH / 2.0;
    if horizontal {
        let center = grid_cell(position.x) as f64;
        let x = if (target.x - center).abs() > half {
            if negative_travel { center - half } else { center + half }
        } else {
            target.x
        };
        Vec2::new(x, position.y)
    } else {
        let center = grid_cell(position.y) as f64;
        let y = if (target.y - center).abs() > half {
            if negative_travel { center - half } else { center + half }
        } else {
            target.y
        };
        Vec2::new(position.x, y)
    }
}
