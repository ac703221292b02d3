//! Swept-disk collision detection between moving gatherers and static items.
//!
//! A gatherer is the disk of radius `width` swept along the segment from its
//! tick-start to its tick-end position; an item is a static disk. The contact
//! test projects the item center onto the sweep segment: a contact exists
//! when the projection parameter lands inside `[0, 1]` and the squared
//! perpendicular distance is strictly below the combined radius squared.
//! Touching exactly at the combined radius does not collect.
//!
//! Events come back sorted ascending by projection parameter (the time of
//! contact within the tick), with ties left in insertion order.

use crate::geom::Vec2;

/// A static collision target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item {
    pub position: Vec2,
    pub width: f64,
    pub id: u64,
}

/// A disk swept from `start` to `end` during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gatherer {
    pub start: Vec2,
    pub end: Vec2,
    pub width: f64,
    pub id: u64,
}

/// One contact between a gatherer and an item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatherEvent {
    pub item_id: u64,
    pub gatherer_id: u64,
    pub sq_distance: f64,
    /// Projection parameter in `[0, 1]`: the fraction of the sweep at which
    /// the closest approach happens.
    pub time: f64,
}

/// Result of projecting an item center onto a sweep segment.
#[derive(Debug, Clone, Copy)]
struct CollectionResult {
    sq_distance: f64,
    proj_ratio: f64,
}

impl CollectionResult {
    fn is_collected(&self, collect_radius: f64) -> bool {
        (0.0..=1.0).contains(&self.proj_ratio)
            && self.sq_distance < collect_radius * collect_radius
    }
}

/// Project `c` onto the segment `a -> b`. Callers must ensure `a != b`.
fn try_collect_point(a: Vec2, b: Vec2, c: Vec2) -> CollectionResult {
    let u_x = c.x - a.x;
    let u_y = c.y - a.y;
    let v_x = b.x - a.x;
    let v_y = b.y - a.y;
    let u_dot_v = u_x * v_x + u_y * v_y;
    let u_len2 = u_x * u_x + u_y * u_y;
    let v_len2 = v_x * v_x + v_y * v_y;
    CollectionResult {
        proj_ratio: u_dot_v / v_len2,
        sq_distance: u_len2 - (u_dot_v * u_dot_v) / v_len2,
    }
}

/// Find every (gatherer, item) contact of the tick, ascending by contact
/// time.
///
/// With `explicit_ids` the events carry the ids stored on the items and
/// gatherers themselves; otherwise they carry positional indices into the
/// two slices. Explicit ids let a caller mix address spaces in one items
/// list (loot by slot id, offices offset past the slot range) and decode
/// events without a reverse lookup.
///
/// A gatherer whose start and end coincide swept no area and emits nothing.
pub fn find_gather_events(
    items: &[Item],
    gatherers: &[Gatherer],
    explicit_ids: bool,
) -> Vec<GatherEvent> {
    let mut events = Vec::new();
    for (g_index, gatherer) in gatherers.iter().enumerate() {
        if gatherer.start == gatherer.end {
            continue;
        }
        for (i_index, item) in items.iter().enumerate() {
            let result = try_collect_point(gatherer.start, gatherer.end, item.position);
            if result.is_collected(gatherer.width + item.width) {
                let (item_id, gatherer_id) = if explicit_ids {
                    (item.id, gatherer.id)
                } else {
                    (i_index as u64, g_index as u64)
                };
                events.push(GatherEvent {
                    item_id,
                    gatherer_id,
                    sq_distance: result.sq_distance,
                    time: result.proj_ratio,
                });
            }
        }
    }
    events.sort_by(|lhs, rhs| lhs.time.total_cmp(&rhs.time));
    events
}
