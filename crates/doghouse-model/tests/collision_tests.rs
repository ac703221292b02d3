//! Integration tests for the swept-disk collision engine.

use doghouse_model::collision::{find_gather_events, Gatherer, Item};
use doghouse_model::geom::Vec2;

const EPSILON: f64 = 1e-10;

fn gatherer(start: (f64, f64), end: (f64, f64), width: f64) -> Gatherer {
    Gatherer {
        start: Vec2::new(start.0, start.1),
        end: Vec2::new(end.0, end.1),
        width,
        id: 0,
    }
}

fn item(pos: (f64, f64), width: f64) -> Item {
    Item { position: Vec2::new(pos.0, pos.1), width, id: 0 }
}

fn diagonal_gatherer() -> Gatherer {
    gatherer((0.0, 0.0), (5.0, 5.0), 0.6)
}

#[test]
fn no_items_no_events() {
    let events = find_gather_events(&[], &[diagonal_gatherer()], false);
    assert!(events.is_empty());
}

#[test]
fn no_gatherers_no_events() {
    let events = find_gather_events(&[item((2.5, 2.5), 0.6)], &[], false);
    assert!(events.is_empty());
}

#[test]
fn midpoint_hit() {
    let events = find_gather_events(&[item((2.5, 2.5), 0.6)], &[diagonal_gatherer()], false);
    assert_eq!(events.len(), 1);
    let event = events[0];
    assert_eq!(event.gatherer_id, 0);
    assert_eq!(event.item_id, 0);
    assert!((event.time - 0.5).abs() < EPSILON);
    assert!(event.sq_distance.abs() < EPSILON);
}

#[test]
fn multiple_events_come_back_time_ordered() {
    let items = [item((0.0, 0.0), 0.6), item((2.5, 2.5), 0.6), item((5.0, 5.0), 0.6)];
    let events = find_gather_events(&items, &[diagonal_gatherer()], false);

    assert_eq!(events.len(), 3);
    let times: Vec<f64> = events.iter().map(|e| e.time).collect();
    assert!((times[0] - 0.0).abs() < EPSILON);
    assert!((times[1] - 0.5).abs() < EPSILON);
    assert!((times[2] - 1.0).abs() < EPSILON);
    assert_eq!(events.iter().map(|e| e.item_id).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert!(events.iter().all(|e| e.gatherer_id == 0));
}

#[test]
fn off_path_item_is_missed() {
    let items = [item((-2.0, -2.0), 0.6), item((2.5, 2.5), 0.6)];
    let events = find_gather_events(&items, &[diagonal_gatherer()], false);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].item_id, 1);
}

#[test]
fn near_miss_at_exactly_combined_radius_is_not_collected() {
    // The gatherer sweeps a vertical line exactly 2 * width away from the
    // item: boundary contact, strictly outside the collection disk.
    let width = 0.6;
    let offset = 2.0 * width;
    let g = gatherer((2.5 + offset, 0.0), (2.5 + offset, 2.5), width);
    let events = find_gather_events(&[item((2.5, 2.5), width)], &[g], false);
    assert!(events.is_empty());
}

#[test]
fn just_inside_combined_radius_is_collected() {
    let width = 0.6;
    let offset = 2.0 * width - 1e-9;
    let g = gatherer((2.5 + offset, 0.0), (2.5 + offset, 2.5), width);
    let events = find_gather_events(&[item((2.5, 2.5), width)], &[g], false);
    assert_eq!(events.len(), 1);
    assert!((events[0].sq_distance - offset * offset).abs() < 1e-6);
}

#[test]
fn stationary_gatherer_emits_nothing() {
    let g = gatherer((5.0, 5.0), (5.0, 5.0), 0.6);
    let events = find_gather_events(&[item((5.0, 5.0), 0.6)], &[g], false);
    assert!(events.is_empty());
}

#[test]
fn several_gatherers_interleave_by_time() {
    let gatherers = [
        Gatherer { id: 0, ..diagonal_gatherer() },
        Gatherer { start: Vec2::new(2.5, 2.5), end: Vec2::new(-1.0, -1.0), width: 0.6, id: 1 },
        Gatherer { start: Vec2::new(0.0, 0.0), end: Vec2::new(-5.0, 5.0), width: 0.6, id: 2 },
    ];
    let events = find_gather_events(&[item((2.5, 2.5), 0.6)], &gatherers, false);

    // Gatherer 1 starts on the item (t = 0); gatherer 0 reaches it halfway;
    // gatherer 2 heads the other way entirely.
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].gatherer_id, 1);
    assert!(events[0].time.abs() < EPSILON);
    assert_eq!(events[1].gatherer_id, 0);
    assert!((events[1].time - 0.5).abs() < EPSILON);
}

#[test]
fn explicit_ids_pass_through() {
    let items = [Item { position: Vec2::new(2.5, 2.5), width: 0.6, id: 17 }];
    let gatherers = [Gatherer {
        start: Vec2::new(0.0, 0.0),
        end: Vec2::new(5.0, 5.0),
        width: 0.6,
        id: 99,
    }];

    let by_index = find_gather_events(&items, &gatherers, false);
    assert_eq!((by_index[0].item_id, by_index[0].gatherer_id), (0, 0));

    let by_id = find_gather_events(&items, &gatherers, true);
    assert_eq!((by_id[0].item_id, by_id[0].gatherer_id), (17, 99));
}

#[test]
fn behind_start_projection_is_rejected() {
    // Item sits behind the sweep (t < 0) but within radius of the start.
    let g = gatherer((0.0, 0.0), (5.0, 0.0), 0.6);
    let events = find_gather_events(&[item((-0.5, 0.0), 0.6)], &[g], false);
    assert!(events.is_empty());
}
