//! Integration tests for the session tick: pickup, drop-off, retirement.

use doghouse_model::prelude::*;

/// One horizontal road from (0,0) to (10,0) with an office at its far end.
fn delivery_map() -> Map {
    let mut map = Map::new(MapId::new("delivery"), "Delivery");
    map.add_road(Road::horizontal(Point { x: 0, y: 0 }, 10));
    map.add_office(Office::new(
        OfficeId::new("o1"),
        Point { x: 10, y: 0 },
        doghouse_model::map::Offset { dx: 0, dy: 0 },
    ));
    map.add_loot_type(LootType::new(7, serde_json::json!({"value": 7})));
    map.set_dog_speed(10.0);
    map.set_bag_capacity(3);
    map
}

/// Generator that can never fire, so tests control loot placement exactly.
fn quiet_generator() -> LootGeneratorConfig {
    LootGeneratorConfig::new(1_000_000, 0.0)
}

fn session_with_dog(map: &Map, speed: Vec2, direction: Direction) -> (Session, u64) {
    let mut session = Session::new(map, &quiet_generator(), 0);
    let mut dog = Dog::new("rex", map.bag_capacity());
    dog.set_speed(speed);
    dog.set_direction(direction);
    let id = session.spawn_dog(map, dog, false);
    (session, id)
}

/// Reach into the session's loot store and place an item directly.
fn place_loot(session: &mut Session, type_index: u64, x: f64, y: f64) -> u64 {
    let mut store = session.loot().clone();
    let id = store.add(type_index, Vec2::new(x, y));
    session.set_loot(store);
    id
}

#[test]
fn pickup_then_drop_off_in_one_tick() {
    let map = delivery_map();
    let (mut session, dog_id) = session_with_dog(&map, Vec2::new(10.0, 0.0), Direction::East);
    let loot_id = place_loot(&mut session, 0, 5.0, 0.0);

    session.tick(&map, 1_000, 60_000);

    let dog = session.dog(dog_id).unwrap();
    assert!(dog.position().approx_eq(Vec2::new(10.0, 0.0)));
    assert!(dog.bag().is_empty(), "bag was emptied at the office");
    assert_eq!(dog.score(), 7);
    assert!(session.loot().get(loot_id).is_none(), "slot was freed");
    assert_eq!(session.loot().visible_count(), 0);
}

#[test]
fn pickup_without_office_keeps_loot_busy() {
    // Same road, no office: the sweep only crosses the loot.
    let mut map = Map::new(MapId::new("delivery"), "Delivery");
    map.add_road(Road::horizontal(Point { x: 0, y: 0 }, 10));
    map.add_loot_type(LootType::new(7, serde_json::json!({"value": 7})));
    map.set_dog_speed(10.0);
    map.set_bag_capacity(3);
    let (mut session, dog_id) = session_with_dog(&map, Vec2::new(5.0, 0.0), Direction::East);
    let loot_id = place_loot(&mut session, 0, 3.0, 0.0);

    session.tick(&map, 1_000, 60_000);

    let dog = session.dog(dog_id).unwrap();
    assert_eq!(dog.bag().ids(), &[loot_id]);
    assert_eq!(dog.score(), 0);
    assert!(session.loot().is_busy(loot_id));
    assert_eq!(session.loot().visible_count(), 0, "carried loot is invisible");
    assert!(session.loot().get(loot_id).is_some(), "but its slot stays live");
}

#[test]
fn full_bag_leaves_loot_on_the_map() {
    let mut map = delivery_map();
    map.set_bag_capacity(1);
    let (mut session, dog_id) = {
        let mut session = Session::new(&map, &quiet_generator(), 0);
        let mut dog = Dog::new("rex", 1);
        dog.set_speed(Vec2::new(5.0, 0.0));
        dog.set_direction(Direction::East);
        let id = session.spawn_dog(&map, dog, false);
        (session, id)
    };
    let first = place_loot(&mut session, 0, 1.0, 0.0);
    let second = place_loot(&mut session, 0, 3.0, 0.0);

    session.tick(&map, 800, 60_000); // sweep to x = 4, short of the office

    let dog = session.dog(dog_id).unwrap();
    assert_eq!(dog.bag().ids(), &[first], "earlier contact wins the only slot");
    assert!(session.loot().is_busy(first));
    assert!(!session.loot().is_busy(second));
    assert_eq!(session.loot().visible_count(), 1);
}

#[test]
fn two_dogs_cannot_carry_the_same_loot() {
    let map = delivery_map();
    let mut session = Session::new(&map, &quiet_generator(), 0);

    let mut east = Dog::new("east", 3);
    east.set_speed(Vec2::new(10.0, 0.0));
    east.set_direction(Direction::East);
    let east_id = session.spawn_dog(&map, east, false);

    let mut chaser = Dog::new("chaser", 3);
    chaser.set_speed(Vec2::new(10.0, 0.0));
    chaser.set_direction(Direction::East);
    let chaser_id = session.spawn_dog(&map, chaser, false);
    session.dog_mut(chaser_id).unwrap().set_position(Vec2::new(1.0, 0.0));

    let loot_id = place_loot(&mut session, 0, 3.0, 0.0);

    session.tick(&map, 400, 60_000); // both sweeps cross x = 3

    let carried_by_east = session.dog(east_id).unwrap().bag().ids().contains(&loot_id);
    let carried_by_chaser = session.dog(chaser_id).unwrap().bag().ids().contains(&loot_id);
    assert!(carried_by_east ^ carried_by_chaser, "exactly one dog holds it");
    assert!(session.loot().is_busy(loot_id));
}

#[test]
fn standing_dog_retires_after_threshold() {
    let map = delivery_map();
    let (mut session, dog_id) = session_with_dog(&map, Vec2::ZERO, Direction::East);

    session.tick(&map, 59_999, 60_000);
    assert!(!session.dog(dog_id).unwrap().is_retired());

    session.tick(&map, 1, 60_000);
    let dog = session.dog(dog_id).unwrap();
    assert!(dog.is_retired());
    assert_eq!(dog.standing_time_ms(), 60_000);
    assert_eq!(dog.game_time_ms(), 60_000);
}

#[test]
fn single_long_tick_retires_immediately() {
    let map = delivery_map();
    let (mut session, dog_id) = session_with_dog(&map, Vec2::ZERO, Direction::East);

    session.tick(&map, 60_000, 60_000);
    assert!(session.dog(dog_id).unwrap().is_retired());
}

#[test]
fn movement_resets_standing_time() {
    let map = delivery_map();
    let (mut session, dog_id) = session_with_dog(&map, Vec2::ZERO, Direction::East);

    session.tick(&map, 30_000, 60_000);
    assert_eq!(session.dog(dog_id).unwrap().standing_time_ms(), 30_000);

    session.dog_mut(dog_id).unwrap().set_speed(Vec2::new(1.0, 0.0));
    session.tick(&map, 1_000, 60_000);
    assert_eq!(session.dog(dog_id).unwrap().standing_time_ms(), 0);

    // Stop again: the standing clock starts over, it does not resume.
    session.dog_mut(dog_id).unwrap().stop();
    session.tick(&map, 30_000, 60_000);
    assert!(!session.dog(dog_id).unwrap().is_retired());
}

#[test]
fn generator_respects_looter_ceiling() {
    let mut map = delivery_map();
    map.set_dog_speed(0.0);
    // A generator that fires every tick with certainty.
    let eager = LootGeneratorConfig::new(1, 1.0);
    let mut session = Session::new(&map, &eager, 123);
    for i in 0..3 {
        let mut dog = Dog::new(format!("dog-{i}"), 3);
        dog.set_speed(Vec2::ZERO);
        session.spawn_dog(&map, dog, true);
    }

    for _ in 0..50 {
        session.tick(&map, 1_000, u64::MAX);
        assert!(session.loot().visible_count() <= session.dog_count());
    }
}

#[test]
fn generated_loot_lands_on_roads() {
    let mut map = delivery_map();
    map.add_road(Road::vertical(Point { x: 0, y: 0 }, 8));
    let eager = LootGeneratorConfig::new(1, 1.0);
    let mut session = Session::new(&map, &eager, 7);
    for i in 0..5 {
        session.spawn_dog(&map, Dog::new(format!("d{i}"), 3), true);
    }

    for _ in 0..20 {
        session.tick(&map, 1_000, u64::MAX);
    }
    for (_, loot) in session.loot().visible() {
        let p = loot.position();
        assert!(map.on_any_road(p.x, p.y), "loot off-road at {p:?}");
    }
}
