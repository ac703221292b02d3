//! Integration tests for the application operations: join, action, tick,
//! retirement drainage, and the client-facing views.

use doghouse_app::app::{Application, MoveCommand};
use doghouse_app::registry::Token;
use doghouse_app::AppError;
use doghouse_model::game::{Game, LootGeneratorConfig};
use doghouse_model::geom::{Point, Vec2};
use doghouse_model::map::{LootType, Map, MapId, Office, OfficeId, Offset, Road};

fn town_map() -> Map {
    let mut map = Map::new(MapId::new("town"), "Town");
    map.add_road(Road::horizontal(Point { x: 0, y: 0 }, 10));
    map.add_road(Road::vertical(Point { x: 10, y: 0 }, 10));
    map.add_office(Office::new(OfficeId::new("o1"), Point { x: 10, y: 0 }, Offset { dx: 0, dy: 0 }));
    map.add_loot_type(LootType::new(5, serde_json::json!({"name": "bone", "value": 5})));
    map.set_dog_speed(2.0);
    map.set_bag_capacity(3);
    map
}

fn quiet_app() -> Application {
    let mut game = Game::new(LootGeneratorConfig::new(1_000_000, 0.0), 60_000);
    game.add_map(town_map()).unwrap();
    Application::new(game, false)
}

#[test]
fn join_creates_session_and_token() {
    let mut app = quiet_app();
    let map_id = MapId::new("town");

    assert!(app.game().session(&map_id).is_none());
    let join = app.join_game(&map_id, "alice").unwrap();
    assert_eq!(join.auth_token.as_str().len(), 32);
    assert!(Token::parse(join.auth_token.as_str()).is_some());

    let session = app.game().session(&map_id).expect("session created lazily");
    let dog = session.dog(join.player_id).unwrap();
    assert_eq!(dog.name(), "alice");
    assert_eq!(dog.position(), Vec2::new(0.0, 0.0), "deterministic spawn at first road start");

    let (found_map, found_dog) = app.find_player(&join.auth_token).unwrap();
    assert_eq!(found_map, &map_id);
    assert_eq!(found_dog, join.player_id);
}

#[test]
fn rejoining_the_same_name_returns_the_same_player() {
    let mut app = quiet_app();
    let map_id = MapId::new("town");

    let first = app.join_game(&map_id, "alice").unwrap();
    let second = app.join_game(&map_id, "alice").unwrap();
    assert_eq!(first.auth_token, second.auth_token);
    assert_eq!(first.player_id, second.player_id);
    assert_eq!(app.game().session(&map_id).unwrap().dog_count(), 1);
}

#[test]
fn join_validates_input() {
    let mut app = quiet_app();
    assert!(matches!(
        app.join_game(&MapId::new("town"), ""),
        Err(AppError::InvalidArgument { .. })
    ));
    assert!(matches!(
        app.join_game(&MapId::new("nowhere"), "bob"),
        Err(AppError::MapNotFound { .. })
    ));
}

#[test]
fn move_sets_speed_and_direction() {
    let mut app = quiet_app();
    let map_id = MapId::new("town");
    let join = app.join_game(&map_id, "alice").unwrap();

    app.move_player(&join.auth_token, MoveCommand::Right).unwrap();
    {
        let dog = app.game().session(&map_id).unwrap().dog(join.player_id).unwrap();
        assert_eq!(dog.speed(), Vec2::new(2.0, 0.0));
        assert_eq!(dog.direction().as_str(), "R");
    }

    app.move_player(&join.auth_token, MoveCommand::Stop).unwrap();
    {
        let dog = app.game().session(&map_id).unwrap().dog(join.player_id).unwrap();
        assert_eq!(dog.speed(), Vec2::ZERO);
        assert_eq!(dog.direction().as_str(), "R", "stop keeps the facing");
    }

    assert!(matches!(
        app.move_player(&Token::random(), MoveCommand::Up),
        Err(AppError::UnknownToken)
    ));
}

#[test]
fn move_command_parses_the_wire_values() {
    assert_eq!(MoveCommand::parse("U"), Some(MoveCommand::Up));
    assert_eq!(MoveCommand::parse("D"), Some(MoveCommand::Down));
    assert_eq!(MoveCommand::parse("L"), Some(MoveCommand::Left));
    assert_eq!(MoveCommand::parse("R"), Some(MoveCommand::Right));
    assert_eq!(MoveCommand::parse(""), Some(MoveCommand::Stop));
    assert_eq!(MoveCommand::parse("X"), None);
    assert_eq!(MoveCommand::parse("UU"), None);
}

#[test]
fn players_view_lists_the_whole_session_sorted() {
    let mut app = quiet_app();
    let map_id = MapId::new("town");
    let alice = app.join_game(&map_id, "alice").unwrap();
    let bob = app.join_game(&map_id, "bob").unwrap();

    let view = app.players_visible_to(&alice.auth_token).unwrap();
    let ids: Vec<u64> = view.players.keys().copied().collect();
    assert_eq!(ids, {
        let mut sorted = vec![alice.player_id, bob.player_id];
        sorted.sort_unstable();
        sorted
    });
    assert_eq!(view.players[&bob.player_id].name, "bob");

    assert!(matches!(
        app.players_visible_to(&Token::random()),
        Err(AppError::UnknownToken)
    ));
}

#[test]
fn state_view_serializes_with_wire_field_names() {
    let mut app = quiet_app();
    let map_id = MapId::new("town");
    let join = app.join_game(&map_id, "alice").unwrap();

    let state = app.game_state(&join.auth_token).unwrap();
    let json = serde_json::to_value(&state).unwrap();
    let player = &json["players"][join.player_id.to_string()];
    assert_eq!(player["pos"], serde_json::json!([0.0, 0.0]));
    assert_eq!(player["speed"], serde_json::json!([0.0, 0.0]));
    assert_eq!(player["dir"], "U");
    assert_eq!(player["bag"], serde_json::json!([]));
    assert_eq!(player["score"], 0);
    assert!(json["lostObjects"].as_object().unwrap().is_empty());
}

#[test]
fn manual_tick_is_refused_while_auto_ticking() {
    let mut app = quiet_app();
    app.set_auto_ticking(true);
    assert!(matches!(app.manual_tick(100), Err(AppError::AutoTickActive)));

    app.set_auto_ticking(false);
    assert!(app.manual_tick(100).is_ok());
}

#[test]
fn zero_delta_changes_nothing() {
    let mut app = quiet_app();
    let map_id = MapId::new("town");
    let join = app.join_game(&map_id, "alice").unwrap();

    let retired = app.manual_tick(0).unwrap();
    assert!(retired.is_empty());
    let dog = app.game().session(&map_id).unwrap().dog(join.player_id).unwrap();
    assert_eq!(dog.game_time_ms(), 0);
    assert_eq!(dog.standing_time_ms(), 0);
}

#[test]
fn standing_player_is_drained_with_final_stats() {
    let mut app = quiet_app();
    let map_id = MapId::new("town");
    let join = app.join_game(&map_id, "alice").unwrap();

    // One long tick crosses the retirement threshold outright.
    let retired = app.manual_tick(60_000).unwrap();
    assert_eq!(retired.len(), 1);
    let record = &retired[0];
    assert_eq!(record.dog_id, join.player_id);
    assert_eq!(record.name, "alice");
    assert_eq!(record.score, 0);
    assert_eq!(record.play_time_ms, 60_000);

    // The token is revoked and the dog is gone from the session.
    assert!(app.find_player(&join.auth_token).is_none());
    assert!(app.game().session(&map_id).unwrap().dog(join.player_id).is_none());

    // The name is free again: re-joining creates a brand new player.
    let again = app.join_game(&map_id, "alice").unwrap();
    assert_ne!(again.auth_token, join.auth_token);
    assert_ne!(again.player_id, join.player_id);
}

#[test]
fn moving_player_outlives_the_threshold() {
    let mut app = quiet_app();
    let map_id = MapId::new("town");
    let join = app.join_game(&map_id, "alice").unwrap();

    app.move_player(&join.auth_token, MoveCommand::Right).unwrap();
    let retired = app.manual_tick(60_000).unwrap();
    assert!(retired.is_empty());
    assert!(app.find_player(&join.auth_token).is_some());
}
