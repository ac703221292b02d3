//! JSON map-configuration loading.
//!
//! The config file carries the map catalog plus global tunables. Roads are
//! written with either an `x1` (horizontal) or a `y1` (vertical) end
//! coordinate; loot-type entries are kept verbatim as catalog payloads, with
//! only their `value` interpreted by the engine.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use doghouse_model::game::{Game, LootGeneratorConfig, DEFAULT_BAG_CAPACITY, DEFAULT_RETIREMENT_TIME_MS};
use doghouse_model::geom::Point;
use doghouse_model::map::{Building, LootType, Map, MapId, Office, OfficeId, Offset, Rectangle, Road, Size};

/// Errors produced while loading the game configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("map '{map}': {reason}")]
    InvalidMap { map: String, reason: String },

    #[error(transparent)]
    Model(#[from] doghouse_model::ModelError),
}

// ---------------------------------------------------------------------------
// File schema
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    maps: Vec<MapEntry>,
    default_dog_speed: f64,
    default_bag_capacity: Option<u64>,
    /// Seconds of standing time before retirement.
    dog_retirement_time: Option<f64>,
    loot_generator_config: GeneratorEntry,
}

#[derive(Debug, Deserialize)]
struct GeneratorEntry {
    /// Seconds per spawn opportunity.
    period: f64,
    probability: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapEntry {
    id: String,
    name: String,
    roads: Vec<RoadEntry>,
    #[serde(default)]
    buildings: Vec<BuildingEntry>,
    #[serde(default)]
    offices: Vec<OfficeEntry>,
    loot_types: Vec<serde_json::Value>,
    dog_speed: Option<f64>,
    bag_capacity: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RoadEntry {
    x0: i32,
    y0: i32,
    x1: Option<i32>,
    y1: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct BuildingEntry {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfficeEntry {
    id: String,
    x: i32,
    y: i32,
    offset_x: i32,
    offset_y: i32,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load the game from a JSON config file.
pub fn load_game(path: &Path) -> Result<Game, ConfigError> {
    let raw = fs::read_to_string(path)?;
    game_from_json(&raw)
}

/// Build the game from the raw JSON text. Exposed for tests.
pub fn game_from_json(raw: &str) -> Result<Game, ConfigError> {
    let file: ConfigFile = serde_json::from_str(raw)?;

    let generator = LootGeneratorConfig::new(
        (file.loot_generator_config.period * 1000.0) as u64,
        file.loot_generator_config.probability,
    );
    let retirement_ms = match file.dog_retirement_time {
        Some(seconds) if seconds > 0.0 => (seconds * 1000.0) as u64,
        _ => DEFAULT_RETIREMENT_TIME_MS,
    };
    let default_bag = file.default_bag_capacity.unwrap_or(DEFAULT_BAG_CAPACITY as u64);

    let mut game = Game::new(generator, retirement_ms);
    for entry in file.maps {
        let map = build_map(entry, file.default_dog_speed, default_bag)?;
        game.add_map(map)?;
    }
    Ok(game)
}

fn build_map(entry: MapEntry, default_speed: f64, default_bag: u64) -> Result<Map, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidMap {
        map: entry.id.clone(),
        reason: reason.to_owned(),
    };

    if entry.roads.is_empty() {
        return Err(invalid("a map needs at least one road"));
    }
    if entry.loot_types.is_empty() {
        return Err(invalid("a map needs at least one loot type"));
    }

    let mut map = Map::new(MapId::new(entry.id.clone()), entry.name.clone());
    for road in &entry.roads {
        let start = Point { x: road.x0, y: road.y0 };
        match (road.x1, road.y1) {
            (Some(x1), None) => map.add_road(Road::horizontal(start, x1)),
            (None, Some(y1)) => map.add_road(Road::vertical(start, y1)),
            _ => return Err(invalid("a road needs exactly one of x1/y1")),
        }
    }
    for b in &entry.buildings {
        map.add_building(Building {
            bounds: Rectangle {
                position: Point { x: b.x, y: b.y },
                size: Size { width: b.w, height: b.h },
            },
        });
    }
    for o in &entry.offices {
        map.add_office(Office::new(
            OfficeId::new(o.id.clone()),
            Point { x: o.x, y: o.y },
            Offset { dx: o.offset_x, dy: o.offset_y },
        ));
    }
    for loot_type in entry.loot_types {
        let value = loot_type
            .get("value")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| invalid("a loot type needs a non-negative integer 'value'"))?;
        map.add_loot_type(LootType::new(value, loot_type));
    }
    map.set_dog_speed(entry.dog_speed.unwrap_or(default_speed));
    map.set_bag_capacity(entry.bag_capacity.unwrap_or(default_bag) as usize);
    Ok(map)
}
