//! Static map geometry: roads, buildings, offices, and the loot catalog.
//!
//! A map is immutable once loaded. Roads are axis-aligned segments between
//! integer grid points; a dog may stand anywhere inside a road's *strip*, the
//! rectangle obtained by inflating the segment by [`ROAD_WIDTH`]` / 2` on each
//! side. Offices are drop-off disks of [`OFFICE_WIDTH`] placed on the grid.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geom::{Point, Vec2};

/// Width of every road strip.
pub const ROAD_WIDTH: f64 = 0.8;

/// Collision width of an office.
pub const OFFICE_WIDTH: f64 = 0.5;

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Nominal map identifier. A wrapper rather than an alias so a map id can
/// never be confused with an arbitrary string at a call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapId(String);

impl MapId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Nominal office identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfficeId(String);

impl OfficeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Road
// ---------------------------------------------------------------------------

/// An axis-aligned road segment. Always either strictly horizontal or
/// strictly vertical; the constructors make anything else unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Road {
    start: Point,
    end: Point,
}

impl Road {
    pub fn horizontal(start: Point, end_x: i32) -> Self {
        Self { start, end: Point { x: end_x, y: start.y } }
    }

    pub fn vertical(start: Point, end_y: i32) -> Self {
        Self { start, end: Point { x: start.x, y: end_y } }
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn is_horizontal(&self) -> bool {
        self.start.y == self.end.y
    }

    pub fn is_vertical(&self) -> bool {
        self.start.x == self.end.x
    }

    /// Top-left corner of the road strip (minimum x/y, inflated).
    pub fn left_top(&self) -> Vec2 {
        Vec2 {
            x: self.start.x.min(self.end.x) as f64 - ROAD_WIDTH / 2.0,
            y: self.start.y.min(self.end.y) as f64 - ROAD_WIDTH / 2.0,
        }
    }

    /// Bottom-right corner of the road strip (maximum x/y, inflated).
    pub fn right_bottom(&self) -> Vec2 {
        Vec2 {
            x: self.start.x.max(self.end.x) as f64 + ROAD_WIDTH / 2.0,
            y: self.start.y.max(self.end.y) as f64 + ROAD_WIDTH / 2.0,
        }
    }

    /// Inclusive strip containment test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let lt = self.left_top();
        let rb = self.right_bottom();
        x >= lt.x && x <= rb.x && y >= lt.y && y <= rb.y
    }
}

// ---------------------------------------------------------------------------
// Buildings and offices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectangle {
    pub position: Point,
    pub size: Size,
}

/// Decorative obstacle. Buildings do not participate in motion or collision;
/// they exist so the map catalog can be rendered by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub bounds: Rectangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

/// A loot drop-off point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Office {
    id: OfficeId,
    position: Point,
    offset: Offset,
}

impl Office {
    pub fn new(id: OfficeId, position: Point, offset: Offset) -> Self {
        Self { id, position, offset }
    }

    pub fn id(&self) -> &OfficeId {
        &self.id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }
}

// ---------------------------------------------------------------------------
// Loot catalog
// ---------------------------------------------------------------------------

/// One entry of a map's loot catalog.
///
/// Gameplay only cares about `value` (score awarded on drop-off); the rest of
/// the catalog entry (sprite, color, scale, ...) is opaque client data and is
/// kept verbatim so the map JSON can be served back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootType {
    value: u64,
    raw: serde_json::Value,
}

impl LootType {
    pub fn new(value: u64, raw: serde_json::Value) -> Self {
        Self { value, raw }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// Static world geometry plus per-map tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Map {
    id: MapId,
    name: String,
    roads: Vec<Road>,
    buildings: Vec<Building>,
    offices: Vec<Office>,
    loot_types: Vec<LootType>,
    dog_speed: f64,
    bag_capacity: usize,
}

impl Map {
    pub fn new(id: MapId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            roads: Vec::new(),
            buildings: Vec::new(),
            offices: Vec::new(),
            loot_types: Vec::new(),
            dog_speed: 0.0,
            bag_capacity: 0,
        }
    }

    pub fn id(&self) -> &MapId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn offices(&self) -> &[Office] {
        &self.offices
    }

    pub fn loot_types(&self) -> &[LootType] {
        &self.loot_types
    }

    /// Dog speed in units per second.
    pub fn dog_speed(&self) -> f64 {
        self.dog_speed
    }

    pub fn bag_capacity(&self) -> usize {
        self.bag_capacity
    }

    pub fn add_road(&mut self, road: Road) {
        self.roads.push(road);
    }

    pub fn add_building(&mut self, building: Building) {
        self.buildings.push(building);
    }

    pub fn add_office(&mut self, office: Office) {
        self.offices.push(office);
    }

    pub fn add_loot_type(&mut self, loot_type: LootType) {
        self.loot_types.push(loot_type);
    }

    pub fn set_dog_speed(&mut self, speed: f64) {
        self.dog_speed = speed;
    }

    pub fn set_bag_capacity(&mut self, capacity: usize) {
        self.bag_capacity = capacity;
    }

    /// True when `(x, y)` lies on at least one road strip of this map.
    pub fn on_any_road(&self, x: f64, y: f64) -> bool {
        self.roads.iter().any(|r| r.contains(x, y))
    }
}
