//! Shared geometric primitives.
//!
//! The map grid is integer-valued ([`Point`]); live positions and velocities
//! are continuous ([`Vec2`]). Comparisons against targets use [`EPSILON`] so
//! accumulated floating-point error never keeps a dog "almost" at its goal.

use serde::{Deserialize, Serialize};

/// Tolerance for position comparisons.
pub const EPSILON: f64 = 1e-6;

/// A point on the integer map grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// A continuous 2D vector, used for positions and speeds alike.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Vec2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// True when both components are within [`EPSILON`] of `other`.
    pub fn approx_eq(self, other: Vec2) -> bool {
        (self.x - other.x).abs() < EPSILON && (self.y - other.y).abs() < EPSILON
    }

    /// True when both components are within [`EPSILON`] of zero.
    pub fn is_zero(self) -> bool {
        self.x.abs() < EPSILON && self.y.abs() < EPSILON
    }
}

impl From<Point> for Vec2 {
    fn from(p: Point) -> Self {
        Vec2 { x: p.x as f64, y: p.y as f64 }
    }
}

/// The grid cell a continuous coordinate falls into. Cell centers sit on
/// integer coordinates, so the boundary between cell `n` and `n + 1` is at
/// `n + 0.5`.
pub fn grid_cell(coord: f64) -> i32 {
    (coord + 0.5).floor() as i32
}

/// Compass direction of a dog. Serialized with the single-letter wire names
/// (`U`/`D`/`L`/`R`) used by clients and the state file alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "U")]
    North,
    #[serde(rename = "D")]
    South,
    #[serde(rename = "L")]
    West,
    #[serde(rename = "R")]
    East,
}

impl Direction {
    /// Single-letter wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "U",
            Direction::South => "D",
            Direction::West => "L",
            Direction::East => "R",
        }
    }

    /// True for east/west, i.e. travel along the x axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::East | Direction::West)
    }
}
