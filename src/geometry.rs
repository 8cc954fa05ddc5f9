//! Spatial primitives shared by the origin frame, the action primitives and blueprints.
//!
//! World axes follow the usual voxel convention: `y` is vertical, `x` grows to the east and
//! `z` grows to the south.

use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A continuous world coordinate or direction.
///
/// Internally uses [`nalgebra::Vector3<f64>`] so callers can do vector math directly on `.0`.
/// Serializes as a plain `[x, y, z]` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3D(pub Vector3<f64>);

impl Vector3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(Vector3::new(x, y, z))
    }

    pub fn zero() -> Self {
        Self(Vector3::zeros())
    }

    /// Unit vector pointing straight up; the usual insertion direction for "place on top of".
    pub fn up() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    pub fn z(&self) -> f64 {
        self.0.z
    }

    pub fn translate(&self, by: Vector3D) -> Self {
        Self(self.0 + by.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Vector3::zeros()
    }

    /// The integer cell containing this point.
    pub fn floored(&self) -> BlockPos {
        BlockPos::new(
            self.0.x.floor() as i32,
            self.0.y.floor() as i32,
            self.0.z.floor() as i32,
        )
    }
}

impl Default for Vector3D {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Vector3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0.x, self.0.y, self.0.z)
    }
}

/// An integer block cell in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighbouring cell reached by stepping along `direction` (rounded per axis).
    pub fn step(&self, direction: Vector3D) -> Self {
        Self {
            x: self.x + direction.x().round() as i32,
            y: self.y + direction.y().round() as i32,
            z: self.z + direction.z().round() as i32,
        }
    }

    /// Centre of the cell, useful as a look target.
    pub fn center(&self) -> Vector3D {
        Vector3D::new(
            f64::from(self.x) + 0.5,
            f64::from(self.y) + 0.5,
            f64::from(self.z) + 0.5,
        )
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A `(right, up, forward)` displacement interpreted against an origin frame.
///
/// Serializes as a `[right, up, forward]` array so blueprints stay compact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Offset {
    pub right: f64,
    pub up: f64,
    pub forward: f64,
}

impl Offset {
    pub fn new(right: f64, up: f64, forward: f64) -> Self {
        Self { right, up, forward }
    }
}

impl From<[f64; 3]> for Offset {
    fn from([right, up, forward]: [f64; 3]) -> Self {
        Self { right, up, forward }
    }
}

impl From<Offset> for [f64; 3] {
    fn from(offset: Offset) -> Self {
        [offset.right, offset.up, offset.forward]
    }
}

impl From<(i32, i32, i32)> for Offset {
    fn from((right, up, forward): (i32, i32, i32)) -> Self {
        Self::new(f64::from(right), f64::from(up), f64::from(forward))
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.right, self.up, self.forward)
    }
}

/// Compass or vertical direction a placed block should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Facing {
    /// Unit vector for this direction in world space.
    pub fn unit(&self) -> Vector3D {
        match self {
            Facing::North => Vector3D::new(0.0, 0.0, -1.0),
            Facing::South => Vector3D::new(0.0, 0.0, 1.0),
            Facing::East => Vector3D::new(1.0, 0.0, 0.0),
            Facing::West => Vector3D::new(-1.0, 0.0, 0.0),
            Facing::Up => Vector3D::new(0.0, 1.0, 0.0),
            Facing::Down => Vector3D::new(0.0, -1.0, 0.0),
        }
    }
}
