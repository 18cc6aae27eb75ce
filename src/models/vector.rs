use serde::{Deserialize, Serialize};
use std::ops::Sub;

/// A point or direction in simulator space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Unit vector in the ground plane pointing at `angle` radians.
    pub fn planar_direction(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin(), 0.0)
    }

    /// Length of the projection onto the ground plane.
    pub fn planar_norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn planar_dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Self::Output {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Axis aligned bounding box reported by the body analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vector3,
    pub max: Vector3,
}

impl BoundingBox {
    pub fn new(min: Vector3, max: Vector3) -> Self {
        Self { min, max }
    }

    pub fn height(&self) -> f64 {
        self.max.z - self.min.z
    }
}
