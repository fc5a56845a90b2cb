//! Planar positions, placements and query volumes.
//!
//! The world is a stack of planes: a position is 2D, and the third axis is an
//! integer altitude.

use bytemuck::{Pod, Zeroable};

/// 2D vector.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vector {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vector {
    /// Creates a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Creates a vector with both components set to `v`.
    #[must_use]
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0);
}

impl std::ops::Add for Vector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vector {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Where a tile sits and how it is turned.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transform {
    /// Plane the tile sits on.
    pub altitude: i32,
    /// Position on that plane.
    pub position: Vector,
    /// Rotation in radians.
    pub rotation: f32,
}

impl Transform {
    /// Creates a transform.
    #[must_use]
    pub const fn new(altitude: i32, x: f32, y: f32, rotation: f32) -> Self {
        Self {
            altitude,
            position: Vector::new(x, y),
            rotation,
        }
    }
}

/// An axis-aligned volume: an altitude range times a rectangle.
///
/// Every test is inclusive on all edges, so a degenerate volume that only
/// touches a boundary still counts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    /// Lowest altitude covered.
    pub lower_altitude: i32,
    /// Highest altitude covered.
    pub upper_altitude: i32,
    /// Lower corner of the rectangle.
    pub lower: Vector,
    /// Upper corner of the rectangle.
    pub upper: Vector,
}

impl Bounds {
    /// Creates a volume from its two corners.
    #[must_use]
    pub const fn new(
        lower_altitude: i32,
        lower_x: f32,
        lower_y: f32,
        upper_altitude: i32,
        upper_x: f32,
        upper_y: f32,
    ) -> Self {
        Self {
            lower_altitude,
            upper_altitude,
            lower: Vector::new(lower_x, lower_y),
            upper: Vector::new(upper_x, upper_y),
        }
    }

    /// Creates the volume of a square footprint on one plane. The far edge
    /// saturates at `i32::MAX`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn footprint(altitude: i32, origin_x: i32, origin_y: i32, size: i32) -> Self {
        Self::new(
            altitude,
            origin_x as f32,
            origin_y as f32,
            altitude,
            origin_x.saturating_add(size) as f32,
            origin_y.saturating_add(size) as f32,
        )
    }

    /// Returns true if the point lies inside the volume.
    #[inline]
    #[must_use]
    pub fn contains(&self, altitude: i32, position: Vector) -> bool {
        altitude >= self.lower_altitude
            && altitude <= self.upper_altitude
            && position.x >= self.lower.x
            && position.x <= self.upper.x
            && position.y >= self.lower.y
            && position.y <= self.upper.y
    }

    /// Returns true if the two volumes share at least one point.
    #[inline]
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.lower_altitude <= other.upper_altitude
            && self.upper_altitude >= other.lower_altitude
            && self.lower.x <= other.upper.x
            && self.lower.y <= other.upper.y
            && self.upper.x >= other.lower.x
            && self.upper.y >= other.lower.y
    }
}
