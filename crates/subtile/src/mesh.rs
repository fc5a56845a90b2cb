//! Debug line mesh built from a traversal.

use subtile_core::{Bounds, Transform, Vector};

use crate::behavior::Behavior;
use crate::material::Material;
use crate::visit::Visitor;

/// Offset of the marker segment drawn for each tile.
const TILE_MARKER: Vector = Vector::splat(0.5);

/// A line list: every two indices form one segment.
///
/// Vertices are `[x, y, altitude]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineMesh {
    vertices: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

impl LineMesh {
    /// Creates an empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the vertex buffer.
    #[must_use]
    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    /// Returns the index buffer.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.indices.len() / 2
    }

    /// Adds one segment on `altitude`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn line(&mut self, altitude: i32, from: Vector, to: Vector) {
        let z = altitude as f32;
        let base = self.vertices.len() as u32;
        self.vertices.push([from.x, from.y, z]);
        self.vertices.push([to.x, to.y, z]);
        self.indices.extend_from_slice(&[base, base + 1]);
    }

    /// Outlines the rectangle of `bounds` on its lower altitude.
    pub fn rect(&mut self, bounds: &Bounds) {
        let (lo, hi) = (bounds.lower, bounds.upper);
        let corners = [lo, Vector::new(hi.x, lo.y), hi, Vector::new(lo.x, hi.y)];
        for (i, &corner) in corners.iter().enumerate() {
            self.line(bounds.lower_altitude, corner, corners[(i + 1) % corners.len()]);
        }
    }

    /// Drops all geometry, keeping the buffers.
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }
}

impl Visitor for LineMesh {
    fn on_tile(&mut self, transform: &Transform, _material: &Material, _behavior: &Behavior) {
        self.line(transform.altitude, transform.position, transform.position + TILE_MARKER);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_marker() {
        let mut mesh = LineMesh::new();
        mesh.on_tile(&Transform::new(2, 1.0, -1.0, 0.0), &Material::default(), &Behavior::default());
        assert_eq!(mesh.vertices(), &[[1.0, -1.0, 2.0], [1.5, -0.5, 2.0]]);
        assert_eq!(mesh.indices(), &[0, 1]);
    }

    #[test]
    fn test_rect_and_reset() {
        let mut mesh = LineMesh::new();
        mesh.rect(&Bounds::footprint(0, 0, 0, 4));
        assert_eq!(mesh.line_count(), 4);
        assert_eq!(mesh.vertices()[3], [4.0, 4.0, 0.0]);
        assert_eq!(mesh.indices()[7], 7);

        mesh.reset();
        assert_eq!(mesh.line_count(), 0);
        assert!(mesh.vertices().is_empty());
    }
}
