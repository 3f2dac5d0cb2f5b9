//! Delta layer
//!
//! The simpler "difference" layer: a sculpted copy of some original mesh is
//! compared vertex by vertex against that original, and each difference is
//! added to the terrain vertex nearest the original vertex.
//!
//! ```text
//! terrain[nearest(original[i])] += (sculpted[i] - original[i]) * strength
//! ```
//!
//! Several original vertices mapping onto the same terrain vertex accumulate.
//! Nearest-vertex lookups always use the undeformed terrain.

use glam::Vec3;
use tracing::{debug, warn};

use crate::error::{LayerError, Result};
use crate::geometry::query::MeshQuery;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaLayer {
    pub strength: f32,
}

impl Default for DeltaLayer {
    fn default() -> Self {
        Self { strength: 1.0 }
    }
}

impl DeltaLayer {
    pub fn new(strength: f32) -> Self {
        Self { strength }
    }

    /// Adds the sculpted-minus-original differences onto `terrain`.
    ///
    /// # Arguments
    ///
    /// * `terrain` - Mesh receiving the differences
    /// * `original` - Undeformed reference mesh
    /// * `sculpted` - Deformed copy of `original`
    ///
    /// # Returns
    ///
    /// New terrain positions in terrain vertex order, or
    /// [`LayerError::TopologyMismatch`] when `original` and `sculpted` have
    /// different vertex counts.
    pub fn apply<T, O, S>(&self, terrain: &T, original: &O, sculpted: &S) -> Result<Vec<Vec3>>
    where
        T: MeshQuery + ?Sized,
        O: MeshQuery + ?Sized,
        S: MeshQuery + ?Sized,
    {
        if original.vertex_count() != sculpted.vertex_count() {
            return Err(LayerError::TopologyMismatch {
                expected: original.vertex_count(),
                actual: sculpted.vertex_count(),
            });
        }

        let mut positions: Vec<Vec3> = (0..terrain.vertex_count())
            .map(|v| terrain.vertex_position(v))
            .collect();

        let mut unmatched = 0usize;
        for i in 0..original.vertex_count() {
            let source = original.vertex_position(i);
            let Some(target) = nearest_vertex(terrain, source) else {
                unmatched += 1;
                continue;
            };
            let difference = sculpted.vertex_position(i) - source;
            positions[target] += difference * self.strength;
        }

        if unmatched > 0 {
            warn!(unmatched, "original vertices with no terrain face nearby");
        }
        debug!(
            vertices = original.vertex_count(),
            strength = self.strength,
            "delta layer applied"
        );
        Ok(positions)
    }
}

/// Terrain vertex nearest `point`, searched among the vertices of the
/// closest terrain face.
pub fn nearest_vertex<M: MeshQuery + ?Sized>(terrain: &M, point: Vec3) -> Option<usize> {
    let surface = terrain.closest_point(point)?;
    terrain
        .face_vertices(surface.face)
        .iter()
        .map(|&v| v as usize)
        .filter(|&v| v < terrain.vertex_count())
        .min_by(|&a, &b| {
            let da = terrain.vertex_position(a).distance_squared(point);
            let db = terrain.vertex_position(b).distance_squared(point);
            da.total_cmp(&db)
        })
}
