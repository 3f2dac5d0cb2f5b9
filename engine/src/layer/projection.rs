//! Projection compositing
//!
//! Moves weighted terrain vertices toward a sculpted target by casting a ray
//! along each vertex normal and blending the vertex toward the hit point.
//!
//! ```text
//! displacement = hit - vertex
//! vertex'      = vertex + displacement * strength * weight
//! ```
//!
//! Vertices without a hit inside `max_distance`, and hits whose displacement
//! is perpendicular to the normal (which would slide the vertex sideways),
//! are left where they are.

use glam::Vec3;
use tracing::debug;

use crate::geometry::grid::AcceleratedMesh;
use crate::geometry::query::{IntersectQuery, MeshQuery};
use crate::layer::falloff::FalloffMap;

/// Displacements with a normal component below this count as lateral.
const LATERAL_EPSILON: f32 = 1e-6;

/// Per-call counters for a projection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionStats {
    /// Vertices that were moved
    pub moved: usize,
    /// Weighted vertices whose ray found nothing in range
    pub missed: usize,
    /// Hits rejected because the displacement was perpendicular to the normal
    pub lateral: usize,
    /// Vertices skipped for a zero weight or a zero normal
    pub skipped: usize,
}

/// Output of a projection pass: a full position array in terrain order.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub positions: Vec<Vec3>,
    pub stats: ProjectionStats,
}

/// Blends terrain vertices toward a sculpted surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionCompositor {
    /// Global blend factor applied on top of the falloff weight
    pub strength: f32,
    /// Longest ray considered
    pub max_distance: f32,
    /// Also cast against the normal, so targets below the terrain are found
    pub both_directions: bool,
    /// Acceleration grid resolution along the longest axis
    pub cells_per_axis: u32,
}

impl ProjectionCompositor {
    pub fn new(strength: f32, max_distance: f32) -> Self {
        Self {
            strength,
            max_distance,
            both_directions: false,
            cells_per_axis: crate::geometry::grid::DEFAULT_CELLS_PER_AXIS,
        }
    }

    /// Builds a ray-acceleration grid over `sculpted` and projects onto it.
    pub fn apply<T, S>(&self, terrain: &T, sculpted: &S, falloff: &FalloffMap) -> Projection
    where
        T: MeshQuery + ?Sized,
        S: MeshQuery + ?Sized,
    {
        let target = AcceleratedMesh::build(sculpted, self.cells_per_axis);
        self.apply_with(terrain, &target, falloff)
    }

    /// Projects onto an already-accelerated target.
    pub fn apply_with<T, I>(&self, terrain: &T, target: &I, falloff: &FalloffMap) -> Projection
    where
        T: MeshQuery + ?Sized,
        I: IntersectQuery + ?Sized,
    {
        let mut positions: Vec<Vec3> = (0..terrain.vertex_count())
            .map(|v| terrain.vertex_position(v))
            .collect();
        let mut stats = ProjectionStats::default();

        for (vertex, weight) in falloff.iter() {
            let index = vertex as usize;
            if index >= positions.len() {
                continue;
            }
            let normal = terrain.vertex_normal(index);
            if weight <= 0.0 || normal == Vec3::ZERO {
                stats.skipped += 1;
                continue;
            }

            let origin = positions[index];
            let Some(hit) =
                target.closest_intersection(origin, normal, self.max_distance, self.both_directions)
            else {
                stats.missed += 1;
                continue;
            };

            let displacement = hit.position - origin;
            if displacement.dot(normal).abs() < LATERAL_EPSILON {
                stats.lateral += 1;
                continue;
            }

            positions[index] = origin + displacement * self.strength * weight;
            stats.moved += 1;
        }

        debug!(
            moved = stats.moved,
            missed = stats.missed,
            lateral = stats.lateral,
            skipped = stats.skipped,
            "projection applied"
        );
        Projection { positions, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh::PolyMesh;

    fn flat() -> PolyMesh {
        PolyMesh::grid(4, 4, 1.0, Vec3::ZERO)
    }

    fn full_weight(mesh: &PolyMesh) -> FalloffMap {
        FalloffMap::from_entries((0..mesh.vertex_count() as u32).map(|v| (v, 1.0)).collect())
    }

    #[test]
    fn test_full_strength_reaches_target() {
        let terrain = flat();
        let sculpted = terrain.translated(Vec3::new(0.0, 2.0, 0.0));
        let result = ProjectionCompositor::new(1.0, 100.0).apply(&terrain, &sculpted, &full_weight(&terrain));
        assert_eq!(result.stats.moved, terrain.vertex_count());
        for p in &result.positions {
            assert!((p.y - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_strength_and_weight_scale_displacement() {
        let terrain = flat();
        let sculpted = terrain.translated(Vec3::new(0.0, 2.0, 0.0));
        let falloff = FalloffMap::from_entries(vec![(6, 0.5), (12, 0.0)]);
        let result = ProjectionCompositor::new(0.5, 100.0).apply(&terrain, &sculpted, &falloff);
        assert!((result.positions[6].y - 0.5).abs() < 1e-4);
        assert_eq!(result.positions[12], terrain.vertex_position(12));
        assert_eq!(result.stats.moved, 1);
        assert_eq!(result.stats.skipped, 1);
        // Unweighted vertices are copied through
        assert_eq!(result.positions[0], terrain.vertex_position(0));
    }

    #[test]
    fn test_out_of_range_target_leaves_terrain_unchanged() {
        let terrain = flat();
        let sculpted = terrain.translated(Vec3::new(0.0, 50.0, 0.0));
        let result = ProjectionCompositor::new(1.0, 10.0).apply(&terrain, &sculpted, &full_weight(&terrain));
        assert_eq!(result.positions, terrain.positions());
        assert_eq!(result.stats.missed, terrain.vertex_count());
    }

    #[test]
    fn test_target_below_needs_both_directions() {
        let terrain = flat();
        let sculpted = terrain.translated(Vec3::new(0.0, -1.0, 0.0));
        let falloff = full_weight(&terrain);

        let forward = ProjectionCompositor::new(1.0, 100.0).apply(&terrain, &sculpted, &falloff);
        assert_eq!(forward.positions, terrain.positions());

        let mut both = ProjectionCompositor::new(1.0, 100.0);
        both.both_directions = true;
        let lowered = both.apply(&terrain, &sculpted, &falloff);
        assert!(lowered.positions.iter().all(|p| (p.y + 1.0).abs() < 1e-4));
    }

    struct SidewaysTarget;

    impl IntersectQuery for SidewaysTarget {
        fn closest_intersection(
            &self,
            origin: Vec3,
            _direction: Vec3,
            _max_distance: f32,
            _both_directions: bool,
        ) -> Option<crate::geometry::query::RayHit> {
            Some(crate::geometry::query::RayHit {
                position: origin + Vec3::X,
                distance: 1.0,
                face: 0,
            })
        }
    }

    #[test]
    fn test_lateral_hit_is_rejected() {
        let terrain = flat();
        let result = ProjectionCompositor::new(1.0, 100.0).apply_with(
            &terrain,
            &SidewaysTarget,
            &full_weight(&terrain),
        );
        assert_eq!(result.positions, terrain.positions());
        assert_eq!(result.stats.lateral, terrain.vertex_count());
    }
}
