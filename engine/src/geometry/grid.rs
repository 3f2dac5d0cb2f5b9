//! Uniform Grid Acceleration
//!
//! Bins the triangles of a mesh into cubic cells keyed by `(ix, iy, iz)` so a
//! ray only tests the triangles of the cells it passes through.
//!
//! # Ray Traversal
//!
//! The ray is clipped to the grid bounds, then walked cell by cell with a 3D
//! DDA (Amanatides & Woo). Traversal stops as soon as the best hit found so
//! far lies before the exit of the current cell, or the walk passes
//! `max_distance`.
//!
//! A triangle spanning several cells is stored in each of them, so it may be
//! tested more than once; the closest-hit bookkeeping makes that harmless.

use std::collections::HashMap;

use glam::{IVec3, Vec3};

use super::intersect::{ray_aabb_span, ray_triangle_intersect};
use super::mesh::fan_triangles;
use super::query::{IntersectQuery, MeshQuery, RayHit};

/// Default number of cells along the longest axis of the grid bounds.
pub const DEFAULT_CELLS_PER_AXIS: u32 = 16;

/// Upper bound on cells along the longest axis; larger requests are clamped.
pub const MAX_CELLS_PER_AXIS: u32 = 1024;

/// A triangle stored in the grid, tagged with its source face.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GridTriangle {
    vertices: [Vec3; 3],
    face: u32,
}

/// Uniform spatial grid over a triangle soup.
#[derive(Debug, Clone)]
pub struct UniformGrid {
    triangles: Vec<GridTriangle>,
    /// Triangle indices per occupied cell
    cells: HashMap<(i32, i32, i32), Vec<u32>>,
    /// Padded lower corner of the grid bounds
    min: Vec3,
    /// Padded upper corner of the grid bounds
    max: Vec3,
    /// Edge length of every (cubic) cell
    cell_size: f32,
    /// Number of cells along each axis
    dims: IVec3,
}

impl UniformGrid {
    /// Builds a grid over the fan triangulation of `mesh`.
    ///
    /// # Arguments
    ///
    /// * `mesh` - Source surface
    /// * `cells_per_axis` - Cells along the longest bounds axis, clamped to
    ///   `1..=MAX_CELLS_PER_AXIS`; shorter axes get proportionally fewer
    pub fn build<M: MeshQuery + ?Sized>(mesh: &M, cells_per_axis: u32) -> Self {
        let triangles: Vec<GridTriangle> = fan_triangles(mesh)
            .map(|(face, vertices)| GridTriangle {
                vertices,
                face: face as u32,
            })
            .collect();

        let (mut min, mut max) = if triangles.is_empty() {
            (Vec3::ZERO, Vec3::ZERO)
        } else {
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY))
        };
        for tri in &triangles {
            for &v in &tri.vertices {
                min = min.min(v);
                max = max.max(v);
            }
        }

        // Flat meshes have zero extent on one axis; pad so the bounds stay a volume
        let extent = (max - min).max_element();
        let pad = (extent * 1e-4).max(1e-4);
        min -= Vec3::splat(pad);
        max += Vec3::splat(pad);

        let cells_per_axis = cells_per_axis.clamp(1, MAX_CELLS_PER_AXIS);
        let cell_size = (max - min).max_element() / cells_per_axis as f32;
        let dims = ((max - min) / cell_size).ceil().as_ivec3().max(IVec3::ONE);

        let mut grid = Self {
            triangles: Vec::new(),
            cells: HashMap::new(),
            min,
            max,
            cell_size,
            dims,
        };

        for (index, tri) in triangles.iter().enumerate() {
            let tri_min = tri.vertices[0].min(tri.vertices[1]).min(tri.vertices[2]);
            let tri_max = tri.vertices[0].max(tri.vertices[1]).max(tri.vertices[2]);
            let lo = grid.cell_of(tri_min);
            let hi = grid.cell_of(tri_max);
            for ix in lo.x..=hi.x {
                for iy in lo.y..=hi.y {
                    for iz in lo.z..=hi.z {
                        grid.cells.entry((ix, iy, iz)).or_default().push(index as u32);
                    }
                }
            }
        }
        grid.triangles = triangles;
        grid
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Cell containing `p`, clamped to the grid.
    fn cell_of(&self, p: Vec3) -> IVec3 {
        ((p - self.min) / self.cell_size)
            .floor()
            .as_ivec3()
            .clamp(IVec3::ZERO, self.dims - IVec3::ONE)
    }

    /// Closest hit along a single direction.
    pub fn ray_cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        if self.triangles.is_empty() || max_distance <= 0.0 {
            return None;
        }
        let direction = direction.try_normalize()?;
        let (t_enter, t_exit) = ray_aabb_span(origin, direction, self.min, self.max)?;
        let limit = t_exit.min(max_distance);
        if t_enter > limit {
            return None;
        }

        let entry = origin + direction * t_enter;
        let mut cell = self.cell_of(entry);
        let step = IVec3::new(
            step_sign(direction.x),
            step_sign(direction.y),
            step_sign(direction.z),
        );

        // Parametric distance to the next cell boundary on each axis, and
        // the distance between boundaries
        let mut t_next = Vec3::splat(f32::INFINITY);
        let mut t_delta = Vec3::splat(f32::INFINITY);
        for axis in 0..3 {
            if step[axis] == 0 {
                continue;
            }
            let boundary_index = if step[axis] > 0 {
                cell[axis] + 1
            } else {
                cell[axis]
            };
            let boundary = self.min[axis] + boundary_index as f32 * self.cell_size;
            t_next[axis] = t_enter + (boundary - entry[axis]) / direction[axis];
            t_delta[axis] = self.cell_size / direction[axis].abs();
        }

        let mut best: Option<RayHit> = None;
        loop {
            let cell_exit = t_next.min_element();

            if let Some(indices) = self.cells.get(&(cell.x, cell.y, cell.z)) {
                for &index in indices {
                    let tri = &self.triangles[index as usize];
                    let Some(t) = ray_triangle_intersect(origin, direction, tri.vertices) else {
                        continue;
                    };
                    if t <= max_distance && best.is_none_or(|hit| t < hit.distance) {
                        best = Some(RayHit {
                            position: origin + direction * t,
                            distance: t,
                            face: tri.face as usize,
                        });
                    }
                }
            }

            if best.is_some_and(|hit| hit.distance <= cell_exit) || cell_exit > limit {
                break;
            }

            let axis = if t_next.x <= t_next.y && t_next.x <= t_next.z {
                0
            } else if t_next.y <= t_next.z {
                1
            } else {
                2
            };
            cell[axis] += step[axis];
            if cell[axis] < 0 || cell[axis] >= self.dims[axis] {
                break;
            }
            t_next[axis] += t_delta[axis];
        }
        best
    }
}

fn step_sign(component: f32) -> i32 {
    if component > 0.0 {
        1
    } else if component < 0.0 {
        -1
    } else {
        0
    }
}

/// A mesh paired with its uniform grid, ready for repeated ray queries.
///
/// Built once per projection pass and dropped afterwards; the grid copies the
/// triangle positions so the source mesh need not outlive it.
#[derive(Debug, Clone)]
pub struct AcceleratedMesh {
    grid: UniformGrid,
}

impl AcceleratedMesh {
    pub fn build<M: MeshQuery + ?Sized>(mesh: &M, cells_per_axis: u32) -> Self {
        Self {
            grid: UniformGrid::build(mesh, cells_per_axis),
        }
    }

    pub fn grid(&self) -> &UniformGrid {
        &self.grid
    }
}

impl IntersectQuery for AcceleratedMesh {
    fn closest_intersection(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        both_directions: bool,
    ) -> Option<RayHit> {
        let forward = self.grid.ray_cast(origin, direction, max_distance);
        if !both_directions {
            return forward;
        }
        let backward = self.grid.ray_cast(origin, -direction, max_distance);
        match (forward, backward) {
            (Some(f), Some(b)) => Some(if b.distance < f.distance { b } else { f }),
            (f, b) => f.or(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh::PolyMesh;

    fn raised_plane(height: f32) -> PolyMesh {
        PolyMesh::grid(8, 8, 1.0, Vec3::new(-4.0, height, -4.0))
    }

    #[test]
    fn test_build_bins_every_triangle() {
        let mesh = raised_plane(0.0);
        let grid = UniformGrid::build(&mesh, 4);
        assert_eq!(grid.triangle_count(), 128);
        assert!(grid.occupied_cells() > 0);
    }

    #[test]
    fn test_ray_hits_plane_from_below() {
        let accel = AcceleratedMesh::build(&raised_plane(2.0), 8);
        let hit = accel
            .closest_intersection(Vec3::new(0.3, 0.0, -1.7), Vec3::Y, 100.0, false)
            .unwrap();
        assert!((hit.distance - 2.0).abs() < 1e-4);
        assert!((hit.position - Vec3::new(0.3, 2.0, -1.7)).length() < 1e-4);
    }

    #[test]
    fn test_ray_through_grid_vertex() {
        let accel = AcceleratedMesh::build(&raised_plane(2.0), 8);
        let hit = accel.closest_intersection(Vec3::new(1.0, 0.0, 1.0), Vec3::Y, 100.0, false);
        assert!(hit.is_some());
    }

    #[test]
    fn test_ray_respects_max_distance() {
        let accel = AcceleratedMesh::build(&raised_plane(5.0), 8);
        let miss = accel.closest_intersection(Vec3::ZERO, Vec3::Y, 4.0, false);
        assert!(miss.is_none());
    }

    #[test]
    fn test_ray_wrong_direction_needs_both_directions() {
        let accel = AcceleratedMesh::build(&raised_plane(-3.0), 8);
        let origin = Vec3::new(0.5, 0.0, 0.5);
        assert!(accel.closest_intersection(origin, Vec3::Y, 100.0, false).is_none());
        let hit = accel.closest_intersection(origin, Vec3::Y, 100.0, true).unwrap();
        assert!((hit.position.y + 3.0).abs() < 1e-4);
        assert!((hit.distance - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_oblique_ray_matches_brute_force() {
        let mesh = raised_plane(1.0);
        let accel = AcceleratedMesh::build(&mesh, 5);
        let origin = Vec3::new(-6.0, -2.0, -5.0);
        let direction = Vec3::new(1.0, 0.6, 0.8).normalize();

        let brute = mesh
            .triangles()
            .filter_map(|(_, tri)| ray_triangle_intersect(origin, direction, tri))
            .fold(f32::INFINITY, f32::min);
        let hit = accel
            .closest_intersection(origin, direction, 1000.0, false)
            .unwrap();
        assert!((hit.distance - brute).abs() < 1e-4);
    }

    #[test]
    fn test_empty_mesh_never_hits() {
        let empty = PolyMesh::new(Vec::new(), Vec::new()).unwrap();
        let accel = AcceleratedMesh::build(&empty, 8);
        assert!(accel.closest_intersection(Vec3::ZERO, Vec3::Y, 10.0, true).is_none());
    }
}
