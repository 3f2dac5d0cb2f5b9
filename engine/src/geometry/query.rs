//! Host geometry capabilities
//!
//! The layer algorithms never own mesh or curve storage. They consume three
//! narrow query traits which any backing representation can implement:
//!
//! - [`MeshQuery`] - positions, normals, face topology and closest-point queries
//! - [`CurveQuery`] - parametric evaluation and closest-point queries
//! - [`IntersectQuery`] - ray intersection against an accelerated surface
//!
//! [`PolyMesh`](super::mesh::PolyMesh), [`PolylineCurve`](super::curve::PolylineCurve),
//! [`CircleCurve`](super::curve::CircleCurve) and
//! [`AcceleratedMesh`](super::grid::AcceleratedMesh) are the in-crate implementations.

use glam::Vec3;

/// A point on a mesh surface together with the face it lies on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    /// World-space position on the surface
    pub position: Vec3,
    /// Index of the face containing `position`
    pub face: usize,
}

/// Result of a ray intersection query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space intersection point
    pub position: Vec3,
    /// Distance from the ray origin to `position` (always >= 0)
    pub distance: f32,
    /// Index of the face that was hit
    pub face: usize,
}

/// Read-only access to an indexed polygon mesh.
///
/// Indices are `usize` for vertex and face lookups; topology slices are `u32`
/// to keep adjacency storage compact.
pub trait MeshQuery {
    fn vertex_count(&self) -> usize;

    /// World-space position of a vertex.
    fn vertex_position(&self, vertex: usize) -> Vec3;

    /// Unit outward normal of a vertex, or zero for isolated vertices.
    fn vertex_normal(&self, vertex: usize) -> Vec3;

    fn face_count(&self) -> usize;

    /// Vertex indices of a face, in winding order.
    fn face_vertices(&self, face: usize) -> &[u32];

    /// Faces sharing at least one edge with `face`, excluding `face` itself.
    fn connected_faces(&self, face: usize) -> &[u32];

    /// Arithmetic mean of a face's vertex positions.
    fn face_centroid(&self, face: usize) -> Vec3 {
        let vertices = self.face_vertices(face);
        if vertices.is_empty() {
            return Vec3::ZERO;
        }
        let sum: Vec3 = vertices
            .iter()
            .map(|&v| self.vertex_position(v as usize))
            .sum();
        sum / vertices.len() as f32
    }

    /// Closest point on the surface to `point`, or `None` for a mesh without faces.
    fn closest_point(&self, point: Vec3) -> Option<SurfacePoint>;
}

/// Read-only access to a parametric curve.
pub trait CurveQuery {
    /// Parameter range `(start, end)` of the curve.
    fn domain(&self) -> (f32, f32);

    /// Evaluate the curve at parameter `t` (clamped to the domain).
    fn point_at_param(&self, t: f32) -> Vec3;

    /// Number of control points defining the curve.
    fn control_point_count(&self) -> usize;

    /// Whether the curve end joins its start.
    fn is_closed(&self) -> bool;

    /// Nearest point on the curve to `point`.
    ///
    /// A degenerate curve (single point, zero radius) returns that point
    /// unconditionally.
    fn closest_point(&self, point: Vec3) -> Vec3;
}

/// Ray intersection against a surface.
pub trait IntersectQuery {
    /// Casts a ray and returns the closest hit within `max_distance`.
    ///
    /// # Arguments
    ///
    /// * `origin` - Ray start
    /// * `direction` - Ray direction (normalized)
    /// * `max_distance` - Hits further than this are ignored
    /// * `both_directions` - Also test along `-direction`
    fn closest_intersection(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        both_directions: bool,
    ) -> Option<RayHit>;
}
