//! Intersection and closest-point primitives
//!
//! Low-level building blocks shared by the mesh, curve and grid modules.
//!
//! # Ray-AABB Intersection
//!
//! The slab method is used for ray-AABB intersection, which finds the
//! entry and exit times of the ray for each axis and intersects them.
//!
//! # Ray-Triangle Intersection
//!
//! Möller–Trumbore, with a small barycentric tolerance so rays passing
//! exactly through a shared edge or vertex are not lost between triangles.
//!
//! # Example
//!
//! ```ignore
//! use terrain_tools_engine::geometry::intersect::{ray_triangle_intersect, closest_point_on_triangle};
//! use glam::Vec3;
//!
//! let tri = [Vec3::ZERO, Vec3::X, Vec3::Z];
//! let t = ray_triangle_intersect(Vec3::new(0.2, -1.0, 0.2), Vec3::Y, tri);
//! assert_eq!(t, Some(1.0));
//! ```

use glam::Vec3;

/// Determinant threshold below which a ray is considered parallel to a triangle.
const PARALLEL_EPSILON: f32 = 1e-10;

/// Barycentric slack accepted at triangle edges.
const BARYCENTRIC_EPSILON: f32 = 1e-6;

/// Hits closer than this to the ray origin are rejected.
const MIN_HIT_DISTANCE: f32 = 1e-6;

/// Entry and exit distances of a ray through an AABB using the slab method.
///
/// # Arguments
///
/// * `ray_origin` - Starting point of the ray
/// * `ray_dir` - Direction of the ray (must be normalized)
/// * `aabb_min` - Minimum corner of the AABB
/// * `aabb_max` - Maximum corner of the AABB
///
/// # Returns
///
/// * `Some((t_enter, t_exit))` - Span along the ray inside the box; `t_enter`
///   is clamped to 0 when the ray starts inside
/// * `None` - No intersection or the box is entirely behind the ray origin
pub fn ray_aabb_span(
    ray_origin: Vec3,
    ray_dir: Vec3,
    aabb_min: Vec3,
    aabb_max: Vec3,
) -> Option<(f32, f32)> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let origin = ray_origin[axis];
        let dir = ray_dir[axis];
        if dir.abs() < PARALLEL_EPSILON {
            // Parallel to this slab: must already be between the planes
            if origin < aabb_min[axis] || origin > aabb_max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / dir;
        let t1 = (aabb_min[axis] - origin) * inv;
        let t2 = (aabb_max[axis] - origin) * inv;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
    }

    if t_max >= t_min && t_max >= 0.0 {
        Some((t_min.max(0.0), t_max))
    } else {
        None
    }
}

/// Möller–Trumbore ray-triangle intersection.
///
/// Returns the distance along `ray_dir` to the hit, or `None` when the ray
/// misses, is parallel to the triangle, or hits behind (or at) its origin.
pub fn ray_triangle_intersect(ray_origin: Vec3, ray_dir: Vec3, tri: [Vec3; 3]) -> Option<f32> {
    let [v0, v1, v2] = tri;
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray_dir.cross(edge2);
    let a = edge1.dot(h);
    if a.abs() < PARALLEL_EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray_origin - v0;
    let u = f * s.dot(h);
    if u < -BARYCENTRIC_EPSILON || u > 1.0 + BARYCENTRIC_EPSILON {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray_dir.dot(q);
    if v < -BARYCENTRIC_EPSILON || u + v > 1.0 + BARYCENTRIC_EPSILON {
        return None;
    }

    let t = f * edge2.dot(q);
    (t > MIN_HIT_DISTANCE).then_some(t)
}

/// Closest point on a triangle to `p` (Voronoi-region method).
pub fn closest_point_on_triangle(p: Vec3, tri: [Vec3; 3]) -> Vec3 {
    let [a, b, c] = tri;
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    // Inside the face region
    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// Closest point on segment `[a, b]` to `p`. A zero-length segment returns `a`.
pub fn closest_point_on_segment(p: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}
