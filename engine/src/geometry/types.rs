//! Geometry type re-exports from glam
//!
//! Core math types used by the mesh, curve and layer modules, plus the
//! shared tolerances for degenerate-geometry checks.

pub use glam::{Vec2, Vec3};

/// Lengths below this are treated as zero (degenerate vectors, collapsed curves).
pub const LENGTH_EPSILON: f32 = 1e-6;

/// Squared form of [`LENGTH_EPSILON`] for comparisons against squared distances.
pub const LENGTH_EPSILON_SQ: f32 = LENGTH_EPSILON * LENGTH_EPSILON;
