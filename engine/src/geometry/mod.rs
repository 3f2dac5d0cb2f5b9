//! Geometry module
//!
//! Mesh, curve and ray-query building blocks consumed by the sculpt layer.
//! Everything the layer needs from a host geometry kernel goes through the
//! traits in [`query`]; the concrete types here are reference implementations
//! used by the binary and the tests.
//!
//! # Submodules
//!
//! - [`types`] - Math types re-exported from glam, shared tolerances
//! - [`query`] - `MeshQuery`, `CurveQuery`, `IntersectQuery` capabilities
//! - [`intersect`] - Ray/AABB, ray/triangle and closest-point primitives
//! - [`mesh`] - `PolyMesh`, an indexed polygon mesh with derived normals and adjacency
//! - [`curve`] - `PolylineCurve` and `CircleCurve` masks
//! - [`grid`] - Uniform-grid ray acceleration (`AcceleratedMesh`)

pub mod curve;
pub mod grid;
pub mod intersect;
pub mod mesh;
pub mod query;
pub mod types;

pub use curve::{CircleCurve, PolylineCurve};
pub use grid::{AcceleratedMesh, DEFAULT_CELLS_PER_AXIS, MAX_CELLS_PER_AXIS, UniformGrid};
pub use mesh::{PolyMesh, fan_triangles};
pub use query::{CurveQuery, IntersectQuery, MeshQuery, RayHit, SurfacePoint};
pub use types::{LENGTH_EPSILON, LENGTH_EPSILON_SQ, Vec2, Vec3};
