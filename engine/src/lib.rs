//! Terrain Tools Engine Library
//!
//! Sculpt layers for terrain meshes: a closed curve drawn over a terrain
//! selects a footprint, every vertex in it gets a smooth falloff weight, and
//! weighted vertices are pulled along their normals onto a separately
//! sculpted mesh.
//!
//! # Modules
//!
//! - [`geometry`] - Mesh/curve query traits, reference meshes and curves, ray acceleration
//! - [`layer`] - Region finding, falloff, projection, caching and the layer node
//! - [`config`] - Serializable layer settings
//! - [`error`] - `LayerError` and the crate `Result`
//!
//! # Example
//!
//! ```ignore
//! use terrain_tools_engine::geometry::{CircleCurve, PolyMesh, Vec3};
//! use terrain_tools_engine::layer::{Plug, SculptLayerNode};
//!
//! let terrain = PolyMesh::grid(10, 10, 1.0, Vec3::ZERO);
//! let sculpted = terrain.translated(Vec3::new(0.0, 2.0, 0.0));
//! let mask = CircleCurve::horizontal(Vec3::new(5.0, 0.0, 5.0), 3.0);
//!
//! let mut node = SculptLayerNode::new("hills");
//! let inputs = node
//!     .inputs()
//!     .terrain(&terrain)
//!     .curve_mask(&mask)
//!     .sculpted_mesh(&sculpted);
//! let output = node.compute(Plug::OutMesh, &inputs)?;
//! let deformed = terrain.with_positions(output.positions.clone())?;
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod layer;

pub use config::SculptLayerConfig;
pub use error::{LayerError, Result};
pub use layer::{CreateSculptLayer, DeltaLayer, LayerOutput, Plug, SculptLayerInputs, SculptLayerNode};
