//! Sculpt layer module
//!
//! Region detection, falloff and projection compositing for a sculpt layer,
//! plus the node and command that wrap them.
//!
//! # Pipeline
//!
//! ```text
//! curve mask ─ sampler ─┬─ region ─ falloff ─┐
//!                       │   (cache gated)    ├─ projection ─ out positions
//! terrain ──────────────┘                    │
//! sculpted mesh ─────────────────────────────┘
//! ```
//!
//! # Submodules
//!
//! - [`sampler`] - Curve sampling, centre and closest-point queries
//! - [`region`] - Flood fill over face adjacency with the directional inside test
//! - [`falloff`] - Per-vertex soft-selection weights
//! - [`projection`] - Ray projection onto the sculpted mesh
//! - [`cache`] - Per-instance region/falloff cache
//! - [`delta`] - Difference layer (sculpted minus original, added at nearest terrain vertex)
//! - [`node`] - `SculptLayerNode`, attribute schema and plug dispatch
//! - [`command`] - `CreateSculptLayer` flag parsing and node creation

pub mod cache;
pub mod command;
pub mod delta;
pub mod falloff;
pub mod node;
pub mod projection;
pub mod region;
pub mod sampler;

pub use cache::{CacheKey, RecomputeCache, RecomputeReason, TerrainFingerprint};
pub use command::CreateSculptLayer;
pub use delta::DeltaLayer;
pub use falloff::{DistanceMetric, FalloffCalculator, FalloffMap, falloff_weight};
pub use node::{
    AttributeKind, AttributeSpec, LayerOutput, Plug, SCHEMA, SculptLayerInputs, SculptLayerNode,
    affects,
};
pub use projection::{Projection, ProjectionCompositor, ProjectionStats};
pub use region::{FaceClass, Region, RegionFinder, RegionGrowth, classify_face};
