//! Sculpt layer node
//!
//! The compositor as a dependency-graph node. The attribute schema is static
//! and shared by every node; the recompute cache and the last committed
//! output belong to one node instance.
//!
//! # Evaluation
//!
//! [`SculptLayerNode::compute`] runs, in order:
//!
//! 1. Sample the curve mask and take its centre
//! 2. Pick the seed face (terrain face closest to the centre)
//! 3. Reuse or recompute the region and falloff via [`RecomputeCache`]
//! 4. Project weighted vertices onto the sculpted mesh
//!
//! Any failure returns before step 3, so the cache and the previous output
//! are left as they were.

use std::fmt;

use glam::Vec3;
use tracing::info;

use crate::config::SculptLayerConfig;
use crate::error::{LayerError, Result};
use crate::geometry::query::{CurveQuery, MeshQuery};
use crate::layer::cache::{CacheKey, RecomputeCache, RecomputeReason, TerrainFingerprint};
use crate::layer::falloff::{FalloffCalculator, FalloffMap};
use crate::layer::projection::{ProjectionCompositor, ProjectionStats};
use crate::layer::region::{Region, RegionFinder};
use crate::layer::sampler;

// ============================================================================
// SCHEMA
// ============================================================================

/// Attributes of a sculpt layer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plug {
    Terrain,
    CurveMask,
    SculptedMesh,
    SculptStrength,
    CurveOffset,
    MaxProjectionDistance,
    OutMesh,
}

/// Data carried by an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Mesh,
    Curve,
    Float,
}

/// Static description of one attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeSpec {
    pub plug: Plug,
    pub name: &'static str,
    pub short_name: &'static str,
    pub kind: AttributeKind,
    pub readable: bool,
    pub writable: bool,
    pub storable: bool,
    pub default: Option<f32>,
}

const fn input(
    plug: Plug,
    name: &'static str,
    short_name: &'static str,
    kind: AttributeKind,
    default: Option<f32>,
) -> AttributeSpec {
    AttributeSpec {
        plug,
        name,
        short_name,
        kind,
        readable: false,
        writable: true,
        storable: true,
        default,
    }
}

/// Attribute table, one entry per [`Plug`] in declaration order.
pub static SCHEMA: [AttributeSpec; 7] = [
    input(Plug::Terrain, "terrain", "t", AttributeKind::Mesh, None),
    input(Plug::CurveMask, "curveMask", "cm", AttributeKind::Curve, None),
    input(Plug::SculptedMesh, "sculptedMesh", "sm", AttributeKind::Mesh, None),
    input(Plug::SculptStrength, "sculptStrength", "ss", AttributeKind::Float, Some(1.0)),
    input(Plug::CurveOffset, "curveOffset", "co", AttributeKind::Float, Some(1.1)),
    input(
        Plug::MaxProjectionDistance,
        "maxProjectionDistance",
        "mpd",
        AttributeKind::Float,
        Some(1000.0),
    ),
    AttributeSpec {
        plug: Plug::OutMesh,
        name: "outMesh",
        short_name: "m",
        kind: AttributeKind::Mesh,
        readable: true,
        writable: false,
        storable: false,
        default: None,
    },
];

impl Plug {
    pub const ALL: [Plug; 7] = [
        Plug::Terrain,
        Plug::CurveMask,
        Plug::SculptedMesh,
        Plug::SculptStrength,
        Plug::CurveOffset,
        Plug::MaxProjectionDistance,
        Plug::OutMesh,
    ];

    pub fn spec(self) -> &'static AttributeSpec {
        &SCHEMA[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn is_input(self) -> bool {
        self.spec().writable
    }

    /// Looks a plug up by long or short attribute name.
    pub fn from_name(name: &str) -> Option<Plug> {
        SCHEMA
            .iter()
            .find(|spec| spec.name == name || spec.short_name == name)
            .map(|spec| spec.plug)
    }
}

impl fmt::Display for Plug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outputs that depend on `plug`. Every input drives `outMesh`.
pub fn affects(plug: Plug) -> &'static [Plug] {
    const OUT_MESH: &[Plug] = &[Plug::OutMesh];
    if plug.is_input() { OUT_MESH } else { &[] }
}

// ============================================================================
// INPUTS / OUTPUT
// ============================================================================

/// Values read by one evaluation. Meshes and the curve are borrowed from the
/// host; a `None` is an unconnected plug.
#[derive(Clone, Copy)]
pub struct SculptLayerInputs<'a> {
    pub terrain: Option<&'a dyn MeshQuery>,
    pub curve_mask: Option<&'a dyn CurveQuery>,
    pub sculpted_mesh: Option<&'a dyn MeshQuery>,
    pub sculpt_strength: f32,
    pub curve_offset: f32,
    pub max_projection_distance: f32,
}

impl<'a> SculptLayerInputs<'a> {
    /// Unconnected inputs with the scalar values from `config`.
    pub fn from_config(config: &SculptLayerConfig) -> Self {
        Self {
            terrain: None,
            curve_mask: None,
            sculpted_mesh: None,
            sculpt_strength: config.sculpt_strength,
            curve_offset: config.curve_offset,
            max_projection_distance: config.max_projection_distance,
        }
    }

    pub fn terrain(mut self, mesh: &'a dyn MeshQuery) -> Self {
        self.terrain = Some(mesh);
        self
    }

    pub fn curve_mask(mut self, curve: &'a dyn CurveQuery) -> Self {
        self.curve_mask = Some(curve);
        self
    }

    pub fn sculpted_mesh(mut self, mesh: &'a dyn MeshQuery) -> Self {
        self.sculpted_mesh = Some(mesh);
        self
    }

    fn check_scalars(&self) -> Result<()> {
        if !self.sculpt_strength.is_finite() {
            return Err(LayerError::invalid_config("sculpt_strength", "must be finite"));
        }
        if !(self.curve_offset.is_finite() && self.curve_offset > 0.0) {
            return Err(LayerError::invalid_config("curve_offset", "must be finite and positive"));
        }
        if !(self.max_projection_distance.is_finite() && self.max_projection_distance > 0.0) {
            return Err(LayerError::invalid_config(
                "max_projection_distance",
                "must be finite and positive",
            ));
        }
        Ok(())
    }
}

impl Default for SculptLayerInputs<'_> {
    fn default() -> Self {
        Self::from_config(&SculptLayerConfig::default())
    }
}

impl fmt::Debug for SculptLayerInputs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SculptLayerInputs")
            .field("terrain", &self.terrain.map(|m| m.vertex_count()))
            .field("curve_mask", &self.curve_mask.is_some())
            .field("sculpted_mesh", &self.sculpted_mesh.map(|m| m.vertex_count()))
            .field("sculpt_strength", &self.sculpt_strength)
            .field("curve_offset", &self.curve_offset)
            .field("max_projection_distance", &self.max_projection_distance)
            .finish()
    }
}

/// Committed result of the last successful evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerOutput {
    /// Deformed terrain positions, same length and order as the input terrain
    pub positions: Vec<Vec3>,
    pub curve_centre: Vec3,
    pub seed_face: Option<usize>,
    /// Number of terrain vertices in the region
    pub region_vertices: usize,
    /// Why the region was recomputed, `None` when the cache was reused
    pub recomputed: Option<RecomputeReason>,
    pub stats: ProjectionStats,
}

// ============================================================================
// NODE
// ============================================================================

/// One sculpt layer instance.
#[derive(Debug, Clone)]
pub struct SculptLayerNode {
    name: String,
    config: SculptLayerConfig,
    cache: RecomputeCache,
    output: Option<LayerOutput>,
    clean: bool,
}

static_assertions::assert_impl_all!(SculptLayerNode: Send, Sync);

impl SculptLayerNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, SculptLayerConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: SculptLayerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            cache: RecomputeCache::new(),
            output: None,
            clean: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &SculptLayerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SculptLayerConfig) {
        self.config = config;
        self.clean = false;
    }

    /// Inputs pre-filled with this node's scalar settings.
    pub fn inputs<'a>(&self) -> SculptLayerInputs<'a> {
        SculptLayerInputs::from_config(&self.config)
    }

    /// Records that `plug` changed; outputs it affects become dirty.
    pub fn mark_dirty(&mut self, plug: Plug) {
        if !affects(plug).is_empty() {
            self.clean = false;
        }
    }

    /// True when the committed output reflects the last evaluated inputs.
    pub fn is_clean(&self) -> bool {
        self.clean
    }

    pub fn output(&self) -> Option<&LayerOutput> {
        self.output.as_ref()
    }

    pub fn cache(&self) -> &RecomputeCache {
        &self.cache
    }

    pub fn region(&self) -> &Region {
        self.cache.region()
    }

    pub fn falloff(&self) -> &FalloffMap {
        self.cache.falloff()
    }

    /// Evaluates `plug`.
    ///
    /// # Returns
    ///
    /// The committed output for [`Plug::OutMesh`];
    /// [`LayerError::UnknownPlug`] for any other plug;
    /// [`LayerError::MissingInput`] or [`LayerError::InvalidConfig`] when the
    /// inputs cannot be evaluated.
    pub fn compute(&mut self, plug: Plug, inputs: &SculptLayerInputs<'_>) -> Result<&LayerOutput> {
        match plug {
            Plug::OutMesh => self.compute_out_mesh(inputs),
            other => Err(LayerError::UnknownPlug { plug: other }),
        }
    }

    fn compute_out_mesh(&mut self, inputs: &SculptLayerInputs<'_>) -> Result<&LayerOutput> {
        let terrain = inputs
            .terrain
            .ok_or(LayerError::MissingInput { plug: Plug::Terrain })?;
        let curve = inputs
            .curve_mask
            .ok_or(LayerError::MissingInput { plug: Plug::CurveMask })?;
        let sculpted = inputs
            .sculpted_mesh
            .ok_or(LayerError::MissingInput { plug: Plug::SculptedMesh })?;
        inputs.check_scalars()?;

        let samples = sampler::sample(curve, sampler::default_sample_count(curve));
        let centre = sampler::curve_centre(curve, &samples);
        let seed_face = terrain.closest_point(centre).map(|p| p.face);

        let key = CacheKey {
            curve_samples: samples,
            curve_offset: inputs.curve_offset,
            seed_face,
            terrain: TerrainFingerprint::of(terrain),
            growth: self.config.region_growth,
            metric: self.config.distance_metric,
        };
        let recomputed = self.cache.should_recompute(&key);

        let finder = RegionFinder::new(inputs.curve_offset).with_growth(self.config.region_growth);
        let calculator = FalloffCalculator::new(self.config.distance_metric);
        let (region, falloff) = self.cache.get_or_recompute(key, || match seed_face {
            Some(seed) => {
                let region = finder.find_region(terrain, curve, centre, seed);
                let falloff = calculator.weights(&region, terrain, curve, centre);
                (region, falloff)
            }
            None => (Region::default(), FalloffMap::default()),
        });
        let region_vertices = region.len();

        let compositor = ProjectionCompositor {
            strength: inputs.sculpt_strength,
            max_distance: inputs.max_projection_distance,
            both_directions: self.config.test_both_directions,
            cells_per_axis: self.config.grid_cells_per_axis.max(1),
        };
        let projection = compositor.apply(terrain, sculpted, falloff);

        info!(
            node = %self.name,
            region_vertices,
            moved = projection.stats.moved,
            recomputed = recomputed.is_some(),
            "sculpt layer evaluated"
        );

        self.clean = true;
        Ok(&*self.output.insert(LayerOutput {
            positions: projection.positions,
            curve_centre: centre,
            seed_face,
            region_vertices,
            recomputed,
            stats: projection.stats,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::curve::CircleCurve;
    use crate::geometry::mesh::PolyMesh;

    #[test]
    fn test_schema_matches_plug_order() {
        for plug in Plug::ALL {
            assert_eq!(plug.spec().plug, plug);
        }
        assert_eq!(Plug::from_name("mpd"), Some(Plug::MaxProjectionDistance));
        assert_eq!(Plug::from_name("outMesh"), Some(Plug::OutMesh));
        assert_eq!(Plug::from_name("bogus"), None);
    }

    #[test]
    fn test_inputs_affect_out_mesh_only() {
        for plug in Plug::ALL {
            if plug == Plug::OutMesh {
                assert!(affects(plug).is_empty());
                assert!(!plug.is_input());
            } else {
                assert_eq!(affects(plug), &[Plug::OutMesh]);
            }
        }
    }

    #[test]
    fn test_unknown_plug_is_unhandled() {
        let mut node = SculptLayerNode::new("layer");
        let err = node.compute(Plug::CurveOffset, &node.inputs()).unwrap_err();
        assert!(err.is_unhandled());
        assert_eq!(err.to_string(), "plug `curveOffset` is not computed by this node");
    }

    #[test]
    fn test_missing_input_keeps_previous_output() {
        let terrain = PolyMesh::grid(6, 6, 1.0, Vec3::ZERO);
        let sculpted = terrain.translated(Vec3::Y);
        let curve = CircleCurve::horizontal(Vec3::new(3.0, 0.0, 3.0), 2.0);

        let mut node = SculptLayerNode::new("layer");
        let inputs = node.inputs().terrain(&terrain).curve_mask(&curve).sculpted_mesh(&sculpted);
        let first = node.compute(Plug::OutMesh, &inputs).unwrap().clone();
        node.mark_dirty(Plug::SculptedMesh);
        assert!(!node.is_clean());

        let mut broken = inputs;
        broken.sculpted_mesh = None;
        let err = node.compute(Plug::OutMesh, &broken).unwrap_err();
        assert!(matches!(err, LayerError::MissingInput { plug: Plug::SculptedMesh }));
        assert_eq!(node.output(), Some(&first));
        assert_eq!(node.cache().recompute_count(), 1);
        assert!(!node.is_clean());
    }

    #[test]
    fn test_second_evaluation_reuses_region() {
        let terrain = PolyMesh::grid(6, 6, 1.0, Vec3::ZERO);
        let sculpted = terrain.translated(Vec3::Y);
        let curve = CircleCurve::horizontal(Vec3::new(3.0, 0.0, 3.0), 2.0);

        let mut node = SculptLayerNode::new("layer");
        let inputs = node.inputs().terrain(&terrain).curve_mask(&curve).sculpted_mesh(&sculpted);
        let first = node.compute(Plug::OutMesh, &inputs).unwrap().clone();
        assert_eq!(first.recomputed, Some(RecomputeReason::FirstEvaluation));
        let second = node.compute(Plug::OutMesh, &inputs).unwrap();
        assert_eq!(second.recomputed, None);
        assert_eq!(second.positions, first.positions);
        assert!(node.is_clean());
    }

    #[test]
    fn test_non_finite_strength_is_rejected() {
        let terrain = PolyMesh::grid(2, 2, 1.0, Vec3::ZERO);
        let curve = CircleCurve::horizontal(Vec3::new(1.0, 0.0, 1.0), 1.0);
        let mut node = SculptLayerNode::new("layer");
        let mut inputs = node.inputs().terrain(&terrain).curve_mask(&curve).sculpted_mesh(&terrain);
        inputs.sculpt_strength = f32::NAN;
        let err = node.compute(Plug::OutMesh, &inputs).unwrap_err();
        assert!(matches!(err, LayerError::InvalidConfig { field: "sculpt_strength", .. }));
        assert!(node.output().is_none());
    }
}
