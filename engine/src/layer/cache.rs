//! Recompute cache
//!
//! Region finding and falloff only depend on the curve mask, the terrain and
//! the region settings. This cache keeps the last [`Region`] and
//! [`FalloffMap`] and decides whether they are still valid for a new
//! evaluation.
//!
//! # Invalidating Inputs
//!
//! A [`CacheKey`] is compared field by field; the first difference found is
//! reported as the [`RecomputeReason`]:
//!
//! - no previous evaluation
//! - the number of curve samples (the mask's topology changed)
//! - the sampled curve positions (the mask moved)
//! - `curve_offset`
//! - the seed face (terrain face closest to the curve centre)
//! - the terrain fingerprint (vertex count, first two vertex positions)
//! - region growth or distance metric settings
//!
//! The terrain fingerprint does not see edits to vertices past the first
//! two. After moving other terrain vertices in place, call
//! [`RecomputeCache::invalidate`] so the region and weights are rebuilt.
//!
//! Projection is not cached: strength, the sculpted mesh and the projection
//! distance can change without touching the mask.
//!
//! # Ownership
//!
//! One cache per compositor instance. Two layers sharing a cache would
//! overwrite each other's regions.

use glam::Vec3;
use tracing::debug;

use crate::geometry::query::MeshQuery;
use crate::layer::falloff::{DistanceMetric, FalloffMap};
use crate::layer::region::{Region, RegionGrowth};

/// Cheap identity check for the terrain.
///
/// Catches edits that replace or reshape the terrain without comparing every
/// vertex: the vertex count and the positions of the first two vertices.
/// Moving any other vertex leaves the fingerprint unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainFingerprint {
    pub vertex_count: usize,
    pub leading: [Option<Vec3>; 2],
}

impl TerrainFingerprint {
    pub fn of<M: MeshQuery + ?Sized>(terrain: &M) -> Self {
        let count = terrain.vertex_count();
        let at = |v: usize| (v < count).then(|| terrain.vertex_position(v));
        Self {
            vertex_count: count,
            leading: [at(0), at(1)],
        }
    }
}

/// Everything the cached region and falloff depend on.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheKey {
    pub curve_samples: Vec<Vec3>,
    pub curve_offset: f32,
    pub seed_face: Option<usize>,
    pub terrain: TerrainFingerprint,
    pub growth: RegionGrowth,
    pub metric: DistanceMetric,
}

/// Why the cached region had to be recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeReason {
    FirstEvaluation,
    CurveTopology,
    CurveMoved,
    CurveOffset,
    SeedFace,
    Terrain,
    Settings,
}

/// Per-instance cache of the last region and falloff.
#[derive(Debug, Clone, Default)]
pub struct RecomputeCache {
    key: Option<CacheKey>,
    region: Region,
    falloff: FalloffMap,
    recomputes: u64,
    reuses: u64,
}

impl RecomputeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the reason the region must be recomputed for `key`, or `None`
    /// when the cached results are still valid.
    pub fn should_recompute(&self, key: &CacheKey) -> Option<RecomputeReason> {
        let Some(last) = &self.key else {
            return Some(RecomputeReason::FirstEvaluation);
        };
        if last.curve_samples.len() != key.curve_samples.len() {
            Some(RecomputeReason::CurveTopology)
        } else if last.curve_samples != key.curve_samples {
            Some(RecomputeReason::CurveMoved)
        } else if last.curve_offset != key.curve_offset {
            Some(RecomputeReason::CurveOffset)
        } else if last.seed_face != key.seed_face {
            Some(RecomputeReason::SeedFace)
        } else if last.terrain != key.terrain {
            Some(RecomputeReason::Terrain)
        } else if last.growth != key.growth || last.metric != key.metric {
            Some(RecomputeReason::Settings)
        } else {
            None
        }
    }

    /// Stores freshly computed results under `key`.
    pub fn update(&mut self, key: CacheKey, region: Region, falloff: FalloffMap) {
        self.key = Some(key);
        self.region = region;
        self.falloff = falloff;
        self.recomputes += 1;
    }

    /// Cached results, counted as a reuse.
    pub fn reuse(&mut self) -> (&Region, &FalloffMap) {
        self.reuses += 1;
        debug!(reuses = self.reuses, "reusing cached region");
        (&self.region, &self.falloff)
    }

    /// Returns the cached region and falloff, recomputing them first if `key`
    /// differs from the stored one.
    pub fn get_or_recompute<F>(&mut self, key: CacheKey, compute: F) -> (&Region, &FalloffMap)
    where
        F: FnOnce() -> (Region, FalloffMap),
    {
        match self.should_recompute(&key) {
            Some(reason) => {
                debug!(?reason, "recomputing region");
                let (region, falloff) = compute();
                self.update(key, region, falloff);
                (&self.region, &self.falloff)
            }
            None => self.reuse(),
        }
    }

    /// Forgets the stored key so the next evaluation recomputes.
    pub fn invalidate(&mut self) {
        self.key = None;
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn falloff(&self) -> &FalloffMap {
        &self.falloff
    }

    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    pub fn reuse_count(&self) -> u64 {
        self.reuses
    }
}
