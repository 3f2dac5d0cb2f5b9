//! Falloff weights
//!
//! Soft-selection weight for every vertex of a region, from the ratio of
//! squared distances to the curve centre:
//!
//! ```text
//! d1     = |centre - vertex|^2
//! d2     = |centre - nearest_curve_point(vertex)|^2
//! ratio  = d1 / d2
//! weight = 2 + 2 / (ratio - 2)
//! ```
//!
//! The weight is exactly 1 at the centre (`ratio = 0`), reaches 0 where the
//! vertex is as far from the centre as the curve is (`ratio = 1`) and is
//! clamped to 0 from there up to the singularity at `ratio = 2`. Past the
//! singularity the raw formula jumps to values above 2; those vertices lie
//! well outside the mask and are given weight 0 as well, so every weight is
//! finite and in `[0, 1]`.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::query::{CurveQuery, MeshQuery};
use crate::geometry::types::LENGTH_EPSILON_SQ;
use crate::layer::region::Region;

/// Distance-ratio value where the weight formula divides by zero.
const SINGULAR_RATIO: f32 = 2.0;

/// Which components enter the squared distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Full 3D distance
    #[default]
    Full3d,
    /// Horizontal (XZ) distance only; height differences are ignored
    Planar,
}

impl DistanceMetric {
    pub fn distance_squared(self, a: Vec3, b: Vec3) -> f32 {
        match self {
            Self::Full3d => a.distance_squared(b),
            Self::Planar => Vec2::new(a.x, a.z).distance_squared(Vec2::new(b.x, b.z)),
        }
    }
}

/// Weight for one vertex.
///
/// A curve point coinciding with the centre (`d2 = 0`) is a zero-radius
/// footprint: the vertex gets 1 if it sits on the centre, else 0.
pub fn falloff_weight(
    centre: Vec3,
    vertex: Vec3,
    curve_point: Vec3,
    metric: DistanceMetric,
) -> f32 {
    let d1 = metric.distance_squared(centre, vertex);
    let d2 = metric.distance_squared(centre, curve_point);
    if d2 <= LENGTH_EPSILON_SQ {
        return if d1 <= LENGTH_EPSILON_SQ { 1.0 } else { 0.0 };
    }

    let ratio = d1 / d2;
    if ratio >= SINGULAR_RATIO {
        return 0.0;
    }
    (2.0 + 2.0 / (ratio - SINGULAR_RATIO)).clamp(0.0, 1.0)
}

/// Weights keyed by vertex index, sorted by vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FalloffMap {
    entries: Vec<(u32, f32)>,
}

impl FalloffMap {
    /// Builds a map from `(vertex, weight)` pairs; duplicates keep the last weight.
    pub fn from_entries(mut entries: Vec<(u32, f32)>) -> Self {
        entries.sort_by_key(|&(vertex, _)| vertex);
        entries.reverse();
        entries.dedup_by_key(|&mut (vertex, _)| vertex);
        entries.reverse();
        Self { entries }
    }

    pub fn get(&self, vertex: u32) -> Option<f32> {
        self.entries
            .binary_search_by_key(&vertex, |&(v, _)| v)
            .ok()
            .map(|index| self.entries[index].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of vertices with a weight above zero.
    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|&&(_, w)| w > 0.0).count()
    }
}

/// Computes falloff weights for a region.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FalloffCalculator {
    pub metric: DistanceMetric,
}

impl FalloffCalculator {
    pub fn new(metric: DistanceMetric) -> Self {
        Self { metric }
    }

    pub fn weights<M, C>(
        &self,
        region: &Region,
        terrain: &M,
        curve: &C,
        curve_centre: Vec3,
    ) -> FalloffMap
    where
        M: MeshQuery + ?Sized,
        C: CurveQuery + ?Sized,
    {
        // Region vertices are already sorted and unique
        let entries: Vec<(u32, f32)> = region
            .vertices()
            .iter()
            .map(|&vertex| {
                let position = terrain.vertex_position(vertex as usize);
                let curve_point = curve.closest_point(position);
                (vertex, falloff_weight(curve_centre, position, curve_point, self.metric))
            })
            .collect();

        let map = FalloffMap { entries };
        debug!(
            vertices = map.len(),
            active = map.active_count(),
            metric = ?self.metric,
            "falloff computed"
        );
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTRE: Vec3 = Vec3::ZERO;
    const ON_CURVE: Vec3 = Vec3::new(3.0, 0.0, 0.0);

    #[test]
    fn test_weight_is_one_at_centre() {
        assert_eq!(falloff_weight(CENTRE, CENTRE, ON_CURVE, DistanceMetric::Full3d), 1.0);
    }

    #[test]
    fn test_weight_is_zero_at_curve() {
        let w = falloff_weight(CENTRE, Vec3::new(0.0, 0.0, 3.0), ON_CURVE, DistanceMetric::Full3d);
        assert!(w.abs() < 1e-6, "got {w}");
    }

    #[test]
    fn test_weight_decreases_monotonically() {
        let mut previous = f32::INFINITY;
        for i in 0..=30 {
            let vertex = Vec3::new(i as f32 * 0.1, 0.0, 0.0);
            let w = falloff_weight(CENTRE, vertex, ON_CURVE, DistanceMetric::Full3d);
            assert!(w <= previous, "weight rose at step {i}");
            assert!((0.0..=1.0).contains(&w));
            previous = w;
        }
    }

    #[test]
    fn test_singularity_and_beyond_are_zero() {
        let at_singularity = Vec3::new(3.0 * 2.0_f32.sqrt(), 0.0, 0.0);
        let w = falloff_weight(CENTRE, at_singularity, ON_CURVE, DistanceMetric::Full3d);
        assert!(w.is_finite());
        assert_eq!(w, 0.0);

        // The raw formula would give 2 + 2/(4 - 2) = 3 here
        let far = Vec3::new(6.0, 0.0, 0.0);
        assert_eq!(falloff_weight(CENTRE, far, ON_CURVE, DistanceMetric::Full3d), 0.0);
    }

    #[test]
    fn test_just_below_singularity_is_clamped() {
        let ratio = 1.999_f32;
        let vertex = Vec3::new(3.0 * ratio.sqrt(), 0.0, 0.0);
        assert_eq!(falloff_weight(CENTRE, vertex, ON_CURVE, DistanceMetric::Full3d), 0.0);
    }

    #[test]
    fn test_collapsed_curve() {
        assert_eq!(falloff_weight(CENTRE, CENTRE, CENTRE, DistanceMetric::Full3d), 1.0);
        assert_eq!(falloff_weight(CENTRE, Vec3::X, CENTRE, DistanceMetric::Full3d), 0.0);
    }

    #[test]
    fn test_planar_metric_ignores_height() {
        let raised_centre = Vec3::new(0.0, 10.0, 0.0);
        let planar = falloff_weight(raised_centre, Vec3::ZERO, ON_CURVE, DistanceMetric::Planar);
        assert_eq!(planar, 1.0);
        let full = falloff_weight(raised_centre, Vec3::ZERO, ON_CURVE, DistanceMetric::Full3d);
        assert!(full < 1.0);
    }

    #[test]
    fn test_known_value() {
        // ratio = 0.25 -> 2 + 2 / -1.75
        let w = falloff_weight(CENTRE, Vec3::new(1.5, 0.0, 0.0), ON_CURVE, DistanceMetric::Full3d);
        assert!((w - (2.0 - 2.0 / 1.75)).abs() < 1e-6);
    }

    #[test]
    fn test_falloff_map_lookup() {
        let map = FalloffMap::from_entries(vec![(7, 0.5), (2, 1.0), (7, 0.25)]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(2), Some(1.0));
        assert_eq!(map.get(7), Some(0.25));
        assert_eq!(map.get(3), None);
        assert_eq!(map.active_count(), 2);
    }
}
