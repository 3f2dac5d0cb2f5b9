//! Curve Masks
//!
//! Two [`CurveQuery`] implementations:
//!
//! - [`PolylineCurve`] - degree-1 curve through control points, open or closed
//! - [`CircleCurve`] - analytic circle in an arbitrary plane
//!
//! Both use the parameter domain `[0, 1]`. A polyline distributes the domain
//! uniformly across its segments (uniform knots), not by arc length.

use std::f32::consts::TAU;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::intersect::closest_point_on_segment;
use super::query::CurveQuery;
use super::types::LENGTH_EPSILON;
use crate::error::{LayerError, Result};

/// Number of control points reported for an analytic circle.
///
/// Matches a periodic cubic circle with eight spans, which keeps default
/// sampling density (twice the control points) comparable to a drawn curve.
const CIRCLE_CONTROL_POINTS: usize = 8;

// ============================================================================
// POLYLINE
// ============================================================================

/// A linear curve through a list of control points.
///
/// Deserializing goes through [`PolylineCurve::new`], so an empty or
/// non-finite point list is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolylineData")]
pub struct PolylineCurve {
    points: Vec<Vec3>,
    closed: bool,
}

/// Unchecked serialized form of a [`PolylineCurve`].
#[derive(Deserialize)]
struct PolylineData {
    points: Vec<Vec3>,
    closed: bool,
}

impl TryFrom<PolylineData> for PolylineCurve {
    type Error = LayerError;

    fn try_from(data: PolylineData) -> Result<Self> {
        Self::new(data.points, data.closed)
    }
}

impl PolylineCurve {
    /// Creates a polyline. At least one point is required; a single point is
    /// a valid (degenerate) curve.
    pub fn new(points: Vec<Vec3>, closed: bool) -> Result<Self> {
        if points.is_empty() {
            return Err(LayerError::InvalidCurve {
                reason: "a curve needs at least one control point".to_string(),
            });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(LayerError::InvalidCurve {
                reason: format!("control point {index} is not finite"),
            });
        }
        Ok(Self { points, closed })
    }

    /// Closed polyline through `points`.
    pub fn closed(points: Vec<Vec3>) -> Result<Self> {
        Self::new(points, true)
    }

    /// Rebuilds any curve as a uniformly parameterized polyline.
    ///
    /// Samples `count` points at evenly spaced parameters. For a closed curve
    /// the end parameter is skipped since it coincides with the start.
    pub fn rebuild<C: CurveQuery + ?Sized>(curve: &C, count: usize) -> Result<Self> {
        let count = count.max(1);
        let (start, end) = curve.domain();
        let closed = curve.is_closed();
        let divisions = if closed || count == 1 {
            count
        } else {
            count - 1
        };
        let points = (0..count)
            .map(|i| {
                let t = start + (end - start) * (i as f32 / divisions as f32);
                curve.point_at_param(t)
            })
            .collect();
        Self::new(points, closed)
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    fn segment_count(&self) -> usize {
        match (self.points.len(), self.closed) {
            (0 | 1, _) => 0,
            (n, true) => n,
            (n, false) => n - 1,
        }
    }

    fn segment(&self, index: usize) -> (Vec3, Vec3) {
        let a = self.points[index];
        let b = self.points[(index + 1) % self.points.len()];
        (a, b)
    }
}

impl CurveQuery for PolylineCurve {
    fn domain(&self) -> (f32, f32) {
        (0.0, 1.0)
    }

    fn point_at_param(&self, t: f32) -> Vec3 {
        let segments = self.segment_count();
        if segments == 0 {
            return self.points[0];
        }
        let scaled = t.clamp(0.0, 1.0) * segments as f32;
        let index = (scaled.floor() as usize).min(segments - 1);
        let local = scaled - index as f32;
        let (a, b) = self.segment(index);
        a.lerp(b, local)
    }

    fn control_point_count(&self) -> usize {
        self.points.len()
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn closest_point(&self, point: Vec3) -> Vec3 {
        let segments = self.segment_count();
        if segments == 0 {
            return self.points[0];
        }
        let mut best = self.points[0];
        let mut best_dist_sq = f32::INFINITY;
        for index in 0..segments {
            let (a, b) = self.segment(index);
            let candidate = closest_point_on_segment(point, a, b);
            let dist_sq = candidate.distance_squared(point);
            if dist_sq < best_dist_sq {
                best_dist_sq = dist_sq;
                best = candidate;
            }
        }
        best
    }
}

// ============================================================================
// CIRCLE
// ============================================================================

/// An analytic circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleCurve {
    /// Centre of the circle
    pub centre: Vec3,
    /// Radius; zero gives a degenerate single-point curve
    pub radius: f32,
    /// Normal of the circle's plane
    pub normal: Vec3,
}

impl CircleCurve {
    /// Circle lying in the horizontal (XZ) plane.
    pub fn horizontal(centre: Vec3, radius: f32) -> Self {
        Self {
            centre,
            radius,
            normal: Vec3::Y,
        }
    }

    fn basis(&self) -> (Vec3, Vec3) {
        let normal = self.normal.try_normalize().unwrap_or(Vec3::Y);
        if normal == Vec3::Y {
            // Keep the familiar +X start for horizontal circles
            (Vec3::X, Vec3::NEG_Z)
        } else {
            normal.any_orthonormal_pair()
        }
    }
}

impl CurveQuery for CircleCurve {
    fn domain(&self) -> (f32, f32) {
        (0.0, 1.0)
    }

    fn point_at_param(&self, t: f32) -> Vec3 {
        let (u, v) = self.basis();
        let angle = t.clamp(0.0, 1.0) * TAU;
        self.centre + (u * angle.cos() + v * angle.sin()) * self.radius
    }

    fn control_point_count(&self) -> usize {
        CIRCLE_CONTROL_POINTS
    }

    fn is_closed(&self) -> bool {
        true
    }

    fn closest_point(&self, point: Vec3) -> Vec3 {
        if self.radius.abs() < LENGTH_EPSILON {
            return self.centre;
        }
        let normal = self.normal.try_normalize().unwrap_or(Vec3::Y);
        let offset = point - self.centre;
        let in_plane = offset - normal * offset.dot(normal);
        match in_plane.try_normalize() {
            Some(direction) => self.centre + direction * self.radius,
            // Every point on the circle is equidistant from the axis
            None => self.point_at_param(0.0),
        }
    }
}
