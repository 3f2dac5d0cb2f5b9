//! Curve sampling
//!
//! Turns a curve mask into a discrete point set and a centre point, and
//! forwards closest-point queries to the curve.

use glam::Vec3;

use crate::geometry::query::CurveQuery;

/// Default sample count: two samples per control point, at least one.
pub fn default_sample_count<C: CurveQuery + ?Sized>(curve: &C) -> usize {
    (curve.control_point_count() * 2).max(1)
}

/// Samples `count` points at uniform parameter steps, including both ends
/// of the domain.
///
/// `count == 1` yields only the start point; `count == 0` yields nothing.
pub fn sample<C: CurveQuery + ?Sized>(curve: &C, count: usize) -> Vec<Vec3> {
    let (start, end) = curve.domain();
    match count {
        0 => Vec::new(),
        1 => vec![curve.point_at_param(start)],
        _ => {
            let step = (end - start) / (count - 1) as f32;
            (0..count)
                .map(|i| {
                    // Pin the final sample to the exact domain end
                    let t = if i == count - 1 {
                        end
                    } else {
                        start + step * i as f32
                    };
                    curve.point_at_param(t)
                })
                .collect()
        }
    }
}

/// Arithmetic mean of `points`, or `None` when empty.
pub fn centroid(points: &[Vec3]) -> Option<Vec3> {
    if points.is_empty() {
        return None;
    }
    let sum: Vec3 = points.iter().copied().sum();
    Some(sum / points.len() as f32)
}

/// Centre of a curve mask computed from its samples.
///
/// On a closed curve the last inclusive sample repeats the first; it is left
/// out so the start point is not weighted twice.
pub fn curve_centre<C: CurveQuery + ?Sized>(curve: &C, samples: &[Vec3]) -> Vec3 {
    let points = if curve.is_closed() && samples.len() > 1 {
        &samples[..samples.len() - 1]
    } else {
        samples
    };
    centroid(points).unwrap_or_else(|| curve.point_at_param(curve.domain().0))
}

/// Nearest point on the curve to `point`.
pub fn closest_point<C: CurveQuery + ?Sized>(curve: &C, point: Vec3) -> Vec3 {
    curve.closest_point(point)
}
