//! Region finding
//!
//! Flood-fills the face adjacency graph of the terrain from a seed face,
//! keeping faces whose centroid lies inside the curve mask's footprint.
//!
//! # Inside Test
//!
//! For a face with centroid `F`, curve centre `C` and nearest curve point `P`:
//!
//! ```text
//! centre_to_face  = (F - C) * curve_offset
//! centre_to_curve = P - C
//! inside  <=>  dot(centre_to_face, normalize(centre_to_curve)) < |centre_to_curve|
//! ```
//!
//! The test is directional: a face is compared against the curve's radius in
//! its own direction, so elongated masks are respected. `curve_offset > 1`
//! pulls the region boundary just inside the curve.
//!
//! # Growth
//!
//! Each face is visited at most once (tracked by a visited flag per face).
//! With [`RegionGrowth::InsideOnly`] the fill only continues through faces
//! that pass the test, which can stop short at narrow concave necks of the
//! mask. [`RegionGrowth::Exhaustive`] keeps walking through outside faces and
//! finds every inside face of the connected component, at the cost of
//! visiting it whole.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::geometry::query::{CurveQuery, MeshQuery};
use crate::geometry::types::LENGTH_EPSILON;

/// How the flood fill treats faces that fail the inside test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionGrowth {
    /// Stop at outside faces
    #[default]
    InsideOnly,
    /// Continue through outside faces, bounded by the visited set
    Exhaustive,
}

/// Outcome of the inside test for one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceClass {
    Inside,
    Outside,
    /// The nearest curve point coincides with the curve centre, so there is
    /// no direction to test along. Counted as inside, never expanded from.
    Collapsed,
}

/// Directional inside test for a single face centroid.
pub fn classify_face(
    face_centre: Vec3,
    closest_on_curve: Vec3,
    curve_centre: Vec3,
    curve_offset: f32,
) -> FaceClass {
    let centre_to_face = (face_centre - curve_centre) * curve_offset;
    let centre_to_curve = closest_on_curve - curve_centre;
    let radius = centre_to_curve.length();
    if radius < LENGTH_EPSILON {
        return FaceClass::Collapsed;
    }
    if centre_to_face.dot(centre_to_curve / radius) < radius {
        FaceClass::Inside
    } else {
        FaceClass::Outside
    }
}

/// Terrain vertices inside a curve footprint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    /// Sorted, unique vertex indices
    vertices: Vec<u32>,
    /// Faces that passed the inside test, in visiting order
    inside_faces: Vec<u32>,
    /// Number of faces popped from the frontier
    visited_faces: usize,
}

impl Region {
    pub fn vertices(&self) -> &[u32] {
        &self.vertices
    }

    pub fn inside_faces(&self) -> &[u32] {
        &self.inside_faces
    }

    pub fn visited_faces(&self) -> usize {
        self.visited_faces
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn contains(&self, vertex: u32) -> bool {
        self.vertices.binary_search(&vertex).is_ok()
    }
}

/// Flood-fill region finder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionFinder {
    /// Scale applied to the centre-to-face vector before the inside test
    pub curve_offset: f32,
    pub growth: RegionGrowth,
}

impl RegionFinder {
    pub fn new(curve_offset: f32) -> Self {
        Self {
            curve_offset,
            growth: RegionGrowth::default(),
        }
    }

    pub fn with_growth(mut self, growth: RegionGrowth) -> Self {
        self.growth = growth;
        self
    }

    /// Collects the vertices of every face reachable from `seed_face` that
    /// lies inside the curve footprint.
    ///
    /// # Arguments
    ///
    /// * `terrain` - Mesh to search
    /// * `curve` - Curve mask
    /// * `curve_centre` - Centre of the mask (see `sampler::curve_centre`)
    /// * `seed_face` - Starting face, normally the face closest to the centre
    ///
    /// An out-of-range seed yields an empty region.
    pub fn find_region<M, C>(
        &self,
        terrain: &M,
        curve: &C,
        curve_centre: Vec3,
        seed_face: usize,
    ) -> Region
    where
        M: MeshQuery + ?Sized,
        C: CurveQuery + ?Sized,
    {
        let face_count = terrain.face_count();
        if seed_face >= face_count {
            warn!(seed_face, face_count, "seed face out of range, region is empty");
            return Region::default();
        }

        let vertex_count = terrain.vertex_count();
        let mut visited = vec![false; face_count];
        let mut in_region = vec![false; vertex_count];
        let mut frontier = vec![seed_face as u32];
        visited[seed_face] = true;

        let mut region = Region::default();

        while let Some(face) = frontier.pop() {
            let face = face as usize;
            region.visited_faces += 1;

            let face_centre = terrain.face_centroid(face);
            let on_curve = curve.closest_point(face_centre);
            let class = classify_face(face_centre, on_curve, curve_centre, self.curve_offset);
            trace!(face, ?class, "classified face");

            let expand = match class {
                FaceClass::Inside => true,
                FaceClass::Collapsed => false,
                FaceClass::Outside => self.growth == RegionGrowth::Exhaustive,
            };

            if class != FaceClass::Outside {
                region.inside_faces.push(face as u32);
                for &vertex in terrain.face_vertices(face) {
                    let index = vertex as usize;
                    if index < vertex_count && !in_region[index] {
                        in_region[index] = true;
                        region.vertices.push(vertex);
                    }
                }
            }

            if expand {
                for &neighbour in terrain.connected_faces(face) {
                    let n = neighbour as usize;
                    if n < face_count && !visited[n] {
                        visited[n] = true;
                        frontier.push(neighbour);
                    }
                }
            }
        }

        region.vertices.sort_unstable();
        debug!(
            seed_face,
            visited = region.visited_faces,
            inside = region.inside_faces.len(),
            vertices = region.vertices.len(),
            "region grown"
        );
        region
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::curve::{CircleCurve, PolylineCurve};
    use crate::geometry::mesh::PolyMesh;

    fn terrain() -> PolyMesh {
        PolyMesh::grid(10, 10, 1.0, Vec3::ZERO)
    }

    fn seed(mesh: &PolyMesh, centre: Vec3) -> usize {
        mesh.closest_point(centre).unwrap().face
    }

    #[test]
    fn test_classify_face() {
        let centre = Vec3::ZERO;
        let on_curve = Vec3::new(2.0, 0.0, 0.0);
        assert_eq!(classify_face(Vec3::new(1.0, 0.0, 0.0), on_curve, centre, 1.0), FaceClass::Inside);
        assert_eq!(classify_face(Vec3::new(3.0, 0.0, 0.0), on_curve, centre, 1.0), FaceClass::Outside);
        // Offset pushes a face near the boundary outside
        assert_eq!(classify_face(Vec3::new(1.9, 0.0, 0.0), on_curve, centre, 1.1), FaceClass::Outside);
        assert_eq!(classify_face(Vec3::ONE, centre, centre, 1.0), FaceClass::Collapsed);
    }

    #[test]
    fn test_circle_region_within_radius() {
        let mesh = terrain();
        let centre = Vec3::new(5.0, 0.0, 5.0);
        let circle = CircleCurve::horizontal(centre, 3.0);
        let finder = RegionFinder::new(1.0);
        let region = finder.find_region(&mesh, &circle, centre, seed(&mesh, centre));

        assert!(!region.is_empty());
        for &face in region.inside_faces() {
            assert!(mesh.face_centroid(face as usize).distance(centre) < 3.0);
        }
        // Every face with a centroid well inside the circle is found
        for face in 0..mesh.face_count() {
            if mesh.face_centroid(face).distance(centre) < 2.5 {
                assert!(region.inside_faces().contains(&(face as u32)), "face {face} missing");
            }
        }
        // Corners are far outside
        assert!(!region.contains(0));
        assert!(!region.contains(120));
    }

    #[test]
    fn test_vertices_sorted_and_unique() {
        let mesh = terrain();
        let centre = Vec3::new(5.0, 0.0, 5.0);
        let circle = CircleCurve::horizontal(centre, 4.0);
        let region = RegionFinder::new(1.1).find_region(&mesh, &circle, centre, seed(&mesh, centre));
        assert!(region.vertices().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_visits_each_face_at_most_once() {
        let mesh = terrain();
        let centre = Vec3::new(5.0, 0.0, 5.0);
        let huge = CircleCurve::horizontal(centre, 100.0);
        let region = RegionFinder::new(1.0).find_region(&mesh, &huge, centre, seed(&mesh, centre));
        assert_eq!(region.visited_faces(), mesh.face_count());
        assert_eq!(region.inside_faces().len(), mesh.face_count());
        assert_eq!(region.len(), mesh.vertex_count());
    }

    #[test]
    fn test_degenerate_curve_yields_seed_face_only() {
        let mesh = terrain();
        let point = Vec3::new(4.5, 0.0, 4.5);
        let curve = PolylineCurve::closed(vec![point]).unwrap();
        let seed_face = seed(&mesh, point);
        let region = RegionFinder::new(1.1).find_region(&mesh, &curve, point, seed_face);
        assert_eq!(region.visited_faces(), 1);
        assert_eq!(region.inside_faces(), &[seed_face as u32]);
        assert_eq!(region.len(), 4);
    }

    #[test]
    fn test_out_of_range_seed_is_empty() {
        let mesh = terrain();
        let circle = CircleCurve::horizontal(Vec3::ZERO, 1.0);
        let region = RegionFinder::new(1.0).find_region(&mesh, &circle, Vec3::ZERO, 999);
        assert!(region.is_empty());
        assert_eq!(region.visited_faces(), 0);
    }

    #[test]
    fn test_larger_offset_shrinks_region() {
        let mesh = terrain();
        let centre = Vec3::new(5.0, 0.0, 5.0);
        let circle = CircleCurve::horizontal(centre, 3.5);
        let seed_face = seed(&mesh, centre);
        let tight = RegionFinder::new(1.5).find_region(&mesh, &circle, centre, seed_face);
        let loose = RegionFinder::new(1.0).find_region(&mesh, &circle, centre, seed_face);
        assert!(tight.len() < loose.len());
        assert!(tight.vertices().iter().all(|&v| loose.contains(v)));
    }

    /// Two squares joined by a corridor too narrow to hold a face centroid.
    fn dumbbell() -> PolylineCurve {
        PolylineCurve::closed(vec![
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(5.0, 0.0, 1.0),
            Vec3::new(5.0, 0.0, 2.8),
            Vec3::new(9.0, 0.0, 2.8),
            Vec3::new(9.0, 0.0, 1.0),
            Vec3::new(13.0, 0.0, 1.0),
            Vec3::new(13.0, 0.0, 5.0),
            Vec3::new(9.0, 0.0, 5.0),
            Vec3::new(9.0, 0.0, 3.2),
            Vec3::new(5.0, 0.0, 3.2),
            Vec3::new(5.0, 0.0, 5.0),
            Vec3::new(1.0, 0.0, 5.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_inside_only_stops_at_neck() {
        let mesh = PolyMesh::grid(14, 14, 1.0, Vec3::ZERO);
        let centre = Vec3::new(3.0, 0.0, 3.0);
        let region = RegionFinder::new(1.0).find_region(&mesh, &dumbbell(), centre, seed(&mesh, centre));

        // Exactly the 4x4 cells of the left square
        let mut faces = region.inside_faces().to_vec();
        faces.sort_unstable();
        let left: Vec<u32> = (1..5).flat_map(|j| (1..5).map(move |i| j * 14 + i)).collect();
        assert_eq!(faces, left);
        assert_eq!(region.len(), 25);
    }

    #[test]
    fn test_exhaustive_growth_crosses_neck() {
        let mesh = PolyMesh::grid(14, 14, 1.0, Vec3::ZERO);
        let curve = dumbbell();
        let centre = Vec3::new(3.0, 0.0, 3.0);
        let seed_face = seed(&mesh, centre);

        let inside_only = RegionFinder::new(1.0).find_region(&mesh, &curve, centre, seed_face);
        let exhaustive = RegionFinder::new(1.0)
            .with_growth(RegionGrowth::Exhaustive)
            .find_region(&mesh, &curve, centre, seed_face);

        assert!(!inside_only.is_empty());
        assert!(exhaustive.len() > inside_only.len());
        assert!(inside_only.vertices().iter().all(|&v| exhaustive.contains(v)));
        assert_eq!(exhaustive.visited_faces(), mesh.face_count());

        // Cells (10, 3) and (11, 3) sit in the right square, past the corridor
        for face in [3 * 14 + 10, 3 * 14 + 11] {
            assert!(exhaustive.inside_faces().contains(&face));
            assert!(!inside_only.inside_faces().contains(&face));
        }
    }
}
