//! Indexed Polygon Mesh
//!
//! [`PolyMesh`] is the in-crate implementation of [`MeshQuery`]. Topology is
//! fixed at construction: face vertex lists are validated, edge-based face
//! adjacency is derived once, and vertex normals are area-weighted averages
//! of the incident face normals (Newell's method, so non-planar quads are
//! handled).
//!
//! Deformation never re-topologizes a mesh. [`PolyMesh::with_positions`]
//! produces a copy that shares the original face layout and adjacency.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;

use super::intersect::closest_point_on_triangle;
use super::query::{MeshQuery, SurfacePoint};
use crate::error::{LayerError, Result};

/// Face layout shared between a mesh and its deformed copies.
#[derive(Debug, Clone, PartialEq)]
struct Topology {
    /// Start of each face in `face_indices`; `faces + 1` entries
    face_offsets: Vec<u32>,
    /// Concatenated vertex indices of every face
    face_indices: Vec<u32>,
    /// Edge-adjacent faces, one list per face
    adjacency: Vec<Vec<u32>>,
}

/// An indexed polygon mesh with derived normals and face adjacency.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyMesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    topology: Arc<Topology>,
}

impl PolyMesh {
    /// Builds a mesh from positions and per-face vertex lists.
    ///
    /// # Errors
    ///
    /// [`LayerError::InvalidMesh`] if a face has fewer than three vertices,
    /// references a vertex out of range, or a position is not finite.
    pub fn new(positions: Vec<Vec3>, faces: Vec<Vec<u32>>) -> Result<Self> {
        if let Some(index) = positions.iter().position(|p| !p.is_finite()) {
            return Err(LayerError::invalid_mesh(format!(
                "vertex {index} has a non-finite position"
            )));
        }

        let mut face_offsets = Vec::with_capacity(faces.len() + 1);
        let mut face_indices = Vec::new();
        face_offsets.push(0);
        for (face, vertices) in faces.iter().enumerate() {
            if vertices.len() < 3 {
                return Err(LayerError::invalid_mesh(format!(
                    "face {face} has {} vertices, need at least 3",
                    vertices.len()
                )));
            }
            if let Some(&bad) = vertices.iter().find(|&&v| v as usize >= positions.len()) {
                return Err(LayerError::invalid_mesh(format!(
                    "face {face} references vertex {bad} but the mesh has {} vertices",
                    positions.len()
                )));
            }
            face_indices.extend_from_slice(vertices);
            face_offsets.push(face_indices.len() as u32);
        }

        let adjacency = build_adjacency(&face_offsets, &face_indices);
        let topology = Arc::new(Topology {
            face_offsets,
            face_indices,
            adjacency,
        });
        let normals = compute_vertex_normals(&positions, &topology);

        Ok(Self {
            positions,
            normals,
            topology,
        })
    }

    /// Builds a triangle mesh from a flat index buffer (three indices per face).
    pub fn from_triangles(positions: Vec<Vec3>, indices: &[u32]) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(LayerError::invalid_mesh(format!(
                "triangle index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        let faces = indices.chunks_exact(3).map(|tri| tri.to_vec()).collect();
        Self::new(positions, faces)
    }

    /// Flat quad grid in the XZ plane with +Y normals.
    ///
    /// # Arguments
    ///
    /// * `cells_x`, `cells_z` - Number of quads along each axis
    /// * `cell_size` - Edge length of each quad
    /// * `origin` - Position of vertex 0 (the min-X, min-Z corner)
    ///
    /// Vertices are laid out row by row along X: vertex `(i, j)` has index
    /// `j * (cells_x + 1) + i`.
    pub fn grid(cells_x: usize, cells_z: usize, cell_size: f32, origin: Vec3) -> Self {
        let row = cells_x + 1;
        let mut positions = Vec::with_capacity(row * (cells_z + 1));
        for j in 0..=cells_z {
            for i in 0..=cells_x {
                positions.push(origin + Vec3::new(i as f32 * cell_size, 0.0, j as f32 * cell_size));
            }
        }

        let mut faces = Vec::with_capacity(cells_x * cells_z);
        for j in 0..cells_z {
            for i in 0..cells_x {
                let v00 = (j * row + i) as u32;
                let v10 = v00 + 1;
                let v01 = v00 + row as u32;
                let v11 = v01 + 1;
                // Counter-clockwise seen from +Y
                faces.push(vec![v00, v01, v11, v10]);
            }
        }

        let face_offsets: Vec<u32> = (0..=faces.len() as u32).map(|f| f * 4).collect();
        let face_indices: Vec<u32> = faces.into_iter().flatten().collect();
        let adjacency = build_adjacency(&face_offsets, &face_indices);
        let topology = Arc::new(Topology {
            face_offsets,
            face_indices,
            adjacency,
        });
        let normals = compute_vertex_normals(&positions, &topology);

        Self {
            positions,
            normals,
            topology,
        }
    }

    /// Copy of this mesh with new vertex positions and the same topology.
    ///
    /// # Errors
    ///
    /// [`LayerError::TopologyMismatch`] if the position count differs.
    pub fn with_positions(&self, positions: Vec<Vec3>) -> Result<Self> {
        if positions.len() != self.positions.len() {
            return Err(LayerError::TopologyMismatch {
                expected: self.positions.len(),
                actual: positions.len(),
            });
        }
        let normals = compute_vertex_normals(&positions, &self.topology);
        Ok(Self {
            positions,
            normals,
            topology: Arc::clone(&self.topology),
        })
    }

    /// Copy of this mesh with every vertex moved by `offset`.
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            positions: self.positions.iter().map(|&p| p + offset).collect(),
            normals: self.normals.clone(),
            topology: Arc::clone(&self.topology),
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Positions as a flat `[x0, y0, z0, x1, ...]` buffer for host write-back.
    pub fn positions_as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Iterates the fan triangulation of every face as `(face, [a, b, c])`.
    pub fn triangles(&self) -> impl Iterator<Item = (usize, [Vec3; 3])> + '_ {
        fan_triangles(self)
    }
}

impl MeshQuery for PolyMesh {
    fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn vertex_position(&self, vertex: usize) -> Vec3 {
        self.positions[vertex]
    }

    fn vertex_normal(&self, vertex: usize) -> Vec3 {
        self.normals[vertex]
    }

    fn face_count(&self) -> usize {
        self.topology.face_offsets.len() - 1
    }

    fn face_vertices(&self, face: usize) -> &[u32] {
        let start = self.topology.face_offsets[face] as usize;
        let end = self.topology.face_offsets[face + 1] as usize;
        &self.topology.face_indices[start..end]
    }

    fn connected_faces(&self, face: usize) -> &[u32] {
        &self.topology.adjacency[face]
    }

    fn closest_point(&self, point: Vec3) -> Option<SurfacePoint> {
        let mut best: Option<(f32, SurfacePoint)> = None;
        for (face, tri) in self.triangles() {
            let candidate = closest_point_on_triangle(point, tri);
            let dist_sq = candidate.distance_squared(point);
            if best.is_none_or(|(d, _)| dist_sq < d) {
                best = Some((
                    dist_sq,
                    SurfacePoint {
                        position: candidate,
                        face,
                    },
                ));
            }
        }
        best.map(|(_, hit)| hit)
    }
}

/// Fan triangulation of any [`MeshQuery`] implementor.
///
/// Face `f` with vertices `[v0, v1, ..., vn]` yields `(v0, v1, v2)`,
/// `(v0, v2, v3)`, ... each tagged with `f`.
pub fn fan_triangles<M: MeshQuery + ?Sized>(
    mesh: &M,
) -> impl Iterator<Item = (usize, [Vec3; 3])> + '_ {
    (0..mesh.face_count()).flat_map(move |face| {
        let vertices = mesh.face_vertices(face);
        let anchor = mesh.vertex_position(vertices[0] as usize);
        vertices.windows(2).skip(1).map(move |pair| {
            (
                face,
                [
                    anchor,
                    mesh.vertex_position(pair[0] as usize),
                    mesh.vertex_position(pair[1] as usize),
                ],
            )
        })
    })
}

/// Faces are adjacent when they share an edge.
fn build_adjacency(face_offsets: &[u32], face_indices: &[u32]) -> Vec<Vec<u32>> {
    let face_count = face_offsets.len() - 1;
    let mut edge_faces: HashMap<(u32, u32), Vec<u32>> = HashMap::new();

    for face in 0..face_count {
        let vertices = &face_indices[face_offsets[face] as usize..face_offsets[face + 1] as usize];
        for (i, &a) in vertices.iter().enumerate() {
            let b = vertices[(i + 1) % vertices.len()];
            let key = if a < b { (a, b) } else { (b, a) };
            edge_faces.entry(key).or_default().push(face as u32);
        }
    }

    let mut adjacency = vec![Vec::new(); face_count];
    for faces in edge_faces.values() {
        for &f in faces {
            for &g in faces {
                if f != g {
                    adjacency[f as usize].push(g);
                }
            }
        }
    }
    for neighbours in &mut adjacency {
        neighbours.sort_unstable();
        neighbours.dedup();
    }
    adjacency
}

fn compute_vertex_normals(positions: &[Vec3], topology: &Topology) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    let face_count = topology.face_offsets.len() - 1;

    for face in 0..face_count {
        let start = topology.face_offsets[face] as usize;
        let end = topology.face_offsets[face + 1] as usize;
        let vertices = &topology.face_indices[start..end];

        // Newell's method: length is twice the polygon area
        let mut face_normal = Vec3::ZERO;
        for (i, &a) in vertices.iter().enumerate() {
            let b = vertices[(i + 1) % vertices.len()];
            let current = positions[a as usize];
            let next = positions[b as usize];
            face_normal += current.cross(next);
        }
        for &v in vertices {
            normals[v as usize] += face_normal;
        }
    }

    normals.iter().map(|n| n.normalize_or_zero()).collect()
}
