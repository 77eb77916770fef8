//! Mesh representation for 3D models
//!
//! Meshes are plain CPU-side vertex and index lists. Backends upload them once
//! and refer to the uploaded copy by [`MeshHandle`].

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use crate::assets::{Asset, AssetError, AssetHandle, ObjLoader};
use crate::foundation::math::{Aabb, Vec3};

/// Handle to a mesh in the asset manager
pub type MeshHandle = AssetHandle<Mesh>;

/// Vertex with position, normal and texture coordinates
///
/// `#[repr(C)]` keeps the layout identical to the vertex buffer layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// Mesh consistency errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// No vertices or no indices
    #[error("Mesh is empty")]
    Empty,

    /// Index count is not a multiple of three
    #[error("Index count {0} is not a multiple of 3")]
    IncompleteTriangle(usize),

    /// An index points past the vertex list
    #[error("Index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Offending index
        index: u32,
        /// Number of vertices
        vertex_count: usize,
    },
}

/// Triangle mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Vertex data
    pub vertices: Vec<Vertex>,

    /// Triangle list indices
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new mesh
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Check that the mesh is a well-formed triangle list
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return Err(MeshError::Empty);
        }
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::IncompleteTriangle(self.indices.len()));
        }
        let vertex_count = self.vertices.len();
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::IndexOutOfRange { index, vertex_count });
        }
        Ok(())
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Model-space bounding box of every vertex
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| Vec3::from(v.position)))
    }

    /// Replace every normal with the area-weighted average of its face normals
    pub fn recompute_normals(&mut self) {
        let mut accumulated = vec![Vec3::zeros(); self.vertices.len()];
        for triangle in self.indices.chunks_exact(3) {
            let corners = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
            if corners.iter().any(|&c| c >= self.vertices.len()) {
                continue;
            }
            let [a, b, c] = corners.map(|i| Vec3::from(self.vertices[i].position));
            let face = (b - a).cross(&(c - a));
            for corner in corners {
                accumulated[corner] += face;
            }
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(accumulated) {
            vertex.normal = normal.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y).into();
        }
    }

    /// Unit cube centered at the origin (side length 2), one quad per face
    pub fn cube() -> Self {
        // (normal, tangent u, tangent v) per face; u × v = normal
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let (n, u, v) = (Vec3::from(normal), Vec3::from(u), Vec3::from(v));
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = n + u * su + v * sv;
                vertices.push(Vertex::new(
                    position.into(),
                    normal,
                    [(su + 1.0) * 0.5, (sv + 1.0) * 0.5],
                ));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self::new(vertices, indices)
    }

    /// Flat square in the XZ plane facing +Y
    pub fn plane(size: f32) -> Self {
        let h = size * 0.5;
        let up = [0.0, 1.0, 0.0];
        let vertices = vec![
            Vertex::new([-h, 0.0, h], up, [0.0, 0.0]),
            Vertex::new([h, 0.0, h], up, [1.0, 0.0]),
            Vertex::new([h, 0.0, -h], up, [1.0, 1.0]),
            Vertex::new([-h, 0.0, -h], up, [0.0, 1.0]),
        ];
        Self::new(vertices, vec![0, 1, 2, 2, 3, 0])
    }

    /// UV sphere centered at the origin
    ///
    /// `segments` (longitude) is clamped to at least 3 and `rings`
    /// (latitude) to at least 2.
    pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);

        let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let theta = v * std::f32::consts::PI;
            for segment in 0..=segments {
                let u = segment as f32 / segments as f32;
                let phi = u * std::f32::consts::TAU;
                let normal = Vec3::new(theta.sin() * phi.cos(), theta.cos(), -theta.sin() * phi.sin());
                vertices.push(Vertex::new((normal * radius).into(), normal.into(), [u, v]));
            }
        }

        let stride = segments + 1;
        let mut indices = Vec::with_capacity((segments * rings * 6) as usize);
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * stride + segment;
                let b = a + stride;
                // Pole rows collapse to a point; skip their degenerate halves
                if ring != 0 {
                    indices.extend_from_slice(&[a, b, a + 1]);
                }
                if ring != rings - 1 {
                    indices.extend_from_slice(&[a + 1, b, b + 1]);
                }
            }
        }

        Self::new(vertices, indices)
    }
}

impl Asset for Mesh {
    fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let text = std::str::from_utf8(bytes).map_err(|e| AssetError::InvalidData(e.to_string()))?;
        let mesh = ObjLoader::parse(text)?.mesh;
        mesh.validate().map_err(|e| AssetError::InvalidData(e.to_string()))?;
        Ok(mesh)
    }

    fn extensions() -> &'static [&'static str] {
        &["obj"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        let vertex = Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5, 0.5]);
        let bytes: &[u8] = bytemuck::bytes_of(&vertex);
        assert_eq!(bytes.len(), 32);
    }

    #[test]
    fn test_primitives_are_valid() {
        for mesh in [Mesh::cube(), Mesh::plane(4.0), Mesh::uv_sphere(1.0, 16, 8)] {
            assert_eq!(mesh.validate(), Ok(()));
        }
        assert_eq!(Mesh::cube().triangle_count(), 12);
    }

    #[test]
    fn test_cube_winding_matches_normals() {
        let cube = Mesh::cube();
        for triangle in cube.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| Vec3::from(cube.vertices[i as usize].position));
            let face = (b - a).cross(&(c - a)).normalize();
            let normal = Vec3::from(cube.vertices[triangle[0] as usize].normal);
            assert_relative_eq!(face, normal, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_bounds() {
        let bounds = Mesh::uv_sphere(2.0, 12, 6).bounds();
        assert_relative_eq!(bounds.max, Vec3::new(2.0, 2.0, 2.0), epsilon = 1e-5);
        assert_relative_eq!(bounds.min, Vec3::new(-2.0, -2.0, -2.0), epsilon = 1e-5);
        assert!(Mesh::new(Vec::new(), Vec::new()).bounds().is_empty());
    }

    #[test]
    fn test_validate_reports_problems() {
        let vertices = Mesh::plane(1.0).vertices;
        assert_eq!(Mesh::new(vertices.clone(), vec![0, 1]).validate(), Err(MeshError::IncompleteTriangle(2)));
        assert_eq!(
            Mesh::new(vertices, vec![0, 1, 9]).validate(),
            Err(MeshError::IndexOutOfRange { index: 9, vertex_count: 4 })
        );
        assert_eq!(Mesh::new(Vec::new(), Vec::new()).validate(), Err(MeshError::Empty));
    }

    #[test]
    fn test_recompute_normals() {
        let mut plane = Mesh::plane(2.0);
        for vertex in &mut plane.vertices {
            vertex.normal = [1.0, 0.0, 0.0];
        }
        plane.recompute_normals();
        for vertex in &plane.vertices {
            assert_relative_eq!(Vec3::from(vertex.normal), Vec3::y(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_mesh_asset_from_obj_bytes() {
        let mesh = <Mesh as Asset>::from_bytes(b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert!(<Mesh as Asset>::from_bytes(b"v 0 0 0\n").is_err());
    }
}
