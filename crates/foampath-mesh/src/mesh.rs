//! Indexed or unindexed triangle meshes with a world transform.

use foampath_math::{Aabb3, Point3, Transform};
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, Result};
use crate::triangle::Triangle;

/// A triangle mesh as handed over by the viewer.
///
/// Positions are stored flat in local space. Without an index buffer,
/// consecutive runs of three vertices form one triangle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]` (f32).
    pub vertices: Vec<f32>,
    /// Optional flat array of triangle indices.
    #[serde(default)]
    pub indices: Option<Vec<u32>>,
    /// Local to world transform.
    #[serde(default)]
    pub transform: Transform,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an indexed mesh with an identity transform.
    pub fn indexed(vertices: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices: Some(indices),
            transform: Transform::identity(),
        }
    }

    /// Create an unindexed triangle soup with an identity transform.
    pub fn soup(vertices: Vec<f32>) -> Self {
        Self {
            vertices,
            indices: None,
            transform: Transform::identity(),
        }
    }

    /// Replace the world transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Check buffer shapes and index ranges.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.len() % 3 != 0 {
            return Err(MeshError::VertexBufferLength(self.vertices.len()));
        }
        let vertex_count = self.num_vertices();
        match &self.indices {
            None => {
                if vertex_count % 3 != 0 {
                    return Err(MeshError::UnindexedVertexCount(vertex_count));
                }
            }
            Some(indices) => {
                if indices.len() % 3 != 0 {
                    return Err(MeshError::IndexBufferLength(indices.len()));
                }
                if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                    return Err(MeshError::IndexOutOfRange {
                        index,
                        vertex_count,
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Length of the (possibly implicit) index buffer.
    pub fn index_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len(),
            None => self.num_vertices(),
        }
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.index_count() / 3
    }

    /// True if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.num_triangles() == 0
    }

    /// The vertex id stored at position `slot` of the index buffer.
    pub fn index_at(&self, slot: usize) -> usize {
        match &self.indices {
            Some(indices) => indices[slot] as usize,
            None => slot,
        }
    }

    /// Local-space position of vertex `id`.
    pub fn vertex(&self, id: usize) -> Point3 {
        let i = id * 3;
        Point3::new(
            self.vertices[i] as f64,
            self.vertices[i + 1] as f64,
            self.vertices[i + 2] as f64,
        )
    }

    /// Local-space corners of triangle number `tri`.
    pub fn triangle_points(&self, tri: usize) -> [Point3; 3] {
        let base = tri * 3;
        [
            self.vertex(self.index_at(base)),
            self.vertex(self.index_at(base + 1)),
            self.vertex(self.index_at(base + 2)),
        ]
    }

    /// Local-space triangle number `tri`.
    pub fn triangle(&self, tri: usize) -> Triangle {
        let [a, b, c] = self.triangle_points(tri);
        Triangle::new(a, b, c)
    }

    /// World-space triangle number `tri`.
    pub fn world_triangle(&self, tri: usize) -> Triangle {
        let [a, b, c] = self.triangle_points(tri);
        Triangle::new(
            self.transform.apply_point(&a),
            self.transform.apply_point(&b),
            self.transform.apply_point(&c),
        )
    }

    /// Bounds of the referenced vertices in local space.
    pub fn local_bounds(&self) -> Aabb3 {
        let mut aabb = Aabb3::empty();
        for slot in 0..self.index_count() {
            aabb.include_point(&self.vertex(self.index_at(slot)));
        }
        aabb
    }

    /// Bounds of the referenced vertices in world space.
    pub fn world_bounds(&self) -> Aabb3 {
        let mut aabb = Aabb3::empty();
        for slot in 0..self.index_count() {
            aabb.include_point(&self.transform.apply_point(&self.vertex(self.index_at(slot))));
        }
        aabb
    }

    /// Copy the triangles starting at the given index-buffer offsets into a
    /// new unindexed mesh.
    ///
    /// Positions stay in local space; the result carries an identity transform.
    pub fn extract(&self, triangle_offsets: &[usize]) -> Result<TriangleMesh> {
        let index_count = self.index_count();
        let mut vertices = Vec::with_capacity(triangle_offsets.len() * 9);
        for &offset in triangle_offsets {
            if offset % 3 != 0 || offset + 3 > index_count {
                return Err(MeshError::TriangleOffset(offset));
            }
            for slot in offset..offset + 3 {
                let i = self.index_at(slot) * 3;
                vertices.extend_from_slice(&self.vertices[i..i + 3]);
            }
        }
        Ok(TriangleMesh::soup(vertices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> TriangleMesh {
        TriangleMesh::indexed(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    #[test]
    fn test_validate_ok() {
        assert!(quad().validate().is_ok());
        assert!(TriangleMesh::new().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_buffers() {
        let soup = TriangleMesh::soup(vec![0.0; 12]);
        assert_eq!(soup.validate(), Err(MeshError::UnindexedVertexCount(4)));

        let ragged = TriangleMesh::soup(vec![0.0; 10]);
        assert_eq!(ragged.validate(), Err(MeshError::VertexBufferLength(10)));

        let mut bad_len = quad();
        bad_len.indices = Some(vec![0, 1]);
        assert_eq!(bad_len.validate(), Err(MeshError::IndexBufferLength(2)));

        let mut out_of_range = quad();
        out_of_range.indices = Some(vec![0, 1, 7]);
        assert!(matches!(
            out_of_range.validate(),
            Err(MeshError::IndexOutOfRange { index: 7, .. })
        ));
    }

    #[test]
    fn test_counts() {
        let mesh = quad();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(mesh.num_triangles(), 2);
    }

    #[test]
    fn test_world_bounds_follow_transform() {
        let mesh = quad().with_transform(Transform::translation(10.0, 0.0, 5.0));
        let local = mesh.local_bounds();
        let world = mesh.world_bounds();
        assert_eq!(local.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(world.min, Point3::new(10.0, 0.0, 5.0));
        assert_eq!(world.max, Point3::new(11.0, 1.0, 5.0));
    }

    #[test]
    fn test_extract_builds_soup() {
        let sub = quad().extract(&[3]).unwrap();
        assert!(sub.indices.is_none());
        assert_eq!(sub.num_triangles(), 1);
        assert_eq!(
            sub.vertices,
            vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]
        );
        assert_eq!(quad().extract(&[1]), Err(MeshError::TriangleOffset(1)));
        assert_eq!(quad().extract(&[6]), Err(MeshError::TriangleOffset(6)));
    }
}
