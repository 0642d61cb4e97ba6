//! Footprint of the part resting on the bed.

use foampath_math::{Aabb3, Point3};
use foampath_mesh::TriangleMesh;

use crate::error::Result;

/// Default height below which triangles count as touching the bed (mm).
pub const DEFAULT_BED_THRESHOLD: f64 = 0.1;

/// Bounding rectangle of the triangles lying entirely below `z_threshold`.
///
/// Returns the four world-space corners at the lowest z, in the order
/// `(min, min)`, `(min, max)`, `(max, min)`, `(max, max)`, or nothing if no
/// triangle qualifies.
pub fn bottom_boundary(mesh: &TriangleMesh, z_threshold: f64) -> Result<Vec<Point3>> {
    mesh.validate()?;

    let mut bounds = Aabb3::empty();
    let mut count = 0;
    for tri in (0..mesh.num_triangles()).map(|t| mesh.world_triangle(t)) {
        if tri.v.iter().all(|p| p.z < z_threshold) {
            for p in &tri.v {
                bounds.include_point(p);
            }
            count += 1;
        }
    }
    if bounds.is_empty() {
        return Ok(Vec::new());
    }
    log::debug!("{count} triangles below z={z_threshold}");

    let (min, max) = (bounds.min, bounds.max);
    Ok(vec![
        Point3::new(min.x, min.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use foampath_math::Transform;

    /// A 10 x 6 slab, 2 high: bottom quad at z=0, top quad at z=2.
    fn slab() -> TriangleMesh {
        let vertices = vec![
            0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 10.0, 6.0, 0.0, 0.0, 6.0, 0.0, //
            0.0, 0.0, 2.0, 10.0, 0.0, 2.0, 10.0, 6.0, 2.0, 0.0, 6.0, 2.0,
        ];
        let indices = vec![0, 2, 1, 0, 3, 2, 4, 5, 6, 4, 6, 7];
        TriangleMesh::indexed(vertices, indices)
    }

    #[test]
    fn test_bottom_rectangle() {
        let corners = bottom_boundary(&slab(), DEFAULT_BED_THRESHOLD).unwrap();
        assert_eq!(corners.len(), 4);
        assert_eq!(corners[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(corners[3], Point3::new(10.0, 6.0, 0.0));
    }

    #[test]
    fn test_uses_world_space() {
        let mesh = slab().with_transform(Transform::translation(5.0, 0.0, 0.0));
        let corners = bottom_boundary(&mesh, DEFAULT_BED_THRESHOLD).unwrap();
        assert_relative_eq!(corners[0].x, 5.0);
        assert_relative_eq!(corners[2].x, 15.0);

        let lifted = slab().with_transform(Transform::translation(0.0, 0.0, 1.0));
        assert!(bottom_boundary(&lifted, DEFAULT_BED_THRESHOLD).unwrap().is_empty());
    }
}
