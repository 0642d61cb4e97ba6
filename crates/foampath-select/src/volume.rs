//! Selection by a placed sensing volume.
//!
//! A box or cylinder is dropped onto the mesh surface; every triangle lying
//! entirely inside it becomes part of the sensing region.

use foampath_math::{Point3, Transform, Vec3};
use foampath_mesh::{Ray, Side, SpatialMesh};
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::engine::{HighlightMask, SelectionResult};
use crate::error::{Result, SelectError};

/// Height above the mesh top from which placement rays start.
const PLACEMENT_CLEARANCE: f64 = 10.0;

/// Shape of a sensing volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VolumeShape {
    /// Cube with edge length `size`.
    #[default]
    Box,
    /// Cylinder along local z with diameter and height `size`.
    Cylinder,
}

/// A box or cylinder placed in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensingVolume {
    /// Shape.
    pub shape: VolumeShape,
    /// Edge length for a box, diameter and height for a cylinder.
    pub size: f64,
    /// Volume-local to world transform.
    pub placement: Transform,
}

impl SensingVolume {
    /// A volume centered at `center` with axes aligned to the world.
    pub fn at(shape: VolumeShape, size: f64, center: Point3) -> Self {
        Self {
            shape,
            size,
            placement: Transform::translation(center.x, center.y, center.z),
        }
    }

    /// Drop a volume onto the mesh surface below world `(x, y)`, with its
    /// local z axis along the surface normal.
    ///
    /// Falls back to the center of the mesh bounds when the ray misses.
    pub fn on_surface(
        mesh: &SpatialMesh,
        shape: VolumeShape,
        size: f64,
        x: f64,
        y: f64,
    ) -> Result<Self> {
        let world = &mesh.mesh().transform;
        let bounds = mesh.mesh().world_bounds();
        if bounds.is_empty() {
            return Ok(Self::at(shape, size, Point3::origin()));
        }

        let world_inv = world
            .inverse()
            .ok_or(SelectError::SingularTransform("world"))?;
        let origin = world_inv.apply_point(&Point3::new(x, y, bounds.max.z + PLACEMENT_CLEARANCE));
        let direction = world_inv.apply_vec(&Vec3::new(0.0, 0.0, -1.0));
        let ray = Ray::new(origin, direction);

        let Some(hit) = mesh.raycast_first(&ray, Side::Double, f64::INFINITY) else {
            return Ok(Self::at(shape, size, bounds.center()));
        };

        let point = world.apply_point(&hit.point);
        let normal = world.apply_vec(&hit.normal);
        let rotation = Rotation3::rotation_between(&Vector3::z(), &normal)
            .unwrap_or_else(|| Rotation3::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI));
        let placement = Transform::translation(point.x, point.y, point.z)
            .then(&Transform::from_matrix(rotation.to_homogeneous()));

        Ok(Self {
            shape,
            size,
            placement,
        })
    }

    /// Reject non-positive or non-finite sizes.
    pub fn validate(&self) -> Result<()> {
        if !(self.size.is_finite() && self.size > 0.0) {
            return Err(SelectError::VolumeSize(self.size));
        }
        Ok(())
    }

    /// Whether a world-space point lies inside, given the inverse placement.
    fn contains_local(&self, local: &Point3) -> bool {
        let half = self.size / 2.0;
        match self.shape {
            VolumeShape::Box => {
                local.x.abs() <= half && local.y.abs() <= half && local.z.abs() <= half
            }
            VolumeShape::Cylinder => {
                local.z.abs() <= half && (local.x * local.x + local.y * local.y).sqrt() <= half
            }
        }
    }

    /// Whether a world-space point lies inside.
    pub fn contains(&self, point: &Point3) -> Result<bool> {
        let inv = self
            .placement
            .inverse()
            .ok_or(SelectError::SingularTransform("placement"))?;
        Ok(self.contains_local(&inv.apply_point(point)))
    }
}

/// Select every triangle whose three world-space vertices lie inside `volume`.
///
/// The sub-mesh holds the triangles in mesh-local coordinates, matching
/// region selection so both can feed the sampler together.
pub fn select_in_volume(mesh: &SpatialMesh, volume: &SensingVolume) -> Result<SelectionResult> {
    volume.validate()?;
    let tri_mesh = mesh.mesh();
    let to_volume = volume
        .placement
        .inverse()
        .ok_or(SelectError::SingularTransform("placement"))?
        .then(&tri_mesh.transform);

    let triangle_indices: Vec<usize> = (0..tri_mesh.num_triangles())
        .filter(|&t| {
            tri_mesh
                .triangle_points(t)
                .iter()
                .all(|p| volume.contains_local(&to_volume.apply_point(p)))
        })
        .map(|t| t * 3)
        .collect();

    let mut indices = vec![0u32; tri_mesh.index_count()];
    let mut count = 0;
    for &offset in &triangle_indices {
        for slot in offset..offset + 3 {
            indices[count] = tri_mesh.index_at(slot) as u32;
            count += 1;
        }
    }

    let sub_mesh = tri_mesh.extract(&triangle_indices)?;
    log::debug!(
        "{:?} volume of size {} holds {} triangles",
        volume.shape,
        volume.size,
        triangle_indices.len()
    );

    Ok(SelectionResult {
        triangle_indices,
        highlight: HighlightMask { indices, count },
        sub_mesh,
        whole_model: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use foampath_mesh::TriangleMesh;

    fn plate(n: usize) -> TriangleMesh {
        let mut vertices = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                vertices.extend_from_slice(&[i as f32, j as f32, 0.0]);
            }
        }
        let stride = (n + 1) as u32;
        let mut indices = Vec::new();
        for j in 0..n as u32 {
            for i in 0..n as u32 {
                let a = j * stride + i;
                indices.extend_from_slice(&[a, a + 1, a + stride + 1, a, a + stride + 1, a + stride]);
            }
        }
        TriangleMesh::indexed(vertices, indices)
    }

    #[test]
    fn test_box_volume_selects_enclosed_triangles() {
        let mesh = SpatialMesh::new(plate(10)).unwrap();
        let volume = SensingVolume::at(VolumeShape::Box, 4.0, Point3::new(5.0, 5.0, 0.0));
        let r = select_in_volume(&mesh, &volume).unwrap();
        // x and y in [3, 7]: 4 x 4 squares
        assert_eq!(r.len(), 32);
        assert_eq!(r.highlight.count, 96);
        let b = r.sub_mesh.local_bounds();
        assert_relative_eq!(b.min.x, 3.0);
        assert_relative_eq!(b.max.y, 7.0);
    }

    #[test]
    fn test_cylinder_is_tighter_than_box() {
        let mesh = SpatialMesh::new(plate(10)).unwrap();
        let center = Point3::new(5.0, 5.0, 0.0);
        let boxed = select_in_volume(&mesh, &SensingVolume::at(VolumeShape::Box, 4.0, center)).unwrap();
        let cyl =
            select_in_volume(&mesh, &SensingVolume::at(VolumeShape::Cylinder, 4.0, center)).unwrap();
        assert!(!cyl.is_empty());
        assert!(cyl.len() < boxed.len());
        for t in &cyl.triangle_indices {
            assert!(boxed.triangle_indices.contains(t));
        }
    }

    #[test]
    fn test_volume_respects_mesh_transform() {
        let mesh = SpatialMesh::new(plate(10).with_transform(Transform::translation(100.0, 0.0, 0.0)))
            .unwrap();
        let miss = SensingVolume::at(VolumeShape::Box, 4.0, Point3::new(5.0, 5.0, 0.0));
        assert!(select_in_volume(&mesh, &miss).unwrap().is_empty());
        let hit = SensingVolume::at(VolumeShape::Box, 4.0, Point3::new(105.0, 5.0, 0.0));
        let r = select_in_volume(&mesh, &hit).unwrap();
        assert_eq!(r.len(), 32);
        // local coordinates
        assert_relative_eq!(r.sub_mesh.local_bounds().min.x, 3.0);
    }

    #[test]
    fn test_on_surface_aligns_with_normal() {
        let mesh = SpatialMesh::new(plate(10).with_transform(Transform::translation(0.0, 0.0, 3.0)))
            .unwrap();
        let v = SensingVolume::on_surface(&mesh, VolumeShape::Cylinder, 2.0, 4.5, 4.5).unwrap();
        let center = v.placement.apply_point(&Point3::origin());
        assert_relative_eq!(center.x, 4.5, epsilon = 1e-9);
        assert_relative_eq!(center.z, 3.0, epsilon = 1e-9);
        assert!(v.contains(&Point3::new(4.5, 4.5, 3.9)).unwrap());
        assert!(!v.contains(&Point3::new(4.5, 4.5, 4.1)).unwrap());
    }

    #[test]
    fn test_invalid_size() {
        let mesh = SpatialMesh::new(plate(2)).unwrap();
        let v = SensingVolume::at(VolumeShape::Box, 0.0, Point3::origin());
        assert_eq!(select_in_volume(&mesh, &v), Err(SelectError::VolumeSize(0.0)));
    }
}
