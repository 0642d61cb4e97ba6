//! A mesh paired with its lazily built spatial index.

use std::sync::OnceLock;

use foampath_math::Aabb3;

use crate::bvh::{Bvh, ShapecastVisitor};
use crate::error::Result;
use crate::ray::{Ray, RayHit, Side};
use crate::TriangleMesh;

/// A validated mesh with a BVH that is built on first use and then reused
/// read-only by every selection and sampling pass.
#[derive(Debug)]
pub struct SpatialMesh {
    mesh: TriangleMesh,
    bvh: OnceLock<Bvh>,
}

impl SpatialMesh {
    /// Validate `mesh` and wrap it. The index is not built yet.
    pub fn new(mesh: TriangleMesh) -> Result<Self> {
        mesh.validate()?;
        Ok(Self {
            mesh,
            bvh: OnceLock::new(),
        })
    }

    /// The underlying mesh.
    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    /// The spatial index over local-space triangles, built on first call.
    pub fn bvh(&self) -> &Bvh {
        self.bvh.get_or_init(|| Bvh::build(&self.mesh))
    }

    /// Whether the index has been built.
    pub fn is_indexed(&self) -> bool {
        self.bvh.get().is_some()
    }

    /// Local-space bounds.
    pub fn local_bounds(&self) -> Aabb3 {
        self.bvh().bounds()
    }

    /// Nearest hit of a local-space ray within `max_t`.
    pub fn raycast_first(&self, ray: &Ray, side: Side, max_t: f64) -> Option<RayHit> {
        self.bvh().raycast_first(ray, side, max_t)
    }

    /// Run a shapecast over local-space triangles.
    pub fn shapecast<V: ShapecastVisitor + ?Sized>(&self, visitor: &mut V) -> bool {
        self.bvh().shapecast(visitor)
    }
}

impl Clone for SpatialMesh {
    fn clone(&self) -> Self {
        let bvh = OnceLock::new();
        if let Some(built) = self.bvh.get() {
            let _ = bvh.set(built.clone());
        }
        Self {
            mesh: self.mesh.clone(),
            bvh,
        }
    }
}
