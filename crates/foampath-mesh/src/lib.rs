#![warn(missing_docs)]

//! Triangle meshes and spatial queries for the foampath pipeline.
//!
//! A [`TriangleMesh`] holds flat vertex positions, an optional index buffer
//! and a world transform. [`SpatialMesh`] pairs it with a lazily built SAH
//! [`Bvh`] that answers closest-hit raycasts and drives
//! [`ShapecastVisitor`]s for region selection.
//!
//! # Example
//!
//! ```ignore
//! use foampath_mesh::{Ray, Side, SpatialMesh, TriangleMesh};
//!
//! let mesh = SpatialMesh::new(TriangleMesh::indexed(vertices, indices))?;
//! let hit = mesh.raycast_first(&Ray::downward(origin), Side::Double, f64::INFINITY);
//! ```

pub mod bvh;
pub mod error;
pub mod mesh;
pub mod ray;
pub mod spatial;
pub mod triangle;

pub use bvh::{BoundsVerdict, Bvh, BvhNode, ShapecastVisitor};
pub use error::{MeshError, Result};
pub use mesh::TriangleMesh;
pub use ray::{Ray, RayHit, Side};
pub use spatial::SpatialMesh;
pub use triangle::Triangle;
