#![warn(missing_docs)]

//! Triangle selection for the foampath pipeline.
//!
//! Turns a closed screen-space region and a camera into a set of selected
//! mesh triangles, using the mesh's BVH to prune or accept whole subtrees
//! before testing individual faces. A placed [`SensingVolume`] offers a
//! second way to mark the sensing region.
//!
//! # Example
//!
//! ```ignore
//! use foampath_select::{select, Camera, SelectionPolicy, SelectionRegion};
//!
//! let region = SelectionRegion::rectangle(start, end);
//! let result = select(&mesh, &camera, &region, SelectionPolicy::default())?;
//! println!("{} triangles selected", result.len());
//! ```

pub mod camera;
pub mod engine;
pub mod error;
pub mod policy;
pub mod region;
pub mod volume;

pub use camera::Camera;
pub use engine::{select, HighlightMask, SelectionResult};
pub use error::{Result, SelectError};
pub use policy::{SelectionMode, SelectionPolicy};
pub use region::{RegionBuilder, RegionTool, SelectionRegion};
pub use volume::{select_in_volume, SensingVolume, VolumeShape};
