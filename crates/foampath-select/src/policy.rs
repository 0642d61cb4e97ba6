//! Face-inclusion policies.

use serde::{Deserialize, Serialize};

/// How a triangle is judged inside a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    /// The projected centroid lies inside the region.
    #[default]
    Centroid,
    /// As `Centroid`, and nothing occludes the centroid from the camera.
    CentroidVisible,
    /// Any projected vertex lies inside, or any projected edge crosses the region.
    Intersection,
}

/// A selection mode plus the whole-model flag, applied to one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPolicy {
    /// Face test.
    pub mode: SelectionMode,
    /// Once any face matches, select every face of the mesh.
    pub whole_model: bool,
}

impl SelectionPolicy {
    /// A policy selecting individual faces with `mode`.
    pub fn faces(mode: SelectionMode) -> Self {
        Self {
            mode,
            whole_model: false,
        }
    }
}
