#![warn(missing_docs)]

//! Foam toolpath generation.
//!
//! This crate turns selected surface regions into layered deposition paths:
//! grid sampling of the surface, serpentine row stitching, and sandwich
//! layer assembly for sensing inlays.
//!
//! # Example
//!
//! ```ignore
//! use foampath_toolpath::{generate, ToolpathConfig};
//! use foampath_mesh::SpatialMesh;
//!
//! let foam = SpatialMesh::new(selection.sub_mesh)?;
//! let result = generate(&foam, None, &ToolpathConfig::default())?;
//!
//! println!("Samples: {}", result.samples.len());
//! println!("Strokes: {}", result.layers.len());
//! ```

pub mod base;
pub mod error;
pub mod layers;
pub mod legacy;
pub mod plan;
pub mod sample;

pub use base::{bottom_boundary, DEFAULT_BED_THRESHOLD};
pub use error::{Result, ToolpathError};
pub use layers::{assemble_layers, LayerRole, LayerSettings, Material, ToolpathLayer};
pub use legacy::{corner_zigzag, CornerPoints, LegacySettings};
pub use plan::{group_rows, plan_all, plan_paths, PlannedPaths, PlannerSettings};
pub use sample::{sample_surface, SampleClass, SamplePoint};

use foampath_mesh::SpatialMesh;
use serde::{Deserialize, Serialize};

/// Toolpath parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolpathConfig {
    /// Sampling grid spacing (mm).
    pub grid_size: f64,
    /// Row grouping and segment splitting.
    pub planner: PlannerSettings,
    /// Sandwich layer stacking.
    pub layers: LayerSettings,
}

impl Default for ToolpathConfig {
    fn default() -> Self {
        Self {
            grid_size: 4.0,
            planner: PlannerSettings::default(),
            layers: LayerSettings::default(),
        }
    }
}

impl ToolpathConfig {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(ToolpathError::InvalidSettings(
                "grid_size must be positive".into(),
            ));
        }
        self.planner.validate()?;
        self.layers.validate()
    }
}

/// Everything derived from one sampling pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolpathResult {
    /// Classified surface samples.
    pub samples: Vec<SamplePoint>,
    /// Planned paths per material subset.
    pub paths: PlannedPaths,
    /// Lifted strokes in print order.
    pub layers: Vec<ToolpathLayer>,
}

impl ToolpathResult {
    /// True if nothing was sampled.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Sample, plan and stack toolpaths for a foam region and optional sensing region.
///
/// Sampling covers the world bounds of `foam`. An empty region gives an
/// empty result.
pub fn generate(
    foam: &SpatialMesh,
    sense: Option<&SpatialMesh>,
    config: &ToolpathConfig,
) -> Result<ToolpathResult> {
    config.validate()?;

    let bounds = foam.mesh().world_bounds();
    let samples = sample_surface(foam, sense, &bounds, config.grid_size)?;
    if samples.is_empty() {
        return Ok(ToolpathResult::default());
    }

    let paths = plan_all(&samples, config.grid_size, &config.planner);
    let layers = assemble_layers(&paths, &config.layers);
    log::info!(
        "{} samples -> {} paths ({} sensing) -> {} strokes",
        samples.len(),
        paths.all.len(),
        paths.sense.len(),
        layers.len()
    );

    Ok(ToolpathResult {
        samples,
        paths,
        layers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use foampath_mesh::TriangleMesh;

    fn plate(size: f32) -> SpatialMesh {
        SpatialMesh::new(TriangleMesh::indexed(
            vec![0.0, 0.0, 0.0, size, 0.0, 0.0, size, size, 0.0, 0.0, size, 0.0],
            vec![0, 1, 2, 0, 2, 3],
        ))
        .unwrap()
    }

    #[test]
    fn test_generate_foam_only() {
        let result = generate(&plate(16.0), None, &ToolpathConfig::default()).unwrap();
        assert_eq!(result.samples.len(), 25);
        assert_eq!(result.paths.all.len(), 1);
        assert_eq!(result.layers.len(), 3);
        assert!(result.layers.iter().all(|l| l.material == Material::Regular));
    }

    #[test]
    fn test_generate_with_inlay() {
        let result = generate(&plate(16.0), Some(&plate(4.0)), &ToolpathConfig::default()).unwrap();
        assert!(result.paths.has_sense());
        assert!(result.layers.iter().any(|l| l.material == Material::Sensing));
        assert!(result
            .layers
            .iter()
            .any(|l| l.role == LayerRole::Final));
    }

    #[test]
    fn test_generate_empty_region() {
        let empty = SpatialMesh::new(TriangleMesh::new()).unwrap();
        let result = generate(&empty, None, &ToolpathConfig::default()).unwrap();
        assert!(result.is_empty());
        assert!(result.layers.is_empty());
    }

    #[test]
    fn test_invalid_config() {
        let config = ToolpathConfig {
            grid_size: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(generate(&plate(4.0), None, &config).is_err());
    }
}
