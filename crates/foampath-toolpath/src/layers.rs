//! Sandwich layer assembly.
//!
//! Initial foam layers, middle layers carrying the sensing inlay next to
//! its foam surround, then final foam layers, each lifted by a fixed step.

use foampath_math::{Point3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolpathError};
use crate::plan::PlannedPaths;
use crate::sample::SamplePoint;

/// Layer stacking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerSettings {
    /// Lift of the first layer above the sampled surface (mm).
    pub z_offset: f64,
    /// Thickness of one foam layer (mm).
    pub delta_z: f64,
    /// Foam layers below the sensing inlay.
    pub initial_layers: u32,
    /// Layers carrying the sensing inlay.
    pub middle_layers: u32,
    /// Foam layers above the sensing inlay.
    pub final_layers: u32,
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            z_offset: 12.0,
            delta_z: 5.0,
            initial_layers: 3,
            middle_layers: 1,
            final_layers: 3,
        }
    }
}

impl LayerSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.z_offset.is_finite() {
            return Err(ToolpathError::InvalidSettings(
                "z_offset must be finite".into(),
            ));
        }
        if !(self.delta_z.is_finite() && self.delta_z >= 0.0) {
            return Err(ToolpathError::InvalidSettings(
                "delta_z must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Z lift of layer `level` (0-based).
    pub fn lift(&self, level: usize) -> f64 {
        self.z_offset + level as f64 * self.delta_z
    }
}

/// Material deposited by a layer stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Material {
    /// Regular foam.
    Regular,
    /// Sensing (conductive) foam.
    Sensing,
}

/// Position of a layer in the sandwich.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerRole {
    /// Below the inlay.
    Initial,
    /// Level with the inlay.
    Middle,
    /// Above the inlay.
    Final,
}

/// One continuous deposition stroke at a fixed lift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolpathLayer {
    /// Ordered stroke points, already lifted.
    pub points: Vec<Point3>,
    /// Material of the stroke.
    pub material: Material,
    /// Sandwich role.
    pub role: LayerRole,
    /// 0-based layer level; strokes sharing a level share a z lift.
    pub level: usize,
}

impl ToolpathLayer {
    /// Stroke length (mm).
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }
}

fn lifted(paths: &[Vec<SamplePoint>], lift: f64) -> impl Iterator<Item = Vec<Point3>> + '_ {
    let up = Vec3::new(0.0, 0.0, lift);
    paths
        .iter()
        .filter(|p| !p.is_empty())
        .map(move |p| p.iter().map(|s| s.position + up).collect())
}

/// Stack planned paths into sandwich layers.
///
/// With sensing paths present: initial and final levels trace the `all`
/// set in regular foam, and each middle level traces the `sense` set in
/// sensing foam followed by the `foam` set in regular foam at the same z.
/// Without sensing paths only the initial levels are emitted, tracing the
/// `foam` set.
pub fn assemble_layers(paths: &PlannedPaths, settings: &LayerSettings) -> Vec<ToolpathLayer> {
    let mut layers = Vec::new();
    let mut level = 0;
    let push = |layers: &mut Vec<ToolpathLayer>,
                    set: &[Vec<SamplePoint>],
                    material: Material,
                    role: LayerRole,
                    level: usize| {
        layers.extend(lifted(set, settings.lift(level)).map(|points| ToolpathLayer {
            points,
            material,
            role,
            level,
        }));
    };

    if !paths.has_sense() {
        for _ in 0..settings.initial_layers {
            push(&mut layers, &paths.foam, Material::Regular, LayerRole::Initial, level);
            level += 1;
        }
        log::debug!("assembled {} foam-only strokes over {level} levels", layers.len());
        return layers;
    }

    for _ in 0..settings.initial_layers {
        push(&mut layers, &paths.all, Material::Regular, LayerRole::Initial, level);
        level += 1;
    }
    for _ in 0..settings.middle_layers {
        push(&mut layers, &paths.sense, Material::Sensing, LayerRole::Middle, level);
        push(&mut layers, &paths.foam, Material::Regular, LayerRole::Middle, level);
        level += 1;
    }
    for _ in 0..settings.final_layers {
        push(&mut layers, &paths.all, Material::Regular, LayerRole::Final, level);
        level += 1;
    }
    log::debug!("assembled {} sandwich strokes over {level} levels", layers.len());
    layers
}
