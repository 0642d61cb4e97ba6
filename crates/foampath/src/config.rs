//! Configuration file loading.
//!
//! Every section is optional; missing values fall back to the defaults of
//! the corresponding settings struct.
//!
//! ```toml
//! extruder = "left"
//!
//! [toolpath]
//! grid_size = 2.0
//!
//! [toolpath.layers]
//! middle_layers = 2
//!
//! [selection]
//! mode = "centroid-visible"
//!
//! [machine]
//! bed_temp = 100
//! ```

use std::path::Path;

use foampath_gcode::{Extruder, MachineProfile};
use foampath_select::SelectionPolicy;
use foampath_toolpath::{ToolpathConfig, ToolpathError, DEFAULT_BED_THRESHOLD};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Base-constraint outline parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseSettings {
    /// Height below which triangles count as touching the bed (mm).
    pub z_threshold: f64,
    /// Outward growth of the outline (mm).
    pub offset: f64,
    /// Print height of the outline (mm).
    pub layer_height: f64,
    /// Head that prints the outline.
    pub extruder: Extruder,
}

impl Default for BaseSettings {
    fn default() -> Self {
        Self {
            z_threshold: DEFAULT_BED_THRESHOLD,
            offset: 0.2,
            layer_height: 0.2,
            extruder: Extruder::Right,
        }
    }
}

impl BaseSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("z_threshold", self.z_threshold),
            ("offset", self.offset),
            ("layer_height", self.layer_height),
        ] {
            if !value.is_finite() {
                return Err(ToolpathError::InvalidSettings(format!("base {name} must be finite")).into());
            }
        }
        Ok(())
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoampathConfig {
    /// Head that prints foam programs.
    pub extruder: Extruder,
    /// Sampling, planning and layer stacking.
    pub toolpath: ToolpathConfig,
    /// Face-inclusion policy for region selection.
    pub selection: SelectionPolicy,
    /// Printer parameters.
    pub machine: MachineProfile,
    /// Base-constraint outline.
    pub base: BaseSettings,
}

impl FoampathConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("loading config from {}", path.as_ref().display());
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.toolpath.validate()?;
        self.machine.validate()?;
        self.base.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foampath_gcode::GcodeFlavor;
    use foampath_select::SelectionMode;

    #[test]
    fn test_empty_document_is_default() {
        let config = FoampathConfig::from_toml_str("").unwrap();
        assert_eq!(config, FoampathConfig::default());
        assert_eq!(config.base.extruder, Extruder::Right);
        assert_eq!(config.extruder, Extruder::Left);
    }

    #[test]
    fn test_partial_sections() {
        let config = FoampathConfig::from_toml_str(
            r#"
            extruder = "right"

            [toolpath]
            grid_size = 2.0

            [toolpath.layers]
            middle_layers = 2

            [selection]
            mode = "centroid-visible"
            whole_model = true

            [machine]
            flavor = "marlin"
            bed_temp = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.extruder, Extruder::Right);
        assert_eq!(config.toolpath.grid_size, 2.0);
        assert_eq!(config.toolpath.layers.middle_layers, 2);
        assert_eq!(config.toolpath.layers.initial_layers, 3);
        assert_eq!(config.selection.mode, SelectionMode::CentroidVisible);
        assert!(config.selection.whole_model);
        assert_eq!(config.machine.flavor, GcodeFlavor::Marlin);
        assert_eq!(config.machine.bed_temp, 100);
        assert_eq!(config.machine.left_nozzle_temp, 240);
    }

    #[test]
    fn test_rate_pair_table() {
        let config = FoampathConfig::from_toml_str(
            r#"
            [machine.interlayer]
            extrusion_rate = 0.5
            head_speed = 250.0
            "#,
        )
        .unwrap();
        assert_eq!(config.machine.interlayer.head_speed, 250.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(FoampathConfig::from_toml_str("[toolpath]\ngrid_size = -1.0\n").is_err());
        assert!(FoampathConfig::from_toml_str("[machine]\nfree_move_speed = 0.0\n").is_err());
        assert!(FoampathConfig::from_toml_str("[toolpath\n").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = FoampathConfig::default();
        config.toolpath.grid_size = 3.0;
        let text = config.to_toml_string().unwrap();
        assert_eq!(FoampathConfig::from_toml_str(&text).unwrap(), config);
    }
}
