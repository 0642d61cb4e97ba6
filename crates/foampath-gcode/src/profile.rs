//! Machine profile definitions.

use foampath_toolpath::Material;
use serde::{Deserialize, Serialize};

use crate::error::{GcodeError, Result};
use crate::flavor::GcodeFlavor;

/// Extrusion per unit of travel at a given head speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePair {
    /// Extrusion rate (filament mm/min).
    pub extrusion_rate: f64,
    /// Print head speed (mm/min), also the move feedrate.
    pub head_speed: f64,
}

impl RatePair {
    /// Create a new rate pair.
    pub const fn new(extrusion_rate: f64, head_speed: f64) -> Self {
        Self {
            extrusion_rate,
            head_speed,
        }
    }

    /// Filament extruded per mm of head travel.
    pub fn ratio(&self) -> f64 {
        self.extrusion_rate / self.head_speed
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !(self.head_speed.is_finite() && self.head_speed > 0.0) {
            return Err(GcodeError::InvalidProfile(format!(
                "{name} head_speed must be positive"
            )));
        }
        if !(self.extrusion_rate.is_finite() && self.extrusion_rate >= 0.0) {
            return Err(GcodeError::InvalidProfile(format!(
                "{name} extrusion_rate must be non-negative"
            )));
        }
        Ok(())
    }
}

/// Print head used for a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Extruder {
    /// Left head (`T0`), loaded with foaming TPU.
    #[default]
    Left,
    /// Right head (`T1`), loaded with PLA.
    Right,
}

impl Extruder {
    /// Tool number.
    pub fn tool(&self) -> u32 {
        match self {
            Extruder::Left => 0,
            Extruder::Right => 1,
        }
    }

    /// Lowercase side name.
    pub fn side(&self) -> &'static str {
        match self {
            Extruder::Left => "left",
            Extruder::Right => "right",
        }
    }
}

/// Machine profile with temperatures, speeds and extrusion rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineProfile {
    /// Profile name.
    pub name: String,
    /// Start/end sequence family.
    pub flavor: GcodeFlavor,
    /// Bed temperature (°C).
    pub bed_temp: u32,
    /// Left nozzle temperature (°C).
    pub left_nozzle_temp: u32,
    /// Right nozzle temperature (°C).
    pub right_nozzle_temp: u32,
    /// Build depth, X and Y (mm).
    pub machine_depth: f64,
    /// Build height (mm).
    pub machine_height: f64,
    /// Nozzle diameter (mm).
    pub nozzle_diameter: f64,
    /// Die swell factor of the foamed extrudate.
    pub die_swell: f64,
    /// Non-extruding move feedrate (mm/min).
    pub free_move_speed: f64,
    /// Feedrate of the rapid to the first point (mm/min).
    pub start_travel_speed: f64,
    /// Regular foam strokes.
    pub regular_foam: RatePair,
    /// Sensing foam strokes.
    pub sensing_foam: RatePair,
    /// Bridges from one stroke to the next.
    pub interlayer: RatePair,
    /// Regular (non-foam) printing, used for base constraints.
    pub normal_print: RatePair,
}

impl Default for MachineProfile {
    fn default() -> Self {
        Self::sv04()
    }
}

impl MachineProfile {
    /// Sovol SV04 independent dual extruder, TPU foam on the left head.
    pub fn sv04() -> Self {
        Self {
            name: "Sovol SV04".into(),
            flavor: GcodeFlavor::Sv04,
            bed_temp: 110,
            left_nozzle_temp: 240,
            right_nozzle_temp: 260,
            machine_depth: 302.0,
            machine_height: 402.0,
            nozzle_diameter: 0.4,
            die_swell: 1.1,
            free_move_speed: 1000.0,
            start_travel_speed: 2880.0,
            regular_foam: RatePair::new(70.0, 70.0),
            sensing_foam: RatePair::new(100.0, 100.0),
            interlayer: RatePair::new(0.2, 200.0),
            normal_print: RatePair::new(0.07, 800.0),
        }
    }

    /// Generic single-head Marlin printer.
    pub fn generic() -> Self {
        Self {
            name: "Generic".into(),
            flavor: GcodeFlavor::Marlin,
            bed_temp: 60,
            left_nozzle_temp: 230,
            right_nozzle_temp: 230,
            machine_depth: 220.0,
            machine_height: 250.0,
            ..Self::sv04()
        }
    }

    /// Get all built-in profiles.
    pub fn all_profiles() -> Vec<Self> {
        vec![Self::sv04(), Self::generic()]
    }

    /// Validate profile values.
    pub fn validate(&self) -> Result<()> {
        for (name, speed) in [
            ("free_move_speed", self.free_move_speed),
            ("start_travel_speed", self.start_travel_speed),
        ] {
            if !(speed.is_finite() && speed > 0.0) {
                return Err(GcodeError::InvalidProfile(format!("{name} must be positive")));
            }
        }
        self.regular_foam.validate("regular_foam")?;
        self.sensing_foam.validate("sensing_foam")?;
        self.interlayer.validate("interlayer")?;
        self.normal_print.validate("normal_print")
    }

    /// Nozzle temperature of `extruder`.
    pub fn nozzle_temp(&self, extruder: Extruder) -> u32 {
        match extruder {
            Extruder::Left => self.left_nozzle_temp,
            Extruder::Right => self.right_nozzle_temp,
        }
    }

    /// Rate pair for strokes of `material`.
    pub fn material_rates(&self, material: Material) -> RatePair {
        match material {
            Material::Regular => self.regular_foam,
            Material::Sensing => self.sensing_foam,
        }
    }

    /// Check if a position is within build volume.
    pub fn in_bounds(&self, x: f64, y: f64, z: f64) -> bool {
        (0.0..=self.machine_depth).contains(&x)
            && (0.0..=self.machine_depth).contains(&y)
            && (0.0..=self.machine_height).contains(&z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_profiles() {
        for profile in MachineProfile::all_profiles() {
            assert!(profile.validate().is_ok(), "{}", profile.name);
            assert!(profile.machine_depth > 0.0);
            assert!(profile.nozzle_diameter > 0.0);
        }
    }

    #[test]
    fn test_default_rates() {
        let p = MachineProfile::default();
        assert_relative_eq!(p.material_rates(Material::Regular).ratio(), 1.0);
        assert_relative_eq!(p.material_rates(Material::Sensing).ratio(), 1.0);
        assert_relative_eq!(p.interlayer.ratio(), 0.001);
        assert_eq!(p.nozzle_temp(Extruder::Left), 240);
        assert_eq!(p.nozzle_temp(Extruder::Right), 260);
    }

    #[test]
    fn test_in_bounds() {
        let p = MachineProfile::sv04();
        assert!(p.in_bounds(100.0, 100.0, 100.0));
        assert!(!p.in_bounds(-1.0, 100.0, 100.0));
        assert!(!p.in_bounds(100.0, 303.0, 100.0));
    }

    #[test]
    fn test_invalid_rate() {
        let p = MachineProfile {
            interlayer: RatePair::new(0.2, 0.0),
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(GcodeError::InvalidProfile(_))));
    }
}
