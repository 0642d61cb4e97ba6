//! Start and end sequences.

use serde::{Deserialize, Serialize};

/// Firmware start/end sequence family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GcodeFlavor {
    /// Sovol SV04 dual-extruder Marlin, with a prime line before printing.
    #[default]
    Sv04,
    /// Plain Marlin, no prime line.
    Marlin,
}

impl GcodeFlavor {
    /// Start G-code template.
    ///
    /// Placeholders: `{tool}`, `{side}`, `{bed_temp}`, `{nozzle_temp}`.
    pub fn start_gcode(&self) -> &'static str {
        match self {
            GcodeFlavor::Sv04 => {
                ";Generated by foampath\n\
                 T{tool}; {side} extruder\n\
                 M82 ;Set absolute extrusion mode\n\
                 ;SV04 start\n\
                 M140 S{bed_temp}; set bed temperature and heat\n\
                 M104 S{nozzle_temp}; set nozzle temperature and heat\n\
                 M280 P0 S160;\n\
                 G4 P100; pause 100ms\n\
                 G28; home x, y, z\n\
                 M420 S1; enable bed leveling\n\
                 M190 S{bed_temp}; wait for bed temperature\n\
                 M109 S{nozzle_temp}; wait for nozzle temperature\n\
                 G92 E0; reset extrusion count\n\
                 \n\
                 ; Prime two lines\n\
                 G1 X10.1 Y20 Z0.28 F5000.0; fast move to position\n\
                 G1 X10.1 Y200.0 Z0.28 F1500.0 E15; print the first line\n\
                 G1 X10.4 Y200.0 Z0.28 F5000.0; fast move to the second position\n\
                 G1 X10.4 Y20 Z0.28 F1500.0 E30; print the second line\n\
                 G92 E0 ;Reset Extruder\n\
                 G1 Z2.0 F3000;\n\
                 G92 E0\n\
                 G1 F2400 E-0.5\n\
                 \n\
                 M204 S500; set acceleration\n\
                 M205 X16 Y16; set jerk\n"
            }
            GcodeFlavor::Marlin => {
                ";Generated by foampath\n\
                 T{tool}; {side} extruder\n\
                 M82 ; Absolute extrusion\n\
                 M140 S{bed_temp} ; Set bed temp\n\
                 M104 S{nozzle_temp} ; Set nozzle temp\n\
                 G28 ; Home all axes\n\
                 M190 S{bed_temp} ; Wait for bed temp\n\
                 M109 S{nozzle_temp} ; Wait for nozzle temp\n\
                 G92 E0 ; Reset extruder\n\
                 G1 Z5 F3000 ; Move Z up\n"
            }
        }
    }

    /// End G-code template.
    ///
    /// Placeholders: `{machine_depth}`.
    pub fn end_gcode(&self) -> &'static str {
        match self {
            GcodeFlavor::Sv04 => {
                ";SV04 end\n\
                 M107; turn off fan\n\
                 G91 ;Relative positioning\n\
                 G1 E-2 F2700 ;Retract a bit\n\
                 G1 E-2 Z0.2 F2400 ;Retract and raise Z\n\
                 G1 X0 Y240 F3000 ;Wipe out\n\
                 G1 Z10 ;Raise Z more\n\
                 G90 ;Absolute positioning\n\
                 G1 X0 Y{machine_depth} ;Present print\n\
                 M106 S0 ;Turn-off fan\n\
                 M104 S0 ;Turn-off hotend\n\
                 M140 S0 ;Turn-off bed\n\
                 M84 X Y E ;Disable all steppers except Z\n\
                 M82 ;Set absolute extrusion mode\n"
            }
            GcodeFlavor::Marlin => {
                "M104 S0 ; Turn off nozzle\n\
                 M140 S0 ; Turn off bed\n\
                 G91 ; Relative positioning\n\
                 G1 E-2 F2700 ; Retract\n\
                 G1 Z10 F3000 ; Move Z up\n\
                 G90 ; Absolute positioning\n\
                 G1 X0 Y{machine_depth} F3000 ; Present print\n\
                 M84 ; Disable motors\n"
            }
        }
    }
}

/// Substitute `{key}` placeholders in `template`.
pub fn render(template: &str, values: &[(&str, String)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{key}}}"), value)
        })
}
