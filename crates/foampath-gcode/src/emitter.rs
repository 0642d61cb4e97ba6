//! Motion program emission with running extrusion bookkeeping.

use foampath_math::Point3;
use foampath_toolpath::ToolpathLayer;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::flavor::render;
use crate::profile::{Extruder, MachineProfile, RatePair};

/// Format a floating point value with fixed precision.
pub fn format_coord(value: f64, precision: usize) -> String {
    format!("{:.prec$}", value, prec = precision)
}

/// A complete program: start sequence, motion body, end sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionProgram {
    /// Rendered start sequence.
    pub preamble: String,
    /// Motion commands, one per line.
    pub body: Vec<String>,
    /// Rendered end sequence.
    pub postamble: String,
    /// Extrusion total reached before the final reset.
    pub total_extrusion: f64,
}

impl MotionProgram {
    /// True if there is nothing to print.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Full G-code text, or an empty string for an empty program.
    pub fn to_gcode(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        format!(
            "{}\n\n{}\n\n{}",
            self.preamble,
            self.body.join("\n"),
            self.postamble
        )
    }
}

/// Running position and absolute extrusion.
#[derive(Debug, Clone, Default)]
pub struct EmitState {
    /// Current head position, once the start point is reached.
    pub position: Option<Point3>,
    /// Absolute extruder position since the last reset.
    pub extruded: f64,
}

/// Builds one [`MotionProgram`] for one print head.
#[derive(Debug)]
pub struct GcodeEmitter<'a> {
    profile: &'a MachineProfile,
    extruder: Extruder,
    state: EmitState,
    body: Vec<String>,
    out_of_bounds: usize,
}

impl<'a> GcodeEmitter<'a> {
    /// Start an empty program. Extrusion starts at zero.
    pub fn new(profile: &'a MachineProfile, extruder: Extruder) -> Self {
        Self {
            profile,
            extruder,
            state: EmitState::default(),
            body: Vec::new(),
            out_of_bounds: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> &EmitState {
        &self.state
    }

    fn track_bounds(&mut self, p: &Point3) {
        if !self.profile.in_bounds(p.x, p.y, p.z) {
            self.out_of_bounds += 1;
        }
    }

    /// Rapid to the first point without extruding.
    pub fn start_at(&mut self, p: Point3) {
        self.track_bounds(&p);
        self.body.push(format!(
            "G0 F{} X{} Y{} Z{}; move to start point",
            self.profile.start_travel_speed,
            format_coord(p.x, 3),
            format_coord(p.y, 3),
            format_coord(p.z, 3)
        ));
        self.body.push("M205 X8 Y8; tune down jerk".into());
        self.body.push("G1 F2400 E0; zero the extruder".into());
        self.state.position = Some(p);
    }

    /// Extruding move to `p`, or a rapid if nothing has been reached yet.
    pub fn extrude_to(&mut self, p: Point3, rates: RatePair) {
        let Some(from) = self.state.position else {
            self.start_at(p);
            return;
        };
        self.track_bounds(&p);
        self.state.extruded += (p - from).norm() * rates.ratio();
        self.body.push(format!(
            "G1 X{} Y{} Z{} E{} F{}",
            format_coord(p.x, 4),
            format_coord(p.y, 4),
            format_coord(p.z, 4),
            format_coord(self.state.extruded, 4),
            rates.head_speed
        ));
        self.state.position = Some(p);
    }

    /// Trace `points` in order: bridge to the first with `bridge`, then
    /// extrude along the rest with `stroke`.
    pub fn stroke(&mut self, points: &[Point3], bridge: RatePair, stroke: RatePair) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.extrude_to(*first, bridge);
        for p in rest {
            self.extrude_to(*p, stroke);
        }
    }

    /// Reset the extruder and wrap the body in the start and end sequences.
    pub fn finish(mut self) -> MotionProgram {
        if self.body.is_empty() {
            return MotionProgram::default();
        }
        if self.out_of_bounds > 0 {
            log::warn!(
                "{} moves fall outside the {} build volume",
                self.out_of_bounds,
                self.profile.name
            );
        }
        let total_extrusion = self.state.extruded;
        self.body.push("G92 E0".into());
        self.state.extruded = 0.0;

        let profile = self.profile;
        let preamble = render(
            profile.flavor.start_gcode(),
            &[
                ("tool", self.extruder.tool().to_string()),
                ("side", self.extruder.side().to_string()),
                ("bed_temp", profile.bed_temp.to_string()),
                ("nozzle_temp", profile.nozzle_temp(self.extruder).to_string()),
            ],
        );
        let postamble = render(
            profile.flavor.end_gcode(),
            &[("machine_depth", profile.machine_depth.to_string())],
        );
        MotionProgram {
            preamble,
            body: self.body,
            postamble,
            total_extrusion,
        }
    }
}

/// Emit a foam program for `layers`, in order.
///
/// Each stroke is reached from the previous one by an extruding bridge at
/// the inter-layer rate; points within a stroke use the rate of its
/// material. An empty layer list yields an empty program.
pub fn emit_layers(
    layers: &[ToolpathLayer],
    profile: &MachineProfile,
    extruder: Extruder,
) -> Result<MotionProgram> {
    profile.validate()?;

    let mut emitter = GcodeEmitter::new(profile, extruder);
    for layer in layers {
        emitter.stroke(
            &layer.points,
            profile.interlayer,
            profile.material_rates(layer.material),
        );
    }
    let program = emitter.finish();
    log::debug!(
        "emitted {} commands for {} strokes, E={:.4}",
        program.body.len(),
        layers.len(),
        program.total_extrusion
    );
    Ok(program)
}

/// Emit a closed rectangle around `boundary`, grown by `offset`, at
/// `layer_height`, using the normal print rate.
///
/// Fewer than four boundary points yield an empty program.
pub fn emit_base_constraints(
    boundary: &[Point3],
    offset: f64,
    profile: &MachineProfile,
    extruder: Extruder,
    layer_height: f64,
) -> Result<MotionProgram> {
    profile.validate()?;
    if boundary.len() < 4 {
        log::warn!(
            "base boundary has {} points, need at least 4",
            boundary.len()
        );
        return Ok(MotionProgram::default());
    }

    let fold = |f: fn(f64, f64) -> f64, init: f64, axis: fn(&Point3) -> f64| {
        boundary.iter().map(axis).fold(init, f)
    };
    let min_x = fold(f64::min, f64::INFINITY, |p| p.x) - offset;
    let max_x = fold(f64::max, f64::NEG_INFINITY, |p| p.x) + offset;
    let min_y = fold(f64::min, f64::INFINITY, |p| p.y) - offset;
    let max_y = fold(f64::max, f64::NEG_INFINITY, |p| p.y) + offset;

    let corners = [
        Point3::new(min_x, min_y, layer_height),
        Point3::new(min_x, max_y, layer_height),
        Point3::new(max_x, max_y, layer_height),
        Point3::new(max_x, min_y, layer_height),
        Point3::new(min_x, min_y, layer_height),
    ];

    let mut emitter = GcodeEmitter::new(profile, extruder);
    emitter.stroke(&corners, profile.normal_print, profile.normal_print);
    Ok(emitter.finish())
}

/// Non-extruding move to `target` at the free-move speed.
pub fn move_to_position(profile: &MachineProfile, target: &Point3) -> String {
    format!(
        "G0 X{} Y{} Z{} F{}",
        format_coord(target.x, 3),
        format_coord(target.y, 3),
        format_coord(target.z, 3),
        profile.free_move_speed
    )
}
