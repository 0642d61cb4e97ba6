#![warn(missing_docs)]

//! G-code generation for foam toolpaths.
//!
//! Converts stacked toolpath strokes into a single-head motion program with
//! absolute extrusion, wrapped in printer-specific start and end sequences.
//!
//! # Example
//!
//! ```ignore
//! use foampath_gcode::{emit_layers, Extruder, MachineProfile};
//!
//! let profile = MachineProfile::sv04();
//! let program = emit_layers(&result.layers, &profile, Extruder::Left)?;
//! std::fs::write("foam.gcode", program.to_gcode())?;
//! ```

pub mod emitter;
pub mod error;
pub mod flavor;
pub mod profile;

pub use emitter::{
    emit_base_constraints, emit_layers, format_coord, move_to_position, EmitState, GcodeEmitter,
    MotionProgram,
};
pub use error::{GcodeError, Result};
pub use flavor::{render, GcodeFlavor};
pub use profile::{Extruder, MachineProfile, RatePair};
