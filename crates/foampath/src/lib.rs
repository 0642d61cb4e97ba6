#![warn(missing_docs)]

//! foampath: surface selection to foam G-code.
//!
//! Mark a foam region (and optionally a sensing inlay) on a triangle mesh,
//! sample it on a grid, stitch the samples into serpentine strokes stacked
//! in sandwich layers, and emit a G-code program for a foam-extruding head.
//!
//! # Example
//!
//! ```ignore
//! use foampath::{Model, Pipeline, PipelineContext, PipelineEvent, SelectionTarget};
//!
//! let mut model = Model::everyday("cup", mesh)?;
//! let mut pipeline = Pipeline::new(PipelineContext { camera, ..Default::default() });
//!
//! let outcome = pipeline.handle(
//!     &mut model,
//!     PipelineEvent::RegionFinalized { target: SelectionTarget::Foam, region },
//! )?;
//! for notice in &outcome.notices {
//!     eprintln!("{notice}");
//! }
//! std::fs::write("cup.gcode", model.program().unwrap().to_gcode())?;
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;

pub use config::{BaseSettings, FoampathConfig};
pub use error::{PipelineError, Result};
pub use model::{EverydayState, Model, ModelKind, SelectionTarget};
pub use pipeline::{Notice, Pipeline, PipelineContext, PipelineEvent, PipelineOutcome};

pub use foampath_gcode;
pub use foampath_math;
pub use foampath_mesh;
pub use foampath_select;
pub use foampath_toolpath;
