//! Error types for the pipeline facade.

use foampath_gcode::GcodeError;
use foampath_mesh::MeshError;
use foampath_select::SelectError;
use foampath_toolpath::ToolpathError;
use thiserror::Error;

/// Errors that abort one pipeline invocation.
///
/// Empty selections and missing prerequisites are not errors; they are
/// reported as [`Notice`](crate::Notice)s.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Malformed mesh buffers.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Selection failed.
    #[error(transparent)]
    Select(#[from] SelectError),

    /// Sampling or planning failed.
    #[error(transparent)]
    Toolpath(#[from] ToolpathError),

    /// G-code emission failed.
    #[error(transparent)]
    Gcode(#[from] GcodeError),

    /// Configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be serialized.
    #[error("config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
