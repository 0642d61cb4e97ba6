//! Error types for sampling and planning.

use foampath_math::MathError;
use foampath_mesh::MeshError;
use thiserror::Error;

/// Errors that can occur while building toolpaths.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolpathError {
    /// Invalid toolpath settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Sampling bounds are malformed.
    #[error(transparent)]
    Bounds(#[from] MathError),

    /// A sampled mesh is malformed.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// The world transform of a sampled mesh cannot be inverted.
    #[error("mesh transform is singular")]
    SingularTransform,
}

/// Result type for toolpath operations.
pub type Result<T> = std::result::Result<T, ToolpathError>;
