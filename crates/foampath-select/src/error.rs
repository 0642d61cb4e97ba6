//! Error types for selection.

use foampath_mesh::MeshError;
use thiserror::Error;

/// Errors that can occur during selection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectError {
    /// The mesh buffers are malformed.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// A transform that must be inverted is singular.
    #[error("{0} transform is not invertible")]
    SingularTransform(&'static str),

    /// Region coordinates did not come in complete triples.
    #[error("region buffer length {0} is not a multiple of 3")]
    RegionBufferLength(usize),

    /// Sensing volume with a non-positive or non-finite size.
    #[error("invalid sensing volume size {0}")]
    VolumeSize(f64),
}

/// Result type for selection operations.
pub type Result<T> = std::result::Result<T, SelectError>;
