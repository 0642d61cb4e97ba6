//! Error types for mesh construction.

use thiserror::Error;

/// Errors raised by malformed mesh buffers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// Position buffer length is not a multiple of 3.
    #[error("vertex buffer length {0} is not a multiple of 3")]
    VertexBufferLength(usize),

    /// Unindexed mesh whose vertex count is not a multiple of 3.
    #[error("unindexed mesh has {0} vertices, not a multiple of 3")]
    UnindexedVertexCount(usize),

    /// Index buffer length is not a multiple of 3.
    #[error("index buffer length {0} is not a multiple of 3")]
    IndexBufferLength(usize),

    /// An index refers past the end of the vertex buffer.
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// The offending index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A triangle offset that is not a multiple of 3 or lies past the end.
    #[error("triangle offset {0} is not a valid triangle start")]
    TriangleOffset(usize),
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
