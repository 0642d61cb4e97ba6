//! Error types for G-code generation.

use thiserror::Error;

/// Errors that can occur while emitting G-code.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// A machine profile value is unusable.
    #[error("invalid machine profile: {0}")]
    InvalidProfile(String),
}

/// Result type for G-code operations.
pub type Result<T> = std::result::Result<T, GcodeError>;
