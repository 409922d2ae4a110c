//! Error types for pingpong-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
