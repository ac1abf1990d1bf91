//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed token id: {0}")]
    MalformedId(String),

    #[error("codec error: {0}")]
    Codec(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
