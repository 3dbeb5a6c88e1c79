//! Error types for the pb core primitives.

use thiserror::Error;

/// Errors from parsing or encoding core primitives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid compact id {0:?}")]
    InvalidCompactId(String),

    #[error("compact id {value} does not fit in {width} characters")]
    CompactIdOverflow { value: u64, width: usize },

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("invalid ownership token: {0}")]
    InvalidToken(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
