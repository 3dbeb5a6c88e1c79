//! Error types for paste and short-URL operations.

use pb_core::{Address, CoreError, Namespace};
use pb_store::StoreError;
use thiserror::Error;

/// Errors that can occur during pb operations.
#[derive(Debug, Error)]
pub enum PasteError {
    /// The address or token does not resolve to a live record.
    #[error("not found")]
    NotFound,

    /// The content already exists; the caller should redirect here.
    #[error("already exists at {0}")]
    Conflict(Address),

    /// Rejected before touching storage.
    #[error("bad input: {0}")]
    BadInput(String),

    /// The sequence has outgrown the configured display width.
    #[error("{namespace} address space exhausted at width {width}")]
    AddressSpaceExhausted { namespace: Namespace, width: usize },

    /// The storage engine failed; nothing was written.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Encoding or parsing error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl PasteError {
    /// Whether the error came from the engine rather than from the request.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, PasteError::Storage(_))
    }
}

/// Result type for pb operations.
pub type Result<T> = std::result::Result<T, PasteError>;
