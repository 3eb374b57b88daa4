//! Error types for devicedb
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for devicedb operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Load Errors
    // -------------------------------------------------------------------------
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u16),

    // -------------------------------------------------------------------------
    // Query Errors
    // -------------------------------------------------------------------------
    #[error("index {index} out of range for section of {count} entries")]
    OutOfRange { index: u32, count: u32 },

    // -------------------------------------------------------------------------
    // Resource Errors
    // -------------------------------------------------------------------------
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

impl StoreError {
    /// Shorthand for a `MalformedHeader` error
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        StoreError::MalformedHeader(msg.into())
    }
}
