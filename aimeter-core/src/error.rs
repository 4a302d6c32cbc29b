//! Core error types for aimeter.

use thiserror::Error;

/// Core error type for aimeter operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Unknown vendor name.
    #[error("Unknown vendor: {0}")]
    UnknownVendor(String),

    /// Invalid data in a model value.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
