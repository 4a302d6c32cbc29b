//! Store error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or rewriting files.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A credential file operation failed.
    #[error("failed to {action} credentials file {}: {source}", path.display())]
    Credentials {
        /// File being updated.
        path: PathBuf,
        /// Step that failed (`stat`, `read`, `parse`, `encode`, `write`).
        action: &'static str,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A required nested JSON object is missing.
    #[error("credentials file has no `{0}` object")]
    MissingObject(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Wraps an error with the credential file and failed step.
    pub fn credentials(
        path: impl Into<PathBuf>,
        action: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Credentials {
            path: path.into(),
            action,
            source: source.into(),
        }
    }
}
