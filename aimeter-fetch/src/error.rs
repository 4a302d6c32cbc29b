//! Fetch error types.

use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for HTTP operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connect, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The per-request timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// The run's cancellation token fired.
    #[error("request cancelled")]
    Cancelled,

    /// The server answered with a non-2xx status.
    #[error(transparent)]
    Status(#[from] ApiStatusError),

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Json(#[from] serde_json::Error),

    /// A header value could not be built.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

impl FetchError {
    /// HTTP status code, when the server answered with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(e) => Some(e.status),
            _ => None,
        }
    }

    /// True for 401 and 403 answers.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// True when the request did not complete in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout | Self::Cancelled)
    }
}

// ============================================================================
// API Status Error
// ============================================================================

/// Non-2xx answer with a truncated body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("API returned status {status}: {body}")]
pub struct ApiStatusError {
    /// HTTP status code.
    pub status: u16,
    /// Response body, truncated on a UTF-8 boundary.
    pub body: String,
}

impl ApiStatusError {
    /// Creates a status error, truncating the body.
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: crate::body::truncate_body(body, crate::body::MAX_ERROR_BODY_BYTES),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = FetchError::from(ApiStatusError::new(401, "unauthorized"));
        assert_eq!(err.to_string(), "API returned status 401: unauthorized");
        assert_eq!(err.status(), Some(401));
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_forbidden_is_auth_failure() {
        let err = FetchError::from(ApiStatusError::new(403, ""));
        assert!(err.is_auth_failure());
        let err = FetchError::from(ApiStatusError::new(500, "boom"));
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn test_status_error_truncates_body() {
        let body = "x".repeat(500);
        let err = ApiStatusError::new(500, &body);
        assert_eq!(err.body.len(), 203);
        assert!(err.body.ends_with("..."));
    }

    #[test]
    fn test_timeout_flags() {
        assert!(FetchError::Timeout.is_timeout());
        assert!(FetchError::Cancelled.is_timeout());
        assert!(FetchError::Timeout.status().is_none());
    }
}
