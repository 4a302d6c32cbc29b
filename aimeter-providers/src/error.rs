//! Provider error types.
//!
//! Every error is scoped to the account that produced it and ends up as a
//! warning row; [`warning_message`] turns it into the user-facing text.

use aimeter_fetch::{ApiStatusError, FetchError};
use aimeter_store::StoreError;
use thiserror::Error;

use crate::jwt::JwtError;

/// Errors produced while loading, refreshing or querying an account.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The credential file could not be turned into a usable account.
    #[error("failed to load credentials: {0}")]
    Load(String),

    /// Transport failure or non-auth status from a vendor endpoint.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// 401/403 on an account that has no refresh token.
    #[error("authentication failed: {0}")]
    AuthExpired(ApiStatusError),

    /// Native credentials belong to the vendor's own CLI and are never rotated
    /// here.
    #[error("token expired; re-authenticate with `{vendor}` externally")]
    NativeRefreshRefused {
        /// CLI name of the vendor tool.
        vendor: &'static str,
    },

    /// The account lacks what its vendor needs for a refresh grant.
    #[error("refresh token not available")]
    RefreshUnavailable,

    /// The token endpoint answered 2xx but the answer was unusable.
    #[error("token refresh failed: {0}")]
    Refresh(String),

    /// The account was not loaded from a file.
    #[error("credential path not available for refresh")]
    CredentialPathUnavailable,

    /// Rotated tokens could not be written back.
    #[error("failed to persist refreshed token: {0}")]
    Persistence(#[from] StoreError),

    /// A 2xx quota response could not be decoded.
    #[error("failed to parse API response: {0}")]
    Decode(String),

    /// A JWT could not be decoded.
    #[error("invalid JWT: {0}")]
    Jwt(#[from] JwtError),
}

impl ProviderError {
    /// The status error behind this error, if any.
    pub fn api_status(&self) -> Option<&ApiStatusError> {
        match self {
            Self::Fetch(FetchError::Status(status)) | Self::AuthExpired(status) => Some(status),
            _ => None,
        }
    }

    /// True for 401 and 403 answers from a vendor endpoint.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Fetch(err) if err.is_auth_failure())
    }
}

/// User-facing text for a failed account.
pub fn warning_message(err: &ProviderError) -> String {
    match err {
        ProviderError::Fetch(FetchError::Timeout) => return "request timed out".to_string(),
        ProviderError::Fetch(FetchError::Cancelled) => return "request cancelled".to_string(),
        _ => {}
    }

    if let Some(status) = err.api_status() {
        let body = status.body.to_lowercase();
        if body.contains("revok") || body.contains("invalid_grant") {
            return "authentication failed (token revoked)".to_string();
        }
        match status.status {
            401 => return "authentication failed (token may be expired)".to_string(),
            403 => return "authentication failed (permission denied)".to_string(),
            _ => {}
        }
    }

    err.to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, body: &str) -> ProviderError {
        ProviderError::Fetch(FetchError::Status(ApiStatusError::new(code, body)))
    }

    #[test]
    fn test_warning_message_timeouts() {
        assert_eq!(
            warning_message(&ProviderError::Fetch(FetchError::Timeout)),
            "request timed out"
        );
        assert_eq!(
            warning_message(&ProviderError::Fetch(FetchError::Cancelled)),
            "request cancelled"
        );
    }

    #[test]
    fn test_warning_message_auth_statuses() {
        assert_eq!(
            warning_message(&status(401, "")),
            "authentication failed (token may be expired)"
        );
        assert_eq!(
            warning_message(&status(403, "forbidden")),
            "authentication failed (permission denied)"
        );
        assert_eq!(
            warning_message(&ProviderError::AuthExpired(ApiStatusError::new(401, ""))),
            "authentication failed (token may be expired)"
        );
    }

    #[test]
    fn test_warning_message_revoked_body() {
        assert_eq!(
            warning_message(&status(400, r#"{"error":"invalid_grant"}"#)),
            "authentication failed (token revoked)"
        );
        assert_eq!(
            warning_message(&status(401, "Token has been REVOKED")),
            "authentication failed (token revoked)"
        );
    }

    #[test]
    fn test_warning_message_falls_back_to_display() {
        assert_eq!(
            warning_message(&status(500, "boom")),
            "API returned status 500: boom"
        );
        let refused = ProviderError::NativeRefreshRefused { vendor: "codex" };
        assert_eq!(
            warning_message(&refused),
            "token expired; re-authenticate with `codex` externally"
        );
    }

    #[test]
    fn test_is_auth_failure() {
        assert!(status(401, "").is_auth_failure());
        assert!(status(403, "").is_auth_failure());
        assert!(!status(429, "").is_auth_failure());
        assert!(!ProviderError::RefreshUnavailable.is_auth_failure());
    }
}
