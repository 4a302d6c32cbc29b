//! Fetch context shared by loaders, refreshers and quota clients.
//!
//! One context is built per run. It fixes the home directory, the credential
//! source decided for the whole run, the cancellation token armed from the
//! deadline, and the HTTP client.

use aimeter_core::CredentialSource;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::http::HttpClient;

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for fetch operations.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Attach debug metadata to rows and log response bodies.
    pub debug: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            debug: false,
        }
    }
}

impl FetchSettings {
    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables debug metadata.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Per-run context passed to every vendor operation.
#[derive(Debug, Clone)]
pub struct FetchContext {
    /// HTTP client.
    pub http: Arc<HttpClient>,
    /// Fetch settings.
    pub settings: FetchSettings,
    home_dir: Option<PathBuf>,
    credential_source: CredentialSource,
    cancel: CancellationToken,
}

impl FetchContext {
    /// Creates a builder for the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// Home directory credentials are resolved against.
    pub fn home_dir(&self) -> Option<&Path> {
        self.home_dir.as_deref()
    }

    /// Credential source decided for this run.
    pub fn credential_source(&self) -> CredentialSource {
        self.credential_source
    }

    /// Token cancelled when the run's deadline passes.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// True when debug metadata is requested.
    pub fn debug(&self) -> bool {
        self.settings.debug
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a [`FetchContext`].
#[derive(Debug, Default)]
pub struct FetchContextBuilder {
    http: Option<Arc<HttpClient>>,
    settings: FetchSettings,
    home_dir: Option<PathBuf>,
    credential_source: CredentialSource,
    cancel: Option<CancellationToken>,
}

impl FetchContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP client.
    #[must_use]
    pub fn http(mut self, http: Arc<HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Sets the fetch settings.
    #[must_use]
    pub fn settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the home directory.
    #[must_use]
    pub fn home_dir(mut self, home: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home.into());
        self
    }

    /// Sets the credential source.
    #[must_use]
    pub fn credential_source(mut self, source: CredentialSource) -> Self {
        self.credential_source = source;
        self
    }

    /// Sets the cancellation token.
    #[must_use]
    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Builds the context, creating an HTTP client from the settings when none
    /// was given.
    pub fn build(self) -> Result<FetchContext, FetchError> {
        let http = match self.http {
            Some(http) => http,
            None => Arc::new(HttpClient::with_timeout(self.settings.timeout)?),
        };

        Ok(FetchContext {
            http,
            settings: self.settings,
            home_dir: self.home_dir,
            credential_source: self.credential_source,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let ctx = FetchContext::builder().build().unwrap();
        assert!(ctx.home_dir().is_none());
        assert_eq!(ctx.credential_source(), CredentialSource::Native);
        assert!(!ctx.debug());
        assert!(!ctx.cancel_token().is_cancelled());
        assert_eq!(ctx.settings.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_builder_shares_cancel_token() {
        let cancel = CancellationToken::new();
        let ctx = FetchContext::builder()
            .home_dir("/home/test")
            .credential_source(CredentialSource::Proxy)
            .settings(FetchSettings::default().with_debug(true))
            .cancel_token(cancel.clone())
            .build()
            .unwrap();

        assert_eq!(ctx.home_dir(), Some(Path::new("/home/test")));
        assert_eq!(ctx.credential_source(), CredentialSource::Proxy);
        assert!(ctx.debug());

        cancel.cancel();
        assert!(ctx.cancel_token().is_cancelled());
    }
}
