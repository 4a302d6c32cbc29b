//! Gemini (Google) vendor.
//!
//! ## Credentials
//!
//! Proxy files nest the OAuth token and carry the Cloud project:
//!
//! ```json
//! {
//!   "type": "gemini",
//!   "email": "user@example.com",
//!   "project_id": "my-project",
//!   "token": {
//!     "access_token": "...",
//!     "refresh_token": "...",
//!     "client_id": "...",
//!     "client_secret": "...",
//!     "token_uri": "https://oauth2.googleapis.com/token",
//!     "expiry": "2025-01-01T00:00:00Z"
//!   }
//! }
//! ```
//!
//! They are named either `gemini-<email>-<project>.json` or
//! `<email>-<project>.json`. The native file (`~/.gemini/oauth_creds.json`)
//! is flat and has no project.
//!
//! ## Quota API
//!
//! ```text
//! POST https://cloudcode-pa.googleapis.com/v1internal:retrieveUserQuota
//! {"project": "my-project"}
//! ```

mod api;
mod credentials;
mod refresh;

pub use api::{QuotaBucket, QuotaResponse};

use aimeter_core::{Account, UsageRow, VendorKind};
use aimeter_fetch::FetchContext;
use async_trait::async_trait;

use crate::error::ProviderError;
use crate::vendor::Vendor;

/// Default quota API base URL.
pub const DEFAULT_BASE_URL: &str = "https://cloudcode-pa.googleapis.com";

/// Default OAuth token endpoint, used when the file has no `token_uri`.
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// The Gemini vendor.
#[derive(Debug, Clone)]
pub struct GeminiVendor {
    base_url: String,
    token_url: String,
}

impl GeminiVendor {
    /// Creates the vendor with the production endpoints.
    pub fn new() -> Self {
        Self::with_endpoints(DEFAULT_BASE_URL, DEFAULT_TOKEN_URL)
    }

    /// Creates the vendor with custom endpoints.
    pub fn with_endpoints(base_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token_url: token_url.into(),
        }
    }
}

impl Default for GeminiVendor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Vendor for GeminiVendor {
    fn kind(&self) -> VendorKind {
        VendorKind::Gemini
    }

    fn load(&self, ctx: &FetchContext) -> Vec<Account> {
        credentials::load(ctx)
    }

    async fn refresh(
        &self,
        ctx: &FetchContext,
        account: &mut Account,
    ) -> Result<String, ProviderError> {
        refresh::refresh(ctx, &self.token_url, account).await
    }

    async fn query(
        &self,
        ctx: &FetchContext,
        account: &Account,
        token: &str,
    ) -> Result<Vec<UsageRow>, ProviderError> {
        let quota = api::fetch_quota(ctx, &self.base_url, account, token).await?;
        Ok(quota.into_rows(account))
    }
}
