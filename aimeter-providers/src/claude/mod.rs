//! Claude (Anthropic) vendor.
//!
//! ## Credentials
//!
//! Proxy files (`~/.cli-proxy-api/claude-*.json`) are flat:
//!
//! ```json
//! {
//!   "type": "claude",
//!   "email": "user@example.com",
//!   "access_token": "...",
//!   "refresh_token": "...",
//!   "expired": "2025-01-01T00:00:00Z",
//!   "last_refresh": "2024-12-31T16:00:00Z"
//! }
//! ```
//!
//! The native file (`~/.claude/.credentials.json`) nests the tokens under
//! `claudeAiOauth` with a millisecond `expiresAt`.
//!
//! ## Quota API
//!
//! ```text
//! GET https://api.anthropic.com/api/oauth/usage
//! anthropic-beta: oauth-2025-04-20
//! ```

mod api;
mod credentials;
mod refresh;

pub use api::{UsageResponse, UsageWindow};

use aimeter_core::{Account, UsageRow, VendorKind};
use aimeter_fetch::FetchContext;
use async_trait::async_trait;

use crate::error::ProviderError;
use crate::vendor::Vendor;

/// Default quota API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Default OAuth token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://console.anthropic.com/v1/oauth/token";

/// The Claude vendor.
#[derive(Debug, Clone)]
pub struct ClaudeVendor {
    base_url: String,
    token_url: String,
}

impl ClaudeVendor {
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

impl Default for ClaudeVendor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Vendor for ClaudeVendor {
    fn kind(&self) -> VendorKind {
        VendorKind::Claude
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
        let usage = api::fetch_usage(ctx, &self.base_url, token).await?;
        Ok(usage.into_rows(account))
    }
}
