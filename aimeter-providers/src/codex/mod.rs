//! Codex (OpenAI) vendor.
//!
//! Proxy files (`~/.cli-proxy-api/codex-*.json`) hold flat `access_token`,
//! `id_token`, `refresh_token`, `email` and `account_id` fields. The native
//! file (`~/.codex/auth.json`) nests them under `tokens`.
//!
//! Several files may belong to the same email (one per workspace); their
//! labels are disambiguated by filename or by a short account id.

mod api;
mod credentials;
mod refresh;

pub use api::{account_debug, token_fingerprint, RateLimit, UsageResponse, UsageWindow};
pub use credentials::{auth_details, DEFAULT_CLIENT_ID};

use aimeter_core::{Account, UsageRow, VendorKind};
use aimeter_fetch::FetchContext;
use async_trait::async_trait;

use crate::error::ProviderError;
use crate::vendor::Vendor;

/// Default quota API base URL.
pub const DEFAULT_BASE_URL: &str = "https://chatgpt.com";

/// Default OAuth token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://auth.openai.com/oauth/token";

/// The Codex vendor.
#[derive(Debug, Clone)]
pub struct CodexVendor {
    base_url: String,
    token_url: String,
}

impl CodexVendor {
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

impl Default for CodexVendor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Vendor for CodexVendor {
    fn kind(&self) -> VendorKind {
        VendorKind::Codex
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
        let usage = api::fetch_usage(ctx, &self.base_url, account, token).await?;
        Ok(usage.into_rows(account, token))
    }

    fn debug_info(&self, account: &Account) -> Option<String> {
        let info = account_debug(account, account.access_token(), "");
        (!info.is_empty()).then_some(info)
    }
}
