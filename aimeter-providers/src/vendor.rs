//! The vendor trait.

use aimeter_core::{Account, CredentialSource, UsageRow, VendorKind};
use aimeter_fetch::FetchContext;
use async_trait::async_trait;

use crate::error::ProviderError;
use crate::source::native_credentials_path;

/// One OAuth-authenticated vendor: how its credentials are found, refreshed
/// and used against its quota API.
#[async_trait]
pub trait Vendor: Send + Sync {
    /// Which vendor this is.
    fn kind(&self) -> VendorKind;

    /// Discovers and normalizes accounts from the context's credential
    /// source. Per-file problems become failed accounts, never errors.
    fn load(&self, ctx: &FetchContext) -> Vec<Account>;

    /// Runs the refresh grant, persists the rotated tokens, and only then
    /// installs them on `account`. Returns the new access token.
    async fn refresh(
        &self,
        ctx: &FetchContext,
        account: &mut Account,
    ) -> Result<String, ProviderError>;

    /// Calls the quota API with `token` and converts the answer into rows.
    async fn query(
        &self,
        ctx: &FetchContext,
        account: &Account,
        token: &str,
    ) -> Result<Vec<UsageRow>, ProviderError>;

    /// Debug metadata attached to an account's warning rows.
    fn debug_info(&self, _account: &Account) -> Option<String> {
        None
    }

    /// Warning shown when no account was found.
    fn no_credentials_message(&self, source: CredentialSource) -> String {
        match source {
            CredentialSource::Proxy => format!(
                "No credential files found matching ~/.cli-proxy-api/{}",
                self.kind().proxy_pattern()
            ),
            CredentialSource::Native => format!(
                "No credentials found in ~/{}",
                native_credentials_path(self.kind())
            ),
        }
    }
}
