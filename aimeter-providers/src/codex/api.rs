//! Codex usage API.
//!
//! ```json
//! {
//!   "plan_type": "plus",
//!   "rate_limit": {
//!     "primary_window": {"used_percent": 12.0, "reset_at": 1735700000},
//!     "secondary_window": {"used_percent": 40.0, "reset_at": 1736200000}
//!   }
//! }
//! ```

use aimeter_core::{Account, UsageRow};
use aimeter_fetch::{FetchContext, HttpClient};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::instrument;

use super::credentials::short_id;
use crate::error::ProviderError;

/// Usage endpoint path.
pub const USAGE_PATH: &str = "/backend-api/wham/usage";

/// Response from the usage API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageResponse {
    /// Subscription plan, e.g. `plus`.
    #[serde(default)]
    pub plan_type: String,
    /// Rate limit windows.
    #[serde(default)]
    pub rate_limit: Option<RateLimit>,
}

/// Rate limit windows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateLimit {
    /// 5-hour window.
    #[serde(default)]
    pub primary_window: Option<UsageWindow>,
    /// 7-day window.
    #[serde(default)]
    pub secondary_window: Option<UsageWindow>,
}

/// One rate limit window.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageWindow {
    /// Used percentage (0-100).
    #[serde(default)]
    pub used_percent: f64,
    /// Reset time in unix seconds; zero when unknown.
    #[serde(default)]
    pub reset_at: i64,
}

impl UsageWindow {
    fn reset_time(&self) -> Option<DateTime<Utc>> {
        if self.reset_at <= 0 {
            None
        } else {
            DateTime::from_timestamp(self.reset_at, 0)
        }
    }
}

impl UsageResponse {
    /// Converts the windows into rows carrying debug metadata for `token`.
    pub fn into_rows(self, account: &Account, token: &str) -> Vec<UsageRow> {
        let debug = account_debug(account, token, &self.plan_type);
        let Some(limits) = self.rate_limit else {
            return Vec::new();
        };

        [("5-hour", limits.primary_window), ("7-day", limits.secondary_window)]
            .into_iter()
            .filter_map(|(label, window)| {
                let window = window?;
                Some(
                    UsageRow::window(account, label, window.used_percent, window.reset_time())
                        .with_debug_info(debug.clone()),
                )
            })
            .collect()
    }
}

/// First four bytes of the token's SHA-256, hex encoded.
pub fn token_fingerprint(token: &str) -> String {
    if token.is_empty() {
        return String::new();
    }
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..4])
}

/// `acct:<id6> plan:<plan> token:<fingerprint>`, skipping empty parts.
pub fn account_debug(account: &Account, token: &str, plan: &str) -> String {
    let mut parts = Vec::with_capacity(3);
    if !account.account_id.is_empty() {
        parts.push(format!("acct:{}", short_id(&account.account_id)));
    }
    if !plan.is_empty() {
        parts.push(format!("plan:{plan}"));
    }
    let fingerprint = token_fingerprint(token);
    if !fingerprint.is_empty() {
        parts.push(format!("token:{fingerprint}"));
    }
    parts.join(" ")
}

#[instrument(skip(ctx, account, token), fields(identity = %account.identity))]
pub(super) async fn fetch_usage(
    ctx: &FetchContext,
    base_url: &str,
    account: &Account,
    token: &str,
) -> Result<UsageResponse, ProviderError> {
    let url = format!("{}{USAGE_PATH}", base_url.trim_end_matches('/'));
    let mut headers = HttpClient::bearer_headers(token)?;
    if !account.account_id.is_empty() {
        HttpClient::insert_header(&mut headers, "chatgpt-account-id", &account.account_id)?;
    }

    let response = ctx
        .http
        .get(&url, headers, ctx.cancel_token())
        .await?
        .error_for_status()?;

    response
        .json()
        .map_err(|e| ProviderError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimeter_core::VendorKind;

    fn account(account_id: &str) -> Account {
        let mut account = Account::new(VendorKind::Codex, "a@example.com", "tok", None);
        account.account_id = account_id.to_string();
        account
    }

    #[test]
    fn test_fingerprint() {
        // sha256("abc") = ba7816bf...
        assert_eq!(token_fingerprint("abc"), "ba7816bf");
        assert_eq!(token_fingerprint(""), "");
    }

    #[test]
    fn test_account_debug_skips_empty_parts() {
        assert_eq!(
            account_debug(&account("acct_123456789"), "abc", "plus"),
            "acct:acct_1 plan:plus token:ba7816bf"
        );
        assert_eq!(account_debug(&account(""), "", ""), "");
        assert_eq!(account_debug(&account(""), "abc", ""), "token:ba7816bf");
    }

    #[test]
    fn test_rows() {
        let usage: UsageResponse = serde_json::from_str(
            r#"{"plan_type":"pro","rate_limit":{
                "primary_window":{"used_percent":12.5,"reset_at":1735700000},
                "secondary_window":{"used_percent":40,"reset_at":0}}}"#,
        )
        .unwrap();
        let rows = usage.into_rows(&account(""), "abc");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "5-hour");
        assert_eq!(rows[0].reset_time.unwrap().timestamp(), 1_735_700_000);
        assert_eq!(rows[0].debug_info.as_deref(), Some("plan:pro token:ba7816bf"));
        assert_eq!(rows[1].label, "7-day");
        assert!(rows[1].reset_time.is_none());
    }

    #[test]
    fn test_missing_rate_limit_has_no_rows() {
        let usage: UsageResponse = serde_json::from_str(r#"{"plan_type":"free"}"#).unwrap();
        assert!(usage.into_rows(&account(""), "abc").is_empty());
    }
}
