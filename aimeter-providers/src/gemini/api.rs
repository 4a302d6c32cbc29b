//! Gemini quota API.

use aimeter_core::{Account, UsageRow};
use aimeter_fetch::{FetchContext, HttpClient};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::error::ProviderError;
use crate::loader::parse_reset_time;

/// Quota endpoint path.
pub const QUOTA_PATH: &str = "/v1internal:retrieveUserQuota";

/// Response from the quota API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuotaResponse {
    /// One bucket per model.
    #[serde(default)]
    pub buckets: Vec<QuotaBucket>,
}

/// Quota of one model.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaBucket {
    /// Model id, e.g. `gemini-2.5-pro`.
    #[serde(default)]
    pub model_id: String,
    /// Token type the bucket counts.
    #[serde(default)]
    pub token_type: String,
    /// Remaining fraction (0-1).
    #[serde(default)]
    pub remaining_fraction: f64,
    /// Reset time (RFC 3339).
    #[serde(default)]
    pub reset_time: Option<String>,
}

impl QuotaBucket {
    /// Used percentage with the remaining fraction clamped to 0-1.
    pub fn used_percent(&self) -> f64 {
        (1.0 - self.remaining_fraction.clamp(0.0, 1.0)) * 100.0
    }

    fn into_row(self, account: &Account) -> UsageRow {
        let reset = match self.reset_time.as_deref().filter(|s| !s.trim().is_empty()) {
            None => None,
            Some(raw) => match parse_reset_time(raw) {
                Ok(ts) => Some(ts),
                Err(message) => {
                    return UsageRow::account_warning(account, message).with_label(self.model_id);
                }
            },
        };
        UsageRow::window(account, self.model_id.clone(), self.used_percent(), reset)
    }
}

impl QuotaResponse {
    /// One row per bucket.
    pub fn into_rows(self, account: &Account) -> Vec<UsageRow> {
        self.buckets
            .into_iter()
            .map(|bucket| bucket.into_row(account))
            .collect()
    }
}

/// Request body; native accounts have no project and send `{}`.
fn request_body(account: &Account) -> Value {
    if account.project_id.is_empty() {
        json!({})
    } else {
        json!({ "project": account.project_id })
    }
}

#[instrument(skip(ctx, account, token), fields(identity = %account.identity))]
pub(super) async fn fetch_quota(
    ctx: &FetchContext,
    base_url: &str,
    account: &Account,
    token: &str,
) -> Result<QuotaResponse, ProviderError> {
    let url = format!("{}{QUOTA_PATH}", base_url.trim_end_matches('/'));
    let headers = HttpClient::bearer_headers(token)?;

    let response = ctx
        .http
        .post_json(&url, headers, &request_body(account), ctx.cancel_token())
        .await?
        .error_for_status()?;

    let quota: QuotaResponse = response
        .json()
        .map_err(|e| ProviderError::Decode(e.to_string()))?;
    debug!(buckets = quota.buckets.len(), "Parsed Gemini quota");
    Ok(quota)
}
