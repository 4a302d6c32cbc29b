//! Claude usage API.
//!
//! ```json
//! {
//!   "five_hour": {"utilization": 25.0, "resets_at": "2025-01-01T12:00:00Z"},
//!   "seven_day": {"utilization": 45.0, "resets_at": "2025-01-05T00:00:00Z"},
//!   "seven_day_opus": null,
//!   "seven_day_sonnet": {"utilization": 30.0, "resets_at": "2025-01-05T00:00:00Z"}
//! }
//! ```

use aimeter_core::{Account, UsageRow};
use aimeter_fetch::{FetchContext, HttpClient};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::ProviderError;
use crate::loader::parse_reset_time;

/// Usage endpoint path.
pub const USAGE_PATH: &str = "/api/oauth/usage";

/// Beta header value required for OAuth access to the usage endpoint.
pub const ANTHROPIC_BETA: &str = "oauth-2025-04-20";

/// Response from the usage API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageResponse {
    /// 5-hour session window.
    #[serde(default)]
    pub five_hour: Option<UsageWindow>,
    /// 7-day window across models.
    #[serde(default)]
    pub seven_day: Option<UsageWindow>,
    /// 7-day Opus window.
    #[serde(default)]
    pub seven_day_opus: Option<UsageWindow>,
    /// 7-day Sonnet window.
    #[serde(default)]
    pub seven_day_sonnet: Option<UsageWindow>,
}

/// One usage window.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageWindow {
    /// Used percentage (0-100).
    #[serde(default)]
    pub utilization: f64,
    /// Reset time (RFC 3339).
    #[serde(default)]
    pub resets_at: Option<String>,
}

impl UsageResponse {
    /// Converts the present windows into rows.
    pub fn into_rows(self, account: &Account) -> Vec<UsageRow> {
        [
            ("5-hour", self.five_hour),
            ("7-day", self.seven_day),
            ("7-day Opus", self.seven_day_opus),
            ("7-day Sonnet", self.seven_day_sonnet),
        ]
        .into_iter()
        .filter_map(|(label, window)| window.map(|w| w.into_row(account, label)))
        .collect()
    }
}

impl UsageWindow {
    fn into_row(self, account: &Account, label: &str) -> UsageRow {
        let reset = match self.resets_at.as_deref().filter(|s| !s.trim().is_empty()) {
            None => None,
            Some(raw) => match parse_reset_time(raw) {
                Ok(ts) => Some(ts),
                Err(message) => {
                    return UsageRow::account_warning(account, message).with_label(label);
                }
            },
        };
        UsageRow::window(account, label, self.utilization, reset)
    }
}

#[instrument(skip(ctx, token))]
pub(super) async fn fetch_usage(
    ctx: &FetchContext,
    base_url: &str,
    token: &str,
) -> Result<UsageResponse, ProviderError> {
    let url = format!("{}{USAGE_PATH}", base_url.trim_end_matches('/'));
    let mut headers = HttpClient::bearer_headers(token)?;
    HttpClient::insert_header(&mut headers, "anthropic-beta", ANTHROPIC_BETA)?;

    let response = ctx
        .http
        .get(&url, headers, ctx.cancel_token())
        .await?
        .error_for_status()?;

    let usage: UsageResponse = response
        .json()
        .map_err(|e| ProviderError::Decode(e.to_string()))?;
    debug!(
        five_hour = usage.five_hour.is_some(),
        seven_day = usage.seven_day.is_some(),
        "Parsed Claude usage"
    );
    Ok(usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimeter_core::VendorKind;

    fn account() -> Account {
        Account::new(VendorKind::Claude, "a@example.com", "t", None)
    }

    #[test]
    fn test_rows_for_present_windows() {
        let usage: UsageResponse = serde_json::from_str(
            r#"{"five_hour":{"utilization":25.0,"resets_at":"2025-01-01T12:00:00Z"},
                "seven_day":{"utilization":45.5,"resets_at":"2025-01-05T00:00:00.123456+00:00"},
                "seven_day_opus":null}"#,
        )
        .unwrap();

        let rows = usage.into_rows(&account());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "5-hour");
        assert!((rows[0].usage_percent - 25.0).abs() < f64::EPSILON);
        assert_eq!(rows[1].label, "7-day");
        assert!(rows[1].reset_time.is_some());
        assert!(rows.iter().all(|r| r.identity == "a@example.com"));
    }

    #[test]
    fn test_invalid_reset_becomes_window_warning() {
        let usage: UsageResponse = serde_json::from_str(
            r#"{"five_hour":{"utilization":10,"resets_at":"tomorrow"},
                "seven_day_sonnet":{"utilization":5}}"#,
        )
        .unwrap();

        let rows = usage.into_rows(&account());
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_warning);
        assert_eq!(rows[0].label, "5-hour");
        assert!(rows[0]
            .message
            .as_deref()
            .unwrap()
            .starts_with("Parse error: invalid reset time format"));

        assert_eq!(rows[1].label, "7-day Sonnet");
        assert!(!rows[1].is_warning);
        assert!(rows[1].reset_time.is_none());
    }

    #[test]
    fn test_empty_response_has_no_rows() {
        let usage: UsageResponse = serde_json::from_str("{}").unwrap();
        assert!(usage.into_rows(&account()).is_empty());
    }
}
