//! Shared OAuth refresh plumbing.
//!
//! Vendors differ in grant encoding and in where the rotated tokens live in
//! their files; the exchange, response parsing and the persist-then-apply
//! ordering are common and live here.

use aimeter_core::Account;
use aimeter_fetch::{debug_body, FetchContext};
use aimeter_store::{format_credential_time, update_json_credentials, StoreError};
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ProviderError;

const ACCESS_TOKEN_KEYS: &[&str] = &["access_token", "accessToken", "token"];
const REFRESH_TOKEN_KEYS: &[&str] = &["refresh_token", "refreshToken"];
const ID_TOKEN_KEYS: &[&str] = &["id_token", "idToken"];
const EXPIRES_IN_KEYS: &[&str] = &["expires_in", "expiresIn"];

// ============================================================================
// Token Response
// ============================================================================

/// Tokens returned by a refresh grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    /// New access token (never empty).
    pub access_token: String,
    /// Rotated refresh token, when the server issued one.
    pub refresh_token: Option<String>,
    /// New ID token, when the server issued one.
    pub id_token: Option<String>,
    /// Lifetime of the access token in seconds.
    pub expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct TypedTokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    /// Absolute expiry computed from `expires_in`, when positive.
    ///
    /// Lifetimes beyond the representable time range count as unknown.
    pub fn expiry(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in
            .filter(|secs| *secs > 0)
            .and_then(TimeDelta::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
    }
}

/// Parses a token endpoint answer.
///
/// The standard snake_case shape is tried first; otherwise the generic map is
/// probed for the camelCase and legacy key variants.
pub fn parse_token_response(body: &str) -> Result<TokenResponse, ProviderError> {
    if let Ok(typed) = serde_json::from_str::<TypedTokenResponse>(body) {
        if !typed.access_token.is_empty() {
            return Ok(TokenResponse {
                access_token: typed.access_token,
                refresh_token: typed.refresh_token.filter(|t| !t.is_empty()),
                id_token: typed.id_token.filter(|t| !t.is_empty()),
                expires_in: typed.expires_in,
            });
        }
    }

    let raw: Map<String, Value> = serde_json::from_str(body)
        .map_err(|e| ProviderError::Refresh(format!("invalid response: {e}")))?;

    let access_token = string_field(&raw, ACCESS_TOKEN_KEYS)
        .ok_or_else(|| ProviderError::Refresh("empty access_token".to_string()))?;

    Ok(TokenResponse {
        access_token,
        refresh_token: string_field(&raw, REFRESH_TOKEN_KEYS),
        id_token: string_field(&raw, ID_TOKEN_KEYS),
        expires_in: int_field(&raw, EXPIRES_IN_KEYS),
    })
}

fn string_field(raw: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| raw.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn int_field(raw: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| match raw.get(*key)? {
        #[allow(clippy::cast_possible_truncation)]
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

// ============================================================================
// Grant Exchange
// ============================================================================

/// Encoding of a refresh grant.
#[derive(Debug, Clone)]
pub enum GrantBody {
    /// `application/json` body.
    Json(Value),
    /// `application/x-www-form-urlencoded` body.
    Form(Vec<(&'static str, String)>),
}

/// Fails unless `account` may be refreshed at all.
///
/// Native accounts are refused before any network traffic, whatever refresh
/// token they hold.
pub fn ensure_refreshable(account: &Account) -> Result<(), ProviderError> {
    if account.is_native() {
        return Err(ProviderError::NativeRefreshRefused {
            vendor: account.vendor.cli_name(),
        });
    }
    if !account.has_refresh_token() {
        return Err(ProviderError::RefreshUnavailable);
    }
    Ok(())
}

/// Posts a refresh grant and parses the answer.
pub async fn exchange(
    ctx: &FetchContext,
    url: &str,
    grant: &GrantBody,
) -> Result<TokenResponse, ProviderError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let cancel = ctx.cancel_token();
    let response = match grant {
        GrantBody::Json(body) => ctx.http.post_json(url, headers, body, cancel).await?,
        GrantBody::Form(form) => ctx.http.post_form(url, headers, form, cancel).await?,
    };

    if !response.is_success() {
        debug!(
            status = %response.status,
            body = %debug_body(&response.body),
            "Token refresh rejected"
        );
    }
    let response = response.error_for_status()?;

    parse_token_response(&response.body).inspect_err(|e| {
        warn!(error = %e, body = %debug_body(&response.body), "Unusable token refresh response");
    })
}

// ============================================================================
// Persistence
// ============================================================================

/// Writes rotated tokens to the account's file, then installs them in memory.
///
/// `write` receives the file's top-level object, the tokens and the formatted
/// refresh time. If the write fails the account is left unchanged.
pub fn persist_and_apply<F>(
    account: &mut Account,
    tokens: TokenResponse,
    now: DateTime<Utc>,
    write: F,
) -> Result<String, ProviderError>
where
    F: FnOnce(&mut Map<String, Value>, &TokenResponse, DateTime<Utc>) -> Result<(), StoreError>,
{
    let path = account
        .source_path
        .clone()
        .ok_or(ProviderError::CredentialPathUnavailable)?;

    update_json_credentials(&path, |data| write(data, &tokens, now))?;
    debug!(path = %path.display(), identity = %account.identity, "Persisted refreshed token");

    let expiry = tokens.expiry(now);
    let access_token = tokens.access_token.clone();
    account.apply_refresh(
        tokens.access_token,
        tokens.refresh_token,
        tokens.id_token,
        expiry,
        now,
    );
    Ok(access_token)
}

/// Writes tokens into a flat credential object (`access_token`,
/// `refresh_token`, `id_token`, `last_refresh`, `expired`).
///
/// Absent refresh and ID tokens leave the stored ones in place.
pub fn write_flat_tokens(
    data: &mut Map<String, Value>,
    tokens: &TokenResponse,
    now: DateTime<Utc>,
    include_id_token: bool,
) {
    data.insert("access_token".into(), Value::from(tokens.access_token.as_str()));
    if let Some(refresh) = &tokens.refresh_token {
        data.insert("refresh_token".into(), Value::from(refresh.as_str()));
    }
    if include_id_token {
        if let Some(id) = &tokens.id_token {
            data.insert("id_token".into(), Value::from(id.as_str()));
        }
    }
    data.insert("last_refresh".into(), Value::from(format_credential_time(now)));
    if let Some(expiry) = tokens.expiry(now) {
        data.insert("expired".into(), Value::from(format_credential_time(expiry)));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use aimeter_core::VendorKind;
    use chrono::TimeZone;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_parse_standard_response() {
        let tokens = parse_token_response(
            r#"{"access_token":"a1","refresh_token":"r1","expires_in":3600,"token_type":"Bearer"}"#,
        )
        .unwrap();
        assert_eq!(tokens.access_token, "a1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("r1"));
        assert_eq!(tokens.expires_in, Some(3600));
        assert!(tokens.id_token.is_none());
    }

    #[test]
    fn test_parse_camel_case_and_string_expiry() {
        let tokens = parse_token_response(
            r#"{"accessToken":"a2","refreshToken":"r2","idToken":"i2","expiresIn":"120"}"#,
        )
        .unwrap();
        assert_eq!(tokens.access_token, "a2");
        assert_eq!(tokens.refresh_token.as_deref(), Some("r2"));
        assert_eq!(tokens.id_token.as_deref(), Some("i2"));
        assert_eq!(tokens.expires_in, Some(120));
    }

    #[test]
    fn test_parse_token_key() {
        let tokens = parse_token_response(r#"{"token":"a3"}"#).unwrap();
        assert_eq!(tokens.access_token, "a3");
        assert!(tokens.expires_in.is_none());
    }

    #[test]
    fn test_parse_missing_access_token() {
        let err = parse_token_response(r#"{"access_token":"","expires_in":10}"#).unwrap_err();
        assert_eq!(err.to_string(), "token refresh failed: empty access_token");

        let err = parse_token_response("not json").unwrap_err();
        assert!(matches!(err, ProviderError::Refresh(_)));
    }

    #[test]
    fn test_expiry_ignores_non_positive() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut tokens = parse_token_response(r#"{"access_token":"a","expires_in":0}"#).unwrap();
        assert!(tokens.expiry(now).is_none());
        tokens.expires_in = Some(60);
        assert_eq!(tokens.expiry(now), Some(now + TimeDelta::seconds(60)));
    }

    #[test]
    fn test_out_of_range_lifetime_is_unknown() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        let tokens =
            parse_token_response(r#"{"access_token":"a","expires_in":10000000000000000}"#).unwrap();
        assert_eq!(tokens.expires_in, Some(10_000_000_000_000_000));
        assert!(tokens.expiry(now).is_none());

        let tokens =
            parse_token_response(r#"{"accessToken":"a","expiresIn":"99999999999999"}"#).unwrap();
        assert!(tokens.expiry(now).is_none());

        let mut data = Map::new();
        write_flat_tokens(&mut data, &tokens, now, false);
        assert_eq!(data["access_token"], "a");
        assert!(data.get("expired").is_none());
    }

    #[test]
    fn test_ensure_refreshable() {
        let mut native = Account::native(VendorKind::Codex, "t", PathBuf::from("/x"));
        native.refresh_token = "r".into();
        assert!(matches!(
            ensure_refreshable(&native),
            Err(ProviderError::NativeRefreshRefused { vendor: "codex" })
        ));

        let mut proxy = Account::new(VendorKind::Claude, "a", "t", None);
        assert!(matches!(
            ensure_refreshable(&proxy),
            Err(ProviderError::RefreshUnavailable)
        ));
        proxy.refresh_token = "r".into();
        assert!(ensure_refreshable(&proxy).is_ok());
    }

    #[test]
    fn test_persist_without_path() {
        let mut account = Account::new(VendorKind::Claude, "a", "old", None);
        let tokens = parse_token_response(r#"{"access_token":"new"}"#).unwrap();
        let err = persist_and_apply(&mut account, tokens, Utc::now(), |_, _, _| Ok(())).unwrap_err();
        assert!(matches!(err, ProviderError::CredentialPathUnavailable));
        assert_eq!(account.access_token(), "old");
    }

    #[test]
    fn test_write_flat_tokens() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut data: Map<String, Value> =
            serde_json::from_value(json!({"refresh_token": "keep", "email": "x"})).unwrap();
        let tokens = TokenResponse {
            access_token: "a".into(),
            refresh_token: None,
            id_token: Some("i".into()),
            expires_in: Some(3600),
        };

        write_flat_tokens(&mut data, &tokens, now, false);
        assert_eq!(data["access_token"], "a");
        assert_eq!(data["refresh_token"], "keep");
        assert!(data.get("id_token").is_none());
        assert_eq!(data["last_refresh"], "2025-01-01T00:00:00Z");
        assert_eq!(data["expired"], "2025-01-01T01:00:00Z");

        write_flat_tokens(&mut data, &tokens, now, true);
        assert_eq!(data["id_token"], "i");
    }
}
