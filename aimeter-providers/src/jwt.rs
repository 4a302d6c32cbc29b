//! JWT claim decoding.
//!
//! Only the payload segment is decoded; signatures are not verified. The
//! claims feed client-id, scope and expiry discovery for refresh.

use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// Claim map of a decoded token.
pub type Claims = Map<String, Value>;

/// Errors from JWT decoding.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Fewer than two dot-separated segments.
    #[error("invalid token")]
    Malformed,

    /// The payload is not base64url.
    #[error("invalid payload encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// The payload is not a JSON object.
    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Decodes the payload of a compact JWT.
///
/// Accepts unpadded base64url and falls back to the padded alphabet, adding
/// the missing `=` characters.
pub fn decode_claims(token: &str) -> Result<Claims, JwtError> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next()) {
        (Some(_), Some(payload)) => payload,
        _ => return Err(JwtError::Malformed),
    };

    let decoded = match URL_SAFE_NO_PAD.decode(payload) {
        Ok(bytes) => bytes,
        Err(_) => {
            let padding = "=".repeat((4 - payload.len() % 4) % 4);
            URL_SAFE.decode(format!("{payload}{padding}"))?
        }
    };

    Ok(serde_json::from_slice(&decoded)?)
}

/// `client_id` claim, else `aud` (a string or the first non-empty string of
/// an array).
pub fn client_id(claims: &Claims) -> Option<String> {
    if let Some(id) = explicit_client_id(claims) {
        return Some(id);
    }
    match claims.get("aud")? {
        Value::String(aud) if !aud.is_empty() => Some(aud.clone()),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// Only the `client_id` claim.
///
/// Access tokens carry the API audience in `aud`, which is not a usable OAuth
/// client id.
pub fn explicit_client_id(claims: &Claims) -> Option<String> {
    claims
        .get("client_id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Scopes from `scp`, then `scope`.
pub fn scopes(claims: &Claims) -> Vec<String> {
    claims
        .get("scp")
        .or_else(|| claims.get("scope"))
        .map(normalize_scopes)
        .unwrap_or_default()
}

/// Normalizes an array of strings or a space-delimited string into a list.
pub fn normalize_scopes(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Value::String(s) => s.split_whitespace().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

/// `exp` claim as a timestamp.
pub fn expiry(claims: &Claims) -> Option<DateTime<Utc>> {
    let exp = claims.get("exp")?;
    #[allow(clippy::cast_possible_truncation)]
    let secs = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;
    DateTime::from_timestamp(secs, 0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Builds an unsigned token with the given claims.
    pub(crate) fn make_token(claims: &Value) -> String {
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("eyJhbGciOiJub25lIn0.{payload}.sig")
    }

    #[test]
    fn test_padded_and_unpadded_decode_identically() {
        // 7-byte payload needs one padding character.
        let body = br#"{"a":1}"#;
        let unpadded = format!("h.{}.s", URL_SAFE_NO_PAD.encode(body));
        let padded = format!("h.{}.s", URL_SAFE.encode(body));
        assert_ne!(unpadded, padded);

        let a = decode_claims(&unpadded).unwrap();
        let b = decode_claims(&padded).unwrap();
        assert_eq!(a, b);
        assert_eq!(a["a"], 1);
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(matches!(decode_claims("nodots"), Err(JwtError::Malformed)));
        assert!(matches!(decode_claims("a.!!!.c"), Err(JwtError::Encoding(_))));
        let not_object = format!("h.{}.s", URL_SAFE_NO_PAD.encode("[1,2]"));
        assert!(matches!(decode_claims(&not_object), Err(JwtError::Payload(_))));
    }

    #[test]
    fn test_client_id_prefers_explicit_claim() {
        let claims = decode_claims(&make_token(&json!({
            "client_id": "app_1",
            "aud": "https://api.example.com"
        })))
        .unwrap();
        assert_eq!(client_id(&claims).as_deref(), Some("app_1"));
    }

    #[test]
    fn test_client_id_from_aud() {
        let claims = decode_claims(&make_token(&json!({"aud": ["", "app_2"]}))).unwrap();
        assert_eq!(client_id(&claims).as_deref(), Some("app_2"));
        assert!(explicit_client_id(&claims).is_none());
    }

    #[test]
    fn test_scopes() {
        let claims = decode_claims(&make_token(&json!({"scp": ["openid", "", "email"]}))).unwrap();
        assert_eq!(scopes(&claims), vec!["openid", "email"]);

        let claims = decode_claims(&make_token(&json!({"scope": "a  b c"}))).unwrap();
        assert_eq!(scopes(&claims), vec!["a", "b", "c"]);

        let claims = decode_claims(&make_token(&json!({"scope": 5}))).unwrap();
        assert!(scopes(&claims).is_empty());
    }

    #[test]
    fn test_expiry() {
        let claims = decode_claims(&make_token(&json!({"exp": 1_700_000_000}))).unwrap();
        assert_eq!(expiry(&claims).unwrap().timestamp(), 1_700_000_000);

        let claims = decode_claims(&make_token(&json!({"exp": 1_700_000_000.5}))).unwrap();
        assert_eq!(expiry(&claims).unwrap().timestamp(), 1_700_000_000);
    }
}
