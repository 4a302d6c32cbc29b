//! Response body helpers for error messages and logs.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum number of body bytes kept in error messages.
pub const MAX_ERROR_BODY_BYTES: usize = 200;

static TOKEN_FIELD: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)("(?:access_token|refresh_token|id_token)"\s*:\s*")[^"]*(")"#).ok()
});

/// Truncates `body` to at most `max` bytes on a char boundary, appending `...`.
///
/// Bodies that already fit are returned unchanged.
pub fn truncate_body(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

/// Replaces OAuth token values in a JSON text with `<redacted>`.
pub fn redact_tokens(body: &str) -> String {
    match TOKEN_FIELD.as_ref() {
        Some(re) => re.replace_all(body, "${1}<redacted>${2}").into_owned(),
        None => "<redacted>".to_string(),
    }
}

/// Body prepared for a debug log line: redacted, then truncated.
pub fn debug_body(body: &str) -> String {
    truncate_body(&redact_tokens(body), MAX_ERROR_BODY_BYTES)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_body_unchanged() {
        assert_eq!(truncate_body("hello", 200), "hello");
        assert_eq!(truncate_body("", 200), "");
    }

    #[test]
    fn test_truncate_respects_utf8_boundary() {
        // 'é' is two bytes; cutting at 3 would split the second one.
        let body = "éééé";
        let out = truncate_body(body, 3);
        assert_eq!(out, "é...");
    }

    #[test]
    fn test_redact_tokens() {
        let body = r#"{"access_token": "sk-abc", "Refresh_Token":"r1","expires_in":3600}"#;
        let out = redact_tokens(body);
        assert!(!out.contains("sk-abc"));
        assert!(!out.contains("r1\""));
        assert!(out.contains(r#""access_token": "<redacted>""#));
        assert!(out.contains("expires_in"));
    }

    #[test]
    fn test_debug_body_redacts_before_truncating() {
        let body = format!(r#"{{"id_token":"{}"}}"#, "a".repeat(400));
        let out = debug_body(&body);
        assert_eq!(out, r#"{"id_token":"<redacted>"}"#);
    }
}
