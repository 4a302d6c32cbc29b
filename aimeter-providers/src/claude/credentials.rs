//! Claude credential loading.

use aimeter_core::{Account, CredentialSource, VendorKind};
use aimeter_fetch::FetchContext;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

use crate::jwt::normalize_scopes;
use crate::loader::{file_fragment, from_millis, parse_timestamp, proxy_files, read_json, read_native};
use crate::source::native_credentials_path;

const FILE_PREFIX: &str = "claude-";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProxyCredentials {
    access_token: String,
    refresh_token: String,
    email: String,
    #[serde(rename = "type")]
    kind: String,
    expired: String,
    last_refresh: String,
    scope: Option<Value>,
    scopes: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NativeFile {
    claude_ai_oauth: NativeOauth,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NativeOauth {
    access_token: String,
    refresh_token: String,
    expires_at: i64,
    scopes: Vec<String>,
}

/// Loads Claude accounts from the context's credential source.
pub(super) fn load(ctx: &FetchContext) -> Vec<Account> {
    match ctx.credential_source() {
        CredentialSource::Proxy => proxy_files(ctx, VendorKind::Claude.proxy_pattern())
            .into_iter()
            .filter_map(load_proxy_file)
            .collect(),
        CredentialSource::Native => load_native(ctx).into_iter().collect(),
    }
}

fn load_proxy_file(path: PathBuf) -> Option<Account> {
    let fragment = file_fragment(&path, FILE_PREFIX);
    let creds: ProxyCredentials = match read_json(&path) {
        Ok(creds) => creds,
        Err(e) => return Some(Account::failed(VendorKind::Claude, fragment, path, e)),
    };

    if !creds.kind.is_empty() && creds.kind != "claude" {
        debug!(path = %path.display(), kind = %creds.kind, "Skipping non-Claude credential");
        return None;
    }

    let identity = if creds.email.trim().is_empty() {
        fragment
    } else {
        creds.email.trim().to_string()
    };

    if creds.access_token.is_empty() {
        return Some(Account::failed(
            VendorKind::Claude,
            identity,
            path,
            "missing access_token",
        ));
    }

    let mut account = Account::new(VendorKind::Claude, identity, creds.access_token, Some(path));
    account.refresh_token = creds.refresh_token;
    account.expiry = parse_timestamp(&creds.expired);
    account.last_refresh = parse_timestamp(&creds.last_refresh);
    account.scopes = creds
        .scopes
        .or(creds.scope)
        .as_ref()
        .map(normalize_scopes)
        .unwrap_or_default();
    Some(account)
}

fn load_native(ctx: &FetchContext) -> Option<Account> {
    let (path, parsed) =
        read_native::<NativeFile>(ctx, native_credentials_path(VendorKind::Claude))?;

    let oauth = match parsed {
        Ok(file) => file.claude_ai_oauth,
        Err(e) => return Some(Account::failed_native(VendorKind::Claude, path, e)),
    };
    if oauth.access_token.is_empty() {
        let message = format!("no access token found in {}", path.display());
        return Some(Account::failed_native(VendorKind::Claude, path, message));
    }

    let mut account = Account::native(VendorKind::Claude, oauth.access_token, path);
    account.refresh_token = oauth.refresh_token;
    account.expiry = from_millis(oauth.expires_at);
    account.scopes = oauth.scopes;
    Some(account)
}

// ============================================================================
// Tests
// ============================================================================
