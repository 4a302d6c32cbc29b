//! Gemini credential loading.

use aimeter_core::{Account, CredentialSource, VendorKind};
use aimeter_fetch::FetchContext;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::loader::{file_fragment, from_millis, parse_timestamp, proxy_files, read_json, read_native};
use crate::source::native_credentials_path;

const FILE_PREFIX: &str = "gemini-";
const FOREIGN_PREFIXES: &[&str] = &["claude-", "codex-"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProxyCredentials {
    token: ProxyToken,
    project_id: String,
    email: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProxyToken {
    access_token: String,
    refresh_token: String,
    client_id: String,
    client_secret: String,
    token_uri: String,
    expiry: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NativeCredentials {
    access_token: String,
    refresh_token: String,
    expiry_date: i64,
    client_id: String,
    client_secret: String,
}

/// Why a proxy file did not yield an account.
enum Rejection {
    /// Not a Gemini credential at all.
    Foreign,
    /// A Gemini credential that cannot be used.
    Invalid(String),
}

/// Loads Gemini accounts from the context's credential source.
pub(super) fn load(ctx: &FetchContext) -> Vec<Account> {
    match ctx.credential_source() {
        CredentialSource::Proxy => proxy_files(ctx, "*.json")
            .into_iter()
            .filter(|path| !has_foreign_prefix(path))
            .filter_map(load_proxy_file)
            .collect(),
        CredentialSource::Native => load_native(ctx).into_iter().collect(),
    }
}

fn has_foreign_prefix(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| FOREIGN_PREFIXES.iter().any(|p| name.starts_with(p)))
}

fn load_proxy_file(path: PathBuf) -> Option<Account> {
    let stem = file_fragment(&path, FILE_PREFIX);
    let prefixed = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with(FILE_PREFIX));

    match parse_proxy_file(&path, &stem) {
        Ok(account) => Some(account),
        Err(Rejection::Invalid(message)) if prefixed => {
            Some(Account::failed(VendorKind::Gemini, stem, path, message))
        }
        Err(Rejection::Invalid(message)) => {
            debug!(path = %path.display(), reason = %message, "Skipping unrecognized credential file");
            None
        }
        Err(Rejection::Foreign) => {
            debug!(path = %path.display(), "Skipping non-Gemini credential file");
            None
        }
    }
}

fn parse_proxy_file(path: &Path, stem: &str) -> Result<Account, Rejection> {
    let creds: ProxyCredentials = read_json(path).map_err(Rejection::Invalid)?;

    if !creds.kind.is_empty() && creds.kind != "gemini" {
        return Err(Rejection::Foreign);
    }
    if creds.token.access_token.is_empty() {
        return Err(Rejection::Invalid("missing token.access_token".to_string()));
    }
    if creds.project_id.is_empty() {
        return Err(Rejection::Invalid("missing project_id".to_string()));
    }

    let suffix = format!("-{}", creds.project_id);
    let identity = match stem.strip_suffix(&suffix) {
        Some(email) if !email.is_empty() => email.to_string(),
        _ if !creds.email.is_empty() => creds.email.clone(),
        _ => return Err(Rejection::Foreign),
    };

    let token = creds.token;
    let mut account = Account::new(
        VendorKind::Gemini,
        identity,
        token.access_token,
        Some(path.to_path_buf()),
    );
    account.refresh_token = token.refresh_token;
    account.client_id = token.client_id;
    account.client_secret = token.client_secret;
    account.token_uri = token.token_uri;
    account.expiry = parse_timestamp(&token.expiry);
    account.project_id = creds.project_id;
    Ok(account)
}

fn load_native(ctx: &FetchContext) -> Option<Account> {
    let (path, parsed) =
        read_native::<NativeCredentials>(ctx, native_credentials_path(VendorKind::Gemini))?;

    let creds = match parsed {
        Ok(creds) => creds,
        Err(e) => return Some(Account::failed_native(VendorKind::Gemini, path, e)),
    };
    if creds.access_token.is_empty() {
        let message = format!("no access token found in {}", path.display());
        return Some(Account::failed_native(VendorKind::Gemini, path, message));
    }

    let mut account = Account::native(VendorKind::Gemini, creds.access_token, path);
    account.refresh_token = creds.refresh_token;
    account.expiry = from_millis(creds.expiry_date);
    account.client_id = creds.client_id;
    account.client_secret = creds.client_secret;
    Some(account)
}

// ============================================================================
// Tests
// ============================================================================
