//! Codex credential loading and label disambiguation.

use aimeter_core::{Account, CredentialSource, VendorKind};
use aimeter_fetch::FetchContext;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::jwt;
use crate::loader::{file_fragment, parse_timestamp, proxy_files, read_json, read_native};
use crate::source::native_credentials_path;

/// OAuth client id of the Codex CLI.
pub const DEFAULT_CLIENT_ID: &str = "app_EMoamEEZ73f0CkXaXp7hrann";

const FILE_PREFIX: &str = "codex-";
const UNKNOWN_LABEL: &str = "unknown";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProxyCredentials {
    access_token: String,
    id_token: String,
    refresh_token: String,
    email: String,
    account_id: String,
    last_refresh: String,
    expired: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NativeFile {
    tokens: NativeTokens,
    last_refresh: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NativeTokens {
    access_token: String,
    refresh_token: String,
    id_token: String,
    account_id: String,
}

/// A proxy account with the names its label is derived from.
struct Discovered {
    account: Account,
    email: String,
    source_name: String,
}

/// Client id and scopes for a refresh grant.
///
/// The ID token is preferred for the client id (its `aud` is the OAuth
/// client). From the access token only an explicit `client_id` claim is
/// accepted, since its `aud` is the API audience. Scopes come from whichever
/// token carries them.
pub fn auth_details(access_token: &str, id_token: &str) -> (String, Vec<String>) {
    let id_claims = jwt::decode_claims(id_token).ok();
    let access_claims = jwt::decode_claims(access_token).ok();

    let client_id = id_claims
        .as_ref()
        .and_then(jwt::client_id)
        .or_else(|| access_claims.as_ref().and_then(jwt::explicit_client_id))
        .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string());

    let scopes = [id_claims.as_ref(), access_claims.as_ref()]
        .into_iter()
        .flatten()
        .map(jwt::scopes)
        .find(|scopes| !scopes.is_empty())
        .unwrap_or_default();

    (client_id, scopes)
}

/// Loads Codex accounts from the context's credential source.
pub(super) fn load(ctx: &FetchContext) -> Vec<Account> {
    match ctx.credential_source() {
        CredentialSource::Proxy => {
            let discovered: Vec<Discovered> = proxy_files(ctx, VendorKind::Codex.proxy_pattern())
                .into_iter()
                .map(load_proxy_file)
                .collect();
            apply_display_names(discovered)
        }
        CredentialSource::Native => load_native(ctx).into_iter().collect(),
    }
}

fn load_proxy_file(path: PathBuf) -> Discovered {
    let source_name = file_fragment(&path, FILE_PREFIX);
    let creds: ProxyCredentials = match read_json(&path) {
        Ok(creds) => creds,
        Err(e) => return failed(source_name, path, e),
    };
    if creds.access_token.is_empty() {
        return failed(source_name, path, "missing access_token".to_string());
    }

    let email = if creds.email.is_empty() {
        source_name.clone()
    } else {
        creds.email
    };
    let (client_id, scopes) = auth_details(&creds.access_token, &creds.id_token);

    let mut account = Account::new(VendorKind::Codex, email.clone(), creds.access_token, Some(path));
    account.refresh_token = creds.refresh_token;
    account.id_token = creds.id_token;
    account.account_id = creds.account_id;
    account.client_id = client_id;
    account.scopes = scopes;
    account.last_refresh = parse_timestamp(&creds.last_refresh);
    account.expiry = parse_timestamp(&creds.expired);

    Discovered {
        account,
        email,
        source_name,
    }
}

fn failed(source_name: String, path: PathBuf, error: String) -> Discovered {
    Discovered {
        account: Account::failed(VendorKind::Codex, source_name.clone(), path, error),
        email: source_name.clone(),
        source_name,
    }
}

/// Assigns identities, disambiguating accounts that share an email.
///
/// A duplicate takes its filename fragment when that differs from the email.
/// When no file of the email has a distinct fragment, `email#<id6>` is used.
fn apply_display_names(discovered: Vec<Discovered>) -> Vec<Account> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut has_alt_source: HashSet<String> = HashSet::new();
    for item in discovered.iter().filter(|d| !d.email.is_empty()) {
        let key = item.email.to_lowercase();
        *counts.entry(key.clone()).or_default() += 1;
        if distinct_source(item) {
            has_alt_source.insert(key);
        }
    }

    discovered
        .into_iter()
        .map(|item| {
            let mut label = [&item.email, &item.source_name]
                .into_iter()
                .find(|s| !s.is_empty())
                .map_or_else(|| UNKNOWN_LABEL.to_string(), Clone::clone);

            let key = item.email.to_lowercase();
            if counts.get(&key).copied().unwrap_or(0) > 1 {
                if distinct_source(&item) {
                    label = item.source_name.clone();
                } else if !has_alt_source.contains(&key) && !item.account.account_id.is_empty() {
                    label = format!("{}#{}", item.email, short_id(&item.account.account_id));
                }
            }

            let mut account = item.account;
            account.identity = label;
            account
        })
        .collect()
}

fn distinct_source(item: &Discovered) -> bool {
    !item.source_name.is_empty() && !item.source_name.eq_ignore_ascii_case(&item.email)
}

/// First six characters of an id.
pub(crate) fn short_id(id: &str) -> &str {
    id.char_indices().nth(6).map_or(id, |(i, _)| &id[..i])
}

fn load_native(ctx: &FetchContext) -> Option<Account> {
    let (path, parsed) = read_native::<NativeFile>(ctx, native_credentials_path(VendorKind::Codex))?;

    let file = match parsed {
        Ok(file) => file,
        Err(e) => return Some(Account::failed_native(VendorKind::Codex, path, e)),
    };
    if file.tokens.access_token.is_empty() {
        let message = format!("no access token found in {}", path.display());
        return Some(Account::failed_native(VendorKind::Codex, path, message));
    }

    let tokens = file.tokens;
    let (client_id, scopes) = auth_details(&tokens.access_token, &tokens.id_token);
    let expiry = jwt::decode_claims(&tokens.access_token)
        .ok()
        .as_ref()
        .and_then(jwt::expiry);

    let mut account = Account::native(VendorKind::Codex, tokens.access_token, path);
    account.refresh_token = tokens.refresh_token;
    account.id_token = tokens.id_token;
    account.account_id = tokens.account_id;
    account.client_id = client_id;
    account.scopes = scopes;
    account.expiry = expiry;
    account.last_refresh = parse_timestamp(&file.last_refresh);
    Some(account)
}

// ============================================================================
// Tests
// ============================================================================
