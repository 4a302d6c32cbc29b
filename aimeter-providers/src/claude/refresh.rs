//! Claude token refresh (JSON grant).

use aimeter_core::Account;
use aimeter_fetch::FetchContext;
use chrono::Utc;
use serde_json::json;
use tracing::instrument;

use crate::error::ProviderError;
use crate::refresh::{ensure_refreshable, exchange, persist_and_apply, write_flat_tokens, GrantBody};

/// OAuth client id of the Claude CLI.
pub const CLIENT_ID: &str = "9d1c250a-e61b-44d9-88ed-5944d1962f5e";

/// Scopes requested when the account does not list its own.
pub const DEFAULT_SCOPES: &[&str] = &["user:profile", "user:inference", "user:sessions:claude_code"];

pub(super) fn grant(account: &Account) -> GrantBody {
    let scope = if account.scopes.is_empty() {
        DEFAULT_SCOPES.join(" ")
    } else {
        account.scopes.join(" ")
    };
    let client_id = if account.client_id.is_empty() {
        CLIENT_ID
    } else {
        account.client_id.as_str()
    };

    GrantBody::Json(json!({
        "grant_type": "refresh_token",
        "refresh_token": account.refresh_token,
        "client_id": client_id,
        "scope": scope,
    }))
}

#[instrument(skip_all, fields(identity = %account.identity))]
pub(super) async fn refresh(
    ctx: &FetchContext,
    token_url: &str,
    account: &mut Account,
) -> Result<String, ProviderError> {
    ensure_refreshable(account)?;
    let tokens = exchange(ctx, token_url, &grant(account)).await?;
    persist_and_apply(account, tokens, Utc::now(), |data, tokens, now| {
        write_flat_tokens(data, tokens, now, false);
        Ok(())
    })
}
