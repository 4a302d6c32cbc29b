//! Codex token refresh (form grant).

use aimeter_core::Account;
use aimeter_fetch::FetchContext;
use chrono::Utc;
use tracing::instrument;

use super::credentials::DEFAULT_CLIENT_ID;
use crate::error::ProviderError;
use crate::refresh::{ensure_refreshable, exchange, persist_and_apply, write_flat_tokens, GrantBody};

pub(super) fn grant(account: &Account) -> GrantBody {
    let client_id = if account.client_id.is_empty() {
        DEFAULT_CLIENT_ID.to_string()
    } else {
        account.client_id.clone()
    };

    let mut form = vec![
        ("grant_type", "refresh_token".to_string()),
        ("refresh_token", account.refresh_token.clone()),
        ("client_id", client_id),
    ];
    if !account.scopes.is_empty() {
        form.push(("scope", account.scopes.join(" ")));
    }
    GrantBody::Form(form)
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
        write_flat_tokens(data, tokens, now, true);
        Ok(())
    })
}
