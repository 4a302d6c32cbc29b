//! Gemini token refresh (form grant, tokens nested under `token`).

use aimeter_core::Account;
use aimeter_fetch::FetchContext;
use aimeter_store::{format_credential_time, nested_object_mut};
use chrono::Utc;
use serde_json::Value;
use tracing::instrument;

use crate::error::ProviderError;
use crate::refresh::{ensure_refreshable, exchange, persist_and_apply, GrantBody};

pub(super) fn grant(account: &Account) -> Result<GrantBody, ProviderError> {
    if account.client_id.is_empty() {
        return Err(ProviderError::RefreshUnavailable);
    }
    let mut form = vec![
        ("grant_type", "refresh_token".to_string()),
        ("refresh_token", account.refresh_token.clone()),
        ("client_id", account.client_id.clone()),
    ];
    if !account.client_secret.is_empty() {
        form.push(("client_secret", account.client_secret.clone()));
    }
    Ok(GrantBody::Form(form))
}

#[instrument(skip_all, fields(identity = %account.identity))]
pub(super) async fn refresh(
    ctx: &FetchContext,
    default_token_url: &str,
    account: &mut Account,
) -> Result<String, ProviderError> {
    ensure_refreshable(account)?;
    let grant = grant(account)?;
    let token_url = if account.token_uri.is_empty() {
        default_token_url.to_string()
    } else {
        account.token_uri.clone()
    };

    let tokens = exchange(ctx, &token_url, &grant).await?;
    persist_and_apply(account, tokens, Utc::now(), |data, tokens, now| {
        let token = nested_object_mut(data, "token")?;
        token.insert("access_token".into(), Value::from(tokens.access_token.as_str()));
        if let Some(refresh) = &tokens.refresh_token {
            token.insert("refresh_token".into(), Value::from(refresh.as_str()));
        }
        if let Some(expiry) = tokens.expiry(now) {
            token.insert("expiry".into(), Value::from(format_credential_time(expiry)));
        }
        data.insert("last_refresh".into(), Value::from(format_credential_time(now)));
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimeter_core::VendorKind;

    #[test]
    fn test_grant_requires_client_id() {
        let mut account = Account::new(VendorKind::Gemini, "a", "t", None);
        account.refresh_token = "r".into();
        assert!(matches!(grant(&account), Err(ProviderError::RefreshUnavailable)));

        account.client_id = "cid".into();
        let Ok(GrantBody::Form(form)) = grant(&account) else {
            panic!("expected form grant");
        };
        assert_eq!(form.len(), 3);

        account.client_secret = "secret".into();
        let Ok(GrantBody::Form(form)) = grant(&account) else {
            panic!("expected form grant");
        };
        assert!(form.contains(&("client_secret", "secret".to_string())));
    }
}
