//! Per-account fetch orchestration.
//!
//! Each account goes through an explicit state machine:
//!
//! ```text
//! Idle ──► Requested ──► Done(Ok)
//!              │
//!              ├─ 401/403 ──► Unauthorized ──► Refreshing ──► Retrying ──► Done
//!              │                   │               │
//!              │                   └─► Done(RefreshNotAllowed)
//!              │                                   └─► Done(RefreshFailed)
//!              └─ other error ──► Done(Failed)
//! ```
//!
//! An account is refreshed at most once and re-queried at most once.

use aimeter_core::{Account, UsageRow};
use aimeter_fetch::{ApiStatusError, FetchContext, FetchError};
use tracing::{debug, info, instrument, warn};

use crate::error::{warning_message, ProviderError};
use crate::vendor::Vendor;

/// Message of the warning row emitted for a successful call without windows.
pub const EMPTY_RESULT_MESSAGE: &str = "empty result";

// ============================================================================
// States
// ============================================================================

#[derive(Debug)]
enum FetchState {
    Idle,
    Requested,
    Unauthorized(ApiStatusError),
    Refreshing,
    Retrying(String),
    Done(FetchOutcome),
}

/// Terminal outcome for one account.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The quota call succeeded (possibly after one refresh).
    Ok(Vec<UsageRow>),
    /// Authorization failed and the account may not be refreshed.
    RefreshNotAllowed(ProviderError),
    /// The refresh grant or its persistence failed.
    RefreshFailed(ProviderError),
    /// Load, network or decode failure.
    Failed(ProviderError),
}

impl FetchOutcome {
    /// The error, for non-`Ok` outcomes.
    pub fn error(&self) -> Option<&ProviderError> {
        match self {
            Self::Ok(_) => None,
            Self::RefreshNotAllowed(e) | Self::RefreshFailed(e) | Self::Failed(e) => Some(e),
        }
    }
}

// ============================================================================
// Orchestration
// ============================================================================

/// Drives one account to a terminal outcome.
#[instrument(skip_all, fields(vendor = %vendor.kind(), identity = %account.identity))]
pub async fn fetch_account(
    vendor: &dyn Vendor,
    ctx: &FetchContext,
    account: &mut Account,
) -> FetchOutcome {
    let mut state = FetchState::Idle;
    loop {
        state = match state {
            FetchState::Idle => {
                if account.is_expired() {
                    debug!("Cached token is past its expiry, trying it anyway");
                }
                if account.is_usable() {
                    FetchState::Requested
                } else {
                    let reason = account.load_error().unwrap_or("no access token").to_string();
                    FetchState::Done(FetchOutcome::Failed(ProviderError::Load(reason)))
                }
            }
            FetchState::Requested => {
                let token = account.access_token().to_string();
                match vendor.query(ctx, account, &token).await {
                    Ok(rows) => FetchState::Done(FetchOutcome::Ok(rows)),
                    Err(ProviderError::Fetch(FetchError::Status(status)))
                        if matches!(status.status, 401 | 403) =>
                    {
                        FetchState::Unauthorized(status)
                    }
                    Err(e) => FetchState::Done(FetchOutcome::Failed(e)),
                }
            }
            FetchState::Unauthorized(status) => {
                debug!(status = status.status, "Quota call unauthorized");
                if account.has_refresh_token() {
                    FetchState::Refreshing
                } else if account.is_native() {
                    FetchState::Done(FetchOutcome::RefreshNotAllowed(
                        ProviderError::NativeRefreshRefused {
                            vendor: account.vendor.cli_name(),
                        },
                    ))
                } else {
                    FetchState::Done(FetchOutcome::RefreshNotAllowed(
                        ProviderError::AuthExpired(status),
                    ))
                }
            }
            FetchState::Refreshing => match vendor.refresh(ctx, account).await {
                Ok(token) => {
                    info!("Token refreshed, retrying quota call");
                    FetchState::Retrying(token)
                }
                Err(e @ ProviderError::NativeRefreshRefused { .. }) => {
                    FetchState::Done(FetchOutcome::RefreshNotAllowed(e))
                }
                Err(e) => {
                    warn!(error = %e, "Token refresh failed");
                    FetchState::Done(FetchOutcome::RefreshFailed(e))
                }
            },
            FetchState::Retrying(token) => match vendor.query(ctx, account, &token).await {
                Ok(rows) => FetchState::Done(FetchOutcome::Ok(rows)),
                Err(e) => FetchState::Done(FetchOutcome::Failed(e)),
            },
            FetchState::Done(outcome) => return outcome,
        };
    }
}

/// Converts an outcome into report rows.
///
/// Debug metadata is kept only when the context asks for it.
pub fn outcome_rows(
    vendor: &dyn Vendor,
    ctx: &FetchContext,
    account: &Account,
    outcome: FetchOutcome,
) -> Vec<UsageRow> {
    let mut rows = match outcome {
        FetchOutcome::Ok(rows) if rows.is_empty() => {
            vec![UsageRow::account_warning(account, EMPTY_RESULT_MESSAGE)]
        }
        FetchOutcome::Ok(rows) => rows,
        FetchOutcome::RefreshNotAllowed(e) | FetchOutcome::RefreshFailed(e) | FetchOutcome::Failed(e) => {
            let mut row = UsageRow::account_warning(account, warning_message(&e));
            if let Some(info) = vendor.debug_info(account) {
                row = row.with_debug_info(info);
            }
            vec![row]
        }
    };
    if !ctx.debug() {
        for row in &mut rows {
            row.debug_info = None;
        }
    }
    rows
}

/// Loads every account of a vendor and fetches them one after another.
#[instrument(skip_all, fields(vendor = %vendor.kind()))]
pub async fn fetch_vendor(vendor: &dyn Vendor, ctx: &FetchContext) -> Vec<UsageRow> {
    let mut accounts = vendor.load(ctx);
    debug!(count = accounts.len(), source = ?ctx.credential_source(), "Loaded accounts");

    if accounts.is_empty() {
        return vec![UsageRow::warning(
            vendor.kind(),
            "",
            vendor.no_credentials_message(ctx.credential_source()),
        )];
    }

    let mut rows = Vec::new();
    for account in &mut accounts {
        let outcome = fetch_account(vendor, ctx, account).await;
        rows.extend(outcome_rows(vendor, ctx, account, outcome));
    }
    rows
}

// ============================================================================
// Tests
// ============================================================================
