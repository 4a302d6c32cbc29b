//! The normalized account model.
//!
//! Every credential file, whatever its vendor-specific JSON shape, is turned
//! into one [`Account`]. Three fields are private because they carry
//! invariants:
//!
//! - `is_native` is fixed by the constructor and gates refresh for the
//!   account's whole lifetime.
//! - `load_error` and a non-empty `access_token` never coexist; only
//!   [`Account::failed`] and [`Account::failed_native`] set a load error.
//! - `access_token` only changes through [`Account::apply_refresh`], which the
//!   refreshers call after the rotated tokens are on disk.

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use super::vendor::VendorKind;

/// Identity label used for credentials read from a vendor's own directory.
pub const NATIVE_IDENTITY: &str = "native";

/// One normalized credential.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Vendor this credential belongs to.
    pub vendor: VendorKind,
    /// Display label (email, filename fragment, or [`NATIVE_IDENTITY`]).
    pub identity: String,
    access_token: String,
    /// Refresh token; empty when the file has none.
    pub refresh_token: String,
    /// OpenID ID token (Codex), used for client id and scope discovery.
    pub id_token: String,
    /// Internal account id (Codex), used for disambiguation.
    pub account_id: String,
    /// OAuth client id; empty means the vendor default.
    pub client_id: String,
    /// OAuth client secret (Gemini).
    pub client_secret: String,
    /// Granted scopes; empty means the vendor default.
    pub scopes: Vec<String>,
    /// Per-account token endpoint override (Gemini).
    pub token_uri: String,
    /// Cloud project (Gemini proxy files only).
    pub project_id: String,
    /// Access token expiry, if known.
    pub expiry: Option<DateTime<Utc>>,
    /// Last time the tokens were rotated, if known.
    pub last_refresh: Option<DateTime<Utc>>,
    /// Credential file the account was loaded from.
    pub source_path: Option<PathBuf>,
    is_native: bool,
    load_error: Option<String>,
}

impl Account {
    /// Creates an account discovered in the proxy-managed directory.
    pub fn new(
        vendor: VendorKind,
        identity: impl Into<String>,
        access_token: impl Into<String>,
        source_path: Option<PathBuf>,
    ) -> Self {
        Self {
            vendor,
            identity: identity.into(),
            access_token: access_token.into(),
            refresh_token: String::new(),
            id_token: String::new(),
            account_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            scopes: Vec::new(),
            token_uri: String::new(),
            project_id: String::new(),
            expiry: None,
            last_refresh: None,
            source_path,
            is_native: false,
            load_error: None,
        }
    }

    /// Creates an account discovered in the vendor's own directory.
    pub fn native(
        vendor: VendorKind,
        access_token: impl Into<String>,
        source_path: PathBuf,
    ) -> Self {
        Self {
            is_native: true,
            ..Self::new(vendor, NATIVE_IDENTITY, access_token, Some(source_path))
        }
    }

    /// Creates an unusable proxy account carrying a load error.
    pub fn failed(
        vendor: VendorKind,
        identity: impl Into<String>,
        source_path: PathBuf,
        load_error: impl Into<String>,
    ) -> Self {
        Self {
            load_error: Some(load_error.into()),
            ..Self::new(vendor, identity, String::new(), Some(source_path))
        }
    }

    /// Creates an unusable native account carrying a load error.
    pub fn failed_native(
        vendor: VendorKind,
        source_path: PathBuf,
        load_error: impl Into<String>,
    ) -> Self {
        Self {
            load_error: Some(load_error.into()),
            ..Self::native(vendor, String::new(), source_path)
        }
    }

    /// Current access token; empty when the account is unusable.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// True when the credential came from the vendor's own directory.
    pub fn is_native(&self) -> bool {
        self.is_native
    }

    /// Parse or validation error recorded at load time.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// True when a quota call can be attempted.
    pub fn is_usable(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// True when the account holds a refresh token.
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// True when the expiry is known and already passed.
    pub fn is_expired(&self) -> bool {
        self.expiry.is_some_and(|exp| exp <= Utc::now())
    }

    /// Installs rotated tokens after they were persisted.
    ///
    /// Empty `refresh_token`/`id_token` keep the current values.
    pub fn apply_refresh(
        &mut self,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        id_token: Option<String>,
        expiry: Option<DateTime<Utc>>,
        refreshed_at: DateTime<Utc>,
    ) {
        self.access_token = access_token.into();
        if let Some(token) = refresh_token.filter(|t| !t.is_empty()) {
            self.refresh_token = token;
        }
        if let Some(token) = id_token.filter(|t| !t.is_empty()) {
            self.id_token = token;
        }
        if expiry.is_some() {
            self.expiry = expiry;
        }
        self.last_refresh = Some(refreshed_at);
    }

    /// Report label, e.g. `Codex (alice@example.com)`.
    pub fn provider_label(&self) -> String {
        let identity = self.identity.trim();
        if identity.is_empty() {
            self.vendor.display_name().to_string()
        } else {
            format!("{} ({identity})", self.vendor.display_name())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
