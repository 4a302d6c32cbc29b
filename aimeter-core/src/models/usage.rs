//! Usage report rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::Account;
use super::vendor::VendorKind;
use crate::error::CoreError;

/// One row of the usage report.
///
/// A row is either a quota window (`is_warning == false`) or a warning about
/// an account or a single window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRow {
    /// Vendor the row belongs to.
    pub vendor: VendorKind,
    /// Account label; empty for vendor-level warnings.
    #[serde(default)]
    pub identity: String,
    /// Window or bucket label, e.g. `5-hour` or `gemini-2.5-pro`.
    #[serde(default)]
    pub label: String,
    /// Used percentage (0-100).
    #[serde(default)]
    pub usage_percent: f64,
    /// When the window resets.
    #[serde(default)]
    pub reset_time: Option<DateTime<Utc>>,
    /// True for warning rows.
    #[serde(default)]
    pub is_warning: bool,
    /// Warning text (only on warning rows).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Debug metadata shown with `--debug`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<String>,
}

impl UsageRow {
    /// Creates a quota window row for an account.
    pub fn window(
        account: &Account,
        label: impl Into<String>,
        usage_percent: f64,
        reset_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            vendor: account.vendor,
            identity: account.identity.clone(),
            label: label.into(),
            usage_percent,
            reset_time,
            is_warning: false,
            message: None,
            debug_info: None,
        }
    }

    /// Creates a warning row.
    pub fn warning(
        vendor: VendorKind,
        identity: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            vendor,
            identity: identity.into(),
            label: String::new(),
            usage_percent: 0.0,
            reset_time: None,
            is_warning: true,
            message: Some(message.into()),
            debug_info: None,
        }
    }

    /// Creates a warning row for an account.
    pub fn account_warning(account: &Account, message: impl Into<String>) -> Self {
        Self::warning(account.vendor, account.identity.clone(), message)
    }

    /// Sets the window label (used for per-window warnings).
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Attaches debug metadata.
    #[must_use]
    pub fn with_debug_info(mut self, info: impl Into<String>) -> Self {
        let info = info.into();
        self.debug_info = if info.is_empty() { None } else { Some(info) };
        self
    }

    /// Report label, e.g. `Gemini (user@example.com)`.
    pub fn provider_label(&self) -> String {
        let identity = self.identity.trim();
        if identity.is_empty() {
            self.vendor.display_name().to_string()
        } else {
            format!("{} ({identity})", self.vendor.display_name())
        }
    }

    /// Validates the usage percentage.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.usage_percent.is_finite() {
            return Err(CoreError::InvalidData(
                "usage_percent is not a finite number".to_string(),
            ));
        }
        if self.usage_percent < 0.0 || self.usage_percent > 100.0 {
            return Err(CoreError::InvalidData(format!(
                "usage_percent {} out of valid range [0, 100]",
                self.usage_percent
            )));
        }
        Ok(())
    }

    /// Clamps the usage percentage to [0, 100], replacing NaN with 0.
    pub fn sanitize(&mut self) {
        if !self.usage_percent.is_finite() {
            self.usage_percent = 0.0;
        }
        self.usage_percent = self.usage_percent.clamp(0.0, 100.0);
    }
}

// ============================================================================
// Tests
// ============================================================================
