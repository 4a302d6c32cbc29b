//! Vendor-related types.
//!
//! - [`VendorKind`] - Enum of supported vendors
//! - [`CredentialSource`] - Proxy-managed or native credential directories

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ============================================================================
// Vendor Kind
// ============================================================================

/// Supported coding-assistant vendors.
///
/// The declaration order is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorKind {
    /// Anthropic Claude
    Claude,
    /// OpenAI Codex
    Codex,
    /// Google Gemini
    Gemini,
}

impl VendorKind {
    /// Returns the display name for this vendor.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Claude => "Claude",
            Self::Codex => "Codex",
            Self::Gemini => "Gemini",
        }
    }

    /// Returns the CLI name for this vendor (also the name of its CLI tool).
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Codex => "codex",
            Self::Gemini => "gemini",
        }
    }

    /// Returns all vendor kinds in report order.
    pub fn all() -> &'static [VendorKind] {
        &[Self::Claude, Self::Codex, Self::Gemini]
    }

    /// Filename glob used for this vendor in the proxy-managed directory.
    pub fn proxy_pattern(&self) -> &'static str {
        match self {
            Self::Claude => "claude-*.json",
            Self::Codex => "codex-*.json",
            Self::Gemini => "gemini-*.json",
        }
    }
}

impl fmt::Display for VendorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for VendorKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" => Ok(Self::Claude),
            "codex" => Ok(Self::Codex),
            "gemini" => Ok(Self::Gemini),
            other => Err(CoreError::UnknownVendor(other.to_string())),
        }
    }
}

// ============================================================================
// Credential Source
// ============================================================================

/// Where credentials are loaded from.
///
/// Decided once per run: if any vendor has a file in the proxy-managed
/// directory, every vendor reads only from there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    /// Centrally managed `~/.cli-proxy-api/`.
    Proxy,
    /// Each tool's own directory (`~/.claude`, `~/.codex`, `~/.gemini`).
    #[default]
    Native,
}

impl CredentialSource {
    /// Human-readable source for the report header.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Proxy => "~/.cli-proxy-api/",
            Self::Native => "native CLI directories",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_order_matches_report_order() {
        let mut kinds = vec![VendorKind::Gemini, VendorKind::Claude, VendorKind::Codex];
        kinds.sort();
        assert_eq!(kinds, VendorKind::all());
    }

    #[test]
    fn test_vendor_from_str() {
        assert_eq!("Claude".parse::<VendorKind>().unwrap(), VendorKind::Claude);
        assert_eq!(" codex ".parse::<VendorKind>().unwrap(), VendorKind::Codex);
        assert!("copilot".parse::<VendorKind>().is_err());
    }

    #[test]
    fn test_source_display_name() {
        assert_eq!(CredentialSource::Proxy.display_name(), "~/.cli-proxy-api/");
        assert_eq!(
            CredentialSource::Native.display_name(),
            "native CLI directories"
        );
    }
}
