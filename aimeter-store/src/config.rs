//! Configuration management.
//!
//! The configuration file is optional and read-only: a missing file yields
//! the defaults, and nothing in a fetch ever writes it.

use aimeter_core::VendorKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::StoreError;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Run deadline in seconds; the CLI flag takes precedence.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Per-vendor overrides, keyed by CLI name (`claude`, `codex`, `gemini`).
    #[serde(default)]
    pub vendors: HashMap<String, VendorConfig>,
}

/// Vendor-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorConfig {
    /// Whether this vendor is queried.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Base URL of the quota API.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Token endpoint used for refresh.
    #[serde(default)]
    pub token_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            token_url: None,
        }
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("aimeter")
            .join("config.json")
    }

    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path())
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    fn validate(&self) -> Result<(), StoreError> {
        if self.timeout_secs == Some(0) {
            return Err(StoreError::Config("timeout_secs must be positive".to_string()));
        }
        for name in self.vendors.keys() {
            name.parse::<VendorKind>()
                .map_err(|e| StoreError::Config(e.to_string()))?;
        }
        Ok(())
    }

    /// Configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Returns the overrides for a vendor (defaults when unset).
    pub fn vendor(&self, kind: VendorKind) -> VendorConfig {
        self.vendors
            .get(kind.cli_name())
            .cloned()
            .unwrap_or_default()
    }

    /// Returns whether a vendor is enabled.
    pub fn is_vendor_enabled(&self, kind: VendorKind) -> bool {
        self.vendors
            .get(kind.cli_name())
            .is_none_or(|v| v.enabled)
    }
}

// ============================================================================
// Tests
// ============================================================================
