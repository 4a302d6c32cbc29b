//! Credential source detection.
//!
//! The decision is global: if any vendor has a file in the proxy-managed
//! directory, every vendor loads from there only, even vendors with no proxy
//! file of their own.

use aimeter_core::{CredentialSource, VendorKind};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the proxy-managed credential directory under the home directory.
pub const PROXY_DIR_NAME: &str = ".cli-proxy-api";

/// Returns `<home>/.cli-proxy-api`.
pub fn proxy_dir(home: &Path) -> PathBuf {
    home.join(PROXY_DIR_NAME)
}

/// Returns the native credential file of a vendor's own CLI, relative to the
/// home directory.
pub fn native_credentials_path(kind: VendorKind) -> &'static str {
    match kind {
        VendorKind::Claude => ".claude/.credentials.json",
        VendorKind::Codex => ".codex/auth.json",
        VendorKind::Gemini => ".gemini/oauth_creds.json",
    }
}

/// Decides where this run loads credentials from.
///
/// Only the `claude-*`, `codex-*` and `gemini-*` patterns count. The Gemini
/// loader also reads bare `{email}-{project}.json` files, but only once a
/// prefixed file has selected the proxy directory; a directory holding only
/// bare-name files is treated as native.
///
/// A missing or empty home directory short-circuits to
/// [`CredentialSource::Native`] so the current directory is never scanned.
pub fn detect_credential_source(home: Option<&Path>) -> CredentialSource {
    let Some(home) = home.filter(|h| !h.as_os_str().is_empty()) else {
        return CredentialSource::Native;
    };

    let dir = proxy_dir(home);
    for kind in VendorKind::all() {
        if has_match(&dir.join(kind.proxy_pattern())) {
            debug!(vendor = %kind, dir = %dir.display(), "Proxy credentials found");
            return CredentialSource::Proxy;
        }
    }
    CredentialSource::Native
}

fn has_match(pattern: &Path) -> bool {
    let Some(pattern) = pattern.to_str() else {
        return false;
    };
    // Scan errors count as "no match".
    glob::glob(pattern)
        .map(|mut paths| paths.any(|p| p.is_ok()))
        .unwrap_or(false)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_no_home_is_native() {
        assert_eq!(detect_credential_source(None), CredentialSource::Native);
        assert_eq!(
            detect_credential_source(Some(Path::new(""))),
            CredentialSource::Native
        );
    }

    #[test]
    fn test_empty_proxy_dir_is_native() {
        let home = TempDir::new().unwrap();
        fs::create_dir(home.path().join(PROXY_DIR_NAME)).unwrap();
        assert_eq!(
            detect_credential_source(Some(home.path())),
            CredentialSource::Native
        );
    }

    #[test]
    fn test_any_vendor_file_is_proxy() {
        for name in ["claude-a.json", "codex-b.json", "gemini-c.json"] {
            let home = TempDir::new().unwrap();
            let dir = home.path().join(PROXY_DIR_NAME);
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join(name), "{}").unwrap();
            assert_eq!(
                detect_credential_source(Some(home.path())),
                CredentialSource::Proxy,
                "{name}"
            );
        }
    }

    /// Bare `{email}-{project}.json` files do not select the proxy directory.
    #[test]
    fn test_unrelated_files_do_not_count() {
        let home = TempDir::new().unwrap();
        let dir = home.path().join(PROXY_DIR_NAME);
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("user@example.com-proj.json"), "{}").unwrap();
        fs::write(dir.join("config.yaml"), "").unwrap();
        assert_eq!(
            detect_credential_source(Some(home.path())),
            CredentialSource::Native
        );
    }

    #[test]
    fn test_native_paths() {
        assert!(native_credentials_path(VendorKind::Codex).ends_with("auth.json"));
        assert!(native_credentials_path(VendorKind::Gemini).starts_with(".gemini/"));
    }
}
