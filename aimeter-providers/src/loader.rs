//! File helpers shared by the credential loaders.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use aimeter_fetch::FetchContext;

use crate::source::proxy_dir;

/// Sorted files matching `pattern` in the proxy directory.
///
/// Hidden files never match, so temp files left by an interrupted rewrite
/// are not picked up.
pub(crate) fn proxy_files(ctx: &FetchContext, pattern: &str) -> Vec<PathBuf> {
    let Some(home) = ctx.home_dir() else {
        return Vec::new();
    };
    let full = proxy_dir(home).join(pattern);
    let Some(full) = full.to_str() else {
        warn!(pattern = %full.display(), "Non UTF-8 credential pattern");
        return Vec::new();
    };

    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..glob::MatchOptions::new()
    };
    let mut files: Vec<PathBuf> = match glob::glob_with(full, options) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(e) => {
            warn!(error = %e, "Invalid credential pattern");
            Vec::new()
        }
    };
    files.sort();
    files
}

/// Reads and parses one credential file.
///
/// The error strings become the account's load error.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let data = fs::read(path).map_err(|e| format!("failed to read file: {e}"))?;
    serde_json::from_slice(&data).map_err(|e| format!("failed to parse JSON: {e}"))
}

/// Reads a native credential file.
///
/// Returns `None` when the file is missing or unreadable; a parse failure is
/// returned as `Some(Err(..))` so the caller can report it.
pub(crate) fn read_native<T: DeserializeOwned>(
    ctx: &FetchContext,
    relative: &str,
) -> Option<(PathBuf, Result<T, String>)> {
    let path = ctx.home_dir()?.join(relative);
    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No native credentials");
            return None;
        }
    };
    let parsed = serde_json::from_slice(&data)
        .map_err(|e| format!("failed to parse {}: {e}", path.display()));
    Some((path, parsed))
}

/// Filename without `prefix` and without the `.json` extension.
pub(crate) fn file_fragment(path: &Path, prefix: &str) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name.strip_prefix(prefix).unwrap_or(&name);
    name.strip_suffix(".json").unwrap_or(name).to_string()
}

/// Parses an RFC 3339 timestamp; empty or invalid values are unknown.
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
}

/// Milliseconds since the epoch; zero and negative values are unknown.
pub(crate) fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    if ms <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(ms)
}

/// Parses a quota window reset time.
pub(crate) fn parse_reset_time(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("Parse error: invalid reset time format: {e}"))
}

// ============================================================================
// Tests
// ============================================================================
