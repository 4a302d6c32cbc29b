//! Atomic credential file updates.
//!
//! Credential files are shared with other tools, so a rewrite must keep every
//! key it does not own and must never leave a half-written file behind. The
//! file is parsed into a generic JSON map, mutated, and written to a temp
//! file in the same directory which is then renamed over the original.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::error::StoreError;

/// Prefix of the temp files created next to a credential file.
const TEMP_PREFIX: &str = ".tmp-cred-";

/// Reads `path`, applies `mutate` to its top-level JSON object, and writes it
/// back atomically with the original permission bits.
///
/// If any step fails the original file is left untouched and the temp file
/// is removed.
pub fn update_json_credentials<F>(path: &Path, mutate: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut Map<String, Value>) -> Result<(), StoreError>,
{
    let metadata = fs::metadata(path).map_err(|e| StoreError::credentials(path, "stat", e))?;
    let content = fs::read(path).map_err(|e| StoreError::credentials(path, "read", e))?;

    let mut data: Map<String, Value> =
        serde_json::from_slice(&content).map_err(|e| StoreError::credentials(path, "parse", e))?;

    mutate(&mut data)?;

    let encoded =
        serde_json::to_vec(&data).map_err(|e| StoreError::credentials(path, "encode", e))?;

    write_atomic(path, &encoded, metadata.permissions())
        .map_err(|e| StoreError::credentials(path, "write", e))?;

    debug!(path = %path.display(), "Credential file updated");
    Ok(())
}

fn write_atomic(path: &Path, data: &[u8], permissions: fs::Permissions) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // Dropping the handle before `persist` deletes the temp file.
    let mut tmp = tempfile::Builder::new().prefix(TEMP_PREFIX).tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    fs::set_permissions(tmp.path(), permissions)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Returns the object stored under `key`, failing when it is absent or not an
/// object.
pub fn nested_object_mut<'a>(
    data: &'a mut Map<String, Value>,
    key: &str,
) -> Result<&'a mut Map<String, Value>, StoreError> {
    data.get_mut(key)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| StoreError::MissingObject(key.to_string()))
}

/// Formats a timestamp the way credential files store them (RFC 3339, UTC,
/// sub-second digits only when non-zero).
pub fn format_credential_time(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_credential_time() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
        assert_eq!(format_credential_time(ts), "2025-03-01T08:30:00Z");

        let ts = ts + chrono::Duration::nanoseconds(123_456_789);
        assert_eq!(format_credential_time(ts), "2025-03-01T08:30:00.123456789Z");
    }

    #[test]
    fn test_nested_object_mut() {
        let mut data: Map<String, Value> =
            serde_json::from_str(r#"{"token":{"access_token":"a"},"email":"x"}"#).unwrap();
        let token = nested_object_mut(&mut data, "token").unwrap();
        token.insert("access_token".into(), Value::from("b"));
        assert_eq!(data["token"]["access_token"], "b");

        let err = nested_object_mut(&mut data, "email").unwrap_err();
        assert!(matches!(err, StoreError::MissingObject(key) if key == "email"));
    }
}
