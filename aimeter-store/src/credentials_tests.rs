//! Credential file update tests.
//!
//! Covers key preservation, permission preservation and the guarantee that a
//! failed update leaves the original file untouched.

use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

use crate::credentials::{nested_object_mut, update_json_credentials};
use crate::error::StoreError;

fn temp_entries(dir: &TempDir) -> Vec<String> {
    fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(".tmp-cred-"))
        .collect()
}

// ============================================================================
// Successful Updates
// ============================================================================

#[test]
fn test_update_preserves_unknown_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("codex-alice.json");
    fs::write(
        &path,
        r#"{"access_token":"old","email":"alice@example.com","custom":{"nested":[1,2,3]}}"#,
    )
    .unwrap();

    update_json_credentials(&path, |data| {
        data.insert("access_token".into(), Value::from("new"));
        Ok(())
    })
    .unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["access_token"], "new");
    assert_eq!(written["email"], "alice@example.com");
    assert_eq!(written["custom"], json!({"nested": [1, 2, 3]}));
    assert!(temp_entries(&dir).is_empty());
}

#[test]
fn test_update_nested_token_object() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gemini-me-proj.json");
    fs::write(
        &path,
        r#"{"token":{"access_token":"a","client_id":"cid"},"project_id":"proj"}"#,
    )
    .unwrap();

    update_json_credentials(&path, |data| {
        let token = nested_object_mut(data, "token")?;
        token.insert("access_token".into(), Value::from("b"));
        Ok(())
    })
    .unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["token"]["access_token"], "b");
    assert_eq!(written["token"]["client_id"], "cid");
    assert_eq!(written["project_id"], "proj");
}

#[cfg(unix)]
#[test]
fn test_update_keeps_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("claude-me.json");
    fs::write(&path, r#"{"access_token":"old"}"#).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

    update_json_credentials(&path, |data| {
        data.insert("access_token".into(), Value::from("new"));
        Ok(())
    })
    .unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o640);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_missing_file_is_stat_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.json");

    let err = update_json_credentials(&path, |_| Ok(())).unwrap_err();
    assert!(matches!(err, StoreError::Credentials { action: "stat", .. }));
    assert!(err.to_string().contains("failed to stat credentials file"));
}

#[test]
fn test_invalid_json_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("codex-bob.json");
    fs::write(&path, "{not valid json").unwrap();

    let err = update_json_credentials(&path, |_| Ok(())).unwrap_err();
    assert!(matches!(err, StoreError::Credentials { action: "parse", .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), "{not valid json");
}

#[test]
fn test_mutation_error_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gemini-x.json");
    let original = r#"{"project_id":"p"}"#;
    fs::write(&path, original).unwrap();

    let err = update_json_credentials(&path, |data| {
        nested_object_mut(data, "token")?;
        Ok(())
    })
    .unwrap_err();

    assert!(matches!(err, StoreError::MissingObject(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
    assert!(temp_entries(&dir).is_empty());
}
