//! Integration tests for core row types.

use aimeter_core::{Account, UsageRow, VendorKind};

#[test]
fn test_row_serialization_roundtrip() {
    let account = Account::new(VendorKind::Codex, "alice", "t", None);
    let row = UsageRow::window(&account, "7-day", 12.5, None).with_debug_info("acct:abc123");
    let json = serde_json::to_string(&row).unwrap();
    let parsed: UsageRow = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, row);
}

#[test]
fn test_failed_account_row_label() {
    let account = Account::failed(
        VendorKind::Codex,
        "bob",
        "/tmp/codex-bob.json".into(),
        "failed to parse JSON: key must be a string",
    );
    let row = UsageRow::account_warning(&account, account.load_error().unwrap_or_default());
    assert_eq!(row.provider_label(), "Codex (bob)");
    assert!(row.is_warning);
}
