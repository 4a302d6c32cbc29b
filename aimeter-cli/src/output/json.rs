//! JSON output formatting.

use aimeter_core::{CredentialSource, UsageRow};
use anyhow::Result;
use serde::Serialize;

/// Serialized report.
#[derive(Debug, Serialize)]
pub struct ReportOutput<'a> {
    /// Where credentials were read from.
    pub credential_source: CredentialSource,
    /// Filtered and sorted rows.
    pub rows: &'a [UsageRow],
}

/// JSON formatter.
pub struct JsonFormatter;

impl JsonFormatter {
    /// Formats the report as pretty-printed JSON.
    pub fn format_report(source: CredentialSource, rows: &[UsageRow]) -> Result<String> {
        let report = ReportOutput {
            credential_source: source,
            rows,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}
