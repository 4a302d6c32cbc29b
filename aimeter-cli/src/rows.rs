//! Row filtering, ordering and table layout.
//!
//! Vendors return flat rows; the table groups them:
//!
//! ```text
//! Provider                  Window  Usage     Resets At
//! Codex (a@example.com)     5-hour  ██░░░░ 30%  in 2h 10m
//! Codex (b@example.com)
//!                           5-hour  █░░░░░ 12%  in 4h 0m
//!                           7-day   ███░░░ 51%  Jan 9 10:00 UTC
//! Gemini (u@example.com)
//!   gemini-3-pro-preview    24-hour ░░░░░░ 2%   in 20h 1m
//! ```

use std::collections::{HashMap, HashSet};

use aimeter_core::{UsageRow, VendorKind};

/// Window label shown for Gemini model rows.
const GEMINI_WINDOW: &str = "24-hour";

/// Indent of Gemini model rows in the provider column.
const MODEL_INDENT: &str = "  ";

/// One line of the rendered table.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayRow {
    /// Provider heading for a group of rows.
    Header(String),
    /// A usage or warning row.
    Line {
        /// Provider cell (empty under a heading).
        provider: String,
        /// Window cell.
        window: String,
        /// The row itself.
        row: UsageRow,
    },
}

/// Drops Gemini 2.x model rows unless `show_gemini_old`. Warnings are kept.
pub fn filter_rows(rows: Vec<UsageRow>, show_gemini_old: bool) -> Vec<UsageRow> {
    if show_gemini_old {
        return rows;
    }
    rows.into_iter()
        .filter(|row| {
            row.is_warning
                || row.vendor != VendorKind::Gemini
                || !row.label.to_lowercase().starts_with("gemini-2")
        })
        .collect()
}

/// Orders rows by vendor, then warnings last, then provider label, then
/// window label. The sort is stable.
pub fn sort_rows(rows: &mut [UsageRow]) {
    rows.sort_by_cached_key(|row| (row.vendor, row.is_warning, row.provider_label(), row.label.clone()));
}

/// Builds the grouped table layout from sorted rows.
pub fn layout(rows: Vec<UsageRow>) -> Vec<DisplayRow> {
    group_providers(format_gemini(rows))
}

/// Puts Gemini model rows under a per-account heading.
fn format_gemini(rows: Vec<UsageRow>) -> Vec<DisplayRow> {
    let mut formatted = Vec::with_capacity(rows.len());
    let mut seen = HashSet::new();

    for row in rows {
        let provider = row.provider_label();
        if row.vendor != VendorKind::Gemini || row.label.is_empty() {
            let window = row.label.clone();
            formatted.push(DisplayRow::Line { provider, window, row });
            continue;
        }

        if seen.insert(provider.clone()) {
            formatted.push(DisplayRow::Header(provider));
        }
        formatted.push(DisplayRow::Line {
            provider: format!("{MODEL_INDENT}{}", row.label),
            window: GEMINI_WINDOW.to_string(),
            row,
        });
    }
    formatted
}

/// Gives providers with several rows a heading and blanks their cells.
fn group_providers(rows: Vec<DisplayRow>) -> Vec<DisplayRow> {
    let headed: HashSet<String> = rows
        .iter()
        .filter_map(|row| match row {
            DisplayRow::Header(name) => Some(name.clone()),
            DisplayRow::Line { .. } => None,
        })
        .collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in &rows {
        if let DisplayRow::Line { provider, .. } = row {
            if !provider.starts_with(MODEL_INDENT) && !headed.contains(provider) {
                *counts.entry(provider.clone()).or_default() += 1;
            }
        }
    }

    let mut grouped = Vec::with_capacity(rows.len());
    let mut seen = HashSet::new();
    for row in rows {
        let DisplayRow::Line { provider, window, row } = row else {
            grouped.push(row);
            continue;
        };

        if provider.starts_with(MODEL_INDENT) {
            grouped.push(DisplayRow::Line { provider, window, row });
        } else if headed.contains(&provider) {
            grouped.push(DisplayRow::Line { provider: String::new(), window, row });
        } else if counts.get(&provider).copied().unwrap_or(0) <= 1 {
            grouped.push(DisplayRow::Line { provider, window, row });
        } else {
            if seen.insert(provider.clone()) {
                grouped.push(DisplayRow::Header(provider));
            }
            grouped.push(DisplayRow::Line { provider: String::new(), window, row });
        }
    }
    grouped
}

// ============================================================================
// Tests
// ============================================================================
