//! Table output with usage bars and colors.

use aimeter_core::{CredentialSource, UsageRow};
use chrono::{DateTime, Duration, Local, Utc};

use crate::rows::DisplayRow;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[90m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const UNDERLINE: &str = "\x1b[4m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

const DEFAULT_BAR_WIDTH: usize = 6;
const MAX_BAR_WIDTH: usize = 24;
const MAX_WARNING_CHARS: usize = 120;
const COLUMN_GAP: &str = "  ";

/// Table formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    debug: bool,
    terminal_width: Option<usize>,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            debug: false,
            terminal_width: None,
        }
    }

    /// Adds the Debug column.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Widens usage bars to fill a terminal of `width` columns.
    #[must_use]
    pub fn with_terminal_width(mut self, width: Option<usize>) -> Self {
        self.terminal_width = width;
        self
    }

    /// The `Credentials:` header line.
    pub fn format_source(&self, source: CredentialSource) -> String {
        let line = format!("Credentials: {}", source.display_name());
        format!("{}\n", self.paint(&line, &[DIM]))
    }

    /// Renders the table, one line per row.
    pub fn format_table(&self, rows: &[DisplayRow]) -> String {
        self.format_table_at(rows, Utc::now())
    }

    pub(crate) fn format_table_at(&self, rows: &[DisplayRow], now: DateTime<Utc>) -> String {
        let bar_width = self
            .terminal_width
            .map_or(DEFAULT_BAR_WIDTH, |width| self.bar_width(rows, width, now));

        let mut headers = vec!["Provider", "Window", "Usage", "Resets At"];
        if self.debug {
            headers.push("Debug");
        }
        let mut table: Vec<Vec<String>> = vec![headers
            .iter()
            .map(|h| self.paint(h, &[DIM, UNDERLINE]))
            .collect()];
        table.extend(rows.iter().map(|row| self.cells(row, bar_width, now)));

        let mut widths = vec![0; table[0].len()];
        for row in &table {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(visible_width(cell));
            }
        }

        let mut out = String::new();
        for row in &table {
            let line = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| pad_right(cell, *width))
                .collect::<Vec<_>>()
                .join(COLUMN_GAP);
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }

    fn cells(&self, row: &DisplayRow, bar_width: usize, now: DateTime<Utc>) -> Vec<String> {
        let mut cells = match row {
            DisplayRow::Header(provider) => {
                vec![self.provider_heading(provider), String::new(), String::new(), String::new()]
            }
            DisplayRow::Line { provider, row, .. } if row.is_warning => {
                vec![
                    self.provider_cell(provider),
                    self.paint(&warning_text(provider, row), &[BOLD, YELLOW]),
                    String::new(),
                    String::new(),
                ]
            }
            DisplayRow::Line { provider, window, row } => {
                let usage = format!("{} {}%", usage_bar(bar_width, row.usage_percent), percent(row.usage_percent));
                vec![
                    self.provider_cell(provider),
                    window.clone(),
                    self.paint(&usage, usage_color(row.usage_percent)),
                    self.reset_cell(row.reset_time, now),
                ]
            }
        };

        if self.debug {
            let debug = match row {
                DisplayRow::Header(_) => String::new(),
                DisplayRow::Line { row, .. } => row.debug_info.clone().unwrap_or_default(),
            };
            cells.push(debug);
        }
        cells
    }

    fn provider_cell(&self, provider: &str) -> String {
        if provider.starts_with("  ") {
            self.paint(provider, &[DIM])
        } else {
            provider.to_string()
        }
    }

    /// `Codex (a@example.com)` with the name bold and the detail dimmed.
    fn provider_heading(&self, provider: &str) -> String {
        match split_provider(provider) {
            Some((name, detail)) => format!(
                "{} {}",
                self.paint(name, &[BOLD]),
                self.paint(&format!("({detail})"), &[DIM])
            ),
            None => self.paint(provider, &[BOLD]),
        }
    }

    fn reset_cell(&self, reset: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
        let text = format_reset_time(reset, now);
        match reset.map(|ts| ts - now) {
            Some(diff) if diff > Duration::zero() && diff < Duration::hours(4) => {
                self.paint(&text, &[CYAN])
            }
            Some(diff) if diff >= Duration::hours(4) => self.paint(&text, &[DIM]),
            _ => text,
        }
    }

    /// Bar width that fills the terminal, between the default and the cap.
    fn bar_width(&self, rows: &[DisplayRow], terminal_width: usize, now: DateTime<Utc>) -> usize {
        let mut provider = "Provider".len();
        let mut window = "Window".len();
        let mut resets = "Resets At".len();
        let mut debug = if self.debug { "Debug".len() } else { 0 };
        let mut percent_width = 0;

        for row in rows {
            let DisplayRow::Line { provider: p, window: w, row } = row else {
                if let DisplayRow::Header(name) = row {
                    provider = provider.max(name.chars().count());
                }
                continue;
            };
            provider = provider.max(p.chars().count());
            if self.debug {
                debug = debug.max(row.debug_info.as_deref().map_or(0, |d| d.chars().count()));
            }
            if row.is_warning {
                window = window.max(warning_text(p, row).chars().count());
                continue;
            }
            window = window.max(w.chars().count());
            resets = resets.max(format_reset_time(row.reset_time, now).chars().count());
            percent_width = percent_width.max(format!("{}%", percent(row.usage_percent)).len());
        }

        if percent_width == 0 {
            return DEFAULT_BAR_WIDTH;
        }

        let columns = if self.debug { 5 } else { 4 };
        let fixed = provider + window + resets + debug + COLUMN_GAP.len() * (columns - 1);
        let available = terminal_width.saturating_sub(fixed);
        let min_usage = "Usage".len().max(percent_width + 1 + DEFAULT_BAR_WIDTH);
        if available <= min_usage {
            return DEFAULT_BAR_WIDTH;
        }
        (available - percent_width - 1).clamp(DEFAULT_BAR_WIDTH, MAX_BAR_WIDTH)
    }

    fn paint(&self, text: &str, codes: &[&str]) -> String {
        if !self.use_colors || text.is_empty() || codes.is_empty() {
            return text.to_string();
        }
        format!("{}{text}{RESET}", codes.concat())
    }
}

// ============================================================================
// Cell Helpers
// ============================================================================

/// `█` blocks for the used share, rounded to the nearest block.
pub fn usage_bar(width: usize, percent: f64) -> String {
    let width = if width == 0 { DEFAULT_BAR_WIDTH } else { width };
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let mut bar = String::with_capacity(width * 3);
    bar.extend(std::iter::repeat_n(BAR_FULL, filled));
    bar.extend(std::iter::repeat_n(BAR_EMPTY, width - filled));
    bar
}

#[allow(clippy::cast_possible_truncation)]
fn percent(value: f64) -> i64 {
    value.round() as i64
}

fn usage_color(percent: f64) -> &'static [&'static str] {
    if percent >= 80.0 {
        &[RED, BOLD]
    } else if percent >= 50.0 {
        &[YELLOW]
    } else {
        &[GREEN]
    }
}

/// Relative time under 24 hours, local wall-clock time beyond.
pub fn format_reset_time(reset: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(reset) = reset else {
        return "-".to_string();
    };
    let diff = reset - now;
    if diff <= Duration::zero() {
        return "expired".to_string();
    }
    if diff < Duration::hours(24) {
        let hours = diff.num_hours();
        let minutes = diff.num_minutes() % 60;
        return if hours > 0 {
            format!("in {hours}h {minutes}m")
        } else {
            format!("in {minutes}m")
        };
    }
    reset.with_timezone(&Local).format("%b %-d %H:%M %Z").to_string()
}

/// Warning cell text. Window warnings outside a model group name their window.
fn warning_text(provider: &str, row: &UsageRow) -> String {
    let message = sanitize_warning(row.message.as_deref().unwrap_or(""));
    if row.label.is_empty() || provider.starts_with("  ") {
        format!("⚠ {message}")
    } else {
        format!("⚠ {}: {message}", row.label)
    }
}

/// Collapses whitespace and caps the message length.
pub fn sanitize_warning(message: &str) -> String {
    let cleaned = message.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&cleaned, MAX_WARNING_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let mut truncated: String = text.chars().take(max - 3).collect();
    truncated.push_str("...");
    truncated
}

fn split_provider(provider: &str) -> Option<(&str, &str)> {
    let start = provider.find(" (")?;
    let name = provider[..start].trim();
    let detail = provider[start + 2..].strip_suffix(')')?;
    (!name.is_empty() && !detail.is_empty()).then_some((name, detail))
}

fn visible_width(text: &str) -> usize {
    strip_ansi_escapes::strip_str(text).chars().count()
}

fn pad_right(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(visible_width(text));
    format!("{text}{}", " ".repeat(padding))
}

// ============================================================================
// Tests
// ============================================================================
