// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! aim - usage quotas of OAuth-authenticated coding assistants.
//!
//! # Examples
//!
//! ```bash
//! # All vendors, table output
//! aim
//!
//! # Debug metadata and logs
//! aim --debug
//!
//! # Only Codex, as JSON
//! aim --vendor codex --format json
//!
//! # Include Gemini 2.x models
//! aim --gemini-old
//! ```

mod output;
mod rows;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use aimeter_core::{UsageRow, VendorKind};
use aimeter_fetch::{CancellationToken, FetchContext, FetchSettings, HttpClient};
use aimeter_providers::{
    detect_credential_source, fetch_vendor, ClaudeVendor, CodexVendor, GeminiVendor, Vendor,
};
use aimeter_store::{Config, VendorConfig};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use futures::future::join_all;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use output::{JsonFormatter, TextFormatter};

/// Run deadline when neither the flag nor the config sets one.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

// ============================================================================
// CLI Definition
// ============================================================================

/// Usage quotas for Claude, Codex and Gemini.
#[derive(Parser)]
#[command(name = "aim")]
#[command(about = "Usage quotas for Claude, Codex and Gemini")]
#[command(long_about = r#"
aim reads the OAuth credentials of Claude, Codex and Gemini and reports
how much of each account's rate-limit windows is used.

Credentials are read from ~/.cli-proxy-api/ when it holds any vendor file,
otherwise from each tool's own directory (~/.claude, ~/.codex, ~/.gemini).
Expired proxy tokens are refreshed and written back; native tokens are not.
"#)]
#[command(version)]
pub struct Cli {
    /// Show debug metadata for usage rows and debug logs.
    #[arg(long)]
    pub debug: bool,

    /// Show Gemini 2.x models (gemini-2*).
    #[arg(long)]
    pub gemini_old: bool,

    /// Overall deadline in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format.
    #[arg(long, short = 'f', default_value = "text")]
    pub format: OutputFormat,

    /// Vendors to query, comma-separated (claude,codex,gemini).
    #[arg(long, value_delimiter = ',')]
    pub vendor: Vec<String>,

    /// Configuration file (default: ~/.config/aimeter/config.json).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Table with usage bars.
    #[default]
    Text,
    /// JSON rows for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success (including per-account warnings).
    Success = 0,
    /// Invalid arguments or configuration.
    Error = 1,
}

// ============================================================================
// Logging Setup
// ============================================================================

/// Filter used when `RUST_LOG` is unset. Covers the `aim` binary and the
/// `aimeter_*` libraries.
fn default_filter(debug: bool) -> &'static str {
    if debug {
        "aim=debug,aimeter=debug"
    } else {
        "aim=warn,aimeter=warn"
    }
}

fn setup_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.debug);

    let code = match run(&cli).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::Error
        }
    };
    std::process::exit(code as i32);
}

async fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    let kinds = selected_vendors(&cli.vendor, &config)?;
    let timeout = cli
        .timeout
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .or_else(|| config.timeout())
        .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

    let home = dirs::home_dir();
    let source = detect_credential_source(home.as_deref());
    info!(source = ?source, timeout_secs = timeout.as_secs(), "Starting run");

    let cancel = CancellationToken::new();
    let settings = FetchSettings::default()
        .with_timeout(timeout)
        .with_debug(cli.debug);
    let mut builder = FetchContext::builder()
        .http(Arc::new(HttpClient::with_timeout(timeout)?))
        .settings(settings)
        .credential_source(source)
        .cancel_token(cancel.clone());
    if let Some(home) = &home {
        builder = builder.home_dir(home);
    }
    let ctx = builder.build()?;

    let deadline = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(timeout).await;
            debug!("Run deadline reached, cancelling requests");
            cancel.cancel();
        }
    });

    let vendors: Vec<Box<dyn Vendor>> = kinds
        .iter()
        .map(|kind| build_vendor(*kind, &config.vendor(*kind)))
        .collect();
    let results = join_all(vendors.iter().map(|vendor| fetch_vendor(vendor.as_ref(), &ctx))).await;
    deadline.abort();

    let mut all_rows: Vec<UsageRow> = results.into_iter().flatten().collect();
    all_rows = rows::filter_rows(all_rows, cli.gemini_old);
    rows::sort_rows(&mut all_rows);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(output::colors_enabled(stdout.is_terminal()))
                .with_debug(cli.debug)
                .with_terminal_width(output::terminal_width(stdout.is_terminal()));
            if home.is_some() {
                writeln!(out, "{}", formatter.format_source(source))?;
            }
            write!(out, "{}", formatter.format_table(&rows::layout(all_rows)))?;
        }
        OutputFormat::Json => {
            writeln!(out, "{}", JsonFormatter::format_report(source, &all_rows)?)?;
        }
    }
    Ok(())
}

/// Vendors to query: the `--vendor` list, else every vendor the config leaves
/// enabled, in report order.
fn selected_vendors(requested: &[String], config: &Config) -> Result<Vec<VendorKind>> {
    if requested.is_empty() {
        return Ok(VendorKind::all()
            .iter()
            .copied()
            .filter(|kind| config.is_vendor_enabled(*kind))
            .collect());
    }

    let mut kinds = requested
        .iter()
        .filter(|name| !name.trim().is_empty())
        .map(|name| name.parse::<VendorKind>())
        .collect::<Result<Vec<_>, _>>()?;
    kinds.sort();
    kinds.dedup();
    Ok(kinds)
}

fn build_vendor(kind: VendorKind, config: &VendorConfig) -> Box<dyn Vendor> {
    let base = config.base_url.as_deref();
    let token = config.token_url.as_deref();
    match kind {
        VendorKind::Claude => Box::new(ClaudeVendor::with_endpoints(
            base.unwrap_or(aimeter_providers::claude::DEFAULT_BASE_URL),
            token.unwrap_or(aimeter_providers::claude::DEFAULT_TOKEN_URL),
        )),
        VendorKind::Codex => Box::new(CodexVendor::with_endpoints(
            base.unwrap_or(aimeter_providers::codex::DEFAULT_BASE_URL),
            token.unwrap_or(aimeter_providers::codex::DEFAULT_TOKEN_URL),
        )),
        VendorKind::Gemini => Box::new(GeminiVendor::with_endpoints(
            base.unwrap_or(aimeter_providers::gemini::DEFAULT_BASE_URL),
            token.unwrap_or(aimeter_providers::gemini::DEFAULT_TOKEN_URL),
        )),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["aim"]);
        assert!(!cli.debug);
        assert!(!cli.gemini_old);
        assert!(cli.timeout.is_none());
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.vendor.is_empty());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "aim", "--debug", "--gemini-old", "--timeout", "5", "--format", "json", "--vendor",
            "codex,claude",
        ]);
        assert!(cli.debug);
        assert!(cli.gemini_old);
        assert_eq!(cli.timeout, Some(5));
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.vendor, vec!["codex", "claude"]);
    }

    #[test]
    fn test_default_filter_covers_binary_target() {
        assert!(default_filter(true).split(',').any(|d| d == "aim=debug"));
        assert!(default_filter(true).split(',').any(|d| d == "aimeter=debug"));
        assert!(default_filter(false).split(',').all(|d| d.ends_with("=warn")));
        assert!(EnvFilter::try_new(default_filter(true)).is_ok());
    }

    #[test]
    fn test_selected_vendors() {
        let config = Config::default();
        assert_eq!(
            selected_vendors(&[], &config).unwrap(),
            vec![VendorKind::Claude, VendorKind::Codex, VendorKind::Gemini]
        );

        let requested = vec!["gemini".to_string(), "Claude".to_string(), "gemini".to_string()];
        assert_eq!(
            selected_vendors(&requested, &config).unwrap(),
            vec![VendorKind::Claude, VendorKind::Gemini]
        );

        assert!(selected_vendors(&["copilot".to_string()], &config).is_err());
    }

    #[test]
    fn test_disabled_vendor_is_skipped() {
        let mut config = Config::default();
        config.vendors.insert(
            "codex".to_string(),
            VendorConfig {
                enabled: false,
                ..VendorConfig::default()
            },
        );
        assert_eq!(
            selected_vendors(&[], &config).unwrap(),
            vec![VendorKind::Claude, VendorKind::Gemini]
        );
    }
}
