// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # aimeter providers
//!
//! Credential resolution, OAuth refresh and quota clients for each vendor.
//!
//! | Vendor | Proxy files | Native file | Refresh grant |
//! |--------|-------------|-------------|---------------|
//! | Claude | `claude-*.json` | `~/.claude/.credentials.json` | JSON body |
//! | Codex | `codex-*.json` | `~/.codex/auth.json` | form body |
//! | Gemini | every other `*.json` | `~/.gemini/oauth_creds.json` | form body |
//!
//! Every vendor implements [`Vendor`]; [`orchestrator::fetch_vendor`] drives
//! one vendor's accounts through query, refresh and retry.
//!
//! ## Usage
//!
//! ```ignore
//! use aimeter_fetch::FetchContext;
//! use aimeter_providers::{detect_credential_source, fetch_vendor, ClaudeVendor};
//!
//! let source = detect_credential_source(dirs::home_dir().as_deref());
//! let ctx = FetchContext::builder().credential_source(source).build()?;
//! let rows = fetch_vendor(&ClaudeVendor::new(), &ctx).await;
//! ```

pub mod error;
pub mod jwt;
mod loader;
pub mod orchestrator;
pub mod refresh;
pub mod source;
pub mod vendor;

// Vendor modules (alphabetical)
pub mod claude;
pub mod codex;
pub mod gemini;

pub use claude::ClaudeVendor;
pub use codex::CodexVendor;
pub use error::{warning_message, ProviderError};
pub use gemini::GeminiVendor;
pub use orchestrator::{fetch_account, fetch_vendor, FetchOutcome};
pub use source::{detect_credential_source, native_credentials_path, proxy_dir};
pub use vendor::Vendor;
