// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # aimeter fetch
//!
//! Host plumbing shared by every vendor:
//!
//! - [`http::HttpClient`] - reqwest wrapper whose requests race a
//!   cancellation token
//! - [`context::FetchContext`] - per-run settings, home directory, credential
//!   source and cancellation token
//! - [`body`] - response body truncation and token redaction for logs
//! - [`error::FetchError`] - transport and status errors

pub mod body;
pub mod context;
pub mod error;
pub mod http;

pub use body::{debug_body, redact_tokens, truncate_body, MAX_ERROR_BODY_BYTES};
pub use context::{FetchContext, FetchContextBuilder, FetchSettings};
pub use error::{ApiStatusError, FetchError};
pub use http::{HttpClient, HttpResponse, USER_AGENT};
pub use tokio_util::sync::CancellationToken;
