// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # aimeter store
//!
//! Everything that touches files on disk besides credential discovery:
//!
//! - **Credentials**: atomic read-merge-write of JSON credential files
//!   that keeps keys this program does not know about
//! - **Config**: optional read-only JSON configuration
//!
//! ## Usage
//!
//! ```ignore
//! use aimeter_store::{format_credential_time, update_json_credentials};
//! use serde_json::Value;
//!
//! update_json_credentials(&path, |data| {
//!     data.insert("access_token".into(), Value::from(new_token));
//!     data.insert("last_refresh".into(), Value::from(format_credential_time(now)));
//!     Ok(())
//! })?;
//! ```

pub mod config;
pub mod credentials;
pub mod error;

pub use config::{Config, VendorConfig};
pub use credentials::{format_credential_time, nested_object_mut, update_json_credentials};
pub use error::StoreError;

#[cfg(test)]
mod credentials_tests;
