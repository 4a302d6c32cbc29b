// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # aimeter Core
//!
//! Core types and models shared by every aimeter crate.
//!
//! ## Key Types
//!
//! - [`VendorKind`] - The three supported coding-assistant vendors
//! - [`CredentialSource`] - Where credentials are read from for the whole run
//! - [`Account`] - One normalized credential, whatever its on-disk shape
//! - [`UsageRow`] - One line of the usage report
//! - [`CoreError`] - Validation errors for the types above

pub mod error;
pub mod models;

pub use error::CoreError;

pub use models::{Account, CredentialSource, UsageRow, VendorKind, NATIVE_IDENTITY};
