//! Domain models for aimeter.
//!
//! ## Submodules
//!
//! - [`vendor`] - Vendor kinds and the process-wide credential source
//! - [`account`] - The normalized account model
//! - [`usage`] - Usage report rows

mod account;
mod usage;
mod vendor;

pub use account::{Account, NATIVE_IDENTITY};
pub use usage::UsageRow;
pub use vendor::{CredentialSource, VendorKind};
