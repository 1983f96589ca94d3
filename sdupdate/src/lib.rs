//! SD-card-driven firmware update core for a resource-constrained
//! bootloader.
//!
//! On boot, before any application code runs, [`orchestrator::do_update`]
//! inspects a removable medium for a candidate firmware image, validates it
//! against its embedded SHA-256 digest, backs up the currently installed
//! firmware, writes the candidate into the primary flash slot, and reverts
//! from the backup if the write fails.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub mod copier;
pub mod digest;
pub mod error;
pub mod header;
pub mod orchestrator;
pub mod session;
mod tlv;
mod util;
pub mod validate;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{CopyError, ImageError, UpdateError};
pub use header::{ImageHeader, ImageVersion, IMAGE_MAGIC};
pub use orchestrator::{do_update, Config};
pub use session::UpdateSession;
pub use tlv::{tlv_iter_begin, TlvIter, TlvRecord, SHA256_TLV_TYPE};
pub use validate::validate;
