//! Shared types for the algo-sandbox workspace.
//!
//! This crate is the canonical source for the wire-level vocabulary used by
//! every other workspace crate:
//!
//! - [`error`]: the library error enum ([`AppDevError`])
//! - [`value`]: the tagged TEAL value codec (uint / byte-string unions)
//! - [`address`]: checksummed base32 address encoding and app-derived addresses
//! - [`models`]: algod REST models (applications, accounts, transactions,
//!   dryrun requests)
//!
//! Other crates should import from here rather than defining their own
//! encodings.

pub mod address;
pub mod error;
pub mod models;
pub mod value;

pub use error::{AppDevError, Result};

/// Maximum byte length of an application state key.
pub const MAX_KEY_BYTES: usize = 64;

/// Maximum number of state entries of one kind in a schema. Used as the
/// "most permissive" schema when a dry-run application declares none.
pub const MAX_SCHEMA_SLOTS: u64 = 64;

/// Largest assignable application id.
pub const MAX_APP_ID: u64 = u64::MAX;
