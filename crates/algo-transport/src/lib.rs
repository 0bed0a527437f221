//! REST transport to the node (`algod`) and wallet (`kmd`) daemons.
//!
//! This crate is the network boundary of the workspace: it submits compile
//! and dry-run requests, polls transaction confirmations and reads account
//! and application state. Everything above it is pure request building and
//! response parsing.
//!
//! Clients are usually built from a node's data directory, which holds the
//! daemon's listen address and API token as plain files:
//!
//! ```ignore
//! use algo_transport::config::algod_from_data_dir;
//!
//! let client = algod_from_data_dir("/var/lib/algorand/nets/private_dev/Primary".as_ref())?;
//! let status = client.status()?;
//! ```

pub mod algod;
pub mod appstate;
pub mod config;
pub mod confirm;
pub mod kmd;

pub use algod::AlgodClient;
pub use kmd::KmdClient;
