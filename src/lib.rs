//! Developer convenience layer for Algorand applications.
//!
//! This crate re-exports the workspace's layers under one roof:
//!
//! - [`value`], [`address`], [`models`], [`error`]: wire-level vocabulary
//!   (typed state values, checksummed addresses, algod REST models)
//! - [`teal`]: the expression tree and its deterministic TEAL renderer
//! - [`transport`]: algod/kmd clients, client factories reading a node's
//!   data directory, and confirmation polling
//! - [`state`], [`apps`], [`dryruns`]: state descriptors, the application
//!   builder, and the dry-run context and result decoders
//!
//! See `algo_sandbox_core` for a worked end-to-end example.

pub use algo_sandbox_core::{apps, dryruns, state};
pub use algo_sandbox_core::{AppBuilder, AppCallCtx};
pub use algo_sandbox_types::{address, error, models, value};
pub use algo_sandbox_types::{AppDevError, Result};
pub use algo_teal as teal;
pub use algo_transport as transport;
pub use algo_transport::{AlgodClient, KmdClient};
