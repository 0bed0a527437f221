//! Application construction and dry-run simulation.
//!
//! The crate has three layers, bottom up:
//!
//! - [`state`]: declarative descriptors for an application's global and
//!   per-account storage, yielding schemas and read/write logic fragments
//! - [`apps`]: the [`AppBuilder`](apps::AppBuilder), which assembles
//!   per-lifecycle logic fragments and named invocations into approval and
//!   clear-state programs plus creation/update transactions
//! - [`dryruns`]: the [`AppCallCtx`](dryruns::AppCallCtx) simulation
//!   context builder and the decoders for dry-run results
//!
//! A typical flow: declare state, register logic on an `AppBuilder`, then
//! either deploy it through a node client or exercise it with a dry run:
//!
//! ```no_run
//! use algo_sandbox_core::apps::AppBuilder;
//! use algo_sandbox_core::dryruns::{self, AppCallCtx};
//! use algo_sandbox_types::models::OnComplete;
//! use algo_transport::AlgodClient;
//!
//! # fn main() -> anyhow::Result<()> {
//! let client = AlgodClient::new("http://localhost:4001", "token");
//! let builder = AppBuilder::default();
//!
//! let ctx = AppCallCtx::default()
//!     .with_application(dryruns::build_application_compiled(
//!         1, &builder, &client, None, None,
//!     )?)
//!     .with_account_opted_in(None, None, None)?
//!     .with_call(OnComplete::NoOp, None, None, None, vec![]);
//!
//! let result = client.dryrun(&ctx.build_request())?;
//! dryruns::check_err(&result)?;
//! for message in dryruns::get_messages(&result, 0) {
//!     println!("{}", message);
//! }
//! # Ok(())
//! # }
//! ```

pub mod apps;
pub mod dryruns;
pub mod state;

pub use apps::AppBuilder;
pub use dryruns::AppCallCtx;
pub use state::{KeyInfo, State, StateGlobal, StateLocal, TealType};
