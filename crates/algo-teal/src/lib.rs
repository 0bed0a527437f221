//! Minimal TEAL expression layer.
//!
//! This crate is the seam between the workspace and the contract-description
//! language: an expression tree carrying exactly the constructors the state
//! descriptors and application builder need, and a pure, deterministic
//! renderer from a tree to TEAL source ([`emit::compile_expr`]). Turning the
//! source into program bytes is a node service call and lives in
//! `algo-transport`.
//!
//! Rendering is a pure function of the tree: compiling the same expression
//! twice yields byte-identical source, which is what makes program
//! comparisons (e.g. update-in-place checks) meaningful.
//!
//! # Example
//!
//! ```
//! use algo_teal::expr::{self, Expr};
//! use algo_teal::emit::compile_expr;
//!
//! let program = expr::ret(expr::int(1));
//! let source = compile_expr(&program).unwrap();
//! assert!(source.contains("int 1"));
//! ```

pub mod emit;
pub mod expr;

pub use emit::compile_expr;
pub use expr::{Expr, MaybeValue};
