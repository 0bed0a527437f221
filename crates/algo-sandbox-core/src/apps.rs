//! The application builder.
//!
//! An [`AppBuilder`] collects per-completion-kind logic fragments, named
//! invocations and state descriptors, and assembles them into the approval
//! and clear-state programs plus the matching creation and update
//! transactions.
//!
//! ## Example
//!
//! ```no_run
//! use algo_sandbox_core::apps::AppBuilder;
//! use algo_sandbox_core::state::{KeyInfo, StateGlobal, TealType};
//! use algo_teal::expr;
//!
//! let state = StateGlobal::new(vec![
//!     KeyInfo::new(b"count", TealType::Uint, Some(expr::int(0))).unwrap(),
//! ])
//! .unwrap();
//! let builder = AppBuilder::default()
//!     .with_global_state(state)
//!     .with_invocation("ping", expr::approve());
//! let approval = builder.approval_source().unwrap();
//! ```

use anyhow::Result;

use algo_sandbox_types::models::{
    OnComplete, StateSchema, SuggestedParams, Transaction,
};
use algo_sandbox_types::value::base64_encode;
use algo_teal::emit::compile_expr;
use algo_teal::expr::{self, Expr, TxnField};
use algo_transport::AlgodClient;

use crate::state::{StateGlobal, StateLocal};

/// Accumulates application logic and state, then renders programs and
/// transactions.
///
/// Every fragment is optional; an empty builder yields an application that
/// approves creation and rejects everything else.
#[derive(Debug, Default)]
pub struct AppBuilder {
    on_create: Option<Expr>,
    on_delete: Option<Expr>,
    on_update: Option<Expr>,
    on_opt_in: Option<Expr>,
    on_close_out: Option<Expr>,
    on_clear: Option<Expr>,
    /// Logic for a plain call carrying no arguments.
    on_no_op: Option<Expr>,
    /// Named entry points, dispatched on the first call argument.
    invocations: Vec<(String, Expr)>,
    global_state: Option<StateGlobal>,
    local_state: Option<StateLocal>,
}

impl AppBuilder {
    pub fn with_on_create(mut self, expr: Expr) -> Self {
        self.on_create = Some(expr);
        self
    }

    pub fn with_on_delete(mut self, expr: Expr) -> Self {
        self.on_delete = Some(expr);
        self
    }

    pub fn with_on_update(mut self, expr: Expr) -> Self {
        self.on_update = Some(expr);
        self
    }

    pub fn with_on_opt_in(mut self, expr: Expr) -> Self {
        self.on_opt_in = Some(expr);
        self
    }

    pub fn with_on_close_out(mut self, expr: Expr) -> Self {
        self.on_close_out = Some(expr);
        self
    }

    pub fn with_on_clear(mut self, expr: Expr) -> Self {
        self.on_clear = Some(expr);
        self
    }

    /// Logic for a no-op call with no arguments.
    pub fn with_on_no_op(mut self, expr: Expr) -> Self {
        self.on_no_op = Some(expr);
        self
    }

    /// Register logic dispatched when the first call argument equals `name`.
    /// Registration order is dispatch order.
    pub fn with_invocation(mut self, name: impl Into<String>, expr: Expr) -> Self {
        self.invocations.push((name.into(), expr));
        self
    }

    pub fn with_global_state(mut self, state: StateGlobal) -> Self {
        self.global_state = Some(state);
        self
    }

    pub fn with_local_state(mut self, state: StateLocal) -> Self {
        self.local_state = Some(state);
        self
    }

    pub fn global_state(&self) -> Option<&StateGlobal> {
        self.global_state.as_ref()
    }

    pub fn local_state(&self) -> Option<&StateLocal> {
        self.local_state.as_ref()
    }

    /// Global storage allocation this application requires.
    pub fn global_schema(&self) -> StateSchema {
        self.global_state.as_ref().map(|s| s.schema()).unwrap_or_default()
    }

    /// Local storage allocation this application requires of opted-in
    /// accounts.
    pub fn local_schema(&self) -> StateSchema {
        self.local_state.as_ref().map(|s| s.schema()).unwrap_or_default()
    }

    fn oc_is(on_complete: OnComplete) -> Expr {
        expr::eq(Expr::Txn(TxnField::OnCompletion), Expr::OnComplete(on_complete))
    }

    /// The assembled approval logic.
    ///
    /// Branches are tried in a fixed order: creation, then each non-no-op
    /// completion kind, then named invocations in registration order, then
    /// the argument-less default call. A call matching no branch is
    /// rejected. Creation and opt-in fall back to seeding the declared
    /// state defaults; delete, update and close-out fall back to rejection.
    pub fn approval_expr(&self) -> Expr {
        let mut branches: Vec<(Expr, Expr)> = Vec::new();

        let on_create = self.on_create.clone().unwrap_or_else(|| {
            let mut steps = Vec::new();
            if let Some(state) = &self.global_state {
                steps.push(state.constructor());
            }
            steps.push(expr::approve());
            expr::seq(steps)
        });
        branches.push((
            expr::eq(Expr::Txn(TxnField::ApplicationId), expr::int(0)),
            on_create,
        ));

        branches.push((
            Self::oc_is(OnComplete::DeleteApplication),
            self.on_delete.clone().unwrap_or_else(expr::reject),
        ));
        branches.push((
            Self::oc_is(OnComplete::UpdateApplication),
            self.on_update.clone().unwrap_or_else(expr::reject),
        ));

        let on_opt_in = self.on_opt_in.clone().unwrap_or_else(|| {
            let mut steps = Vec::new();
            if let Some(state) = &self.local_state {
                steps.push(state.constructor());
            }
            steps.push(expr::approve());
            expr::seq(steps)
        });
        branches.push((Self::oc_is(OnComplete::OptIn), on_opt_in));

        branches.push((
            Self::oc_is(OnComplete::CloseOut),
            self.on_close_out.clone().unwrap_or_else(expr::reject),
        ));

        for (name, body) in &self.invocations {
            // guard the argument read behind the argument count so that
            // argument-less calls fall through instead of erring
            let predicate = expr::and(
                Self::oc_is(OnComplete::NoOp),
                expr::if_else(
                    expr::ge(Expr::Txn(TxnField::NumAppArgs), expr::int(1)),
                    expr::eq(Expr::TxnArg(0), expr::bytes(name.as_bytes().to_vec())),
                    expr::int(0),
                ),
            );
            branches.push((predicate, body.clone()));
        }

        if let Some(on_no_op) = &self.on_no_op {
            let predicate = expr::and(
                Self::oc_is(OnComplete::NoOp),
                expr::eq(Expr::Txn(TxnField::NumAppArgs), expr::int(0)),
            );
            branches.push((predicate, on_no_op.clone()));
        }

        branches.push((expr::int(1), expr::reject()));
        expr::cond(branches)
    }

    /// The assembled clear-state logic. Clear-state always succeeds unless
    /// explicit logic was given.
    pub fn clear_expr(&self) -> Expr {
        self.on_clear.clone().unwrap_or_else(expr::approve)
    }

    /// Render the approval program to TEAL source.
    pub fn approval_source(&self) -> Result<String> {
        compile_expr(&self.approval_expr())
    }

    /// Render the clear-state program to TEAL source.
    pub fn clear_source(&self) -> Result<String> {
        compile_expr(&self.clear_expr())
    }

    /// Assemble both programs through the node's compile endpoint.
    pub fn compile_programs(&self, client: &AlgodClient) -> Result<(Vec<u8>, Vec<u8>)> {
        let approval = client.compile(&self.approval_source()?)?;
        let clear = client.compile(&self.clear_source()?)?;
        Ok((approval, clear))
    }

    /// The transaction creating this application.
    pub fn create_txn(
        &self,
        client: &AlgodClient,
        sender: &str,
        params: &SuggestedParams,
    ) -> Result<Transaction> {
        let (approval, clear) = self.compile_programs(client)?;
        let mut txn = Transaction::app_call(sender, params, 0, OnComplete::NoOp);
        txn.apap = Some(base64_encode(&approval));
        txn.apsu = Some(base64_encode(&clear));
        txn.apgs = Some(self.global_schema());
        txn.apls = Some(self.local_schema());
        Ok(txn)
    }

    /// The transaction replacing the programs of the deployed application
    /// `app_id`. The state schemas are fixed at creation and not resent.
    pub fn update_txn(
        &self,
        client: &AlgodClient,
        sender: &str,
        params: &SuggestedParams,
        app_id: u64,
    ) -> Result<Transaction> {
        let (approval, clear) = self.compile_programs(client)?;
        let mut txn =
            Transaction::app_call(sender, params, app_id, OnComplete::UpdateApplication);
        txn.apap = Some(base64_encode(&approval));
        txn.apsu = Some(base64_encode(&clear));
        Ok(txn)
    }
}
