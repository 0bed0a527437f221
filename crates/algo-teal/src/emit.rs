//! Renderer from an expression tree to TEAL source.
//!
//! The renderer is deliberately small: it performs no optimization and no
//! type checking beyond what the tree's shape enforces, it only flattens the
//! tree into the stack machine's instruction order. Output is a pure
//! function of the input tree.

use std::collections::HashMap;

use anyhow::{bail, Result};

use algo_sandbox_types::models::OnComplete;

use crate::expr::{Expr, GlobalField, SlotId, TxnField};

/// The program version the renderer targets.
pub const TEAL_VERSION: u32 = 6;

/// Physical scratch slots available to a program.
const NUM_SLOTS: usize = 256;

/// Render an expression tree to TEAL source.
///
/// Fails only when the tree references more distinct scratch slots than the
/// machine has.
pub fn compile_expr(expr: &Expr) -> Result<String> {
    let mut renderer = Renderer::default();
    let mut lines = vec![format!("#pragma version {}", TEAL_VERSION)];
    renderer.emit(expr, &mut lines)?;
    lines.push(String::new());
    Ok(lines.join("\n"))
}

#[derive(Default)]
struct Renderer {
    labels: usize,
    slots: HashMap<SlotId, usize>,
}

impl Renderer {
    fn label(&mut self) -> String {
        let label = format!("l{}", self.labels);
        self.labels += 1;
        label
    }

    fn slot(&mut self, id: SlotId) -> Result<usize> {
        if let Some(&slot) = self.slots.get(&id) {
            return Ok(slot);
        }
        let slot = self.slots.len();
        if slot >= NUM_SLOTS {
            bail!("program uses more than {} scratch slots", NUM_SLOTS);
        }
        self.slots.insert(id, slot);
        Ok(slot)
    }

    fn emit(&mut self, expr: &Expr, out: &mut Vec<String>) -> Result<()> {
        match expr {
            Expr::Int(value) => out.push(format!("int {}", value)),
            Expr::OnComplete(oc) => out.push(format!("int {}", on_complete_name(*oc))),
            Expr::Bytes(bytes) => {
                if bytes.is_empty() {
                    out.push("byte \"\"".into());
                } else {
                    out.push(format!("byte 0x{}", hex::encode(bytes)));
                }
            }
            Expr::Addr(address) => out.push(format!("addr {}", address)),
            Expr::Txn(field) => out.push(format!("txn {}", txn_field_name(*field))),
            Expr::TxnArg(index) => out.push(format!("txna ApplicationArgs {}", index)),
            Expr::Global(field) => out.push(format!("global {}", global_field_name(*field))),
            Expr::Load(id) => {
                let slot = self.slot(*id)?;
                out.push(format!("load {}", slot));
            }
            Expr::Eq(a, b) => {
                self.emit(a, out)?;
                self.emit(b, out)?;
                out.push("==".into());
            }
            Expr::Ge(a, b) => {
                self.emit(a, out)?;
                self.emit(b, out)?;
                out.push(">=".into());
            }
            Expr::And(a, b) => {
                self.emit(a, out)?;
                self.emit(b, out)?;
                out.push("&&".into());
            }
            Expr::If { cond, then, otherwise } => {
                let else_label = self.label();
                let end_label = self.label();
                self.emit(cond, out)?;
                out.push(format!("bz {}", else_label));
                self.emit(then, out)?;
                out.push(format!("b {}", end_label));
                out.push(format!("{}:", else_label));
                self.emit(otherwise, out)?;
                out.push(format!("{}:", end_label));
            }
            Expr::Seq(exprs) => {
                for expr in exprs {
                    self.emit(expr, out)?;
                }
            }
            Expr::Cond(branches) => {
                let labels: Vec<String> = branches.iter().map(|_| self.label()).collect();
                for ((predicate, _), label) in branches.iter().zip(&labels) {
                    self.emit(predicate, out)?;
                    out.push(format!("bnz {}", label));
                }
                // no branch matched
                out.push("err".into());
                for ((_, body), label) in branches.iter().zip(&labels) {
                    out.push(format!("{}:", label));
                    self.emit(body, out)?;
                }
            }
            Expr::Return(value) => {
                self.emit(value, out)?;
                out.push("return".into());
            }
            Expr::AppGlobalGet(key) => {
                self.emit(key, out)?;
                out.push("app_global_get".into());
            }
            Expr::AppGlobalPut(key, value) => {
                self.emit(key, out)?;
                self.emit(value, out)?;
                out.push("app_global_put".into());
            }
            Expr::AppGlobalDel(key) => {
                self.emit(key, out)?;
                out.push("app_global_del".into());
            }
            Expr::AppLocalGet(account, key) => {
                self.emit(account, out)?;
                self.emit(key, out)?;
                out.push("app_local_get".into());
            }
            Expr::AppLocalPut(account, key, value) => {
                self.emit(account, out)?;
                self.emit(key, out)?;
                self.emit(value, out)?;
                out.push("app_local_put".into());
            }
            Expr::AppLocalDel(account, key) => {
                self.emit(account, out)?;
                self.emit(key, out)?;
                out.push("app_local_del".into());
            }
            Expr::GlobalGetEx { app, key, value_slot, flag_slot } => {
                self.emit(app, out)?;
                self.emit(key, out)?;
                out.push("app_global_get_ex".into());
                // the presence flag is on top of the stack
                let flag = self.slot(*flag_slot)?;
                let value = self.slot(*value_slot)?;
                out.push(format!("store {}", flag));
                out.push(format!("store {}", value));
            }
            Expr::LocalGetEx { account, app, key, value_slot, flag_slot } => {
                self.emit(account, out)?;
                self.emit(app, out)?;
                self.emit(key, out)?;
                out.push("app_local_get_ex".into());
                let flag = self.slot(*flag_slot)?;
                let value = self.slot(*value_slot)?;
                out.push(format!("store {}", flag));
                out.push(format!("store {}", value));
            }
        }
        Ok(())
    }
}

fn on_complete_name(oc: OnComplete) -> &'static str {
    match oc {
        OnComplete::NoOp => "NoOp",
        OnComplete::OptIn => "OptIn",
        OnComplete::CloseOut => "CloseOut",
        OnComplete::ClearState => "ClearState",
        OnComplete::UpdateApplication => "UpdateApplication",
        OnComplete::DeleteApplication => "DeleteApplication",
    }
}

fn txn_field_name(field: TxnField) -> &'static str {
    match field {
        TxnField::Sender => "Sender",
        TxnField::ApplicationId => "ApplicationID",
        TxnField::OnCompletion => "OnCompletion",
        TxnField::NumAppArgs => "NumAppArgs",
    }
}

fn global_field_name(field: GlobalField) -> &'static str {
    match field {
        GlobalField::CurrentApplicationId => "CurrentApplicationID",
        GlobalField::CreatorAddress => "CreatorAddress",
        GlobalField::Round => "Round",
        GlobalField::LatestTimestamp => "LatestTimestamp",
    }
}
