//! The expression tree and its constructors.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use algo_sandbox_types::models::OnComplete;

/// A logical scratch-slot id. Logical ids are process-unique; the renderer
/// maps each distinct id to a physical slot (0..=255) in first-use order, so
/// renders stay deterministic no matter how many handles a process created
/// before this program's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub usize);

static NEXT_SLOT: AtomicUsize = AtomicUsize::new(0);

impl SlotId {
    fn alloc() -> SlotId {
        SlotId(NEXT_SLOT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Transaction fields readable from program logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnField {
    Sender,
    ApplicationId,
    OnCompletion,
    NumAppArgs,
}

/// Global environment fields readable from program logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalField {
    CurrentApplicationId,
    CreatorAddress,
    Round,
    LatestTimestamp,
}

/// A TEAL expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Int(u64),
    /// A named completion-kind constant.
    OnComplete(OnComplete),
    Bytes(Vec<u8>),
    Addr(String),
    Txn(TxnField),
    /// The n-th application call argument.
    TxnArg(u8),
    Global(GlobalField),
    /// Read a scratch slot.
    Load(SlotId),
    Eq(Box<Expr>, Box<Expr>),
    Ge(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Seq(Vec<Expr>),
    /// Ordered (predicate, body) branches; the first matching predicate's
    /// body runs, and a program with no matching branch errs.
    Cond(Vec<(Expr, Expr)>),
    Return(Box<Expr>),
    AppGlobalGet(Box<Expr>),
    AppGlobalPut(Box<Expr>, Box<Expr>),
    AppGlobalDel(Box<Expr>),
    AppLocalGet(Box<Expr>, Box<Expr>),
    AppLocalPut(Box<Expr>, Box<Expr>, Box<Expr>),
    AppLocalDel(Box<Expr>, Box<Expr>),
    /// Read a key from a foreign application's global state, storing the
    /// (value, presence) pair into scratch slots.
    GlobalGetEx {
        app: Box<Expr>,
        key: Box<Expr>,
        value_slot: SlotId,
        flag_slot: SlotId,
    },
    /// Read a key from an account's local state for a foreign application.
    LocalGetEx {
        account: Box<Expr>,
        app: Box<Expr>,
        key: Box<Expr>,
        value_slot: SlotId,
        flag_slot: SlotId,
    },
}

pub fn int(value: u64) -> Expr {
    Expr::Int(value)
}

pub fn bytes(value: impl Into<Vec<u8>>) -> Expr {
    Expr::Bytes(value.into())
}

pub fn addr(address: impl Into<String>) -> Expr {
    Expr::Addr(address.into())
}

pub fn eq(a: Expr, b: Expr) -> Expr {
    Expr::Eq(Box::new(a), Box::new(b))
}

pub fn ge(a: Expr, b: Expr) -> Expr {
    Expr::Ge(Box::new(a), Box::new(b))
}

pub fn and(a: Expr, b: Expr) -> Expr {
    Expr::And(Box::new(a), Box::new(b))
}

pub fn if_else(cond: Expr, then: Expr, otherwise: Expr) -> Expr {
    Expr::If { cond: Box::new(cond), then: Box::new(then), otherwise: Box::new(otherwise) }
}

pub fn seq(exprs: Vec<Expr>) -> Expr {
    Expr::Seq(exprs)
}

pub fn cond(branches: Vec<(Expr, Expr)>) -> Expr {
    Expr::Cond(branches)
}

pub fn ret(value: Expr) -> Expr {
    Expr::Return(Box::new(value))
}

/// `return 1`: approve the call.
pub fn approve() -> Expr {
    ret(int(1))
}

/// `return 0`: reject the call.
pub fn reject() -> Expr {
    ret(int(0))
}

/// The kind of external read a [`MaybeValue`] performs.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ExRead {
    Global { app: Expr, key: Expr },
    Local { account: Expr, app: Expr, key: Expr },
}

/// A pending external state read bound to a pair of scratch slots.
///
/// Evaluating the handle ([`MaybeValue::eval`]) performs the read and stores
/// the value and its presence flag into the handle's slots; [`value`] and
/// [`has_value`] then load from those same slots. The sequencing contract is
/// the caller's: a load is only meaningful after the handle was evaluated
/// earlier in the same program.
///
/// Handles are shared (`Rc`): a second handle for the same key would own
/// *different* slots and would not see the first handle's stored value, which
/// is why the state descriptors memoize one handle per key.
///
/// [`value`]: MaybeValue::value
/// [`has_value`]: MaybeValue::has_value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaybeValue {
    value_slot: SlotId,
    flag_slot: SlotId,
    read: ExRead,
}

impl MaybeValue {
    /// A handle reading `key` from the global state of `app`.
    pub fn global_get_ex(app: Expr, key: Expr) -> Rc<MaybeValue> {
        Rc::new(MaybeValue {
            value_slot: SlotId::alloc(),
            flag_slot: SlotId::alloc(),
            read: ExRead::Global { app, key },
        })
    }

    /// A handle reading `key` from `account`'s local state for `app`.
    pub fn local_get_ex(account: Expr, app: Expr, key: Expr) -> Rc<MaybeValue> {
        Rc::new(MaybeValue {
            value_slot: SlotId::alloc(),
            flag_slot: SlotId::alloc(),
            read: ExRead::Local { account, app, key },
        })
    }

    /// The expression performing the read and filling this handle's slots.
    pub fn eval(&self) -> Expr {
        match &self.read {
            ExRead::Global { app, key } => Expr::GlobalGetEx {
                app: Box::new(app.clone()),
                key: Box::new(key.clone()),
                value_slot: self.value_slot,
                flag_slot: self.flag_slot,
            },
            ExRead::Local { account, app, key } => Expr::LocalGetEx {
                account: Box::new(account.clone()),
                app: Box::new(app.clone()),
                key: Box::new(key.clone()),
                value_slot: self.value_slot,
                flag_slot: self.flag_slot,
            },
        }
    }

    /// Load the stored value. Requires an earlier [`eval`](MaybeValue::eval).
    pub fn value(&self) -> Expr {
        Expr::Load(self.value_slot)
    }

    /// Load the presence flag. Requires an earlier [`eval`](MaybeValue::eval).
    pub fn has_value(&self) -> Expr {
        Expr::Load(self.flag_slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_handles_for_one_key_use_distinct_slots() {
        let a = MaybeValue::global_get_ex(int(1), bytes(b"k".to_vec()));
        let b = MaybeValue::global_get_ex(int(1), bytes(b"k".to_vec()));
        assert_ne!(a.value(), b.value());
        assert_ne!(a.has_value(), b.has_value());
    }

    #[test]
    fn eval_references_the_handle_slots() {
        let handle = MaybeValue::local_get_ex(addr("A"), int(1), bytes(b"k".to_vec()));
        match handle.eval() {
            Expr::LocalGetEx { value_slot, flag_slot, .. } => {
                assert_eq!(handle.value(), Expr::Load(value_slot));
                assert_eq!(handle.has_value(), Expr::Load(flag_slot));
            }
            other => panic!("unexpected expression: {:?}", other),
        }
    }
}
