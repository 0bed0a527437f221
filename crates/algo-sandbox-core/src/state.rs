//! Declarative application state descriptors.
//!
//! A descriptor names a fixed set of storage slots, each with a value kind
//! and an optional default expression. From it the builder derives the
//! storage schema used at creation time and the logic fragments that read,
//! write and seed the slots.
//!
//! The external variants read *another* application's (or account's) state
//! through pending-read handles. A handle is memoized per key: the handle
//! remembers which scratch slots the read fills, so the same handle must be
//! reused to consume a previously evaluated read. Descriptors own that
//! memoization table; build one application builder (and its descriptors)
//! per logical application design rather than sharing them across builds.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Deref;
use std::rc::Rc;

use algo_sandbox_types::error::{AppDevError, Result};
use algo_sandbox_types::models::StateSchema;
use algo_sandbox_types::MAX_KEY_BYTES;
use algo_teal::expr::{self, Expr, GlobalField, TxnField};
use algo_teal::MaybeValue;

/// A state key as accepted at the API boundary: a small integer, text, or
/// raw bytes. Normalized to bytes immediately on use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Int(u64),
    Str(String),
    Bytes(Vec<u8>),
}

impl From<u64> for Key {
    fn from(v: u64) -> Self {
        Key::Int(v)
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Str(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Str(v)
    }
}

impl From<Vec<u8>> for Key {
    fn from(v: Vec<u8>) -> Self {
        Key::Bytes(v)
    }
}

impl From<&[u8]> for Key {
    fn from(v: &[u8]) -> Self {
        Key::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Key {
    fn from(v: &[u8; N]) -> Self {
        Key::Bytes(v.to_vec())
    }
}

/// Normalize a key to its canonical byte form.
///
/// Integers must fit one byte (at most 64 keys are ever allowed, so this is
/// not a practical limit); the byte order is big-endian for consistency with
/// TEAL conventions. The canonical form may not exceed the platform's
/// 64-byte key limit.
pub fn key_to_bytes(key: &Key) -> Result<Vec<u8>> {
    let bytes = match key {
        Key::Int(value) => {
            if *value > u64::from(u8::MAX) {
                return Err(AppDevError::InvalidKeyType { value: *value });
            }
            vec![*value as u8]
        }
        Key::Str(text) => text.as_bytes().to_vec(),
        Key::Bytes(bytes) => bytes.clone(),
    };
    if bytes.len() > MAX_KEY_BYTES {
        return Err(AppDevError::KeyTooLong { key: bytes });
    }
    Ok(bytes)
}

/// The kind of value a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TealType {
    Uint,
    Bytes,
}

/// One declared storage slot: canonical key, value kind, optional default.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyInfo {
    pub key: Vec<u8>,
    pub kind: TealType,
    /// Expression producing the initial value, written by `constructor`.
    pub default: Option<Expr>,
}

impl KeyInfo {
    pub fn new(key: impl Into<Key>, kind: TealType, default: Option<Expr>) -> Result<KeyInfo> {
        Ok(KeyInfo { key: key_to_bytes(&key.into())?, kind, default })
    }
}

/// An ordered set of declared slots with unique keys.
#[derive(Debug)]
pub struct State {
    infos: Vec<KeyInfo>,
    index: HashMap<Vec<u8>, usize>,
}

impl State {
    /// Registering the same canonical key twice is rejected: the two
    /// declarations would silently shadow one another in the schema.
    pub fn new(infos: Vec<KeyInfo>) -> Result<State> {
        let mut index = HashMap::with_capacity(infos.len());
        for (position, info) in infos.iter().enumerate() {
            if index.insert(info.key.clone(), position).is_some() {
                return Err(AppDevError::DuplicateKey { key: info.key.clone() });
            }
        }
        Ok(State { infos, index })
    }

    /// The declaration for `key`.
    pub fn key_info(&self, key: impl Into<Key>) -> Result<&KeyInfo> {
        let key = key_to_bytes(&key.into())?;
        match self.index.get(&key) {
            Some(&position) => Ok(&self.infos[position]),
            None => Err(AppDevError::UnknownKey { key }),
        }
    }

    /// All declarations, in declaration order.
    pub fn key_infos(&self) -> &[KeyInfo] {
        &self.infos
    }

    /// Storage allocation counts, by declared kind. Must match the schema
    /// the application was created with: the platform rejects updates that
    /// would change it.
    pub fn schema(&self) -> StateSchema {
        let mut schema = StateSchema::default();
        for info in &self.infos {
            match info.kind {
                TealType::Uint => schema.num_uints += 1,
                TealType::Bytes => schema.num_byte_slices += 1,
            }
        }
        schema
    }
}

/// Read-only view of a foreign application's global state.
#[derive(Debug)]
pub struct StateGlobalExternal {
    state: State,
    app_id: Expr,
    pending: RefCell<HashMap<Vec<u8>, Rc<MaybeValue>>>,
}

impl Deref for StateGlobalExternal {
    type Target = State;

    fn deref(&self) -> &State {
        &self.state
    }
}

impl StateGlobalExternal {
    /// `app_id` must evaluate to an id in the call's foreign-application
    /// list (or the current application's id).
    pub fn new(infos: Vec<KeyInfo>, app_id: Expr) -> Result<StateGlobalExternal> {
        Ok(StateGlobalExternal {
            state: State::new(infos)?,
            app_id,
            pending: RefCell::new(HashMap::new()),
        })
    }

    /// The pending-read handle for `key`, creating and memoizing it on
    /// first use. Callers must evaluate the handle before loading from it.
    pub fn get_ex(&self, key: impl Into<Key>) -> Result<Rc<MaybeValue>> {
        let info = self.state.key_info(key)?;
        let mut pending = self.pending.borrow_mut();
        let handle = pending.entry(info.key.clone()).or_insert_with(|| {
            MaybeValue::global_get_ex(self.app_id.clone(), expr::bytes(info.key.clone()))
        });
        Ok(Rc::clone(handle))
    }

    /// Evaluate the read and yield its value. Re-running this fragment
    /// repeats the underlying read; to pay for it once, evaluate the handle
    /// at the start of the program and load from it afterwards.
    pub fn load_ex_value(&self, key: impl Into<Key>) -> Result<Expr> {
        let handle = self.get_ex(key)?;
        Ok(expr::seq(vec![handle.eval(), handle.value()]))
    }

    /// Evaluate the read and yield whether the key was present.
    pub fn load_ex_has_value(&self, key: impl Into<Key>) -> Result<Expr> {
        let handle = self.get_ex(key)?;
        Ok(expr::seq(vec![handle.eval(), handle.has_value()]))
    }
}

/// The current application's global state, readable and writable.
#[derive(Debug)]
pub struct StateGlobal {
    external: StateGlobalExternal,
}

impl Deref for StateGlobal {
    type Target = StateGlobalExternal;

    fn deref(&self) -> &StateGlobalExternal {
        &self.external
    }
}

impl StateGlobal {
    pub fn new(infos: Vec<KeyInfo>) -> Result<StateGlobal> {
        // only the current application's global state can be written
        Ok(StateGlobal {
            external: StateGlobalExternal::new(
                infos,
                Expr::Global(GlobalField::CurrentApplicationId),
            )?,
        })
    }

    /// Fragment reading the slot at `key`.
    pub fn get(&self, key: impl Into<Key>) -> Result<Expr> {
        let info = self.key_info(key)?;
        Ok(Expr::AppGlobalGet(Box::new(expr::bytes(info.key.clone()))))
    }

    /// Fragment writing `value` to the slot at `key`.
    pub fn set(&self, key: impl Into<Key>, value: Expr) -> Result<Expr> {
        let info = self.key_info(key)?;
        Ok(Expr::AppGlobalPut(Box::new(expr::bytes(info.key.clone())), Box::new(value)))
    }

    /// Fragment clearing the slot at `key`.
    pub fn del(&self, key: impl Into<Key>) -> Result<Expr> {
        let info = self.key_info(key)?;
        Ok(Expr::AppGlobalDel(Box::new(expr::bytes(info.key.clone()))))
    }

    /// Fragment writing every entry that declared a default, in declaration
    /// order. Run during the application's create step.
    pub fn constructor(&self) -> Expr {
        expr::seq(
            self.key_infos()
                .iter()
                .filter_map(|info| {
                    info.default.as_ref().map(|default| {
                        Expr::AppGlobalPut(
                            Box::new(expr::bytes(info.key.clone())),
                            Box::new(default.clone()),
                        )
                    })
                })
                .collect(),
        )
    }
}

/// Read-only view of an account's local state for a foreign application.
#[derive(Debug)]
pub struct StateLocalExternal {
    state: State,
    app_id: Expr,
    account: Expr,
    pending: RefCell<HashMap<Vec<u8>, Rc<MaybeValue>>>,
}

impl Deref for StateLocalExternal {
    type Target = State;

    fn deref(&self) -> &State {
        &self.state
    }
}

impl StateLocalExternal {
    pub fn new(infos: Vec<KeyInfo>, app_id: Expr, account: Expr) -> Result<StateLocalExternal> {
        Ok(StateLocalExternal {
            state: State::new(infos)?,
            app_id,
            account,
            pending: RefCell::new(HashMap::new()),
        })
    }

    /// See [`StateGlobalExternal::get_ex`].
    pub fn get_ex(&self, key: impl Into<Key>) -> Result<Rc<MaybeValue>> {
        let info = self.state.key_info(key)?;
        let mut pending = self.pending.borrow_mut();
        let handle = pending.entry(info.key.clone()).or_insert_with(|| {
            MaybeValue::local_get_ex(
                self.account.clone(),
                self.app_id.clone(),
                expr::bytes(info.key.clone()),
            )
        });
        Ok(Rc::clone(handle))
    }

    /// See [`StateGlobalExternal::load_ex_value`].
    pub fn load_ex_value(&self, key: impl Into<Key>) -> Result<Expr> {
        let handle = self.get_ex(key)?;
        Ok(expr::seq(vec![handle.eval(), handle.value()]))
    }

    /// See [`StateGlobalExternal::load_ex_has_value`].
    pub fn load_ex_has_value(&self, key: impl Into<Key>) -> Result<Expr> {
        let handle = self.get_ex(key)?;
        Ok(expr::seq(vec![handle.eval(), handle.has_value()]))
    }
}

/// The current application's local state for one account, readable and
/// writable. The account defaults to the transaction sender.
#[derive(Debug)]
pub struct StateLocal {
    external: StateLocalExternal,
}

impl Deref for StateLocal {
    type Target = StateLocalExternal;

    fn deref(&self) -> &StateLocalExternal {
        &self.external
    }
}

impl StateLocal {
    pub fn new(infos: Vec<KeyInfo>) -> Result<StateLocal> {
        StateLocal::for_account(infos, Expr::Txn(TxnField::Sender))
    }

    /// Address any opted-in account instead of the sender.
    pub fn for_account(infos: Vec<KeyInfo>, account: Expr) -> Result<StateLocal> {
        Ok(StateLocal {
            external: StateLocalExternal::new(
                infos,
                Expr::Global(GlobalField::CurrentApplicationId),
                account,
            )?,
        })
    }

    fn account(&self) -> Expr {
        self.external.account.clone()
    }

    /// Fragment reading the slot at `key`.
    pub fn get(&self, key: impl Into<Key>) -> Result<Expr> {
        let info = self.key_info(key)?;
        Ok(Expr::AppLocalGet(
            Box::new(self.account()),
            Box::new(expr::bytes(info.key.clone())),
        ))
    }

    /// Fragment writing `value` to the slot at `key`.
    pub fn set(&self, key: impl Into<Key>, value: Expr) -> Result<Expr> {
        let info = self.key_info(key)?;
        Ok(Expr::AppLocalPut(
            Box::new(self.account()),
            Box::new(expr::bytes(info.key.clone())),
            Box::new(value),
        ))
    }

    /// Fragment clearing the slot at `key`.
    pub fn del(&self, key: impl Into<Key>) -> Result<Expr> {
        let info = self.key_info(key)?;
        Ok(Expr::AppLocalDel(
            Box::new(self.account()),
            Box::new(expr::bytes(info.key.clone())),
        ))
    }

    /// Fragment writing every defaulted entry, in declaration order. Run
    /// during the account's opt-in step.
    pub fn constructor(&self) -> Expr {
        expr::seq(
            self.key_infos()
                .iter()
                .filter_map(|info| {
                    info.default.as_ref().map(|default| {
                        Expr::AppLocalPut(
                            Box::new(self.account()),
                            Box::new(expr::bytes(info.key.clone())),
                            Box::new(default.clone()),
                        )
                    })
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_keys() {
        assert_eq!(key_to_bytes(&Key::from(5u64)).unwrap(), vec![5u8]);
        assert_eq!(key_to_bytes(&Key::from("a")).unwrap(), b"a".to_vec());
        assert_eq!(key_to_bytes(&Key::from(b"123")).unwrap(), b"123".to_vec());
    }

    #[test]
    fn rejects_oversized_and_out_of_range_keys() {
        let long = vec![0u8; MAX_KEY_BYTES + 1];
        assert!(matches!(
            key_to_bytes(&Key::from(long)),
            Err(AppDevError::KeyTooLong { .. })
        ));
        assert!(matches!(
            key_to_bytes(&Key::from(256u64)),
            Err(AppDevError::InvalidKeyType { value: 256 })
        ));
        // a 64-byte key is exactly at the limit
        assert!(key_to_bytes(&Key::from(vec![0u8; MAX_KEY_BYTES])).is_ok());
    }

    #[test]
    fn counts_schema_by_kind() {
        let state = State::new(vec![
            KeyInfo::new(b"a", TealType::Uint, None).unwrap(),
            KeyInfo::new(b"b", TealType::Uint, None).unwrap(),
            KeyInfo::new(b"c", TealType::Bytes, None).unwrap(),
        ])
        .unwrap();
        let schema = state.schema();
        assert_eq!(schema.num_uints, 2);
        assert_eq!(schema.num_byte_slices, 1);
    }

    #[test]
    fn rejects_duplicate_keys() {
        // 5u64 and [5u8] normalize to the same canonical key
        let result = State::new(vec![
            KeyInfo::new(5u64, TealType::Uint, None).unwrap(),
            KeyInfo::new(vec![5u8], TealType::Bytes, None).unwrap(),
        ]);
        assert!(matches!(result, Err(AppDevError::DuplicateKey { .. })));
    }

    #[test]
    fn lookup_of_undeclared_key_fails() {
        let state = State::new(vec![KeyInfo::new(b"a", TealType::Uint, None).unwrap()]).unwrap();
        assert!(state.key_info(b"a").is_ok());
        assert!(matches!(state.key_info(b"b"), Err(AppDevError::UnknownKey { .. })));
    }

    #[test]
    fn external_read_handle_is_memoized_per_key() {
        let state = StateGlobalExternal::new(
            vec![KeyInfo::new(b"a", TealType::Uint, None).unwrap()],
            expr::int(7),
        )
        .unwrap();
        let first = state.get_ex(b"a").unwrap();
        let second = state.get_ex(b"a").unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        // the memoized handle keeps loading from the same slots
        assert_eq!(first.value(), second.value());
    }

    #[test]
    fn constructor_seeds_defaults_in_declaration_order() {
        let state = StateGlobal::new(vec![
            KeyInfo::new(b"a", TealType::Uint, Some(expr::int(1))).unwrap(),
            KeyInfo::new(b"b", TealType::Bytes, None).unwrap(),
            KeyInfo::new(b"c", TealType::Bytes, Some(expr::bytes(b"x".to_vec()))).unwrap(),
        ])
        .unwrap();
        match state.constructor() {
            Expr::Seq(writes) => {
                assert_eq!(writes.len(), 2);
                match &writes[0] {
                    Expr::AppGlobalPut(key, value) => {
                        assert_eq!(**key, expr::bytes(b"a".to_vec()));
                        assert_eq!(**value, expr::int(1));
                    }
                    other => panic!("unexpected write: {:?}", other),
                }
                match &writes[1] {
                    Expr::AppGlobalPut(key, _) => {
                        assert_eq!(**key, expr::bytes(b"c".to_vec()));
                    }
                    other => panic!("unexpected write: {:?}", other),
                }
            }
            other => panic!("unexpected constructor: {:?}", other),
        }
    }

    #[test]
    fn local_state_defaults_to_the_sender() {
        let state = StateLocal::new(vec![
            KeyInfo::new(b"b", TealType::Bytes, Some(expr::bytes(b"abc".to_vec()))).unwrap(),
        ])
        .unwrap();
        match state.get(b"b").unwrap() {
            Expr::AppLocalGet(account, _) => {
                assert_eq!(*account, Expr::Txn(TxnField::Sender));
            }
            other => panic!("unexpected read: {:?}", other),
        }
        match state.constructor() {
            Expr::Seq(writes) => assert_eq!(writes.len(), 1),
            other => panic!("unexpected constructor: {:?}", other),
        }
    }
}
