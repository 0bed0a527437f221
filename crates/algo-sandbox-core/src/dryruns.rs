//! Dry-run request construction and result inspection.
//!
//! The centrepiece is [`AppCallCtx`], an immutable builder for the synthetic
//! chain snapshot a dry run executes against. Every `with_*` call returns a
//! new context, leaving the receiver untouched, so one base context can seed
//! many variant scenarios:
//!
//! ```
//! use algo_sandbox_core::dryruns::AppCallCtx;
//! use algo_sandbox_types::models::OnComplete;
//!
//! let base = AppCallCtx::default()
//!     .with_application_program(None, None, None)
//!     .unwrap()
//!     .with_account_opted_in(None, None, None)
//!     .unwrap();
//! let created = base.with_call(OnComplete::NoOp, None, None, Some(0), vec![]);
//! let called = base.with_call(OnComplete::NoOp, None, None, None, vec![]);
//! let request = called.build_request();
//! # let _ = (created, request);
//! ```
//!
//! Identifiers are auto-assigned: applications get the first free id (gap
//! search from 1), accounts get synthetic addresses encoding the first free
//! integer index, and convenience calls target the most recently added
//! application and account. The remaining items here are the standalone
//! one-transaction harnesses ([`source_run`], [`builder_run`]) and the
//! decoders that turn a raw dry-run result back into typed messages, traces
//! and state deltas.

use std::collections::BTreeMap;

use serde_json::Value as Json;
use tracing::debug;

use algo_sandbox_types::address::{
    address_from_index, index_from_address, zero_address,
};
use algo_sandbox_types::error::{AppDevError, Result};
use algo_sandbox_types::models::{
    Account, Application, ApplicationLocalState, ApplicationParams, DryrunRequest, DryrunSource,
    OnComplete, SignedTransaction, StateSchema, SuggestedParams, Transaction,
};
use algo_sandbox_types::value::{
    base64_decode, base64_encode, from_teal_value, TealKeyValue, TealValue, Value,
};
use algo_sandbox_types::{MAX_APP_ID, MAX_SCHEMA_SLOTS};
use algo_teal::emit::compile_expr;
use algo_transport::AlgodClient;

use crate::apps::AppBuilder;

/// The schema used when no specific allocation matters: every dry-run
/// application gets the maximal storage so state writes never fail for lack
/// of slots.
fn max_schema() -> StateSchema {
    StateSchema { num_uints: MAX_SCHEMA_SLOTS, num_byte_slices: MAX_SCHEMA_SLOTS }
}

/// First free identifier in `used`, searching upward from 1.
fn next_free_id(mut used: Vec<u64>, kind: &'static str) -> Result<u64> {
    used.sort_unstable();
    used.dedup();
    let mut candidate: u64 = 1;
    for id in used {
        if id < candidate {
            continue;
        }
        if id > candidate {
            break;
        }
        candidate = candidate
            .checked_add(1)
            .ok_or(AppDevError::AutoNumberingExhausted { kind })?;
    }
    if candidate > MAX_APP_ID {
        return Err(AppDevError::AutoNumberingExhausted { kind });
    }
    Ok(candidate)
}

/// A growing snapshot of simulated chain state plus the calls to execute
/// against it.
#[derive(Debug, Clone, Default)]
pub struct AppCallCtx {
    pub apps: Vec<Application>,
    pub accounts: Vec<Account>,
    pub txns: Vec<Transaction>,
    pub assets: Vec<u64>,
    pub round: Option<u64>,
    pub latest_timestamp: Option<u64>,
}

impl AppCallCtx {
    /// Override the round reported to executed logic.
    pub fn with_round(&self, round: u64) -> AppCallCtx {
        let mut ctx = self.clone();
        ctx.round = Some(round);
        ctx
    }

    /// Override the timestamp reported to executed logic.
    pub fn with_latest_timestamp(&self, timestamp: u64) -> AppCallCtx {
        let mut ctx = self.clone();
        ctx.latest_timestamp = Some(timestamp);
        ctx
    }

    /// Append a fully specified application record.
    pub fn with_application(&self, app: Application) -> AppCallCtx {
        let mut ctx = self.clone();
        ctx.apps.push(app);
        ctx
    }

    /// Append an application built from an optional compiled approval
    /// program. The id defaults to [`next_app_id`](AppCallCtx::next_app_id)
    /// and the schemas to the maximal allocation.
    pub fn with_application_program(
        &self,
        program: Option<&[u8]>,
        app_id: Option<u64>,
        state: Option<Vec<TealKeyValue>>,
    ) -> Result<AppCallCtx> {
        let app_id = match app_id {
            Some(id) => id,
            None => self.next_app_id()?,
        };
        Ok(self.with_application(Application {
            id: app_id,
            params: ApplicationParams {
                approval_program: program.map(base64_encode),
                global_state: state,
                global_state_schema: Some(max_schema()),
                local_state_schema: Some(max_schema()),
                ..ApplicationParams::default()
            },
        }))
    }

    /// Append a fully specified account record.
    pub fn with_account(&self, account: Account) -> AppCallCtx {
        let mut ctx = self.clone();
        ctx.accounts.push(account);
        ctx
    }

    /// Append an account opted into an application.
    ///
    /// The application defaults to the most recently added one, the address
    /// to the next free synthetic address. An empty `local_state` still
    /// marks the account as opted in, as distinct from not opted in at all.
    pub fn with_account_opted_in(
        &self,
        app_id: Option<u64>,
        address: Option<String>,
        local_state: Option<Vec<TealKeyValue>>,
    ) -> Result<AppCallCtx> {
        let app_id = app_id.unwrap_or_else(|| self.last_app_id());
        let address = match address {
            Some(address) => address,
            None => self.next_account_address()?,
        };
        Ok(self.with_account(Account {
            address,
            status: Some("Offline".into()),
            apps_local_state: Some(vec![ApplicationLocalState {
                id: app_id,
                key_value: Some(local_state.unwrap_or_default()),
            }]),
            ..Account::default()
        }))
    }

    /// Register a foreign asset id for cross-referencing in calls.
    pub fn with_asset(&self, asset_id: u64) -> AppCallCtx {
        let mut ctx = self.clone();
        ctx.assets.push(asset_id);
        ctx
    }

    /// Append a fully formed transaction.
    pub fn with_transaction(&self, txn: Transaction) -> AppCallCtx {
        let mut ctx = self.clone();
        ctx.txns.push(txn);
        ctx
    }

    /// Append an application call.
    ///
    /// The sender defaults to the most recently added account, the target
    /// to the most recently added application, and the parameters to
    /// [`suggested_params`](AppCallCtx::suggested_params). The call's
    /// foreign reference lists are populated with *every* account,
    /// application and asset in the context. Dry runs do not enforce the
    /// platform's reference-list size limits, so this blanket inclusion is
    /// only valid for simulation; network-submittable transactions need
    /// explicit, minimal lists.
    pub fn with_call(
        &self,
        on_complete: OnComplete,
        sender: Option<String>,
        params: Option<SuggestedParams>,
        app_id: Option<u64>,
        args: Vec<Vec<u8>>,
    ) -> AppCallCtx {
        let sender = sender.unwrap_or_else(|| self.last_account_address());
        let params = params.unwrap_or_else(|| self.suggested_params());
        let app_id = app_id.unwrap_or_else(|| self.last_app_id());

        let mut txn = Transaction::app_call(sender, &params, app_id, on_complete);
        txn.apaa = args.iter().map(|a| base64_encode(a)).collect();
        txn.apat = self.accounts.iter().map(|a| a.address.clone()).collect();
        txn.apfa = self.apps.iter().map(|a| a.id).collect();
        txn.apas = self.assets.clone();
        self.with_transaction(txn)
    }

    /// The first unused application id: 1 when the context holds no
    /// applications, otherwise the lowest gap in the used ids.
    pub fn next_app_id(&self) -> Result<u64> {
        next_free_id(
            self.apps.iter().map(|a| a.id).collect(),
            "application id",
        )
    }

    /// The synthetic address of the first unused account index. Accounts
    /// with non-synthetic addresses do not participate in the numbering.
    pub fn next_account_address(&self) -> Result<String> {
        let used = self
            .accounts
            .iter()
            .filter_map(|a| index_from_address(&a.address).ok())
            .collect();
        Ok(address_from_index(next_free_id(used, "account index")?))
    }

    /// Id of the most recently added application, or 0 if none.
    pub fn last_app_id(&self) -> u64 {
        self.apps.last().map(|a| a.id).unwrap_or(0)
    }

    /// Address of the most recently added account, or the zero address if
    /// none.
    pub fn last_account_address(&self) -> String {
        self.accounts
            .last()
            .map(|a| a.address.clone())
            .unwrap_or_else(zero_address)
    }

    /// Minimal parameters valid for simulation: zero fee and a 1000-round
    /// validity window starting at the context's round (or 1). The genesis
    /// hash is left empty; dry runs do not check it.
    pub fn suggested_params(&self) -> SuggestedParams {
        let first = self.round.unwrap_or(1);
        SuggestedParams {
            fee: 0,
            flat_fee: true,
            first,
            last: first + 1000,
            genesis_hash: None,
            genesis_id: None,
        }
    }

    /// Assemble the wire request. Transactions are wrapped with an absent
    /// signature; programs travel embedded in the application records, so
    /// no standalone sources are attached.
    pub fn build_request(&self) -> DryrunRequest {
        debug!(
            txns = self.txns.len(),
            apps = self.apps.len(),
            accounts = self.accounts.len(),
            "building dryrun request"
        );
        DryrunRequest {
            txns: self
                .txns
                .iter()
                .map(|txn| SignedTransaction { txn: txn.clone(), sig: None })
                .collect(),
            apps: self.apps.clone(),
            accounts: self.accounts.clone(),
            sources: Vec::new(),
            protocol_version: None,
            round: self.round,
            latest_timestamp: self.latest_timestamp,
        }
    }
}

/// An application record carrying global state but no programs. Used to
/// pass another application's state into a dry run; an application that is
/// actually called needs a program, either embedded or via a
/// [`DryrunSource`].
pub fn build_application(
    app_id: u64,
    state: Option<Vec<TealKeyValue>>,
    creator: Option<String>,
) -> Application {
    Application {
        id: app_id,
        params: ApplicationParams { creator, global_state: state, ..ApplicationParams::default() },
    }
}

/// An application record with its programs assembled through the node, so a
/// dry run can call it without standalone sources.
pub fn build_application_compiled(
    app_id: u64,
    builder: &AppBuilder,
    client: &AlgodClient,
    state: Option<Vec<TealKeyValue>>,
    creator: Option<String>,
) -> anyhow::Result<Application> {
    let (approval, clear) = builder.compile_programs(client)?;
    Ok(Application {
        id: app_id,
        params: ApplicationParams {
            creator,
            approval_program: Some(base64_encode(&approval)),
            clear_state_program: Some(base64_encode(&clear)),
            global_state: state,
            global_state_schema: Some(builder.global_schema()),
            local_state_schema: Some(builder.local_schema()),
        },
    })
}

/// An account record opted into each of `applications`, reusing the
/// applications' key-value records as the account's local state.
pub fn build_account(
    address: impl Into<String>,
    applications: &[Application],
    microalgos: u64,
) -> Account {
    Account {
        address: address.into(),
        amount: microalgos,
        status: Some("Offline".into()),
        apps_local_state: Some(
            applications
                .iter()
                .map(|app| ApplicationLocalState {
                    id: app.id,
                    key_value: app.params.global_state.clone(),
                })
                .collect(),
        ),
    }
}

/// The application id a standalone run targets when the transaction left it
/// at zero (a creation call).
const STANDALONE_APP_ID: u64 = u64::MAX;

fn standalone_app_id(txn: &Transaction) -> Result<u64> {
    if !txn.is_app_call() {
        return Err(AppDevError::NotAnApplicationCall { txn_type: txn.txn_type.clone() });
    }
    Ok(if txn.apid == 0 { STANDALONE_APP_ID } else { txn.apid })
}

/// A one-transaction request running raw TEAL source as the approval
/// program.
///
/// The simplest harness for debugging a standalone program. A zero
/// application id in the transaction is mapped to [`u64::MAX`], so that
/// value refers to the program under test. When no `sender_state` is given
/// the sender is included as an account with no state.
pub fn source_run(
    stxn: SignedTransaction,
    source: &str,
    global_state_values: Option<Vec<TealKeyValue>>,
    sender_state: Option<Account>,
) -> Result<DryrunRequest> {
    let app_id = standalone_app_id(&stxn.txn)?;
    let app = Application {
        id: app_id,
        params: ApplicationParams {
            creator: Some(stxn.txn.snd.clone()),
            global_state: global_state_values,
            global_state_schema: Some(max_schema()),
            local_state_schema: Some(max_schema()),
            ..ApplicationParams::default()
        },
    };
    let account =
        sender_state.unwrap_or_else(|| build_account(stxn.txn.snd.clone(), &[], 0));
    Ok(DryrunRequest {
        txns: vec![stxn],
        apps: vec![app],
        accounts: vec![account],
        sources: vec![DryrunSource {
            // standalone runs exercise approval semantics
            field_name: "approv".into(),
            source: source.into(),
            txn_index: 0,
            app_index: app_id,
        }],
        ..DryrunRequest::default()
    })
}

/// A one-transaction request running an [`AppBuilder`]'s logic.
///
/// The program matching the call's completion kind is rendered and attached
/// as a standalone source: the clear-state program for a clear-state call,
/// the approval program otherwise.
pub fn builder_run(
    stxn: SignedTransaction,
    builder: &AppBuilder,
    global_state_values: Option<Vec<TealKeyValue>>,
    sender_state: Option<Account>,
) -> anyhow::Result<DryrunRequest> {
    let app_id = standalone_app_id(&stxn.txn)?;
    let is_clear = stxn.txn.apan == OnComplete::ClearState.value();
    let source = compile_expr(&if is_clear {
        builder.clear_expr()
    } else {
        builder.approval_expr()
    })?;

    let app = Application {
        id: app_id,
        params: ApplicationParams {
            creator: Some(stxn.txn.snd.clone()),
            global_state: global_state_values,
            global_state_schema: Some(builder.global_schema()),
            local_state_schema: Some(builder.local_schema()),
            ..ApplicationParams::default()
        },
    };
    let account =
        sender_state.unwrap_or_else(|| build_account(stxn.txn.snd.clone(), &[], 0));
    Ok(DryrunRequest {
        txns: vec![stxn],
        apps: vec![app],
        accounts: vec![account],
        sources: vec![DryrunSource {
            field_name: if is_clear { "clearp" } else { "approv" }.into(),
            source,
            txn_index: 0,
            app_index: app_id,
        }],
        ..DryrunRequest::default()
    })
}

/// One executed instruction as reported by the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceItem {
    /// The disassembled source line the instruction came from.
    pub source: String,
    /// Operand stack after the instruction.
    pub stack: Vec<Value>,
    pub pc: u64,
}

/// One reported state change. An absent value signals deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDelta {
    pub key: Vec<u8>,
    pub value: Option<Value>,
}

impl KeyDelta {
    fn from_record(record: &Json) -> Result<KeyDelta> {
        let key_b64 = record.get("key").and_then(|k| k.as_str()).ok_or_else(|| {
            AppDevError::Decode { reason: "delta record carries no key".into() }
        })?;
        let key = base64_decode(key_b64, "delta key")?;
        let value = match record.get("value") {
            None => None,
            Some(value) => {
                if let Some(uint) = value.get("uint").and_then(|v| v.as_u64()) {
                    Some(Value::Uint(uint))
                } else if let Some(bytes) = value.get("bytes").and_then(|v| v.as_str()) {
                    Some(Value::Bytes(base64_decode(bytes, "delta value")?))
                } else {
                    None
                }
            }
        };
        Ok(KeyDelta { key, value })
    }
}

fn txn_result(result: &Json, txn_index: usize) -> Option<&Json> {
    result.get("txns").and_then(|t| t.as_array()).and_then(|t| t.get(txn_index))
}

/// Fail if the result carries a top-level error, passing the server's
/// message through verbatim.
pub fn check_err(result: &Json) -> Result<()> {
    match result.get("error").and_then(|e| e.as_str()) {
        Some(message) if !message.is_empty() => {
            Err(AppDevError::Simulation { message: message.to_string() })
        }
        _ => Ok(()),
    }
}

/// Execution messages of the transaction at `txn_index`. An out-of-range
/// index yields an empty list, so callers can probe optional slots.
pub fn get_messages(result: &Json, txn_index: usize) -> Vec<String> {
    txn_result(result, txn_index)
        .and_then(|t| t.get("app-call-messages"))
        .and_then(|m| m.as_array())
        .map(|messages| {
            messages
                .iter()
                .filter_map(|m| m.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Execution trace of the transaction at `txn_index`: each reported entry's
/// 1-based line resolved against the disassembly, with its operand stack
/// decoded. Missing disassembly or trace yields an empty list.
pub fn get_trace(result: &Json, txn_index: usize) -> Result<Vec<TraceItem>> {
    let Some(txn) = txn_result(result, txn_index) else {
        return Ok(Vec::new());
    };
    let (Some(lines), Some(trace)) = (
        txn.get("disassembly").and_then(|l| l.as_array()),
        txn.get("app-call-trace").and_then(|t| t.as_array()),
    ) else {
        return Ok(Vec::new());
    };

    let mut items = Vec::with_capacity(trace.len());
    for entry in trace {
        let line = entry.get("line").and_then(|l| l.as_u64()).unwrap_or(0);
        let source = line
            .checked_sub(1)
            .and_then(|i| lines.get(i as usize))
            .and_then(|l| l.as_str())
            .unwrap_or("")
            .to_string();
        let mut stack = Vec::new();
        if let Some(entries) = entry.get("stack").and_then(|s| s.as_array()) {
            for wire in entries {
                let wire: TealValue = serde_json::from_value(wire.clone())
                    .map_err(|e| AppDevError::Decode {
                        reason: format!("malformed stack value: {}", e),
                    })?;
                if let Some(value) = from_teal_value(Some(&wire))? {
                    stack.push(value);
                }
            }
        }
        items.push(TraceItem {
            source,
            stack,
            pc: entry.get("pc").and_then(|p| p.as_u64()).unwrap_or(0),
        });
    }
    Ok(items)
}

/// Global state changes of the transaction at `txn_index`.
pub fn get_global_deltas(result: &Json, txn_index: usize) -> Result<Vec<KeyDelta>> {
    let Some(records) = txn_result(result, txn_index)
        .and_then(|t| t.get("global-delta"))
        .and_then(|d| d.as_array())
    else {
        return Ok(Vec::new());
    };
    records.iter().map(KeyDelta::from_record).collect()
}

/// Local state changes of the transaction at `txn_index`, grouped by
/// account address. Records with a null address or delta list are skipped.
pub fn get_local_deltas(
    result: &Json,
    txn_index: usize,
) -> Result<BTreeMap<String, Vec<KeyDelta>>> {
    let mut grouped: BTreeMap<String, Vec<KeyDelta>> = BTreeMap::new();
    let Some(records) = txn_result(result, txn_index)
        .and_then(|t| t.get("local-deltas"))
        .and_then(|d| d.as_array())
    else {
        return Ok(grouped);
    };
    for record in records {
        let Some(address) = record.get("address").and_then(|a| a.as_str()) else {
            continue;
        };
        let Some(deltas) = record.get("delta").and_then(|d| d.as_array()) else {
            continue;
        };
        let decoded = deltas
            .iter()
            .map(KeyDelta::from_record)
            .collect::<Result<Vec<_>>>()?;
        grouped.entry(address.to_string()).or_default().extend(decoded);
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx_with_apps(ids: &[u64]) -> AppCallCtx {
        let mut ctx = AppCallCtx::default();
        for &id in ids {
            ctx = ctx.with_application(build_application(id, None, None));
        }
        ctx
    }

    #[test]
    fn app_ids_fill_gaps() {
        assert_eq!(AppCallCtx::default().next_app_id().unwrap(), 1);
        assert_eq!(ctx_with_apps(&[1, 2, 4]).next_app_id().unwrap(), 3);
        assert_eq!(ctx_with_apps(&[1, 2, 3]).next_app_id().unwrap(), 4);
        assert_eq!(ctx_with_apps(&[2]).next_app_id().unwrap(), 1);
    }

    #[test]
    fn account_addresses_fill_gaps() {
        let ctx = AppCallCtx::default();
        assert_eq!(ctx.next_account_address().unwrap(), address_from_index(1));

        let ctx = ctx
            .with_account(build_account(address_from_index(1), &[], 0))
            .with_account(build_account(address_from_index(3), &[], 0));
        assert_eq!(ctx.next_account_address().unwrap(), address_from_index(2));
    }

    #[test]
    fn non_synthetic_addresses_are_ignored_by_numbering() {
        let real = algo_sandbox_types::address::encode_address(&[0xab; 32]);
        let ctx = AppCallCtx::default().with_account(build_account(real, &[], 0));
        assert_eq!(ctx.next_account_address().unwrap(), address_from_index(1));
    }

    #[test]
    fn contexts_are_copy_on_write() {
        let base = ctx_with_apps(&[1]);
        let a = base.with_round(1);
        let b = base.with_round(2).with_application(build_application(9, None, None));

        assert_eq!(base.round, None);
        assert_eq!(a.round, Some(1));
        assert_eq!(b.round, Some(2));
        assert_eq!(base.apps.len(), 1);
        assert_eq!(a.apps.len(), 1);
        assert_eq!(b.apps.len(), 2);
    }

    #[test]
    fn application_program_defaults_to_next_id_and_max_schema() {
        let ctx = ctx_with_apps(&[1, 3])
            .with_application_program(Some(&[1, 2, 3]), None, None)
            .unwrap();
        let app = ctx.apps.last().unwrap();
        assert_eq!(app.id, 2);
        assert_eq!(app.params.global_state_schema, Some(max_schema()));
        assert_eq!(app.params.local_state_schema, Some(max_schema()));
        assert_eq!(app.params.approval_program, Some(base64_encode(&[1, 2, 3])));
    }

    #[test]
    fn opted_in_account_defaults_to_last_app() {
        let ctx = ctx_with_apps(&[7])
            .with_account_opted_in(None, None, None)
            .unwrap();
        let account = ctx.accounts.last().unwrap();
        assert_eq!(account.address, address_from_index(1));
        let states = account.apps_local_state.as_ref().unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].id, 7);
        // empty state still signals opted in
        assert_eq!(states[0].key_value, Some(vec![]));
    }

    #[test]
    fn call_defaults_and_blanket_references() {
        let ctx = ctx_with_apps(&[5])
            .with_account_opted_in(None, None, None)
            .unwrap()
            .with_asset(11)
            .with_call(OnComplete::NoOp, None, None, None, vec![b"go".to_vec()]);

        let txn = ctx.txns.last().unwrap();
        assert_eq!(txn.apid, 5);
        assert_eq!(txn.snd, address_from_index(1));
        assert_eq!(txn.apaa, vec![base64_encode(b"go")]);
        assert_eq!(txn.apat, vec![address_from_index(1)]);
        assert_eq!(txn.apfa, vec![5]);
        assert_eq!(txn.apas, vec![11]);
    }

    #[test]
    fn call_with_no_accounts_comes_from_the_zero_address() {
        let ctx = AppCallCtx::default().with_call(OnComplete::NoOp, None, None, Some(0), vec![]);
        assert_eq!(ctx.txns[0].snd, zero_address());
        assert_eq!(ctx.txns[0].apid, 0);
    }

    #[test]
    fn suggested_params_follow_the_round() {
        let params = AppCallCtx::default().suggested_params();
        assert_eq!((params.first, params.last), (1, 1001));
        assert_eq!(params.fee, 0);
        assert!(params.genesis_hash.is_none());

        let params = AppCallCtx::default().with_round(50).suggested_params();
        assert_eq!((params.first, params.last), (50, 1050));
    }

    #[test]
    fn end_to_end_request_shape() {
        let request = AppCallCtx::default()
            .with_application_program(None, None, None)
            .unwrap()
            .with_account_opted_in(None, None, None)
            .unwrap()
            .with_call(OnComplete::NoOp, None, None, None, vec![])
            .with_latest_timestamp(123)
            .build_request();

        assert_eq!(request.apps.len(), 1);
        assert_eq!(request.accounts.len(), 1);
        assert_eq!(request.txns.len(), 1);
        assert!(request.sources.is_empty());
        assert_eq!(request.latest_timestamp, Some(123));

        let stxn = &request.txns[0];
        assert!(stxn.sig.is_none());
        assert_eq!(stxn.txn.apfa, vec![request.apps[0].id]);
        assert_eq!(stxn.txn.apat, vec![request.accounts[0].address.clone()]);
    }

    fn noop_stxn(app_id: u64) -> SignedTransaction {
        let params = AppCallCtx::default().suggested_params();
        SignedTransaction {
            txn: Transaction::app_call(zero_address(), &params, app_id, OnComplete::NoOp),
            sig: None,
        }
    }

    #[test]
    fn source_run_targets_the_standalone_app_id() {
        let request = source_run(noop_stxn(0), "int 1\nreturn", None, None).unwrap();
        assert_eq!(request.apps[0].id, u64::MAX);
        assert_eq!(request.sources[0].field_name, "approv");
        assert_eq!(request.sources[0].app_index, u64::MAX);
        assert_eq!(request.accounts[0].address, zero_address());

        let request = source_run(noop_stxn(12), "int 1\nreturn", None, None).unwrap();
        assert_eq!(request.apps[0].id, 12);
    }

    #[test]
    fn source_run_rejects_non_application_calls() {
        let mut stxn = noop_stxn(1);
        stxn.txn.txn_type = "pay".into();
        assert!(matches!(
            source_run(stxn, "int 1", None, None),
            Err(AppDevError::NotAnApplicationCall { .. })
        ));
    }

    #[test]
    fn builder_run_attaches_the_matching_program() {
        let builder = AppBuilder::default();
        let request = builder_run(noop_stxn(0), &builder, None, None).unwrap();
        assert_eq!(request.sources[0].field_name, "approv");
        assert!(request.sources[0].source.starts_with("#pragma version 6\n"));

        let mut clear = noop_stxn(0);
        clear.txn.apan = OnComplete::ClearState.value();
        let request = builder_run(clear, &builder, None, None).unwrap();
        assert_eq!(request.sources[0].field_name, "clearp");
    }

    #[test]
    fn check_err_surfaces_the_server_message() {
        assert!(check_err(&json!({"txns": []})).is_ok());
        let err = check_err(&json!({"error": "logic eval error"})).unwrap_err();
        assert_eq!(err.to_string(), "dryrun error: logic eval error");
    }

    #[test]
    fn messages_are_read_leniently() {
        let result = json!({
            "txns": [
                { "app-call-messages": ["ApprovalProgram", "PASS"] },
            ]
        });
        assert_eq!(get_messages(&result, 0), vec!["ApprovalProgram", "PASS"]);
        assert!(get_messages(&result, 1).is_empty());
        assert!(get_messages(&json!({}), 0).is_empty());
    }

    #[test]
    fn trace_pairs_lines_with_decoded_stacks() {
        let result = json!({
            "txns": [
                {
                    "disassembly": ["#pragma version 6", "int 1", "return"],
                    "app-call-trace": [
                        { "line": 2, "pc": 1, "stack": [] },
                        {
                            "line": 3,
                            "pc": 2,
                            "stack": [ { "type": 2, "uint": 1 } ]
                        },
                    ]
                }
            ]
        });
        let trace = get_trace(&result, 0).unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[0], TraceItem { source: "int 1".into(), stack: vec![], pc: 1 });
        assert_eq!(trace[1].source, "return");
        assert_eq!(trace[1].stack, vec![Value::Uint(1)]);

        assert!(get_trace(&result, 5).unwrap().is_empty());
        assert!(get_trace(&json!({"txns": [{}]}), 0).unwrap().is_empty());
    }

    #[test]
    fn global_deltas_decode_values_and_deletions() {
        let result = json!({
            "txns": [
                {
                    "global-delta": [
                        { "key": base64_encode(b"a"), "value": { "action": 2, "uint": 1 } },
                        { "key": base64_encode(b"b"), "value": { "action": 1, "bytes": base64_encode(b"abc") } },
                        { "key": base64_encode(b"c"), "value": { "action": 3 } },
                    ]
                }
            ]
        });
        let deltas = get_global_deltas(&result, 0).unwrap();
        assert_eq!(
            deltas,
            vec![
                KeyDelta { key: b"a".to_vec(), value: Some(Value::Uint(1)) },
                KeyDelta { key: b"b".to_vec(), value: Some(Value::Bytes(b"abc".to_vec())) },
                KeyDelta { key: b"c".to_vec(), value: None },
            ]
        );
        assert!(get_global_deltas(&result, 1).unwrap().is_empty());
    }

    #[test]
    fn local_deltas_group_by_address_and_skip_null_records() {
        let result = json!({
            "txns": [
                {
                    "local-deltas": [
                        {
                            "address": "ADDR1",
                            "delta": [
                                { "key": base64_encode(b"b"), "value": { "uint": 2 } },
                            ]
                        },
                        { "address": null, "delta": [] },
                        { "address": "ADDR2", "delta": null },
                    ]
                }
            ]
        });
        let deltas = get_local_deltas(&result, 0).unwrap();
        assert_eq!(deltas.len(), 1);
        assert_eq!(
            deltas["ADDR1"],
            vec![KeyDelta { key: b"b".to_vec(), value: Some(Value::Uint(2)) }]
        );
    }
}
