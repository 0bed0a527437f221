//! algod REST models used to assemble dry-run requests.
//!
//! Field names follow the node's JSON encoding: application and account
//! records use the v2 API's kebab-case names, transactions use the short
//! codec names (`snd`, `apid`, ...). Zero and empty fields are omitted the
//! way the node omits them.

use serde::{Deserialize, Serialize};

use crate::value::TealKeyValue;

/// Storage allocation counts for one state scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateSchema {
    #[serde(rename = "num-uint", default)]
    pub num_uints: u64,
    #[serde(rename = "num-byte-slice", default)]
    pub num_byte_slices: u64,
}

/// An application record: id plus creation parameters and global state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Application {
    pub id: u64,
    pub params: ApplicationParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplicationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    /// Compiled approval program, base64.
    #[serde(rename = "approval-program", skip_serializing_if = "Option::is_none")]
    pub approval_program: Option<String>,
    /// Compiled clear-state program, base64.
    #[serde(rename = "clear-state-program", skip_serializing_if = "Option::is_none")]
    pub clear_state_program: Option<String>,
    #[serde(rename = "global-state", skip_serializing_if = "Option::is_none")]
    pub global_state: Option<Vec<TealKeyValue>>,
    #[serde(rename = "global-state-schema", skip_serializing_if = "Option::is_none")]
    pub global_state_schema: Option<StateSchema>,
    #[serde(rename = "local-state-schema", skip_serializing_if = "Option::is_none")]
    pub local_state_schema: Option<StateSchema>,
}

/// One application's local state as held by an account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplicationLocalState {
    pub id: u64,
    #[serde(rename = "key-value", skip_serializing_if = "Option::is_none")]
    pub key_value: Option<Vec<TealKeyValue>>,
}

/// An account record with the local state of the applications it opted into.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "apps-local-state", skip_serializing_if = "Option::is_none")]
    pub apps_local_state: Option<Vec<ApplicationLocalState>>,
}

/// The application-call completion kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnComplete {
    #[default]
    NoOp,
    OptIn,
    CloseOut,
    ClearState,
    UpdateApplication,
    DeleteApplication,
}

impl OnComplete {
    /// The numeric wire value of this completion kind.
    pub fn value(self) -> u64 {
        match self {
            OnComplete::NoOp => 0,
            OnComplete::OptIn => 1,
            OnComplete::CloseOut => 2,
            OnComplete::ClearState => 3,
            OnComplete::UpdateApplication => 4,
            OnComplete::DeleteApplication => 5,
        }
    }

    pub fn from_value(value: u64) -> Option<OnComplete> {
        match value {
            0 => Some(OnComplete::NoOp),
            1 => Some(OnComplete::OptIn),
            2 => Some(OnComplete::CloseOut),
            3 => Some(OnComplete::ClearState),
            4 => Some(OnComplete::UpdateApplication),
            5 => Some(OnComplete::DeleteApplication),
            _ => None,
        }
    }
}

/// Transaction parameters: fee and validity window.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SuggestedParams {
    pub fee: u64,
    pub flat_fee: bool,
    pub first: u64,
    pub last: u64,
    pub genesis_hash: Option<String>,
    pub genesis_id: Option<String>,
}

/// An application-call transaction, in the node's short-key encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub txn_type: String,
    /// Sender address.
    pub snd: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub fee: u64,
    /// First valid round.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub fv: u64,
    /// Last valid round.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub lv: u64,
    /// Genesis hash, base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gen: Option<String>,
    /// Application id; zero on a creation call.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub apid: u64,
    /// Completion kind, as its numeric value.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub apan: u64,
    /// Call arguments, base64.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apaa: Vec<String>,
    /// Referenced accounts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apat: Vec<String>,
    /// Referenced foreign applications.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apfa: Vec<u64>,
    /// Referenced foreign assets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apas: Vec<u64>,
    /// Compiled approval program on create/update calls, base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apap: Option<String>,
    /// Compiled clear-state program on create/update calls, base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apsu: Option<String>,
    /// Requested state allocation on a creation call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apgs: Option<StateSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apls: Option<StateSchema>,
}

/// Wire tag of application-call transactions.
pub const TXN_TYPE_APP_CALL: &str = "appl";

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl Transaction {
    /// Build a bare application call against `app_id`.
    pub fn app_call(
        sender: impl Into<String>,
        params: &SuggestedParams,
        app_id: u64,
        on_complete: OnComplete,
    ) -> Transaction {
        Transaction {
            txn_type: TXN_TYPE_APP_CALL.into(),
            snd: sender.into(),
            fee: params.fee,
            fv: params.first,
            lv: params.last,
            gh: params.genesis_hash.clone(),
            gen: params.genesis_id.clone(),
            apid: app_id,
            apan: on_complete.value(),
            ..Transaction::default()
        }
    }

    /// Whether this transaction is an application call with a recognized
    /// completion kind.
    pub fn is_app_call(&self) -> bool {
        self.txn_type == TXN_TYPE_APP_CALL && OnComplete::from_value(self.apan).is_some()
    }
}

/// A transaction wrapped with its (possibly absent) signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub txn: Transaction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

/// Standalone source attached to a dry-run request, overriding the program
/// of one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DryrunSource {
    /// Which program this source replaces: "approv" or "clearp".
    #[serde(rename = "field-name")]
    pub field_name: String,
    pub source: String,
    #[serde(rename = "txn-index", default)]
    pub txn_index: u64,
    #[serde(rename = "app-index", default)]
    pub app_index: u64,
}

/// A complete dry-run request: transactions to execute plus the synthetic
/// chain state to execute them against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DryrunRequest {
    #[serde(default)]
    pub txns: Vec<SignedTransaction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apps: Vec<Application>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<Account>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<DryrunSource>,
    #[serde(rename = "protocol-version", skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u64>,
    #[serde(rename = "latest-timestamp", skip_serializing_if = "Option::is_none")]
    pub latest_timestamp: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_call_omits_empty_fields() {
        let params = SuggestedParams { first: 1, last: 1001, ..SuggestedParams::default() };
        let txn = Transaction::app_call("SENDER", &params, 0, OnComplete::NoOp);
        let json = serde_json::to_value(&txn).unwrap();
        assert_eq!(json["type"], "appl");
        assert_eq!(json["snd"], "SENDER");
        // zero fee, zero app id and NoOp are all omitted
        assert!(json.get("fee").is_none());
        assert!(json.get("apid").is_none());
        assert!(json.get("apan").is_none());
        assert!(json.get("apaa").is_none());
    }

    #[test]
    fn on_complete_values_round_trip() {
        for oc in [
            OnComplete::NoOp,
            OnComplete::OptIn,
            OnComplete::CloseOut,
            OnComplete::ClearState,
            OnComplete::UpdateApplication,
            OnComplete::DeleteApplication,
        ] {
            assert_eq!(OnComplete::from_value(oc.value()), Some(oc));
        }
        assert_eq!(OnComplete::from_value(6), None);
    }

    #[test]
    fn schema_uses_node_field_names() {
        let schema = StateSchema { num_uints: 2, num_byte_slices: 1 };
        let json = serde_json::to_value(schema).unwrap();
        assert_eq!(json["num-uint"], 2);
        assert_eq!(json["num-byte-slice"], 1);
    }

    #[test]
    fn is_app_call_checks_type_and_completion() {
        let params = SuggestedParams::default();
        let txn = Transaction::app_call("S", &params, 1, OnComplete::OptIn);
        assert!(txn.is_app_call());

        let mut pay = txn.clone();
        pay.txn_type = "pay".into();
        assert!(!pay.is_app_call());

        let mut bad = txn;
        bad.apan = 9;
        assert!(!bad.is_app_call());
    }
}
