//! State lookups against fetched account and application records.
//!
//! The info endpoints return state as lists of key-value records with
//! base64 keys; these helpers find one key and decode its value through the
//! value codec.

use anyhow::Result;
use serde_json::Value as Json;

use algo_sandbox_types::value::{base64_encode, from_teal_value, TealValue, Value};

fn find_key(records: Option<&Json>, key_b64: &str) -> Result<Option<Value>> {
    let Some(records) = records.and_then(|v| v.as_array()) else {
        return Ok(None);
    };
    for record in records {
        if record.get("key").and_then(|k| k.as_str()) != Some(key_b64) {
            continue;
        }
        let wire: Option<TealValue> = match record.get("value") {
            Some(v) => Some(serde_json::from_value(v.clone())?),
            None => None,
        };
        return Ok(from_teal_value(wire.as_ref())?);
    }
    Ok(None)
}

/// Value of `key` in an application's global state, from an
/// application-info record.
pub fn get_app_global_key(app_info: &Json, key: &[u8]) -> Result<Option<Value>> {
    let key_b64 = base64_encode(key);
    let records = app_info.get("params").and_then(|p| p.get("global-state"));
    find_key(records, &key_b64)
}

/// Value of `key` in `app_id`'s local state, from an account-info record.
pub fn get_app_local_key(account_info: &Json, app_id: u64, key: &[u8]) -> Result<Option<Value>> {
    let key_b64 = base64_encode(key);
    let Some(states) = account_info.get("apps-local-state").and_then(|v| v.as_array()) else {
        return Ok(None);
    };
    for state in states {
        if state.get("id").and_then(|v| v.as_u64()) != Some(app_id) {
            continue;
        }
        return find_key(state.get("key-value"), &key_b64);
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_global_key() {
        let info = json!({
            "id": 1,
            "params": {
                "global-state": [
                    { "key": base64_encode(b"a"), "value": { "type": 2, "uint": 123 } },
                ]
            }
        });
        assert_eq!(get_app_global_key(&info, b"a").unwrap(), Some(Value::Uint(123)));
        assert_eq!(get_app_global_key(&info, b"b").unwrap(), None);
    }

    #[test]
    fn finds_local_key_for_the_right_app() {
        let info = json!({
            "address": "ADDR",
            "apps-local-state": [
                {
                    "id": 7,
                    "key-value": [
                        { "key": base64_encode(b"b"), "value": { "type": 1, "bytes": base64_encode(b"abc") } },
                    ]
                }
            ]
        });
        assert_eq!(
            get_app_local_key(&info, 7, b"b").unwrap(),
            Some(Value::Bytes(b"abc".to_vec()))
        );
        assert_eq!(get_app_local_key(&info, 8, b"b").unwrap(), None);
        assert_eq!(get_app_local_key(&info, 7, b"c").unwrap(), None);
    }

    #[test]
    fn tolerates_records_without_state() {
        let info = json!({ "id": 1, "params": {} });
        assert_eq!(get_app_global_key(&info, b"a").unwrap(), None);
        let info = json!({ "address": "ADDR" });
        assert_eq!(get_app_local_key(&info, 1, b"a").unwrap(), None);
    }
}
