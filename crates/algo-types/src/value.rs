//! Codec for the tagged TEAL value union.
//!
//! On the wire a state value is `{type, bytes, uint}` where type 1 is a
//! base64-encoded byte string and type 2 is a uint. This module converts
//! between that representation and the native [`Value`] enum.
//!
//! Round-trip law: `from_teal_value(Some(&to_teal_value(&v))) == Ok(Some(v))`
//! for every native value `v`.

use serde::{Deserialize, Serialize};

use crate::error::{AppDevError, Result};

/// Wire type tag for byte-string values.
pub const TYPE_BYTES: u64 = 1;
/// Wire type tag for uint values.
pub const TYPE_UINT: u64 = 2;

/// A native state value: an unsigned integer or a byte string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Uint(u64),
    Bytes(Vec<u8>),
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

/// The algod wire representation of a state value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TealValue {
    #[serde(rename = "type")]
    pub value_type: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uint: Option<u64>,
}

/// A state key (base64 bytes) paired with its wire value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TealKeyValue {
    pub key: String,
    pub value: TealValue,
}

/// Encode bytes to base64.
pub fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decode base64 to bytes, naming what was being decoded on failure.
pub fn base64_decode(b64: &str, context: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(b64)
        .map_err(|e| AppDevError::Decode { reason: format!("{} is not valid base64: {}", context, e) })
}

/// Decode a wire value into its native form.
///
/// A missing value decodes to `None`. Any type tag other than the two known
/// ones, or a tagged value whose payload field is absent, is a decode error.
pub fn from_teal_value(value: Option<&TealValue>) -> Result<Option<Value>> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.value_type {
        TYPE_BYTES => {
            let b64 = value.bytes.as_deref().ok_or_else(|| AppDevError::Decode {
                reason: "byte value with no bytes field".into(),
            })?;
            Ok(Some(Value::Bytes(base64_decode(b64, "state value")?)))
        }
        TYPE_UINT => {
            let uint = value.uint.ok_or_else(|| AppDevError::Decode {
                reason: "uint value with no uint field".into(),
            })?;
            Ok(Some(Value::Uint(uint)))
        }
        other => Err(AppDevError::Decode { reason: format!("unknown value type tag: {}", other) }),
    }
}

/// Encode a native value into its wire form.
pub fn to_teal_value(value: &Value) -> TealValue {
    match value {
        Value::Bytes(bytes) => TealValue {
            value_type: TYPE_BYTES,
            bytes: Some(base64_encode(bytes)),
            uint: None,
        },
        Value::Uint(uint) => TealValue { value_type: TYPE_UINT, bytes: None, uint: Some(*uint) },
    }
}

/// Build the wire key-value record for a state entry.
pub fn to_key_value(key: &[u8], value: &Value) -> TealKeyValue {
    TealKeyValue { key: base64_encode(key), value: to_teal_value(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_uints() {
        for v in [0u64, 1, u64::MAX] {
            let value = Value::Uint(v);
            let decoded = from_teal_value(Some(&to_teal_value(&value))).unwrap();
            assert_eq!(decoded, Some(value));
        }
    }

    #[test]
    fn round_trips_bytes() {
        for v in [b"".to_vec(), b"x".to_vec(), vec![7u8; 64]] {
            let value = Value::Bytes(v);
            let decoded = from_teal_value(Some(&to_teal_value(&value))).unwrap();
            assert_eq!(decoded, Some(value));
        }
    }

    #[test]
    fn missing_value_decodes_to_none() {
        assert_eq!(from_teal_value(None).unwrap(), None);
    }

    #[test]
    fn unknown_type_tag_is_an_error() {
        let wire = TealValue { value_type: 3, bytes: None, uint: Some(1) };
        assert!(matches!(
            from_teal_value(Some(&wire)),
            Err(AppDevError::Decode { .. })
        ));
    }

    #[test]
    fn tagged_value_requires_its_payload() {
        let wire = TealValue { value_type: TYPE_UINT, bytes: None, uint: None };
        assert!(from_teal_value(Some(&wire)).is_err());

        let wire = TealValue { value_type: TYPE_BYTES, bytes: None, uint: Some(1) };
        assert!(from_teal_value(Some(&wire)).is_err());
    }

    #[test]
    fn key_value_uses_base64_key() {
        let kv = to_key_value(b"a", &Value::Uint(1));
        assert_eq!(kv.key, "YQ==");
        assert_eq!(kv.value.uint, Some(1));
    }
}
