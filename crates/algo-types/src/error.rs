//! Structured error types for the library layer.
//!
//! Every error is raised at the point of detection and carries the offending
//! key, index or message so a failure can be diagnosed without re-running.
//! Network-layer errors (transport, compile service) stay as `anyhow` errors
//! in the transport crate and are not modeled here.

use std::fmt;

pub type Result<T> = std::result::Result<T, AppDevError>;

/// Errors produced by the state descriptors, value codec and dry-run builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppDevError {
    /// A state key integer does not fit the single-byte encoding.
    InvalidKeyType {
        /// The out-of-range integer key
        value: u64,
    },

    /// A canonical state key exceeds the platform's 64-byte limit.
    KeyTooLong {
        /// The offending key bytes
        key: Vec<u8>,
    },

    /// Two entries of one state descriptor normalize to the same byte key.
    DuplicateKey {
        /// The canonical key registered twice
        key: Vec<u8>,
    },

    /// A key was looked up that the descriptor never declared.
    UnknownKey {
        /// The canonical key that was requested
        key: Vec<u8>,
    },

    /// A wire value could not be decoded into a native uint or byte string.
    Decode {
        /// What was malformed
        reason: String,
    },

    /// A transaction expected to carry an application call does not.
    NotAnApplicationCall {
        /// The transaction type tag that was found
        txn_type: String,
    },

    /// The dry-run result carried a top-level error from the node.
    Simulation {
        /// The node's message, passed through verbatim
        message: String,
    },

    /// The synthetic id space is full. Unrecoverable configuration error.
    AutoNumberingExhausted {
        /// Which id space was exhausted ("application id" or "account index")
        kind: &'static str,
    },
}

impl fmt::Display for AppDevError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppDevError::InvalidKeyType { value } => {
                write!(f, "invalid key: integer {} out of range 0..=255", value)
            }
            AppDevError::KeyTooLong { key } => {
                write!(f, "key too long: {} bytes (max 64): 0x{}", key.len(), hex::encode(key))
            }
            AppDevError::DuplicateKey { key } => {
                write!(f, "duplicate state key: 0x{}", hex::encode(key))
            }
            AppDevError::UnknownKey { key } => {
                write!(f, "unknown state key: 0x{}", hex::encode(key))
            }
            AppDevError::Decode { reason } => write!(f, "decode error: {}", reason),
            AppDevError::NotAnApplicationCall { txn_type } => {
                write!(f, "transaction must be an application call, got type '{}'", txn_type)
            }
            AppDevError::Simulation { message } => write!(f, "dryrun error: {}", message),
            AppDevError::AutoNumberingExhausted { kind } => {
                write!(f, "auto-numbering exhausted: no free {}", kind)
            }
        }
    }
}

impl std::error::Error for AppDevError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let err = AppDevError::KeyTooLong { key: vec![0; 65] };
        let text = err.to_string();
        assert!(text.contains("65 bytes"));

        let err = AppDevError::Simulation { message: "logic eval error".into() };
        assert_eq!(err.to_string(), "dryrun error: logic eval error");
    }
}
