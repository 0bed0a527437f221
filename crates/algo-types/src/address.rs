//! Checksummed account address encoding.
//!
//! An address is a 32-byte identifier rendered as 58 characters of unpadded
//! RFC 4648 base32: the identifier followed by the last 4 bytes of its
//! SHA-512/256 digest. The all-zero identifier is the well-known "no
//! account" address.
//!
//! No crate in this workspace's dependency tree provides base32, so the
//! fixed-alphabet codec lives here.

use sha2::{Digest, Sha512_256};

use crate::error::{AppDevError, Result};

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const CHECKSUM_BYTES: usize = 4;
const ADDRESS_BYTES: usize = 32;

/// Domain prefix hashed with an application id to derive its escrow address.
const APP_ID_PREFIX: &[u8] = b"appID";

/// An account's signing key (as exported by the wallet daemon) and address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    pub key: String,
    pub address: String,
}

/// An application id and its derived escrow address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppMeta {
    pub app_id: u64,
    pub address: String,
}

impl AppMeta {
    /// Extract the created application's metadata from a confirmed
    /// transaction result, or `None` if the result created no application.
    pub fn from_result(result: &serde_json::Value) -> Option<AppMeta> {
        let app_id = result.get("application-index")?.as_u64()?;
        Some(AppMeta { app_id, address: app_address(app_id) })
    }
}

fn checksum(data: &[u8]) -> [u8; CHECKSUM_BYTES] {
    let digest = Sha512_256::digest(data);
    let mut tail = [0u8; CHECKSUM_BYTES];
    tail.copy_from_slice(&digest[digest.len() - CHECKSUM_BYTES..]);
    tail
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 8 / 5 + 1);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for &byte in data {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 31) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 31) as usize] as char);
    }
    out
}

fn base32_decode(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for ch in text.bytes() {
        let index = ALPHABET
            .iter()
            .position(|&a| a == ch)
            .ok_or_else(|| AppDevError::Decode {
                reason: format!("invalid base32 character: {:?}", ch as char),
            })?;
        buffer = (buffer << 5) | index as u32;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xff) as u8);
        }
    }
    // trailing bits are encoding padding and carry no data
    Ok(out)
}

/// Encode a 32-byte identifier as a checksummed address string.
pub fn encode_address(id: &[u8; ADDRESS_BYTES]) -> String {
    let mut data = Vec::with_capacity(ADDRESS_BYTES + CHECKSUM_BYTES);
    data.extend_from_slice(id);
    data.extend_from_slice(&checksum(id));
    base32_encode(&data)
}

/// Decode an address string back to its 32-byte identifier, verifying the
/// embedded checksum.
pub fn decode_address(address: &str) -> Result<[u8; ADDRESS_BYTES]> {
    let data = base32_decode(address)?;
    if data.len() < ADDRESS_BYTES + CHECKSUM_BYTES {
        return Err(AppDevError::Decode {
            reason: format!("address decodes to {} bytes, expected {}", data.len(), ADDRESS_BYTES + CHECKSUM_BYTES),
        });
    }
    let mut id = [0u8; ADDRESS_BYTES];
    id.copy_from_slice(&data[..ADDRESS_BYTES]);
    if data[ADDRESS_BYTES..ADDRESS_BYTES + CHECKSUM_BYTES] != checksum(&id) {
        return Err(AppDevError::Decode { reason: format!("address checksum mismatch: {}", address) });
    }
    Ok(id)
}

/// The well-known address of the all-zero identifier, denoting "no account".
pub fn zero_address() -> String {
    encode_address(&[0u8; ADDRESS_BYTES])
}

/// Derive an application's escrow address from its id alone: the address
/// encoding of `sha512_256("appID" ++ id_be_8)`.
pub fn app_address(app_id: u64) -> String {
    let mut data = Vec::with_capacity(APP_ID_PREFIX.len() + 8);
    data.extend_from_slice(APP_ID_PREFIX);
    data.extend_from_slice(&app_id.to_be_bytes());
    let digest: [u8; ADDRESS_BYTES] = Sha512_256::digest(&data).into();
    encode_address(&digest)
}

/// Build a synthetic address from a small integer index. Used by the dry-run
/// context to auto-number accounts; the mapping is bijective so the index
/// can be recovered with [`index_from_address`].
pub fn address_from_index(index: u64) -> String {
    let mut id = [0u8; ADDRESS_BYTES];
    id[ADDRESS_BYTES - 8..].copy_from_slice(&index.to_be_bytes());
    encode_address(&id)
}

/// Recover the integer index of a synthetic address. Fails for addresses
/// that were not produced by [`address_from_index`].
pub fn index_from_address(address: &str) -> Result<u64> {
    let id = decode_address(address)?;
    if id[..ADDRESS_BYTES - 8].iter().any(|&b| b != 0) {
        return Err(AppDevError::Decode {
            reason: format!("address is not a synthetic index: {}", address),
        });
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&id[ADDRESS_BYTES - 8..]);
    Ok(u64::from_be_bytes(tail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_address_is_the_known_constant() {
        assert_eq!(
            zero_address(),
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ"
        );
    }

    #[test]
    fn addresses_round_trip() {
        let mut id = [0u8; 32];
        for (i, byte) in id.iter_mut().enumerate() {
            *byte = i as u8;
        }
        let address = encode_address(&id);
        assert_eq!(address.len(), 58);
        assert_eq!(decode_address(&address).unwrap(), id);
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let mut address = zero_address();
        // flip the first character to corrupt the identifier
        address.replace_range(0..1, "B");
        assert!(matches!(decode_address(&address), Err(AppDevError::Decode { .. })));
    }

    #[test]
    fn index_round_trips() {
        for index in [0u64, 1, 7, u64::from(u32::MAX)] {
            let address = address_from_index(index);
            assert_eq!(index_from_address(&address).unwrap(), index);
        }
        assert_eq!(address_from_index(0), zero_address());
    }

    #[test]
    fn non_synthetic_address_has_no_index() {
        let id = [0xab; 32];
        let address = encode_address(&id);
        assert!(index_from_address(&address).is_err());
    }

    #[test]
    fn app_address_is_deterministic() {
        let a = app_address(1);
        let b = app_address(1);
        assert_eq!(a, b);
        assert_eq!(a.len(), 58);
        assert_ne!(app_address(1), app_address(2));
        decode_address(&a).unwrap();
    }

    #[test]
    fn app_meta_reads_creation_result() {
        let result = serde_json::json!({ "application-index": 7, "confirmed-round": 3 });
        let meta = AppMeta::from_result(&result).unwrap();
        assert_eq!(meta.app_id, 7);
        assert_eq!(meta.address, app_address(7));

        let result = serde_json::json!({ "confirmed-round": 3 });
        assert!(AppMeta::from_result(&result).is_none());
    }
}
