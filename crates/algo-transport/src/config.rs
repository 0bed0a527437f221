//! Client factories reading a node's data directory.
//!
//! A running daemon writes its listen address and admin token into its data
//! directory (`algod.net` / `algod.token`, and `kmd-v<version>/kmd.net` /
//! `kmd.token`). These factories are the only configuration mechanism the
//! workspace needs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::algod::AlgodClient;
use crate::kmd::KmdClient;

/// Default kmd service version directory suffix.
pub const KMD_VERSION: &str = "0.5";

fn read_trimmed(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(text.trim().to_string())
}

/// Build a client for the algod daemon whose data directory is `data_dir`.
pub fn algod_from_data_dir(data_dir: &Path) -> Result<AlgodClient> {
    let address = read_trimmed(&data_dir.join("algod.net"))?;
    let token = read_trimmed(&data_dir.join("algod.token"))?;
    Ok(AlgodClient::new(&format!("http://{}", address), &token))
}

/// Build a client for the kmd daemon under `data_dir`.
pub fn kmd_from_data_dir(data_dir: &Path, version: &str) -> Result<KmdClient> {
    let kmd_dir = data_dir.join(format!("kmd-v{}", version));
    let address = read_trimmed(&kmd_dir.join("kmd.net"))?;
    let token = read_trimmed(&kmd_dir.join("kmd.token"))?;
    Ok(KmdClient::new(&format!("http://{}", address), &token))
}

/// The node data directory named by the `ALGORAND_DATA` environment
/// variable, if set and non-empty.
pub fn data_dir_from_env() -> Option<PathBuf> {
    match std::env::var("ALGORAND_DATA") {
        Ok(value) if !value.trim().is_empty() => Some(PathBuf::from(value.trim())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn builds_algod_client_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("algod.net"), "127.0.0.1:8080\n").unwrap();
        fs::write(dir.path().join("algod.token"), "aaaa\n").unwrap();

        let client = algod_from_data_dir(dir.path()).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn builds_kmd_client_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let kmd_dir = dir.path().join("kmd-v0.5");
        fs::create_dir(&kmd_dir).unwrap();
        fs::write(kmd_dir.join("kmd.net"), "127.0.0.1:7833\n").unwrap();
        fs::write(kmd_dir.join("kmd.token"), "bbbb\n").unwrap();

        let client = kmd_from_data_dir(dir.path(), KMD_VERSION).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:7833");
    }

    #[test]
    fn missing_connection_files_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = algod_from_data_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("algod.net"));
    }
}
