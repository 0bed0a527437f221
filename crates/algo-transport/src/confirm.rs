//! Transaction confirmation polling.

use std::collections::HashSet;

use anyhow::{bail, Result};
use serde_json::Value;
use tracing::debug;

use crate::algod::AlgodClient;

/// Wait for the network to confirm `txids` and return their pending-info
/// records, in confirmation order.
///
/// Transactions dropped from the pool (pool errors) are abandoned silently;
/// transactions still unconfirmed after `timeout_blocks` rounds are simply
/// absent from the result.
pub fn wait_for_confirmations(
    client: &AlgodClient,
    txids: &[&str],
    timeout_blocks: u64,
) -> Result<Vec<Value>> {
    let status = client.status()?;
    let start_round = status
        .get("last-round")
        .and_then(|v| v.as_u64())
        .unwrap_or(0)
        + 1;
    let mut current_round = start_round;

    let mut waiting: HashSet<&str> = txids.iter().copied().collect();
    let mut infos = Vec::new();

    while current_round < start_round + timeout_blocks {
        for txid in waiting.clone() {
            let info = client.pending_transaction_info(txid)?;
            let pool_error = info
                .get("pool-error")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            if !pool_error.is_empty() {
                debug!(txid, pool_error, "transaction dropped from pool");
                waiting.remove(txid);
            } else if info.get("confirmed-round").and_then(|v| v.as_u64()).unwrap_or(0) > 0 {
                infos.push(info);
                waiting.remove(txid);
            }
        }
        if waiting.is_empty() {
            break;
        }
        // wait until the end of this block
        client.status_after_block(current_round)?;
        current_round += 1;
    }

    Ok(infos)
}

/// Wait for one transaction; fails if it was not confirmed in time.
pub fn wait_for_confirmation(
    client: &AlgodClient,
    txid: &str,
    timeout_blocks: u64,
) -> Result<Value> {
    let mut infos = wait_for_confirmations(client, &[txid], timeout_blocks)?;
    match infos.pop() {
        Some(info) => Ok(info),
        None => bail!("transaction {} not confirmed within {} blocks", txid, timeout_blocks),
    }
}
