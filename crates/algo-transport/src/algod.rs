//! Client for the node daemon's v2 REST API.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use tracing::debug;

use algo_sandbox_types::models::DryrunRequest;
use algo_sandbox_types::value::base64_decode;

const TOKEN_HEADER: &str = "X-Algo-API-Token";

/// Client for one algod daemon.
#[derive(Clone, Debug)]
pub struct AlgodClient {
    base_url: String,
    token: String,
    agent: ureq::Agent,
}

impl AlgodClient {
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

    /// Create a client for the daemon at `base_url` with the given API token.
    pub fn new(base_url: &str, token: &str) -> Self {
        Self::with_timeouts(
            base_url,
            token,
            Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            Duration::from_secs(Self::DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    /// Create a client with explicit timeouts.
    pub fn with_timeouts(
        base_url: &str,
        token: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            agent: ureq::AgentBuilder::new()
                .timeout(timeout)
                .timeout_connect(connect_timeout)
                .build(),
        }
    }

    /// The daemon URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> Result<Value> {
        debug!(path, "algod GET");
        self.agent
            .get(&self.url(path))
            .set(TOKEN_HEADER, &self.token)
            .call()
            .map_err(request_error)
            .with_context(|| format!("GET {}", path))?
            .into_json()
            .with_context(|| format!("parsing response of GET {}", path))
    }

    /// Current node status, including the last committed round.
    pub fn status(&self) -> Result<Value> {
        self.get("/v2/status")
    }

    /// Block until the node has committed a round after `round`.
    pub fn status_after_block(&self, round: u64) -> Result<Value> {
        self.get(&format!("/v2/status/wait-for-block-after/{}", round))
    }

    /// Pending or recently confirmed state of one transaction.
    pub fn pending_transaction_info(&self, txid: &str) -> Result<Value> {
        self.get(&format!("/v2/transactions/pending/{}", txid))
    }

    /// Account balance, status and per-application local state.
    pub fn account_info(&self, address: &str) -> Result<Value> {
        self.get(&format!("/v2/accounts/{}", address))
    }

    /// Application parameters and global state.
    pub fn application_info(&self, app_id: u64) -> Result<Value> {
        self.get(&format!("/v2/applications/{}", app_id))
    }

    /// Suggested transaction parameters from the node.
    pub fn transaction_params(&self) -> Result<Value> {
        self.get("/v2/transactions/params")
    }

    /// Assemble TEAL source into program bytes.
    ///
    /// Requires the node's developer API. Assembly errors reported by the
    /// node propagate verbatim.
    pub fn compile(&self, source: &str) -> Result<Vec<u8>> {
        debug!(bytes = source.len(), "algod compile");
        let response: Value = self
            .agent
            .post(&self.url("/v2/teal/compile"))
            .set(TOKEN_HEADER, &self.token)
            .set("Content-Type", "application/x-binary")
            .send_string(source)
            .map_err(request_error)
            .context("POST /v2/teal/compile")?
            .into_json()
            .context("parsing compile response")?;
        let result = response
            .get("result")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("compile response carries no result"))?;
        Ok(base64_decode(result, "compiled program")?)
    }

    /// Execute a dry-run request and return the raw result.
    pub fn dryrun(&self, request: &DryrunRequest) -> Result<Value> {
        debug!(
            txns = request.txns.len(),
            apps = request.apps.len(),
            accounts = request.accounts.len(),
            "algod dryrun"
        );
        self.agent
            .post(&self.url("/v2/teal/dryrun"))
            .set(TOKEN_HEADER, &self.token)
            .set("Content-Type", "application/json")
            .send_json(request)
            .map_err(request_error)
            .context("POST /v2/teal/dryrun")?
            .into_json()
            .context("parsing dryrun response")
    }
}

/// Surface the node's own message on HTTP-level failures, not just the
/// status code.
fn request_error(err: ureq::Error) -> anyhow::Error {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or(body);
            anyhow!("node returned {}: {}", code, message)
        }
        other => anyhow!(other),
    }
}
