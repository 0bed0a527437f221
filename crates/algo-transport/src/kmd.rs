//! Client for the wallet daemon.
//!
//! Wallet and key management are out of this workspace's scope; the client
//! exists so the factory and scripts can health-check a local kmd instance.

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;

const TOKEN_HEADER: &str = "X-KMD-API-Token";

/// Client for one kmd daemon.
#[derive(Clone)]
pub struct KmdClient {
    base_url: String,
    token: String,
    agent: ureq::Agent,
}

impl KmdClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(30))
                .timeout_connect(Duration::from_secs(5))
                .build(),
        }
    }

    /// The daemon URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// API versions supported by the daemon. Doubles as a liveness check.
    pub fn versions(&self) -> Result<Value> {
        self.agent
            .get(&format!("{}/versions", self.base_url))
            .set(TOKEN_HEADER, &self.token)
            .call()
            .context("GET /versions")?
            .into_json()
            .context("parsing kmd versions response")
    }
}
