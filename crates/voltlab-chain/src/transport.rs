//! # HTTP JSON-RPC Transport
//!
//! `reqwest`-based implementation of the [`JsonRpcTransport`] port. The
//! endpoint is derived deterministically from the node's port map; lab
//! nodes all answer on the loopback interface with fixed credentials.

use crate::ports::JsonRpcTransport;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use shared_types::{AdapterError, ChainNode};
use std::time::Duration;

/// RPC credentials baked into every lab chain container.
const RPC_USER: &str = "voltuser";
const RPC_PASS: &str = "voltpass";

/// Per-request timeout. Distinct from the readiness poll budget: a single
/// RPC that hangs this long is as good as refused.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    message: String,
}

/// JSON-RPC over HTTP, one POST per call.
pub struct HttpJsonRpcTransport {
    client: reqwest::Client,
}

impl HttpJsonRpcTransport {
    /// Create a transport with its own connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    fn url(node: &ChainNode) -> String {
        format!("http://127.0.0.1:{}/", node.ports.rpc)
    }
}

impl Default for HttpJsonRpcTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JsonRpcTransport for HttpJsonRpcTransport {
    async fn call(
        &self,
        node: &ChainNode,
        method: &str,
        params: Value,
    ) -> Result<Value, AdapterError> {
        let body = json!({
            "jsonrpc": "1.0",
            "id": "voltlab",
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(Self::url(node))
            .basic_auth(RPC_USER, Some(RPC_PASS))
            .json(&body)
            .send()
            .await
            .map_err(|e| AdapterError::Unreachable {
                node: node.name.clone(),
                reason: e.to_string(),
            })?;

        let parsed: RpcResponse =
            response
                .json()
                .await
                .map_err(|e| AdapterError::Malformed {
                    node: node.name.clone(),
                    operation: method.to_string(),
                    detail: e.to_string(),
                })?;

        if let Some(error) = parsed.error {
            return Err(AdapterError::Rpc {
                node: node.name.clone(),
                message: error.message,
            });
        }

        parsed.result.ok_or_else(|| AdapterError::Malformed {
            node: node.name.clone(),
            operation: method.to_string(),
            detail: "response had neither result nor error".to_string(),
        })
    }
}
