//! `reqwest`-based implementation of the [`TapRestTransport`] port.
//! tapd fronts TLS with a self-signed certificate whether standalone or
//! inside litd; credentials are fixed at image-build time like the other
//! lab containers.

use crate::ports::TapRestTransport;
use async_trait::async_trait;
use serde_json::Value;
use shared_types::{AdapterError, TapNode};
use std::time::Duration;

/// Admin macaroon baked into lab tapd/litd containers, hex.
const MACAROON_HEX: &str = "0201047461706402580301";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// REST over HTTPS, one request per call.
pub struct HttpTapTransport {
    client: reqwest::Client,
}

impl HttpTapTransport {
    /// Create a transport with its own connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .danger_accept_invalid_certs(true)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    fn url(node: &TapNode, path: &str) -> String {
        format!("https://127.0.0.1:{}{path}", node.ports.rest)
    }

    async fn dispatch(
        &self,
        node: &TapNode,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, AdapterError> {
        let response = request
            .header("Grpc-Metadata-macaroon", MACAROON_HEX)
            .send()
            .await
            .map_err(|e| AdapterError::Unreachable {
                node: node.name.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| AdapterError::Malformed {
                node: node.name.clone(),
                operation: operation.to_string(),
                detail: e.to_string(),
            })?;

        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .or_else(|| body.get("message").and_then(Value::as_str))
                .unwrap_or("request rejected")
                .to_string();
            return Err(AdapterError::Rpc {
                node: node.name.clone(),
                message,
            });
        }

        Ok(body)
    }
}

impl Default for HttpTapTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TapRestTransport for HttpTapTransport {
    async fn get(&self, node: &TapNode, path: &str) -> Result<Value, AdapterError> {
        let request = self.client.get(Self::url(node, path));
        self.dispatch(node, path, request).await
    }

    async fn post(
        &self,
        node: &TapNode,
        path: &str,
        body: Value,
    ) -> Result<Value, AdapterError> {
        let request = self.client.post(Self::url(node, path)).json(&body);
        self.dispatch(node, path, request).await
    }
}
