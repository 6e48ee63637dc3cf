//! # HTTP REST Transport
//!
//! `reqwest`-based implementation of the [`RestTransport`] port. Endpoints
//! and credentials are derived deterministically from the node identity:
//! lab containers all answer on the loopback interface and are provisioned
//! with fixed credentials at image-build time.

use crate::ports::RestTransport;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use shared_types::{AdapterError, LightningImplementation, LightningNode};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Admin macaroon baked into lab lnd/litd/c-lightning-REST containers, hex.
const MACAROON_HEX: &str = "0201036c6e640258030a10b493608461fb6e64";

/// API password baked into lab Eclair containers.
const ECLAIR_API_PASS: &str = "voltpass";

/// Per-request timeout for unary calls. Streaming subscriptions are exempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Buffered events per subscription before backpressure.
const SUBSCRIPTION_BUFFER: usize = 64;

/// REST over HTTP(S), one request per call plus long-lived event streams.
pub struct HttpRestTransport {
    client: reqwest::Client,
    stream_client: reqwest::Client,
}

impl HttpRestTransport {
    /// Create a transport with its own connection pool. Lab nodes serve
    /// self-signed TLS, so certificate validation is disabled.
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        let stream_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .unwrap_or_default();
        Self {
            client,
            stream_client,
        }
    }

    fn url(node: &LightningNode, path: &str) -> String {
        let scheme = match node.implementation {
            LightningImplementation::Lnd | LightningImplementation::Litd => "https",
            LightningImplementation::CoreLightning | LightningImplementation::Eclair => "http",
        };
        format!("{scheme}://127.0.0.1:{}{path}", node.ports.rest)
    }

    /// Attach the implementation's authentication scheme to a request.
    fn authorize(
        node: &LightningNode,
        request: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        match node.implementation {
            LightningImplementation::Lnd | LightningImplementation::Litd => {
                request.header("Grpc-Metadata-macaroon", MACAROON_HEX)
            }
            LightningImplementation::CoreLightning => request.header("macaroon", MACAROON_HEX),
            LightningImplementation::Eclair => request.basic_auth("", Some(ECLAIR_API_PASS)),
        }
    }

    async fn dispatch(
        &self,
        node: &LightningNode,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, AdapterError> {
        let response = Self::authorize(node, request).send().await.map_err(|e| {
            AdapterError::Unreachable {
                node: node.name.clone(),
                reason: e.to_string(),
            }
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

impl Default for HttpRestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RestTransport for HttpRestTransport {
    async fn get(&self, node: &LightningNode, path: &str) -> Result<Value, AdapterError> {
        let request = self.client.get(Self::url(node, path));
        self.dispatch(node, path, request).await
    }

    async fn post(
        &self,
        node: &LightningNode,
        path: &str,
        body: Value,
    ) -> Result<Value, AdapterError> {
        let request = self.client.post(Self::url(node, path)).json(&body);
        self.dispatch(node, path, request).await
    }

    async fn delete(&self, node: &LightningNode, path: &str) -> Result<Value, AdapterError> {
        let request = self.client.delete(Self::url(node, path));
        self.dispatch(node, path, request).await
    }

    async fn subscribe(
        &self,
        node: &LightningNode,
        path: &str,
    ) -> Result<mpsc::Receiver<Value>, AdapterError> {
        let request = self.stream_client.get(Self::url(node, path));
        let response = Self::authorize(node, request).send().await.map_err(|e| {
            AdapterError::Unreachable {
                node: node.name.clone(),
                reason: e.to_string(),
            }
        })?;

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let node_name = node.name.clone();
        tokio::spawn(async move {
            // Line-delimited JSON: buffer partial chunks until a newline.
            let mut stream = response.bytes_stream();
            let mut buffer = Vec::new();
            while let Some(chunk) = stream.next().await {
                let Ok(chunk) = chunk else { break };
                buffer.extend_from_slice(&chunk);
                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let Ok(event) = serde_json::from_slice::<Value>(&line) else {
                        continue;
                    };
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
            debug!(node = %node_name, "event stream ended");
        });

        Ok(rx)
    }
}
