//! # Chain Category Ports
//!
//! Driving port ([`ChainService`]) and driven port ([`JsonRpcTransport`]).
//! The orchestrator and auto-miner only ever hold `Arc<dyn ChainService>`;
//! adapters only ever talk through the transport, so tests swap in an
//! in-memory backend.

use crate::domain::{ChainInfo, WalletInfo};
use async_trait::async_trait;
use serde_json::Value;
use shared_types::{AdapterError, ChainNode, PollConfig, Sats};

/// Uniform operation contract for chain nodes, one implementation per
/// backend. All operations are asynchronous and may fail.
#[async_trait]
pub trait ChainService: Send + Sync {
    /// Normalized chain-tip info; also serves as the readiness probe.
    async fn get_info(&self, node: &ChainNode) -> Result<ChainInfo, AdapterError>;

    /// Normalized wallet balances.
    async fn get_wallet_info(&self, node: &ChainNode) -> Result<WalletInfo, AdapterError>;

    /// A fresh receive address from the node's wallet.
    async fn get_new_address(&self, node: &ChainNode) -> Result<String, AdapterError>;

    /// Connect to the given peer addresses. Best-effort: individual
    /// failures are logged and swallowed, never propagated - partial
    /// connectivity is an expected transient state during bring-up.
    async fn connect_peers(&self, node: &ChainNode, peers: &[String]);

    /// Mine `blocks` blocks to an address of this node's wallet.
    /// Returns the mined block hashes and publishes a `BlockMined` event.
    async fn mine(&self, node: &ChainNode, blocks: u32) -> Result<Vec<String>, AdapterError>;

    /// Send `amount` to `address`, mining first if the wallet balance
    /// cannot cover it. Returns the backend's transaction id unchanged.
    async fn send_funds(
        &self,
        node: &ChainNode,
        address: &str,
        amount: Sats,
    ) -> Result<String, AdapterError>;

    /// Create the default wallet if the node has none. Idempotent.
    async fn ensure_wallet(&self, node: &ChainNode) -> Result<(), AdapterError>;

    /// Poll `get_info` until the node answers or `config.timeout` elapses.
    async fn wait_until_online(
        &self,
        node: &ChainNode,
        config: PollConfig,
    ) -> Result<(), AdapterError>;
}

/// Driven port: a JSON-RPC call to one chain node's RPC endpoint.
///
/// The production implementation is [`crate::HttpJsonRpcTransport`];
/// tests provide scripted in-memory responses.
#[async_trait]
pub trait JsonRpcTransport: Send + Sync {
    /// Invoke `method` with `params` on the node's RPC endpoint and
    /// return the `result` member of the response.
    async fn call(
        &self,
        node: &ChainNode,
        method: &str,
        params: Value,
    ) -> Result<Value, AdapterError>;
}
