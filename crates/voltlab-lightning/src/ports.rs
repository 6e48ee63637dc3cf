//! # Lightning Category Ports
//!
//! Driving port ([`LightningService`]) and driven port ([`RestTransport`]).
//! The orchestrator and reconciler only ever hold `Arc<dyn LightningService>`;
//! adapters only ever talk through the transport, so tests swap in an
//! in-memory backend.

use crate::domain::{
    BalanceSnapshot, ChannelInfo, DecodedInvoice, LightningNodeInfo, OpenChannelOutcome,
    PaymentOutcome,
};
use async_trait::async_trait;
use serde_json::Value;
use shared_types::{AdapterError, LightningNode, PollConfig, Sats};
use tokio::sync::mpsc;

/// Uniform operation contract for Lightning nodes, one implementation per
/// backend. All amounts are exact integer satoshi/millisatoshi types.
#[async_trait]
pub trait LightningService: Send + Sync {
    /// Normalized node identity and sync state; also the readiness probe.
    async fn get_info(&self, node: &LightningNode) -> Result<LightningNodeInfo, AdapterError>;

    /// Normalized on-chain wallet balances.
    async fn get_balances(&self, node: &LightningNode)
        -> Result<BalanceSnapshot, AdapterError>;

    /// A fresh on-chain receive address from the node's wallet.
    async fn get_new_address(&self, node: &LightningNode) -> Result<String, AdapterError>;

    /// All channels, open and pending, in the unified projection shape.
    async fn get_channels(&self, node: &LightningNode)
        -> Result<Vec<ChannelInfo>, AdapterError>;

    /// Identity pubkeys of currently connected peers. Used by the mesh
    /// step to skip nodes already connected, matched by identity key.
    async fn list_peers(&self, node: &LightningNode) -> Result<Vec<String>, AdapterError>;

    /// Connect to the given `pubkey@host:port` peer URLs. Best-effort:
    /// individual failures are logged and swallowed, never propagated.
    async fn connect_peers(&self, node: &LightningNode, urls: &[String]);

    /// Open a channel of `capacity` to the peer at `peer_url`.
    async fn open_channel(
        &self,
        node: &LightningNode,
        peer_url: &str,
        capacity: Sats,
        is_private: bool,
    ) -> Result<OpenChannelOutcome, AdapterError>;

    /// Close the channel at `channel_point`. Returns the closing txid.
    async fn close_channel(
        &self,
        node: &LightningNode,
        channel_point: &str,
    ) -> Result<String, AdapterError>;

    /// Create a BOLT11 invoice for `amount` and return its payment request.
    async fn create_invoice(
        &self,
        node: &LightningNode,
        amount: Sats,
        memo: &str,
    ) -> Result<String, AdapterError>;

    /// Pay a BOLT11 invoice, optionally overriding its amount.
    async fn pay_invoice(
        &self,
        node: &LightningNode,
        invoice: &str,
        amount: Option<Sats>,
    ) -> Result<PaymentOutcome, AdapterError>;

    /// Decode a BOLT11 invoice without paying it.
    async fn decode_invoice(
        &self,
        node: &LightningNode,
        invoice: &str,
    ) -> Result<DecodedInvoice, AdapterError>;

    /// Subscribe to the node's channel-event stream. Normalized events are
    /// published on the bus until the stream ends or the listener is
    /// removed. Replaces any existing subscription for the same node name.
    async fn subscribe_channel_events(&self, node: &LightningNode)
        -> Result<(), AdapterError>;

    /// Tear down the cached event listener for `node_name`. Idempotent:
    /// an untracked name is a no-op, not an error.
    async fn remove_listener(&self, node_name: &str);

    /// Poll `get_info` until the node answers or `config.timeout` elapses.
    async fn wait_until_online(
        &self,
        node: &LightningNode,
        config: PollConfig,
    ) -> Result<(), AdapterError>;
}

/// Driven port: REST calls against one Lightning node's HTTP API.
///
/// The production implementation is [`crate::HttpRestTransport`]; tests
/// provide scripted in-memory responses. Authentication (macaroon headers,
/// basic auth) is the transport's concern, derived from the node identity.
#[async_trait]
pub trait RestTransport: Send + Sync {
    /// GET `path` and return the parsed JSON body.
    async fn get(&self, node: &LightningNode, path: &str) -> Result<Value, AdapterError>;

    /// POST `body` to `path` and return the parsed JSON body.
    async fn post(
        &self,
        node: &LightningNode,
        path: &str,
        body: Value,
    ) -> Result<Value, AdapterError>;

    /// DELETE `path` and return the parsed JSON body.
    async fn delete(&self, node: &LightningNode, path: &str) -> Result<Value, AdapterError>;

    /// Open a streaming GET of `path`: each received JSON document is sent
    /// on the returned channel. The stream lives until the node closes it
    /// or the receiver is dropped.
    async fn subscribe(
        &self,
        node: &LightningNode,
        path: &str,
    ) -> Result<mpsc::Receiver<Value>, AdapterError>;
}
