//! # Tap Category Ports
//!
//! Driving port ([`TapService`]) and driven port ([`TapRestTransport`]).
//! The asset surface is smaller than the Lightning one: no event stream,
//! no listener cache. Asset-state changes surface through the chain and
//! channel event paths instead.

use crate::domain::{AssetBalance, DecodedAssetAddress, MintOutcome, TapdInfo};
use async_trait::async_trait;
use serde_json::Value;
use shared_types::{AdapterError, PollConfig, TapNode};

/// Uniform operation contract for Taproot-Assets nodes.
#[async_trait]
pub trait TapService: Send + Sync {
    /// Normalized daemon info; also the readiness probe.
    async fn get_info(&self, node: &TapNode) -> Result<TapdInfo, AdapterError>;

    /// Per-asset balances, one entry per asset id.
    async fn get_balances(&self, node: &TapNode) -> Result<Vec<AssetBalance>, AdapterError>;

    /// Mint `amount` units of a new asset named `name`. The batch is
    /// finalized immediately; the mint confirms with the next block.
    async fn mint_asset(
        &self,
        node: &TapNode,
        name: &str,
        amount: u64,
    ) -> Result<MintOutcome, AdapterError>;

    /// A fresh asset address requesting `amount` units of `asset_id`.
    async fn new_address(
        &self,
        node: &TapNode,
        asset_id: &str,
        amount: u64,
    ) -> Result<String, AdapterError>;

    /// Send assets to an asset address. Returns the anchoring txid.
    async fn send_asset(&self, node: &TapNode, address: &str) -> Result<String, AdapterError>;

    /// Decode an asset address without sending to it.
    async fn decode_address(
        &self,
        node: &TapNode,
        address: &str,
    ) -> Result<DecodedAssetAddress, AdapterError>;

    /// Pull asset issuance proofs from another node's universe server.
    /// Returns the number of universe roots synced.
    async fn sync_universe(
        &self,
        node: &TapNode,
        universe_host: &str,
    ) -> Result<u64, AdapterError>;

    /// Poll `get_info` until the node answers or `config.timeout` elapses.
    async fn wait_until_online(
        &self,
        node: &TapNode,
        config: PollConfig,
    ) -> Result<(), AdapterError>;
}

/// Driven port: REST calls against one tap node's HTTP API.
#[async_trait]
pub trait TapRestTransport: Send + Sync {
    /// GET `path` and return the parsed JSON body.
    async fn get(&self, node: &TapNode, path: &str) -> Result<Value, AdapterError>;

    /// POST `body` to `path` and return the parsed JSON body.
    async fn post(
        &self,
        node: &TapNode,
        path: &str,
        body: Value,
    ) -> Result<Value, AdapterError>;
}
