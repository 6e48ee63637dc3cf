//! # tapd Adapter
//!
//! Maps the [`TapService`] contract onto tapd's REST surface. Asset
//! amounts are opaque integer units and arrive as integer strings; they
//! are parsed exactly, never through floating point.

use crate::domain::{AssetBalance, DecodedAssetAddress, MintOutcome, TapdInfo};
use crate::ports::{TapRestTransport, TapService};
use async_trait::async_trait;
use serde_json::{json, Value};
use shared_types::{wait_until_online, AdapterError, PollConfig, TapNode};
use std::sync::Arc;
use tracing::info;

/// `TapService` adapter for tapd, standalone or bundled in litd.
pub struct TapdService {
    transport: Arc<dyn TapRestTransport>,
}

impl TapdService {
    /// Create an adapter over the given transport.
    pub fn new(transport: Arc<dyn TapRestTransport>) -> Self {
        Self { transport }
    }

    fn malformed(node: &TapNode, operation: &str, detail: &str) -> AdapterError {
        AdapterError::Malformed {
            node: node.name.clone(),
            operation: operation.to_string(),
            detail: detail.to_string(),
        }
    }

    /// tapd renders u64 fields as strings in JSON.
    fn units(value: &Value) -> Option<u64> {
        match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

#[async_trait]
impl TapService for TapdService {
    async fn get_info(&self, node: &TapNode) -> Result<TapdInfo, AdapterError> {
        let raw = self.transport.get(node, "/v1/taproot-assets/getinfo").await?;
        Ok(TapdInfo {
            version: raw["version"].as_str().unwrap_or_default().to_string(),
            lnd_identity_pubkey: raw["lnd_identity_pubkey"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            synced_to_chain: raw["sync_to_chain"].as_bool().unwrap_or(false),
        })
    }

    async fn get_balances(&self, node: &TapNode) -> Result<Vec<AssetBalance>, AdapterError> {
        let raw = self
            .transport
            .get(node, "/v1/taproot-assets/assets/balance?asset_id=true")
            .await?;
        let balances = raw["asset_balances"].as_object().ok_or_else(|| {
            Self::malformed(node, "assets/balance", "missing asset_balances")
        })?;

        Ok(balances
            .iter()
            .filter_map(|(asset_id, entry)| {
                Some(AssetBalance {
                    asset_id: asset_id.clone(),
                    name: entry["asset_genesis"]["name"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string(),
                    balance: Self::units(&entry["balance"])?,
                })
            })
            .collect())
    }

    async fn mint_asset(
        &self,
        node: &TapNode,
        name: &str,
        amount: u64,
    ) -> Result<MintOutcome, AdapterError> {
        self.transport
            .post(
                node,
                "/v1/taproot-assets/assets",
                json!({ "asset": {
                    "asset_type": "NORMAL",
                    "name": name,
                    "amount": amount.to_string(),
                } }),
            )
            .await?;

        // The batch holds the pending asset until finalized; one call
        // per mint keeps the lab's one-asset-per-batch behavior.
        let raw = self
            .transport
            .post(node, "/v1/taproot-assets/assets/mint/finalize", json!({}))
            .await?;
        let batch_key = raw["batch"]["batch_key"]
            .as_str()
            .ok_or_else(|| Self::malformed(node, "mint/finalize", "missing batch_key"))?
            .to_string();

        info!(node = %node.name, asset = name, amount, "Minted asset batch");
        Ok(MintOutcome { batch_key })
    }

    async fn new_address(
        &self,
        node: &TapNode,
        asset_id: &str,
        amount: u64,
    ) -> Result<String, AdapterError> {
        let raw = self
            .transport
            .post(
                node,
                "/v1/taproot-assets/addrs",
                json!({ "asset_id": asset_id, "amt": amount.to_string() }),
            )
            .await?;
        raw["encoded"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| Self::malformed(node, "addrs", "missing encoded address"))
    }

    async fn send_asset(&self, node: &TapNode, address: &str) -> Result<String, AdapterError> {
        let raw = self
            .transport
            .post(
                node,
                "/v1/taproot-assets/send",
                json!({ "tap_addrs": [address] }),
            )
            .await?;
        raw["transfer"]["anchor_tx_hash"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| Self::malformed(node, "send", "missing anchor txid"))
    }

    async fn decode_address(
        &self,
        node: &TapNode,
        address: &str,
    ) -> Result<DecodedAssetAddress, AdapterError> {
        let raw = self
            .transport
            .post(
                node,
                "/v1/taproot-assets/addrs/decode",
                json!({ "addr": address }),
            )
            .await?;
        Ok(DecodedAssetAddress {
            asset_id: raw["asset_id"]
                .as_str()
                .ok_or_else(|| Self::malformed(node, "addrs/decode", "missing asset_id"))?
                .to_string(),
            amount: Self::units(&raw["amount"])
                .ok_or_else(|| Self::malformed(node, "addrs/decode", "missing amount"))?,
        })
    }

    async fn sync_universe(
        &self,
        node: &TapNode,
        universe_host: &str,
    ) -> Result<u64, AdapterError> {
        let raw = self
            .transport
            .post(
                node,
                "/v1/taproot-assets/universe/sync",
                json!({ "universe_host": universe_host, "sync_mode": "SYNC_ISSUANCE_ONLY" }),
            )
            .await?;
        Ok(raw["synced_universes"]
            .as_array()
            .map(Vec::len)
            .unwrap_or(0) as u64)
    }

    async fn wait_until_online(
        &self,
        node: &TapNode,
        config: PollConfig,
    ) -> Result<(), AdapterError> {
        wait_until_online(&node.name, config, || async {
            self.get_info(node).await.map(|_| ())
        })
        .await
    }
}
