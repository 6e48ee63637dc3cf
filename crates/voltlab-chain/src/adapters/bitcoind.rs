//! # bitcoind Adapter
//!
//! Maps the [`ChainService`] contract onto Bitcoin Core's JSON-RPC
//! surface. Amounts arrive BTC-denominated as decimal strings and are
//! parsed exactly into satoshis; no float touches an amount.

use crate::domain::{blocks_to_mine, ChainInfo, WalletInfo};
use crate::ports::{ChainService, JsonRpcTransport};
use async_trait::async_trait;
use serde_json::{json, Value};
use shared_bus::{EventPublisher, LabEvent};
use shared_types::{best_effort, wait_until_online, AdapterError, ChainNode, PollConfig, Sats};
use std::sync::Arc;
use tracing::{debug, info};

/// `ChainService` adapter for Bitcoin Core.
pub struct BitcoindService {
    transport: Arc<dyn JsonRpcTransport>,
    bus: Arc<dyn EventPublisher>,
}

impl BitcoindService {
    /// Create an adapter over the given transport and event bus.
    pub fn new(transport: Arc<dyn JsonRpcTransport>, bus: Arc<dyn EventPublisher>) -> Self {
        Self { transport, bus }
    }

    fn malformed(node: &ChainNode, operation: &str, detail: &str) -> AdapterError {
        AdapterError::Malformed {
            node: node.name.clone(),
            operation: operation.to_string(),
            detail: detail.to_string(),
        }
    }

    fn parse_sats(
        node: &ChainNode,
        operation: &str,
        value: &Value,
    ) -> Result<Sats, AdapterError> {
        Sats::parse(value, true)
            .ok_or_else(|| Self::malformed(node, operation, "unparseable BTC amount"))
    }
}

#[async_trait]
impl ChainService for BitcoindService {
    async fn get_info(&self, node: &ChainNode) -> Result<ChainInfo, AdapterError> {
        let raw = self
            .transport
            .call(node, "getblockchaininfo", json!([]))
            .await?;

        Ok(ChainInfo {
            blocks: raw["blocks"]
                .as_u64()
                .ok_or_else(|| Self::malformed(node, "getblockchaininfo", "missing blocks"))?,
            best_block_hash: raw["bestblockhash"].as_str().unwrap_or_default().to_string(),
            chain: raw["chain"].as_str().unwrap_or("regtest").to_string(),
            initial_block_download: raw["initialblockdownload"].as_bool().unwrap_or(false),
        })
    }

    async fn get_wallet_info(&self, node: &ChainNode) -> Result<WalletInfo, AdapterError> {
        let raw = self.transport.call(node, "getwalletinfo", json!([])).await?;

        Ok(WalletInfo {
            balance: Self::parse_sats(node, "getwalletinfo", &raw["balance"])?,
            immature_balance: Self::parse_sats(node, "getwalletinfo", &raw["immature_balance"])?,
        })
    }

    async fn get_new_address(&self, node: &ChainNode) -> Result<String, AdapterError> {
        let raw = self
            .transport
            .call(node, "getnewaddress", json!(["", "bech32"]))
            .await?;
        raw.as_str()
            .map(String::from)
            .ok_or_else(|| Self::malformed(node, "getnewaddress", "expected string"))
    }

    async fn connect_peers(&self, node: &ChainNode, peers: &[String]) {
        for peer in peers {
            debug!(node = %node.name, peer = %peer, "Connecting chain peer");
            best_effort(
                "addnode",
                self.transport.call(node, "addnode", json!([peer, "add"])),
            )
            .await;
        }
    }

    async fn mine(&self, node: &ChainNode, blocks: u32) -> Result<Vec<String>, AdapterError> {
        if blocks == 0 {
            return Ok(Vec::new());
        }
        let address = self.get_new_address(node).await?;
        let raw = self
            .transport
            .call(node, "generatetoaddress", json!([blocks, address]))
            .await?;

        let hashes = raw
            .as_array()
            .ok_or_else(|| Self::malformed(node, "generatetoaddress", "expected array"))?
            .iter()
            .filter_map(|h| h.as_str().map(String::from))
            .collect::<Vec<_>>();

        info!(node = %node.name, blocks, "Mined blocks");
        self.bus
            .publish(LabEvent::BlockMined {
                network_id: node.network_id,
                blocks,
                node: node.name.clone(),
            })
            .await;

        Ok(hashes)
    }

    async fn send_funds(
        &self,
        node: &ChainNode,
        address: &str,
        amount: Sats,
    ) -> Result<String, AdapterError> {
        let info = self.get_info(node).await?;
        let wallet = self.get_wallet_info(node).await?;

        if wallet.balance < amount {
            let shortfall = amount - wallet.balance;
            let blocks = blocks_to_mine(info.blocks, shortfall);
            debug!(node = %node.name, blocks, %shortfall, "Mining to cover send");
            self.mine(node, blocks).await?;
        }

        let raw = self
            .transport
            .call(node, "sendtoaddress", json!([address, amount.to_btc_string()]))
            .await?;
        raw.as_str()
            .map(String::from)
            .ok_or_else(|| Self::malformed(node, "sendtoaddress", "expected txid string"))
    }

    async fn ensure_wallet(&self, node: &ChainNode) -> Result<(), AdapterError> {
        let wallets = self.transport.call(node, "listwallets", json!([])).await?;
        let empty = wallets.as_array().map(Vec::is_empty).unwrap_or(true);
        if empty {
            info!(node = %node.name, "Creating default wallet");
            self.transport
                .call(node, "createwallet", json!(["default"]))
                .await?;
        }
        Ok(())
    }

    async fn wait_until_online(
        &self,
        node: &ChainNode,
        config: PollConfig,
    ) -> Result<(), AdapterError> {
        wait_until_online(&node.name, config, || async {
            self.get_info(node).await.map(|_| ())
        })
        .await
    }
}
