//! # btcd Adapter
//!
//! Maps the [`ChainService`] contract onto btcd plus its companion
//! btcwallet. btcd has no `getblockchaininfo`; tip info is assembled from
//! `getinfo` and `getbestblockhash`, and the wallet surface differs from
//! Bitcoin Core's (no `immature_balance`, wallet created at daemon init).

use crate::domain::{blocks_to_mine, ChainInfo, WalletInfo};
use crate::ports::{ChainService, JsonRpcTransport};
use async_trait::async_trait;
use serde_json::{json, Value};
use shared_bus::{EventPublisher, LabEvent};
use shared_types::{best_effort, wait_until_online, AdapterError, ChainNode, PollConfig, Sats};
use std::sync::Arc;
use tracing::{debug, info};

/// `ChainService` adapter for btcd/btcwallet.
pub struct BtcdService {
    transport: Arc<dyn JsonRpcTransport>,
    bus: Arc<dyn EventPublisher>,
}

impl BtcdService {
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

    fn expect_string(
        node: &ChainNode,
        operation: &str,
        value: Value,
    ) -> Result<String, AdapterError> {
        value
            .as_str()
            .map(String::from)
            .ok_or_else(|| Self::malformed(node, operation, "expected string"))
    }
}

#[async_trait]
impl ChainService for BtcdService {
    async fn get_info(&self, node: &ChainNode) -> Result<ChainInfo, AdapterError> {
        let raw = self.transport.call(node, "getinfo", json!([])).await?;
        let best = self
            .transport
            .call(node, "getbestblockhash", json!([]))
            .await?;

        Ok(ChainInfo {
            blocks: raw["blocks"]
                .as_u64()
                .ok_or_else(|| Self::malformed(node, "getinfo", "missing blocks"))?,
            best_block_hash: best.as_str().unwrap_or_default().to_string(),
            // btcd reports neither chain name nor IBD state here; a lab
            // node is always a synced regtest node.
            chain: "regtest".to_string(),
            initial_block_download: false,
        })
    }

    async fn get_wallet_info(&self, node: &ChainNode) -> Result<WalletInfo, AdapterError> {
        let raw = self.transport.call(node, "getbalance", json!([])).await?;
        let balance = Sats::parse(&raw, true)
            .ok_or_else(|| Self::malformed(node, "getbalance", "unparseable BTC amount"))?;

        Ok(WalletInfo {
            balance,
            immature_balance: Sats::ZERO,
        })
    }

    async fn get_new_address(&self, node: &ChainNode) -> Result<String, AdapterError> {
        let raw = self.transport.call(node, "getnewaddress", json!([])).await?;
        Self::expect_string(node, "getnewaddress", raw)
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
        let raw = self.transport.call(node, "generate", json!([blocks])).await?;

        let hashes = raw
            .as_array()
            .ok_or_else(|| Self::malformed(node, "generate", "expected array"))?
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
        Self::expect_string(node, "sendtoaddress", raw)
    }

    async fn ensure_wallet(&self, _node: &ChainNode) -> Result<(), AdapterError> {
        // btcwallet creates its wallet at daemon init.
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
