//! # Eclair Adapter
//!
//! Maps the [`LightningService`] contract onto Eclair's HTTP API. Eclair
//! is POST-driven, buries channel balances inside the commitment
//! structure and has no funding-outpoint channel id; normalization digs
//! the unified fields out of the nested commitment data.

use crate::domain::{
    split_connection_url, BalanceSnapshot, ChannelInfo, ChannelStatus, DecodedInvoice,
    LightningNodeInfo, OpenChannelOutcome, PaymentOutcome,
};
use crate::listeners::ListenerRegistry;
use crate::ports::{LightningService, RestTransport};
use async_trait::async_trait;
use serde_json::{json, Value};
use shared_bus::{ChannelEventKind, EventPublisher, LabEvent};
use shared_types::{
    best_effort, wait_until_online, AdapterError, LightningNode, MilliSats, PollConfig, Sats,
};
use std::sync::Arc;
use tracing::{debug, info};

/// `LightningService` adapter for Eclair.
pub struct EclairService {
    transport: Arc<dyn RestTransport>,
    bus: Arc<dyn EventPublisher>,
    listeners: Arc<ListenerRegistry>,
}

impl EclairService {
    /// Create an adapter over the given transport and event bus.
    pub fn new(transport: Arc<dyn RestTransport>, bus: Arc<dyn EventPublisher>) -> Self {
        Self {
            transport,
            bus,
            listeners: Arc::new(ListenerRegistry::new()),
        }
    }

    fn malformed(node: &LightningNode, operation: &str, detail: &str) -> AdapterError {
        AdapterError::Malformed {
            node: node.name.clone(),
            operation: operation.to_string(),
            detail: detail.to_string(),
        }
    }

    fn channel_status(state: &str) -> ChannelStatus {
        match state {
            "WAIT_FOR_FUNDING_CONFIRMED" | "WAIT_FOR_CHANNEL_READY" | "WAIT_FOR_FUNDING_LOCKED" => {
                ChannelStatus::Opening
            }
            "NORMAL" => ChannelStatus::Open,
            "SHUTDOWN" | "NEGOTIATING" | "CLOSING" => ChannelStatus::Closing,
            _ => ChannelStatus::Closed,
        }
    }

    fn channel_from(value: &Value) -> Option<ChannelInfo> {
        let commitments = &value["data"]["commitments"];
        let capacity = Sats::parse(&commitments["capacity"], false)?;
        let local = MilliSats::parse(&commitments["localCommit"]["spec"]["toLocal"])?.to_sats();
        Some(ChannelInfo {
            channel_point: commitments["commitInput"]["outPoint"].as_str()?.to_string(),
            remote_pubkey: value["nodeId"].as_str()?.to_string(),
            capacity,
            local_balance: local,
            remote_balance: capacity - local,
            status: Self::channel_status(value["state"].as_str().unwrap_or_default()),
            is_private: !value["data"]["commitments"]["announceChannel"]
                .as_bool()
                .unwrap_or(true),
        })
    }

    /// Normalize one websocket event.
    fn event_kind(event: &Value) -> ChannelEventKind {
        match event["type"].as_str() {
            Some("channel-opened") => ChannelEventKind::Pending,
            Some("channel-closed") => ChannelEventKind::Closed,
            Some("channel-state-changed") => {
                match Self::channel_status(event["currentState"].as_str().unwrap_or_default()) {
                    ChannelStatus::Opening => ChannelEventKind::Pending,
                    ChannelStatus::Open => ChannelEventKind::Open,
                    ChannelStatus::Closing | ChannelStatus::Closed => ChannelEventKind::Closed,
                }
            }
            _ => ChannelEventKind::Unknown,
        }
    }

    /// Resolve a funding outpoint to Eclair's internal channel id.
    async fn channel_id_for(
        &self,
        node: &LightningNode,
        channel_point: &str,
    ) -> Result<String, AdapterError> {
        let raw = self.transport.post(node, "/channels", json!({})).await?;
        raw.as_array()
            .into_iter()
            .flatten()
            .find(|c| {
                c["data"]["commitments"]["commitInput"]["outPoint"].as_str()
                    == Some(channel_point)
            })
            .and_then(|c| c["channelId"].as_str())
            .map(String::from)
            .ok_or_else(|| {
                Self::malformed(node, "close_channel", "no channel at that outpoint")
            })
    }
}

#[async_trait]
impl LightningService for EclairService {
    async fn get_info(&self, node: &LightningNode) -> Result<LightningNodeInfo, AdapterError> {
        let raw = self.transport.post(node, "/getinfo", json!({})).await?;
        let pubkey = raw["nodeId"]
            .as_str()
            .ok_or_else(|| Self::malformed(node, "/getinfo", "missing nodeId"))?
            .to_string();

        Ok(LightningNodeInfo {
            rpc_url: format!("{pubkey}@127.0.0.1:{}", node.ports.p2p),
            pubkey,
            alias: raw["alias"].as_str().unwrap_or_default().to_string(),
            block_height: raw["blockHeight"].as_u64().unwrap_or(0),
            // Eclair refuses API calls until its backend is synced, so
            // reachability implies sync.
            synced_to_chain: true,
        })
    }

    async fn get_balances(
        &self,
        node: &LightningNode,
    ) -> Result<BalanceSnapshot, AdapterError> {
        let raw = self
            .transport
            .post(node, "/onchainbalance", json!({}))
            .await?;
        let confirmed = Sats::parse(&raw["confirmed"], false)
            .ok_or_else(|| Self::malformed(node, "/onchainbalance", "unparseable balance"))?;
        let unconfirmed = Sats::parse(&raw["unconfirmed"], false).unwrap_or(Sats::ZERO);
        Ok(BalanceSnapshot {
            total: confirmed + unconfirmed,
            confirmed,
            unconfirmed,
        })
    }

    async fn get_new_address(&self, node: &LightningNode) -> Result<String, AdapterError> {
        let raw = self
            .transport
            .post(node, "/getnewaddress", json!({}))
            .await?;
        raw.as_str()
            .map(String::from)
            .ok_or_else(|| Self::malformed(node, "/getnewaddress", "expected string"))
    }

    async fn get_channels(
        &self,
        node: &LightningNode,
    ) -> Result<Vec<ChannelInfo>, AdapterError> {
        let raw = self.transport.post(node, "/channels", json!({})).await?;
        Ok(raw
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Self::channel_from)
            .collect())
    }

    async fn list_peers(&self, node: &LightningNode) -> Result<Vec<String>, AdapterError> {
        let raw = self.transport.post(node, "/peers", json!({})).await?;
        Ok(raw
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|p| p["nodeId"].as_str().map(String::from))
            .collect())
    }

    async fn connect_peers(&self, node: &LightningNode, urls: &[String]) {
        for url in urls {
            debug!(node = %node.name, peer = %url, "Connecting lightning peer");
            best_effort(
                "connect_peer",
                self.transport.post(node, "/connect", json!({ "uri": url })),
            )
            .await;
        }
    }

    async fn open_channel(
        &self,
        node: &LightningNode,
        peer_url: &str,
        capacity: Sats,
        is_private: bool,
    ) -> Result<OpenChannelOutcome, AdapterError> {
        let pubkey = split_connection_url(peer_url)
            .map(|(pubkey, _)| pubkey)
            .unwrap_or(peer_url);
        self.connect_peers(node, &[peer_url.to_string()]).await;

        let raw = self
            .transport
            .post(
                node,
                "/open",
                json!({
                    "nodeId": pubkey,
                    "fundingSatoshis": capacity.0,
                    "announceChannel": !is_private,
                }),
            )
            .await?;

        let txid = raw["fundingTxId"]
            .as_str()
            .ok_or_else(|| Self::malformed(node, "/open", "missing funding txid"))?
            .to_string();
        let output_index = raw["fundingTxOutputIndex"].as_u64().unwrap_or(0) as u32;
        info!(node = %node.name, %capacity, "Opened channel");
        Ok(OpenChannelOutcome { txid, output_index })
    }

    async fn close_channel(
        &self,
        node: &LightningNode,
        channel_point: &str,
    ) -> Result<String, AdapterError> {
        let channel_id = self.channel_id_for(node, channel_point).await?;
        let raw = self
            .transport
            .post(node, "/close", json!({ "channelId": channel_id }))
            .await?;
        raw["txid"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| Self::malformed(node, "close_channel", "missing closing txid"))
    }

    async fn create_invoice(
        &self,
        node: &LightningNode,
        amount: Sats,
        memo: &str,
    ) -> Result<String, AdapterError> {
        let raw = self
            .transport
            .post(
                node,
                "/createinvoice",
                json!({
                    "amountMsat": MilliSats::from(amount).0,
                    "description": memo,
                }),
            )
            .await?;
        raw["serialized"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| Self::malformed(node, "/createinvoice", "missing serialized invoice"))
    }

    async fn pay_invoice(
        &self,
        node: &LightningNode,
        invoice: &str,
        amount: Option<Sats>,
    ) -> Result<PaymentOutcome, AdapterError> {
        let mut body = json!({ "invoice": invoice });
        if let Some(amount) = amount {
            body["amountMsat"] = json!(MilliSats::from(amount).0);
        }
        let raw = self.transport.post(node, "/payinvoice", body).await?;

        Ok(PaymentOutcome {
            preimage: raw["paymentPreimage"]
                .as_str()
                .ok_or_else(|| Self::malformed(node, "/payinvoice", "missing preimage"))?
                .to_string(),
            amount_msat: MilliSats::parse(&raw["recipientAmountMsat"]).unwrap_or_default(),
        })
    }

    async fn decode_invoice(
        &self,
        node: &LightningNode,
        invoice: &str,
    ) -> Result<DecodedInvoice, AdapterError> {
        let raw = self
            .transport
            .post(node, "/parseinvoice", json!({ "invoice": invoice }))
            .await?;
        Ok(DecodedInvoice {
            payment_hash: raw["paymentHash"].as_str().unwrap_or_default().to_string(),
            amount_msat: MilliSats::parse(&raw["amount"]).unwrap_or_default(),
            description: raw["description"].as_str().unwrap_or_default().to_string(),
        })
    }

    async fn subscribe_channel_events(
        &self,
        node: &LightningNode,
    ) -> Result<(), AdapterError> {
        let mut rx = self.transport.subscribe(node, "/ws").await?;
        let bus = Arc::clone(&self.bus);
        let network_id = node.network_id;
        let node_name = node.name.clone();
        let implementation = node.implementation;

        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let kind = Self::event_kind(&event);
                bus.publish(LabEvent::ChannelObserved {
                    network_id,
                    node: node_name.clone(),
                    implementation,
                    kind,
                })
                .await;
            }
        });
        self.listeners.install(&node.name, task);
        Ok(())
    }

    async fn remove_listener(&self, node_name: &str) {
        self.listeners.remove(node_name);
    }

    async fn wait_until_online(
        &self,
        node: &LightningNode,
        config: PollConfig,
    ) -> Result<(), AdapterError> {
        wait_until_online(&node.name, config, || async {
            self.get_info(node).await.map(|_| ())
        })
        .await
    }
}
