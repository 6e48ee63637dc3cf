//! # lnd Adapter
//!
//! Maps the [`LightningService`] contract onto lnd's REST surface.
//! lnd reports amounts as integer-satoshi strings and payment amounts in
//! millisatoshi; both are parsed exactly into the shared amount types.

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

/// `LightningService` adapter for lnd.
pub struct LndService {
    transport: Arc<dyn RestTransport>,
    bus: Arc<dyn EventPublisher>,
    listeners: Arc<ListenerRegistry>,
}

impl LndService {
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

    fn sats(node: &LightningNode, operation: &str, value: &Value) -> Result<Sats, AdapterError> {
        Sats::parse(value, false)
            .ok_or_else(|| Self::malformed(node, operation, "unparseable satoshi amount"))
    }

    fn channel_from(value: &Value, status: ChannelStatus) -> Option<ChannelInfo> {
        Some(ChannelInfo {
            channel_point: value["channel_point"].as_str()?.to_string(),
            remote_pubkey: value["remote_pubkey"]
                .as_str()
                .or_else(|| value["remote_node_pub"].as_str())?
                .to_string(),
            capacity: Sats::parse(&value["capacity"], false)?,
            local_balance: Sats::parse(&value["local_balance"], false).unwrap_or(Sats::ZERO),
            remote_balance: Sats::parse(&value["remote_balance"], false).unwrap_or(Sats::ZERO),
            status,
            is_private: value["private"].as_bool().unwrap_or(false),
        })
    }

    /// Normalize one event from `/v1/channels/subscribe`.
    fn event_kind(event: &Value) -> ChannelEventKind {
        match event["result"]["type"].as_str() {
            Some("PENDING_OPEN_CHANNEL") => ChannelEventKind::Pending,
            Some("OPEN_CHANNEL") => ChannelEventKind::Open,
            Some("CLOSED_CHANNEL") => ChannelEventKind::Closed,
            _ => ChannelEventKind::Unknown,
        }
    }
}

#[async_trait]
impl LightningService for LndService {
    async fn get_info(&self, node: &LightningNode) -> Result<LightningNodeInfo, AdapterError> {
        let raw = self.transport.get(node, "/v1/getinfo").await?;
        let pubkey = raw["identity_pubkey"]
            .as_str()
            .ok_or_else(|| Self::malformed(node, "/v1/getinfo", "missing identity_pubkey"))?
            .to_string();

        Ok(LightningNodeInfo {
            rpc_url: format!("{pubkey}@127.0.0.1:{}", node.ports.p2p),
            pubkey,
            alias: raw["alias"].as_str().unwrap_or_default().to_string(),
            block_height: raw["block_height"].as_u64().unwrap_or(0),
            synced_to_chain: raw["synced_to_chain"].as_bool().unwrap_or(false),
        })
    }

    async fn get_balances(
        &self,
        node: &LightningNode,
    ) -> Result<BalanceSnapshot, AdapterError> {
        let raw = self.transport.get(node, "/v1/balance/blockchain").await?;
        Ok(BalanceSnapshot {
            total: Self::sats(node, "/v1/balance/blockchain", &raw["total_balance"])?,
            confirmed: Self::sats(node, "/v1/balance/blockchain", &raw["confirmed_balance"])?,
            unconfirmed: Self::sats(node, "/v1/balance/blockchain", &raw["unconfirmed_balance"])?,
        })
    }

    async fn get_new_address(&self, node: &LightningNode) -> Result<String, AdapterError> {
        let raw = self.transport.get(node, "/v1/newaddress").await?;
        raw["address"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| Self::malformed(node, "/v1/newaddress", "missing address"))
    }

    async fn get_channels(
        &self,
        node: &LightningNode,
    ) -> Result<Vec<ChannelInfo>, AdapterError> {
        let open = self.transport.get(node, "/v1/channels").await?;
        let pending = self.transport.get(node, "/v1/channels/pending").await?;

        let mut channels = Vec::new();
        for raw in open["channels"].as_array().into_iter().flatten() {
            if let Some(channel) = Self::channel_from(raw, ChannelStatus::Open) {
                channels.push(channel);
            }
        }
        for raw in pending["pending_open_channels"].as_array().into_iter().flatten() {
            if let Some(channel) = Self::channel_from(&raw["channel"], ChannelStatus::Opening) {
                channels.push(channel);
            }
        }
        for raw in pending["waiting_close_channels"].as_array().into_iter().flatten() {
            if let Some(channel) = Self::channel_from(&raw["channel"], ChannelStatus::Closing) {
                channels.push(channel);
            }
        }
        Ok(channels)
    }

    async fn list_peers(&self, node: &LightningNode) -> Result<Vec<String>, AdapterError> {
        let raw = self.transport.get(node, "/v1/peers").await?;
        Ok(raw["peers"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|p| p["pub_key"].as_str().map(String::from))
            .collect())
    }

    async fn connect_peers(&self, node: &LightningNode, urls: &[String]) {
        for url in urls {
            let Some((pubkey, host)) = split_connection_url(url) else {
                debug!(node = %node.name, url = %url, "Skipping malformed peer url");
                continue;
            };
            debug!(node = %node.name, peer = %pubkey, "Connecting lightning peer");
            best_effort(
                "connect_peer",
                self.transport.post(
                    node,
                    "/v1/peers",
                    json!({ "addr": { "pubkey": pubkey, "host": host }, "perm": false }),
                ),
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
        // The peer must be connected before funding; harmless if it is.
        self.connect_peers(node, &[peer_url.to_string()]).await;

        let raw = self
            .transport
            .post(
                node,
                "/v1/channels",
                json!({
                    "node_pubkey_string": pubkey,
                    "local_funding_amount": capacity.0.to_string(),
                    "private": is_private,
                }),
            )
            .await?;

        let txid = raw["funding_txid_str"]
            .as_str()
            .ok_or_else(|| Self::malformed(node, "/v1/channels", "missing funding txid"))?
            .to_string();
        let output_index = raw["output_index"].as_u64().unwrap_or(0) as u32;
        info!(node = %node.name, %capacity, "Opened channel");
        Ok(OpenChannelOutcome { txid, output_index })
    }

    async fn close_channel(
        &self,
        node: &LightningNode,
        channel_point: &str,
    ) -> Result<String, AdapterError> {
        let (txid, index) = channel_point.split_once(':').ok_or_else(|| {
            Self::malformed(node, "close_channel", "channel point is not txid:index")
        })?;
        let raw = self
            .transport
            .delete(node, &format!("/v1/channels/{txid}/{index}"))
            .await?;
        raw["close_pending"]["txid"]
            .as_str()
            .or_else(|| raw["closing_txid"].as_str())
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
                "/v1/invoices",
                json!({ "value": amount.0.to_string(), "memo": memo }),
            )
            .await?;
        raw["payment_request"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| Self::malformed(node, "/v1/invoices", "missing payment_request"))
    }

    async fn pay_invoice(
        &self,
        node: &LightningNode,
        invoice: &str,
        amount: Option<Sats>,
    ) -> Result<PaymentOutcome, AdapterError> {
        let mut body = json!({ "payment_request": invoice });
        if let Some(amount) = amount {
            body["amt"] = json!(amount.0.to_string());
        }
        let raw = self
            .transport
            .post(node, "/v1/channels/transactions", body)
            .await?;

        if let Some(error) = raw["payment_error"].as_str() {
            if !error.is_empty() {
                return Err(AdapterError::Rpc {
                    node: node.name.clone(),
                    message: error.to_string(),
                });
            }
        }
        Ok(PaymentOutcome {
            preimage: raw["payment_preimage"]
                .as_str()
                .ok_or_else(|| {
                    Self::malformed(node, "/v1/channels/transactions", "missing preimage")
                })?
                .to_string(),
            amount_msat: MilliSats::parse(&raw["payment_route"]["total_amt_msat"])
                .unwrap_or_default(),
        })
    }

    async fn decode_invoice(
        &self,
        node: &LightningNode,
        invoice: &str,
    ) -> Result<DecodedInvoice, AdapterError> {
        let raw = self
            .transport
            .get(node, &format!("/v1/payreq/{invoice}"))
            .await?;
        Ok(DecodedInvoice {
            payment_hash: raw["payment_hash"].as_str().unwrap_or_default().to_string(),
            amount_msat: MilliSats::parse(&raw["num_msat"]).unwrap_or_default(),
            description: raw["description"].as_str().unwrap_or_default().to_string(),
        })
    }

    async fn subscribe_channel_events(
        &self,
        node: &LightningNode,
    ) -> Result<(), AdapterError> {
        let mut rx = self
            .transport
            .subscribe(node, "/v1/channels/subscribe")
            .await?;
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
