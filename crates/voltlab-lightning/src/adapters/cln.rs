//! # Core Lightning Adapter
//!
//! Maps the [`LightningService`] contract onto the c-lightning REST
//! surface. Core Lightning reports amounts in millisatoshi, sometimes
//! with an `msat` suffix, and identifies channels by an internal channel
//! id rather than the funding outpoint; both are normalized here.

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
use uuid::Uuid;

/// `LightningService` adapter for Core Lightning (c-lightning REST).
pub struct CoreLightningService {
    transport: Arc<dyn RestTransport>,
    bus: Arc<dyn EventPublisher>,
    listeners: Arc<ListenerRegistry>,
}

impl CoreLightningService {
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

    /// Parse a millisatoshi field, tolerating the `msat` string suffix.
    fn msat(value: &Value) -> Option<MilliSats> {
        match value {
            Value::String(s) => MilliSats::parse(&json!(s.trim_end_matches("msat"))),
            other => MilliSats::parse(other),
        }
    }

    fn channel_status(state: &str) -> ChannelStatus {
        match state {
            "CHANNELD_AWAITING_LOCKIN" | "DUALOPEND_AWAITING_LOCKIN" => ChannelStatus::Opening,
            "CHANNELD_NORMAL" => ChannelStatus::Open,
            "CHANNELD_SHUTTING_DOWN"
            | "CLOSINGD_SIGEXCHANGE"
            | "CLOSINGD_COMPLETE"
            | "AWAITING_UNILATERAL"
            | "FUNDING_SPEND_SEEN" => ChannelStatus::Closing,
            _ => ChannelStatus::Closed,
        }
    }

    fn channel_from(value: &Value) -> Option<ChannelInfo> {
        let total = Self::msat(&value["msatoshi_total"])?.to_sats();
        let local = Self::msat(&value["msatoshi_to_us"])?.to_sats();
        Some(ChannelInfo {
            channel_point: format!(
                "{}:{}",
                value["funding_txid"].as_str()?,
                value["funding_output"].as_u64().unwrap_or(0)
            ),
            remote_pubkey: value["id"].as_str()?.to_string(),
            capacity: total,
            local_balance: local,
            remote_balance: total - local,
            status: Self::channel_status(value["state"].as_str().unwrap_or_default()),
            is_private: value["private"].as_bool().unwrap_or(false),
        })
    }

    /// Normalize one websocket event.
    fn event_kind(event: &Value) -> ChannelEventKind {
        match event["event"].as_str() {
            Some("channel_opened") => ChannelEventKind::Pending,
            Some("channel_state_changed") => {
                match Self::channel_status(event["data"]["new_state"].as_str().unwrap_or_default())
                {
                    ChannelStatus::Opening => ChannelEventKind::Pending,
                    ChannelStatus::Open => ChannelEventKind::Open,
                    ChannelStatus::Closing | ChannelStatus::Closed => ChannelEventKind::Closed,
                }
            }
            _ => ChannelEventKind::Unknown,
        }
    }

    /// Resolve a funding outpoint to Core Lightning's internal channel id.
    async fn channel_id_for(
        &self,
        node: &LightningNode,
        channel_point: &str,
    ) -> Result<String, AdapterError> {
        let txid = channel_point.split(':').next().unwrap_or(channel_point);
        let raw = self
            .transport
            .get(node, "/v1/channel/listChannels")
            .await?;
        raw.as_array()
            .into_iter()
            .flatten()
            .find(|c| c["funding_txid"].as_str() == Some(txid))
            .and_then(|c| c["channel_id"].as_str())
            .map(String::from)
            .ok_or_else(|| {
                Self::malformed(node, "close_channel", "no channel at that outpoint")
            })
    }
}

#[async_trait]
impl LightningService for CoreLightningService {
    async fn get_info(&self, node: &LightningNode) -> Result<LightningNodeInfo, AdapterError> {
        let raw = self.transport.get(node, "/v1/getinfo").await?;
        let pubkey = raw["id"]
            .as_str()
            .ok_or_else(|| Self::malformed(node, "/v1/getinfo", "missing id"))?
            .to_string();
        let synced = raw["warning_bitcoind_sync"].is_null()
            && raw["warning_lightningd_sync"].is_null();

        Ok(LightningNodeInfo {
            rpc_url: format!("{pubkey}@127.0.0.1:{}", node.ports.p2p),
            pubkey,
            alias: raw["alias"].as_str().unwrap_or_default().to_string(),
            block_height: raw["blockheight"].as_u64().unwrap_or(0),
            synced_to_chain: synced,
        })
    }

    async fn get_balances(
        &self,
        node: &LightningNode,
    ) -> Result<BalanceSnapshot, AdapterError> {
        let raw = self.transport.get(node, "/v1/getBalance").await?;
        let parse = |field: &str| {
            Sats::parse(&raw[field], false)
                .ok_or_else(|| Self::malformed(node, "/v1/getBalance", "unparseable balance"))
        };
        Ok(BalanceSnapshot {
            total: parse("totalBalance")?,
            confirmed: parse("confBalance")?,
            unconfirmed: parse("unconfBalance")?,
        })
    }

    async fn get_new_address(&self, node: &LightningNode) -> Result<String, AdapterError> {
        let raw = self.transport.get(node, "/v1/newaddr").await?;
        raw["address"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| Self::malformed(node, "/v1/newaddr", "missing address"))
    }

    async fn get_channels(
        &self,
        node: &LightningNode,
    ) -> Result<Vec<ChannelInfo>, AdapterError> {
        let raw = self
            .transport
            .get(node, "/v1/channel/listChannels")
            .await?;
        Ok(raw
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Self::channel_from)
            .collect())
    }

    async fn list_peers(&self, node: &LightningNode) -> Result<Vec<String>, AdapterError> {
        let raw = self.transport.get(node, "/v1/peer/listPeers").await?;
        Ok(raw
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|p| p["id"].as_str().map(String::from))
            .collect())
    }

    async fn connect_peers(&self, node: &LightningNode, urls: &[String]) {
        for url in urls {
            debug!(node = %node.name, peer = %url, "Connecting lightning peer");
            best_effort(
                "connect_peer",
                self.transport
                    .post(node, "/v1/peer/connect", json!({ "id": url })),
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
                "/v1/channel/openChannel",
                json!({
                    "id": pubkey,
                    "satoshis": capacity.0.to_string(),
                    "announce": !is_private,
                }),
            )
            .await?;

        let txid = raw["txid"]
            .as_str()
            .ok_or_else(|| Self::malformed(node, "/v1/channel/openChannel", "missing txid"))?
            .to_string();
        let output_index = raw["outnum"].as_u64().unwrap_or(0) as u32;
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
            .delete(node, &format!("/v1/channel/closeChannel/{channel_id}"))
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
                "/v1/invoice/genInvoice",
                json!({
                    "amount": MilliSats::from(amount).0,
                    "label": format!("voltlab-{}", Uuid::new_v4()),
                    "description": memo,
                }),
            )
            .await?;
        raw["bolt11"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| Self::malformed(node, "/v1/invoice/genInvoice", "missing bolt11"))
    }

    async fn pay_invoice(
        &self,
        node: &LightningNode,
        invoice: &str,
        amount: Option<Sats>,
    ) -> Result<PaymentOutcome, AdapterError> {
        let mut body = json!({ "invoice": invoice });
        if let Some(amount) = amount {
            body["amount"] = json!(MilliSats::from(amount).0);
        }
        let raw = self.transport.post(node, "/v1/pay", body).await?;

        Ok(PaymentOutcome {
            preimage: raw["payment_preimage"]
                .as_str()
                .ok_or_else(|| Self::malformed(node, "/v1/pay", "missing preimage"))?
                .to_string(),
            amount_msat: Self::msat(&raw["amount_sent_msat"]).unwrap_or_default(),
        })
    }

    async fn decode_invoice(
        &self,
        node: &LightningNode,
        invoice: &str,
    ) -> Result<DecodedInvoice, AdapterError> {
        let raw = self
            .transport
            .get(node, &format!("/v1/pay/decodePay/{invoice}"))
            .await?;
        Ok(DecodedInvoice {
            payment_hash: raw["payment_hash"].as_str().unwrap_or_default().to_string(),
            amount_msat: Self::msat(&raw["amount_msat"]).unwrap_or_default(),
            description: raw["description"].as_str().unwrap_or_default().to_string(),
        })
    }

    async fn subscribe_channel_events(
        &self,
        node: &LightningNode,
    ) -> Result<(), AdapterError> {
        let mut rx = self.transport.subscribe(node, "/v1/ws").await?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::{test_node, ScriptedRest};
    use shared_bus::InMemoryEventBus;
    use shared_types::LightningImplementation;

    fn service(transport: Arc<ScriptedRest>) -> CoreLightningService {
        CoreLightningService::new(transport, Arc::new(InMemoryEventBus::new()))
    }

    #[tokio::test]
    async fn test_get_info_reads_sync_warnings() {
        let transport = Arc::new(ScriptedRest::new());
        transport.respond(
            "/v1/getinfo",
            json!({
                "id": "03cln",
                "alias": "bob",
                "blockheight": 99,
                "warning_bitcoind_sync": "Still syncing",
            }),
        );
        let service = service(Arc::clone(&transport));
        let node = test_node(LightningImplementation::CoreLightning);

        let info = service.get_info(&node).await.unwrap();
        assert!(!info.synced_to_chain);
        assert_eq!(info.rpc_url, "03cln@127.0.0.1:9735");
    }

    #[tokio::test]
    async fn test_channels_normalize_msat_to_sats() {
        let transport = Arc::new(ScriptedRest::new());
        transport.respond(
            "/v1/channel/listChannels",
            json!([{
                "id": "02bob",
                "channel_id": "cid1",
                "funding_txid": "aa",
                "funding_output": 0,
                "state": "CHANNELD_NORMAL",
                "msatoshi_total": "100000000msat",
                "msatoshi_to_us": 60_000_000,
                "private": true,
            }]),
        );
        let service = service(Arc::clone(&transport));
        let node = test_node(LightningImplementation::CoreLightning);

        let channels = service.get_channels(&node).await.unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].capacity, Sats(100_000));
        assert_eq!(channels[0].local_balance, Sats(60_000));
        assert_eq!(channels[0].remote_balance, Sats(40_000));
        assert_eq!(channels[0].status, ChannelStatus::Open);
        assert!(channels[0].is_private);
    }

    #[tokio::test]
    async fn test_close_channel_resolves_internal_id() {
        let transport = Arc::new(ScriptedRest::new());
        transport.respond(
            "/v1/channel/listChannels",
            json!([{ "funding_txid": "aa", "channel_id": "cid1" }]),
        );
        transport.respond("/v1/channel/closeChannel/cid1", json!({ "txid": "closetx" }));
        let service = service(Arc::clone(&transport));
        let node = test_node(LightningImplementation::CoreLightning);

        let txid = service.close_channel(&node, "aa:0").await.unwrap();
        assert_eq!(txid, "closetx");
    }

    #[tokio::test]
    async fn test_invoice_label_is_unique_per_call() {
        let transport = Arc::new(ScriptedRest::new());
        transport.respond("/v1/invoice/genInvoice", json!({ "bolt11": "lnbcrt1..." }));
        let service = service(Arc::clone(&transport));
        let node = test_node(LightningImplementation::CoreLightning);

        service.create_invoice(&node, Sats(1000), "a").await.unwrap();
        service.create_invoice(&node, Sats(1000), "a").await.unwrap();

        let calls = transport.calls_to("/v1/invoice/genInvoice");
        assert_eq!(calls[0]["amount"], json!(1_000_000));
        assert_ne!(calls[0]["label"], calls[1]["label"]);
    }

    #[test]
    fn test_event_kind_maps_state_changes() {
        let open = json!({ "event": "channel_state_changed", "data": { "new_state": "CHANNELD_NORMAL" } });
        assert_eq!(CoreLightningService::event_kind(&open), ChannelEventKind::Open);

        let closing = json!({ "event": "channel_state_changed", "data": { "new_state": "CLOSINGD_COMPLETE" } });
        assert_eq!(CoreLightningService::event_kind(&closing), ChannelEventKind::Closed);

        let other = json!({ "event": "invoice_payment" });
        assert_eq!(CoreLightningService::event_kind(&other), ChannelEventKind::Unknown);
    }
}
