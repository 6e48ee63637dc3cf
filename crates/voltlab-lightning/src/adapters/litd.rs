//! # litd Adapter
//!
//! Lightning Terminal bundles an lnd daemon and fronts its REST surface
//! unchanged, so the litd adapter is a thin delegation over [`LndService`].
//! It exists as its own type so the factory registers it under the litd
//! tag and the transport picks litd's endpoint scheme.

use crate::adapters::LndService;
use crate::domain::{
    BalanceSnapshot, ChannelInfo, DecodedInvoice, LightningNodeInfo, OpenChannelOutcome,
    PaymentOutcome,
};
use crate::ports::{LightningService, RestTransport};
use async_trait::async_trait;
use shared_bus::EventPublisher;
use shared_types::{AdapterError, LightningNode, PollConfig, Sats};
use std::sync::Arc;

/// `LightningService` adapter for litd, backed by the bundled lnd.
pub struct LitdService {
    inner: LndService,
}

impl LitdService {
    /// Create an adapter over the given transport and event bus.
    pub fn new(transport: Arc<dyn RestTransport>, bus: Arc<dyn EventPublisher>) -> Self {
        Self {
            inner: LndService::new(transport, bus),
        }
    }
}

#[async_trait]
impl LightningService for LitdService {
    async fn get_info(&self, node: &LightningNode) -> Result<LightningNodeInfo, AdapterError> {
        self.inner.get_info(node).await
    }

    async fn get_balances(
        &self,
        node: &LightningNode,
    ) -> Result<BalanceSnapshot, AdapterError> {
        self.inner.get_balances(node).await
    }

    async fn get_new_address(&self, node: &LightningNode) -> Result<String, AdapterError> {
        self.inner.get_new_address(node).await
    }

    async fn get_channels(
        &self,
        node: &LightningNode,
    ) -> Result<Vec<ChannelInfo>, AdapterError> {
        self.inner.get_channels(node).await
    }

    async fn list_peers(&self, node: &LightningNode) -> Result<Vec<String>, AdapterError> {
        self.inner.list_peers(node).await
    }

    async fn connect_peers(&self, node: &LightningNode, urls: &[String]) {
        self.inner.connect_peers(node, urls).await;
    }

    async fn open_channel(
        &self,
        node: &LightningNode,
        peer_url: &str,
        capacity: Sats,
        is_private: bool,
    ) -> Result<OpenChannelOutcome, AdapterError> {
        self.inner
            .open_channel(node, peer_url, capacity, is_private)
            .await
    }

    async fn close_channel(
        &self,
        node: &LightningNode,
        channel_point: &str,
    ) -> Result<String, AdapterError> {
        self.inner.close_channel(node, channel_point).await
    }

    async fn create_invoice(
        &self,
        node: &LightningNode,
        amount: Sats,
        memo: &str,
    ) -> Result<String, AdapterError> {
        self.inner.create_invoice(node, amount, memo).await
    }

    async fn pay_invoice(
        &self,
        node: &LightningNode,
        invoice: &str,
        amount: Option<Sats>,
    ) -> Result<PaymentOutcome, AdapterError> {
        self.inner.pay_invoice(node, invoice, amount).await
    }

    async fn decode_invoice(
        &self,
        node: &LightningNode,
        invoice: &str,
    ) -> Result<DecodedInvoice, AdapterError> {
        self.inner.decode_invoice(node, invoice).await
    }

    async fn subscribe_channel_events(
        &self,
        node: &LightningNode,
    ) -> Result<(), AdapterError> {
        self.inner.subscribe_channel_events(node).await
    }

    async fn remove_listener(&self, node_name: &str) {
        self.inner.remove_listener(node_name).await;
    }

    async fn wait_until_online(
        &self,
        node: &LightningNode,
        config: PollConfig,
    ) -> Result<(), AdapterError> {
        self.inner.wait_until_online(node, config).await
    }
}
