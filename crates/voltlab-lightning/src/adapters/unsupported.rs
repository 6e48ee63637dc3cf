//! # Unsupported Lightning Stub
//!
//! Returned by the factory for implementations without adapter support.
//! Every operation fails with a descriptive `NotSupported` error, so a
//! half-supported implementation can still appear in listings and only
//! fails when actually exercised.

use crate::domain::{
    BalanceSnapshot, ChannelInfo, DecodedInvoice, LightningNodeInfo, OpenChannelOutcome,
    PaymentOutcome,
};
use crate::ports::LightningService;
use async_trait::async_trait;
use shared_types::{AdapterError, LightningNode, PollConfig, Sats};
use tracing::warn;

/// Deferred-failure stub for a Lightning implementation without an adapter.
pub struct UnsupportedLightningService {
    implementation: String,
}

impl UnsupportedLightningService {
    /// Create a stub naming the unsupported implementation.
    #[must_use]
    pub fn new(implementation: impl Into<String>) -> Self {
        Self {
            implementation: implementation.into(),
        }
    }

    fn unsupported(&self, operation: &str) -> AdapterError {
        AdapterError::NotSupported {
            implementation: self.implementation.clone(),
            operation: operation.to_string(),
        }
    }
}

#[async_trait]
impl LightningService for UnsupportedLightningService {
    async fn get_info(&self, _node: &LightningNode) -> Result<LightningNodeInfo, AdapterError> {
        Err(self.unsupported("get_info"))
    }

    async fn get_balances(
        &self,
        _node: &LightningNode,
    ) -> Result<BalanceSnapshot, AdapterError> {
        Err(self.unsupported("get_balances"))
    }

    async fn get_new_address(&self, _node: &LightningNode) -> Result<String, AdapterError> {
        Err(self.unsupported("get_new_address"))
    }

    async fn get_channels(
        &self,
        _node: &LightningNode,
    ) -> Result<Vec<ChannelInfo>, AdapterError> {
        Err(self.unsupported("get_channels"))
    }

    async fn list_peers(&self, _node: &LightningNode) -> Result<Vec<String>, AdapterError> {
        Err(self.unsupported("list_peers"))
    }

    async fn connect_peers(&self, node: &LightningNode, _urls: &[String]) {
        warn!(node = %node.name, implementation = %self.implementation,
            "connect_peers ignored for unsupported implementation");
    }

    async fn open_channel(
        &self,
        _node: &LightningNode,
        _peer_url: &str,
        _capacity: Sats,
        _is_private: bool,
    ) -> Result<OpenChannelOutcome, AdapterError> {
        Err(self.unsupported("open_channel"))
    }

    async fn close_channel(
        &self,
        _node: &LightningNode,
        _channel_point: &str,
    ) -> Result<String, AdapterError> {
        Err(self.unsupported("close_channel"))
    }

    async fn create_invoice(
        &self,
        _node: &LightningNode,
        _amount: Sats,
        _memo: &str,
    ) -> Result<String, AdapterError> {
        Err(self.unsupported("create_invoice"))
    }

    async fn pay_invoice(
        &self,
        _node: &LightningNode,
        _invoice: &str,
        _amount: Option<Sats>,
    ) -> Result<PaymentOutcome, AdapterError> {
        Err(self.unsupported("pay_invoice"))
    }

    async fn decode_invoice(
        &self,
        _node: &LightningNode,
        _invoice: &str,
    ) -> Result<DecodedInvoice, AdapterError> {
        Err(self.unsupported("decode_invoice"))
    }

    async fn subscribe_channel_events(
        &self,
        _node: &LightningNode,
    ) -> Result<(), AdapterError> {
        Err(self.unsupported("subscribe_channel_events"))
    }

    async fn remove_listener(&self, _node_name: &str) {}

    async fn wait_until_online(
        &self,
        _node: &LightningNode,
        _config: PollConfig,
    ) -> Result<(), AdapterError> {
        Err(self.unsupported("wait_until_online"))
    }
}
