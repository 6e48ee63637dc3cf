//! # Unsupported Chain Stub
//!
//! Returned by the factory for implementations without adapter support.
//! Every operation fails with a descriptive `NotSupported` error, so a
//! half-supported implementation can still appear in listings and only
//! fails when actually exercised.

use crate::domain::{ChainInfo, WalletInfo};
use crate::ports::ChainService;
use async_trait::async_trait;
use shared_types::{AdapterError, ChainNode, PollConfig, Sats};
use tracing::warn;

/// Deferred-failure stub for a chain implementation without an adapter.
pub struct UnsupportedChainService {
    implementation: String,
}

impl UnsupportedChainService {
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
impl ChainService for UnsupportedChainService {
    async fn get_info(&self, _node: &ChainNode) -> Result<ChainInfo, AdapterError> {
        Err(self.unsupported("get_info"))
    }

    async fn get_wallet_info(&self, _node: &ChainNode) -> Result<WalletInfo, AdapterError> {
        Err(self.unsupported("get_wallet_info"))
    }

    async fn get_new_address(&self, _node: &ChainNode) -> Result<String, AdapterError> {
        Err(self.unsupported("get_new_address"))
    }

    async fn connect_peers(&self, node: &ChainNode, _peers: &[String]) {
        warn!(node = %node.name, implementation = %self.implementation,
            "connect_peers ignored for unsupported implementation");
    }

    async fn mine(&self, _node: &ChainNode, _blocks: u32) -> Result<Vec<String>, AdapterError> {
        Err(self.unsupported("mine"))
    }

    async fn send_funds(
        &self,
        _node: &ChainNode,
        _address: &str,
        _amount: Sats,
    ) -> Result<String, AdapterError> {
        Err(self.unsupported("send_funds"))
    }

    async fn ensure_wallet(&self, _node: &ChainNode) -> Result<(), AdapterError> {
        Err(self.unsupported("ensure_wallet"))
    }

    async fn wait_until_online(
        &self,
        _node: &ChainNode,
        _config: PollConfig,
    ) -> Result<(), AdapterError> {
        Err(self.unsupported("wait_until_online"))
    }
}
