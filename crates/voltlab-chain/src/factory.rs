//! # Chain Service Factory
//!
//! Fixed map from implementation tag to adapter, populated at startup.
//! Callers never branch on implementation; they ask for "the service for
//! this node". Unknown tags resolve to the deferred-failure stub. Pure
//! lookup: no side effects, no locking.

use crate::adapters::{BitcoindService, BtcdService, UnsupportedChainService};
use crate::ports::{ChainService, JsonRpcTransport};
use shared_bus::EventPublisher;
use shared_types::{ChainImplementation, ChainNode};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-category service lookup for chain nodes.
pub struct ChainServiceFactory {
    services: HashMap<ChainImplementation, Arc<dyn ChainService>>,
}

impl ChainServiceFactory {
    /// Build the factory with all supported adapters registered.
    #[must_use]
    pub fn new(transport: Arc<dyn JsonRpcTransport>, bus: Arc<dyn EventPublisher>) -> Self {
        let mut services: HashMap<ChainImplementation, Arc<dyn ChainService>> = HashMap::new();
        services.insert(
            ChainImplementation::Bitcoind,
            Arc::new(BitcoindService::new(Arc::clone(&transport), Arc::clone(&bus))),
        );
        services.insert(
            ChainImplementation::Btcd,
            Arc::new(BtcdService::new(transport, bus)),
        );
        Self { services }
    }

    /// Build a factory from an explicit map. Implementations missing from
    /// the map resolve to the unsupported stub.
    #[must_use]
    pub fn with_services(
        services: HashMap<ChainImplementation, Arc<dyn ChainService>>,
    ) -> Self {
        Self { services }
    }

    /// The service for this node's implementation.
    #[must_use]
    pub fn service(&self, node: &ChainNode) -> Arc<dyn ChainService> {
        self.services
            .get(&node.implementation)
            .cloned()
            .unwrap_or_else(|| {
                Arc::new(UnsupportedChainService::new(node.implementation.tag()))
            })
    }
}
