//! # Lightning Service Factory
//!
//! Fixed map from implementation tag to adapter, populated at startup.
//! Unknown tags resolve to the deferred-failure stub so a half-supported
//! implementation can still appear in listings. Pure lookup: no side
//! effects, no locking.

use crate::adapters::{
    CoreLightningService, EclairService, LitdService, LndService, UnsupportedLightningService,
};
use crate::ports::{LightningService, RestTransport};
use shared_bus::EventPublisher;
use shared_types::{LightningImplementation, LightningNode};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-category service lookup for Lightning nodes.
pub struct LightningServiceFactory {
    services: HashMap<LightningImplementation, Arc<dyn LightningService>>,
}

impl LightningServiceFactory {
    /// Build the factory with all supported adapters registered.
    #[must_use]
    pub fn new(transport: Arc<dyn RestTransport>, bus: Arc<dyn EventPublisher>) -> Self {
        let mut services: HashMap<LightningImplementation, Arc<dyn LightningService>> =
            HashMap::new();
        services.insert(
            LightningImplementation::Lnd,
            Arc::new(LndService::new(Arc::clone(&transport), Arc::clone(&bus))),
        );
        services.insert(
            LightningImplementation::CoreLightning,
            Arc::new(CoreLightningService::new(
                Arc::clone(&transport),
                Arc::clone(&bus),
            )),
        );
        services.insert(
            LightningImplementation::Eclair,
            Arc::new(EclairService::new(Arc::clone(&transport), Arc::clone(&bus))),
        );
        services.insert(
            LightningImplementation::Litd,
            Arc::new(LitdService::new(transport, bus)),
        );
        Self { services }
    }

    /// Build a factory from an explicit map. Implementations missing from
    /// the map resolve to the unsupported stub.
    #[must_use]
    pub fn with_services(
        services: HashMap<LightningImplementation, Arc<dyn LightningService>>,
    ) -> Self {
        Self { services }
    }

    /// The service for this node's implementation.
    #[must_use]
    pub fn service(&self, node: &LightningNode) -> Arc<dyn LightningService> {
        self.services
            .get(&node.implementation)
            .cloned()
            .unwrap_or_else(|| {
                Arc::new(UnsupportedLightningService::new(node.implementation.tag()))
            })
    }
}
