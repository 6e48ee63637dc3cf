//! # Tap Service Factory
//!
//! Fixed map from implementation tag to adapter, populated at startup.
//! This is the strict factory: an unregistered tag fails immediately
//! instead of resolving to a deferred-failure stub, because no partial
//! asset-backend support exists.

use crate::adapters::TapdService;
use crate::ports::{TapRestTransport, TapService};
use shared_types::{AdapterError, TapImplementation, TapNode};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-category service lookup for tap nodes.
pub struct TapServiceFactory {
    services: HashMap<TapImplementation, Arc<dyn TapService>>,
}

impl TapServiceFactory {
    /// Build the factory with all supported adapters registered. Both
    /// tags share one tapd adapter; litd proxies the same REST surface.
    #[must_use]
    pub fn new(transport: Arc<dyn TapRestTransport>) -> Self {
        let tapd: Arc<dyn TapService> = Arc::new(TapdService::new(transport));
        let mut services: HashMap<TapImplementation, Arc<dyn TapService>> = HashMap::new();
        services.insert(TapImplementation::Tapd, Arc::clone(&tapd));
        services.insert(TapImplementation::Litd, tapd);
        Self { services }
    }

    /// Build a factory from an explicit map.
    #[must_use]
    pub fn with_services(services: HashMap<TapImplementation, Arc<dyn TapService>>) -> Self {
        Self { services }
    }

    /// The service for this node's implementation, or an immediate error
    /// for an unregistered tag.
    pub fn service(&self, node: &TapNode) -> Result<Arc<dyn TapService>, AdapterError> {
        self.services
            .get(&node.implementation)
            .cloned()
            .ok_or_else(|| AdapterError::NotSupported {
                implementation: node.implementation.tag().to_string(),
                operation: "get_service".to_string(),
            })
    }
}
