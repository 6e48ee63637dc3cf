//! # Channel-Event Reconciler
//!
//! Consumes channel events and mined-block events from the bus and
//! rebuilds the derived channel projections for the affected network.
//! Resyncs are throttled per network with leading and trailing edges: a
//! burst of events yields one resync at burst-start and one at burst-end.
//! Each Lightning implementation gets a grace delay before the resync
//! request, reflecting its channel-state propagation latency.

use crate::store::NetworkStore;
use shared_bus::{ChannelEventKind, LabEvent, Subscription, Throttle};
use shared_types::{best_effort, LightningImplementation, NetworkId, Status};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;
use voltlab_chain::{ChainInfo, ChainServiceFactory};
use voltlab_lightning::{ChannelInfo, LightningServiceFactory};

/// Throttle window for channel-graph resyncs.
const RESYNC_WINDOW: Duration = Duration::from_secs(3);

type ResyncFn = Arc<dyn Fn(NetworkId) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Derived read models, keyed by (network, node name): channel lists for
/// Lightning nodes and chain-info snapshots for chain nodes. Never
/// mutated in place: a resync replaces each entry wholesale.
#[derive(Default)]
pub struct ProjectionCache {
    channels: Mutex<HashMap<(NetworkId, String), Vec<ChannelInfo>>>,
    chain_info: Mutex<HashMap<(NetworkId, String), ChainInfo>>,
}

impl ProjectionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one node's channel list.
    pub fn set_channels(
        &self,
        network_id: NetworkId,
        node_name: &str,
        channels: Vec<ChannelInfo>,
    ) {
        self.channels
            .lock()
            .unwrap()
            .insert((network_id, node_name.to_string()), channels);
    }

    /// Current channel list for a node, empty when never synced.
    #[must_use]
    pub fn channels(&self, network_id: NetworkId, node_name: &str) -> Vec<ChannelInfo> {
        self.channels
            .lock()
            .unwrap()
            .get(&(network_id, node_name.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Replace one chain node's info snapshot.
    pub fn set_chain_info(&self, network_id: NetworkId, node_name: &str, info: ChainInfo) {
        self.chain_info
            .lock()
            .unwrap()
            .insert((network_id, node_name.to_string()), info);
    }

    /// Latest chain-info snapshot for a node, `None` when never synced.
    #[must_use]
    pub fn chain_info(&self, network_id: NetworkId, node_name: &str) -> Option<ChainInfo> {
        self.chain_info
            .lock()
            .unwrap()
            .get(&(network_id, node_name.to_string()))
            .cloned()
    }

    /// Drop every projection of one network. Used on network stop.
    pub fn clear_network(&self, network_id: NetworkId) {
        self.channels
            .lock()
            .unwrap()
            .retain(|(id, _), _| *id != network_id);
        self.chain_info
            .lock()
            .unwrap()
            .retain(|(id, _), _| *id != network_id);
    }
}

/// Grace delay before a resync request for this implementation's events.
fn grace_delay(implementation: LightningImplementation) -> Duration {
    match implementation {
        LightningImplementation::Lnd | LightningImplementation::Litd => {
            Duration::from_millis(250)
        }
        LightningImplementation::CoreLightning => Duration::from_secs(1),
        LightningImplementation::Eclair => Duration::from_secs(2),
    }
}

/// Event-driven channel-graph resynchronizer.
pub struct ChannelReconciler {
    resync: ResyncFn,
    throttles: Mutex<HashMap<NetworkId, Throttle>>,
}

impl ChannelReconciler {
    /// Create a reconciler that rebuilds `cache` from the store and the
    /// category factories on every resync.
    pub fn new(
        store: Arc<NetworkStore>,
        chain: Arc<ChainServiceFactory>,
        lightning: Arc<LightningServiceFactory>,
        cache: Arc<ProjectionCache>,
    ) -> Self {
        let resync = move |network_id: NetworkId| {
            let store = Arc::clone(&store);
            let chain = Arc::clone(&chain);
            let lightning = Arc::clone(&lightning);
            let cache = Arc::clone(&cache);
            Box::pin(async move {
                let Ok(network) = store.get(network_id) else {
                    return;
                };
                for node in network
                    .lightning
                    .iter()
                    .filter(|n| n.status == Status::Started)
                {
                    let service = lightning.service(node);
                    if let Some(channels) =
                        best_effort("get_channels", service.get_channels(node)).await
                    {
                        cache.set_channels(network_id, &node.name, channels);
                    }
                }
                for node in network.chain.iter().filter(|n| n.status == Status::Started) {
                    let service = chain.service(node);
                    if let Some(info) = best_effort("get_info", service.get_info(node)).await {
                        cache.set_chain_info(network_id, &node.name, info);
                    }
                }
                debug!(network = network_id, "Projections resynced");
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        };
        Self::with_resync(resync)
    }

    /// Create a reconciler around an arbitrary resync action.
    pub fn with_resync<F, Fut>(resync: F) -> Self
    where
        F: Fn(NetworkId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let resync: ResyncFn = Arc::new(move |id| Box::pin(resync(id)));
        Self {
            resync,
            throttles: Mutex::new(HashMap::new()),
        }
    }

    /// Request a throttled resync of one network's channel graph.
    pub fn request_resync(&self, network_id: NetworkId) {
        let mut throttles = self.throttles.lock().unwrap();
        let throttle = throttles.entry(network_id).or_insert_with(|| {
            let resync = Arc::clone(&self.resync);
            Throttle::new(RESYNC_WINDOW, move || resync(network_id))
        });
        throttle.fire();
    }

    /// Consume bus events until the bus closes. Channel events wait out
    /// their implementation's grace delay; mined blocks resync without
    /// one. `Unknown` channel events are dropped.
    pub fn run(self: Arc<Self>, mut subscription: Subscription) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                match event {
                    LabEvent::BlockMined { network_id, .. } => {
                        self.request_resync(network_id);
                    }
                    LabEvent::ChannelObserved {
                        network_id,
                        kind,
                        implementation,
                        ..
                    } => {
                        if kind == ChannelEventKind::Unknown {
                            debug!(network = network_id, "Ignoring unclassified channel event");
                            continue;
                        }
                        let reconciler = Arc::clone(&self);
                        tokio::spawn(async move {
                            sleep(grace_delay(implementation)).await;
                            reconciler.request_resync(network_id);
                        });
                    }
                    LabEvent::StatusChanged { .. } => {}
                }
            }
        })
    }
}
