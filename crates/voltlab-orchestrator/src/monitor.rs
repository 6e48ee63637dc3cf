//! # Startup Reconciliation
//!
//! After containers launch, every node gets an independent readiness
//! wait; waits fan out in parallel and are joined, never raced. Barriers
//! are per category: all chain waits settle before the first mine, all
//! Lightning waits settle before peer meshing. One node failing its wait
//! marks only that node Error and never aborts its siblings.

use crate::store::NetworkStore;
use futures::future::join_all;
use shared_bus::{EventPublisher, LabEvent};
use shared_types::{
    best_effort, ChainNode, LightningNode, NetworkId, PollConfig, Status, TapNode,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use voltlab_chain::ChainServiceFactory;
use voltlab_lightning::{LightningNodeInfo, LightningServiceFactory};
use voltlab_tap::TapServiceFactory;

/// Drives post-launch reconciliation for a network's nodes.
pub struct StartupMonitor {
    store: Arc<NetworkStore>,
    chain: Arc<ChainServiceFactory>,
    lightning: Arc<LightningServiceFactory>,
    tap: Arc<TapServiceFactory>,
    bus: Arc<dyn EventPublisher>,
}

impl StartupMonitor {
    /// Create a monitor over the shared store, factories and bus.
    pub fn new(
        store: Arc<NetworkStore>,
        chain: Arc<ChainServiceFactory>,
        lightning: Arc<LightningServiceFactory>,
        tap: Arc<TapServiceFactory>,
        bus: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            store,
            chain,
            lightning,
            tap,
            bus,
        }
    }

    /// Wait for the network's nodes to come online and reconcile them.
    ///
    /// `only` scopes the run to a single node, used when one node is
    /// started into an already-running network.
    pub async fn monitor_startup(&self, network_id: NetworkId, only: Option<&str>) {
        let Ok(network) = self.store.get(network_id) else {
            warn!(network = network_id, "Startup monitor found no such network");
            return;
        };

        let included = |name: &str| only.map_or(true, |o| o == name);
        let chain_nodes: Vec<ChainNode> = network
            .chain
            .iter()
            .filter(|n| included(&n.name))
            .cloned()
            .collect();
        let lightning_nodes: Vec<LightningNode> = network
            .lightning
            .iter()
            .filter(|n| included(&n.name))
            .cloned()
            .collect();
        let tap_nodes: Vec<TapNode> = network
            .tap
            .iter()
            .filter(|n| included(&n.name))
            .cloned()
            .collect();

        // Barrier 1: every chain wait settles, then one block is mined.
        // Some Lightning implementations stay wedged until the chain tip
        // has moved at least once.
        let chain_peers: Vec<String> = network
            .chain
            .iter()
            .map(|n| format!("127.0.0.1:{}", n.ports.p2p))
            .collect();
        join_all(
            chain_nodes
                .iter()
                .map(|node| self.settle_chain_node(node, &chain_peers)),
        )
        .await;

        if !chain_nodes.is_empty() {
            if let Some(first) = network.chain.first() {
                let service = self.chain.service(first);
                best_effort("initial_mine", service.mine(first, 1)).await;
            }
        }

        // Barrier 2: every Lightning wait settles, then the mesh runs.
        let settled =
            join_all(lightning_nodes.iter().map(|node| self.settle_lightning_node(node)))
                .await;
        let online: Vec<(LightningNode, LightningNodeInfo)> = lightning_nodes
            .into_iter()
            .zip(settled)
            .filter_map(|(node, info)| info.map(|i| (node, i)))
            .collect();

        self.mesh_peers(&online).await;
        for (node, _) in &online {
            let service = self.lightning.service(node);
            best_effort(
                "subscribe_channel_events",
                service.subscribe_channel_events(node),
            )
            .await;
        }

        // Tap nodes only need their readiness wait.
        join_all(tap_nodes.iter().map(|node| self.settle_tap_node(node))).await;

        let _ = self
            .store
            .update(network_id, |n| n.status = n.aggregate_status());
        info!(network = network_id, "Startup reconciliation finished");
    }

    async fn mark(&self, network_id: NetworkId, name: &str, status: Status, error: Option<String>) {
        let _ = self
            .store
            .set_node_status(network_id, name, status, error);
        self.bus
            .publish(LabEvent::StatusChanged {
                network_id,
                node: name.to_string(),
                status,
            })
            .await;
    }

    async fn settle_chain_node(&self, node: &ChainNode, peers: &[String]) {
        let service = self.chain.service(node);
        match service.wait_until_online(node, PollConfig::chain()).await {
            Ok(()) => {
                self.mark(node.network_id, &node.name, Status::Started, None)
                    .await;
                let siblings: Vec<String> = peers
                    .iter()
                    .filter(|p| **p != format!("127.0.0.1:{}", node.ports.p2p))
                    .cloned()
                    .collect();
                service.connect_peers(node, &siblings).await;
                best_effort("ensure_wallet", service.ensure_wallet(node)).await;
            }
            Err(err) => {
                self.mark(
                    node.network_id,
                    &node.name,
                    Status::Error,
                    Some(err.to_string()),
                )
                .await;
            }
        }
    }

    async fn settle_lightning_node(&self, node: &LightningNode) -> Option<LightningNodeInfo> {
        let service = self.lightning.service(node);
        match service.wait_until_online(node, PollConfig::lightning()).await {
            Ok(()) => {
                self.mark(node.network_id, &node.name, Status::Started, None)
                    .await;
                best_effort("get_info", service.get_info(node)).await
            }
            Err(err) => {
                self.mark(
                    node.network_id,
                    &node.name,
                    Status::Error,
                    Some(err.to_string()),
                )
                .await;
                None
            }
        }
    }

    async fn settle_tap_node(&self, node: &TapNode) {
        let service = match self.tap.service(node) {
            Ok(service) => service,
            Err(err) => {
                self.mark(
                    node.network_id,
                    &node.name,
                    Status::Error,
                    Some(err.to_string()),
                )
                .await;
                return;
            }
        };
        match service.wait_until_online(node, PollConfig::tap()).await {
            Ok(()) => {
                self.mark(node.network_id, &node.name, Status::Started, None)
                    .await;
            }
            Err(err) => {
                self.mark(
                    node.network_id,
                    &node.name,
                    Status::Error,
                    Some(err.to_string()),
                )
                .await;
            }
        }
    }

    /// Full-mesh peer connection: every online node connects to every
    /// other, skipping peers it already knows. Matching is by full
    /// identity pubkey, never by address or key prefix. Best-effort and
    /// never retried.
    async fn mesh_peers(&self, online: &[(LightningNode, LightningNodeInfo)]) {
        for (node, info) in online {
            let service = self.lightning.service(node);
            let connected = best_effort("list_peers", service.list_peers(node))
                .await
                .unwrap_or_default();
            let targets: Vec<String> = online
                .iter()
                .filter(|(_, other)| {
                    other.pubkey != info.pubkey && !connected.contains(&other.pubkey)
                })
                .map(|(_, other)| other.rpc_url.clone())
                .collect();
            if targets.is_empty() {
                debug!(node = %node.name, "Mesh: nothing to connect");
                continue;
            }
            service.connect_peers(node, &targets).await;
        }
    }
}
