//! # Network Lifecycle
//!
//! The driving surface of the orchestrator: topology edits (add and
//! remove nodes with referential-integrity checks) and the start/stop
//! state machine. Validation always happens before the first mutation,
//! so a rejected operation leaves the store untouched. Container work
//! goes through the [`ContainerRuntime`] port; post-launch readiness and
//! reconciliation is handed to a spawned [`StartupMonitor`] run so start
//! returns as soon as the containers are launched.

use crate::automine::AutoMiner;
use crate::monitor::StartupMonitor;
use crate::ports::{ContainerRuntime, NodePorts, Persistence, PortAllocator};
use crate::store::NetworkStore;
use shared_bus::EventPublisher;
use shared_types::{
    AutoMineMode, ChainImplementation, ChainNode, ChainPorts, LabError, LightningImplementation,
    LightningNode, LightningPorts, Network, NetworkId, Status, TapImplementation, TapNode,
    TapPorts,
};
use std::sync::Arc;
use tracing::{info, warn};
use voltlab_chain::ChainServiceFactory;
use voltlab_lightning::LightningServiceFactory;
use voltlab_tap::TapServiceFactory;

/// Owner of network lifecycles: topology edits, start/stop sequencing,
/// mining actions.
pub struct NetworkOrchestrator {
    store: Arc<NetworkStore>,
    runtime: Arc<dyn ContainerRuntime>,
    ports: Arc<dyn PortAllocator>,
    persistence: Arc<dyn Persistence>,
    chain: Arc<ChainServiceFactory>,
    lightning: Arc<LightningServiceFactory>,
    auto_miner: Arc<AutoMiner>,
    monitor: Arc<StartupMonitor>,
}

impl NetworkOrchestrator {
    /// Wire up the orchestrator. The auto-miner and startup monitor are
    /// built here so they share the store and factories.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<NetworkStore>,
        runtime: Arc<dyn ContainerRuntime>,
        ports: Arc<dyn PortAllocator>,
        persistence: Arc<dyn Persistence>,
        chain: Arc<ChainServiceFactory>,
        lightning: Arc<LightningServiceFactory>,
        tap: Arc<TapServiceFactory>,
        bus: Arc<dyn EventPublisher>,
    ) -> Self {
        let auto_miner = Arc::new(AutoMiner::new(Arc::clone(&store), Arc::clone(&chain)));
        let monitor = Arc::new(StartupMonitor::new(
            Arc::clone(&store),
            Arc::clone(&chain),
            Arc::clone(&lightning),
            tap,
            bus,
        ));
        Self {
            store,
            runtime,
            ports,
            persistence,
            chain,
            lightning,
            auto_miner,
            monitor,
        }
    }

    /// The shared network store.
    #[must_use]
    pub fn store(&self) -> &Arc<NetworkStore> {
        &self.store
    }

    /// The auto-mining scheduler.
    #[must_use]
    pub fn auto_miner(&self) -> &AutoMiner {
        &self.auto_miner
    }

    /// Create an empty network.
    pub fn create_network(&self, name: impl Into<String>) -> NetworkId {
        self.store.create(name)
    }

    /// Snapshot of one network.
    pub fn network(&self, network_id: NetworkId) -> Result<Network, LabError> {
        self.store.get(network_id)
    }

    /// Snapshot of all networks.
    #[must_use]
    pub fn networks(&self) -> Vec<Network> {
        self.store.list()
    }

    /// Delete a network: cancel its timer, detach its event listeners,
    /// drop it from the store.
    pub async fn remove_network(&self, network_id: NetworkId) -> Result<(), LabError> {
        let network = self.store.get(network_id)?;
        self.auto_miner.clear(network_id);
        for node in &network.lightning {
            self.lightning.service(node).remove_listener(&node.name).await;
        }
        self.store.remove(network_id)?;
        info!(network = network_id, "Network removed");
        Ok(())
    }

    /// Add a chain node. The name must be unique across all categories.
    pub async fn add_chain_node(
        &self,
        network_id: NetworkId,
        name: &str,
        implementation: ChainImplementation,
        version: &str,
        ports: ChainPorts,
        managed_image: bool,
    ) -> Result<(), LabError> {
        let network = self.store.get(network_id)?;
        if network.contains_node(name) {
            return Err(LabError::DuplicateNodeName(name.to_string()));
        }
        self.store.update(network_id, |n| {
            n.chain.push(ChainNode {
                name: name.to_string(),
                network_id,
                implementation,
                version: version.to_string(),
                status: Status::Stopped,
                ports,
                managed_image,
                error_message: None,
            });
        })?;
        self.persist(network_id).await
    }

    /// Add a Lightning node, backed by the first chain node its
    /// implementation can use.
    pub async fn add_lightning_node(
        &self,
        network_id: NetworkId,
        name: &str,
        implementation: LightningImplementation,
        version: &str,
        ports: LightningPorts,
        managed_image: bool,
    ) -> Result<(), LabError> {
        let network = self.store.get(network_id)?;
        if network.contains_node(name) {
            return Err(LabError::DuplicateNodeName(name.to_string()));
        }
        let backend = network
            .chain
            .iter()
            .find(|c| implementation.compatible_backends().contains(&c.implementation))
            .map(|c| c.name.clone())
            .ok_or(LabError::NoChainBackend(network_id))?;
        self.store.update(network_id, |n| {
            n.lightning.push(LightningNode {
                name: name.to_string(),
                network_id,
                implementation,
                version: version.to_string(),
                status: Status::Stopped,
                ports,
                backend_name: backend,
                managed_image,
                error_message: None,
            });
        })?;
        self.persist(network_id).await
    }

    /// Add a tap node anchored to a Lightning node. A `Tapd` node needs
    /// an lnd anchor; a `Litd` tap node is the daemon inside a litd
    /// Lightning node and must reference one.
    pub async fn add_tap_node(
        &self,
        network_id: NetworkId,
        name: &str,
        implementation: TapImplementation,
        version: &str,
        ports: TapPorts,
        lnd_name: &str,
    ) -> Result<(), LabError> {
        let network = self.store.get(network_id)?;
        if network.contains_node(name) {
            return Err(LabError::DuplicateNodeName(name.to_string()));
        }
        let anchor_ok = network.lightning_node(lnd_name).is_some_and(|anchor| {
            match implementation {
                TapImplementation::Tapd => {
                    anchor.implementation == LightningImplementation::Lnd
                }
                TapImplementation::Litd => {
                    anchor.implementation == LightningImplementation::Litd
                }
            }
        });
        if !anchor_ok {
            return Err(LabError::DanglingBackend {
                node: name.to_string(),
                backend: lnd_name.to_string(),
            });
        }
        self.store.update(network_id, |n| {
            n.tap.push(TapNode {
                name: name.to_string(),
                network_id,
                implementation,
                version: version.to_string(),
                status: Status::Stopped,
                ports,
                lnd_name: lnd_name.to_string(),
                managed_image: true,
                error_message: None,
            });
        })?;
        self.persist(network_id).await
    }

    /// Remove a node, keeping the topology's references intact.
    ///
    /// Removing a chain node re-links its dependents to a remaining
    /// compatible chain node; every dependent is checked before anything
    /// is mutated. Removing a Lightning node is rejected while a tap
    /// node is anchored to it.
    pub async fn remove_node(&self, network_id: NetworkId, name: &str) -> Result<(), LabError> {
        let network = self.store.get(network_id)?;

        if network.chain_node(name).is_some() {
            if network.chain.len() == 1 {
                return Err(LabError::LastChainNode(name.to_string()));
            }
            let mut relinks: Vec<(String, String)> = Vec::new();
            for dependent in network.dependents_of_chain(name) {
                let implementation = network
                    .lightning_node(&dependent)
                    .map(|n| n.implementation)
                    .ok_or_else(|| LabError::NodeNotFound {
                        network_id,
                        name: dependent.clone(),
                    })?;
                let replacement = network
                    .chain
                    .iter()
                    .filter(|c| c.name != name)
                    .find(|c| implementation.compatible_backends().contains(&c.implementation))
                    .map(|c| c.name.clone())
                    .ok_or_else(|| LabError::NoCompatibleBackend {
                        removed: name.to_string(),
                        dependent: dependent.clone(),
                    })?;
                relinks.push((dependent, replacement));
            }
            self.store.update(network_id, |n| {
                for (dependent, replacement) in &relinks {
                    if let Some(node) =
                        n.lightning.iter_mut().find(|l| l.name == *dependent)
                    {
                        node.backend_name = replacement.clone();
                    }
                }
                n.chain.retain(|c| c.name != name);
            })?;
            if !relinks.is_empty() {
                info!(
                    network = network_id,
                    removed = name,
                    relinked = relinks.len(),
                    "Re-linked dependents to a remaining chain backend"
                );
            }
            return self.persist(network_id).await;
        }

        if let Some(node) = network.lightning_node(name).cloned() {
            if let Some(tap) = network.tap.iter().find(|t| t.lnd_name == name) {
                return Err(LabError::NoCompatibleBackend {
                    removed: name.to_string(),
                    dependent: tap.name.clone(),
                });
            }
            self.lightning.service(&node).remove_listener(name).await;
            self.store
                .update(network_id, |n| n.lightning.retain(|l| l.name != name))?;
            return self.persist(network_id).await;
        }

        if network.tap_node(name).is_some() {
            self.store
                .update(network_id, |n| n.tap.retain(|t| t.name != name))?;
            return self.persist(network_id).await;
        }

        Err(LabError::NodeNotFound {
            network_id,
            name: name.to_string(),
        })
    }

    /// Start the network: launch every container, then reconcile in the
    /// background.
    ///
    /// The custom-image guard runs before any state changes, so a
    /// missing image leaves the network untouched. Any failure after the
    /// status flip marks the network and all its nodes Error.
    pub async fn start(&self, network_id: NetworkId) -> Result<(), LabError> {
        let network = self.store.get(network_id)?;
        self.guard_images(&network, None).await?;
        self.store.set_all_statuses(network_id, Status::Starting)?;
        if let Err(err) = self.launch(network_id).await {
            warn!(network = network_id, error = %err, "Network start failed");
            let _ = self.store.set_all_statuses(network_id, Status::Error);
            return Err(err);
        }
        Ok(())
    }

    async fn launch(&self, network_id: NetworkId) -> Result<(), LabError> {
        let network = self.store.get(network_id)?;
        if let Some(replacements) = self.ports.open_ports(&network).await? {
            info!(
                network = network_id,
                nodes = replacements.len(),
                "Port conflicts resolved with replacement ports"
            );
            self.store.update(network_id, |n| {
                apply_port_replacements(n, &replacements);
            })?;
            let refreshed = self.store.get(network_id)?;
            self.persistence.save(&refreshed).await?;
            self.runtime.save_compose_definition(&refreshed).await?;
        }

        let network = self.store.get(network_id)?;
        self.runtime.start_network(&network).await?;

        // The network counts as running once its containers launched;
        // individual nodes stay Starting until the monitor settles them.
        self.store
            .update(network_id, |n| n.status = Status::Started)?;
        if network.auto_mine != AutoMineMode::Off {
            self.auto_miner.set_mode(network_id, network.auto_mine)?;
        }
        self.spawn_monitor(network_id, None);
        Ok(())
    }

    /// Stop the network: cancel unattended mining, detach event
    /// listeners, stop every container.
    pub async fn stop(&self, network_id: NetworkId) -> Result<(), LabError> {
        let network = self.store.get(network_id)?;
        self.auto_miner.clear(network_id);
        self.store.set_all_statuses(network_id, Status::Stopping)?;
        // Listeners are detached unconditionally; a wedged node must not
        // keep its event stream alive past the stop.
        for node in &network.lightning {
            self.lightning.service(node).remove_listener(&node.name).await;
        }
        if let Err(err) = self.runtime.stop_network(&network).await {
            warn!(network = network_id, error = %err, "Network stop failed");
            let _ = self.store.set_all_statuses(network_id, Status::Error);
            return Err(err);
        }
        self.store.set_all_statuses(network_id, Status::Stopped)?;
        info!(network = network_id, "Network stopped");
        Ok(())
    }

    /// Start or stop based on the current status. Transitional states
    /// are left alone.
    pub async fn toggle(&self, network_id: NetworkId) -> Result<(), LabError> {
        match self.store.get(network_id)?.status {
            Status::Stopped | Status::Error => self.start(network_id).await,
            Status::Started => self.stop(network_id).await,
            Status::Starting | Status::Stopping => Ok(()),
        }
    }

    /// Start one node into an already-running network and reconcile only
    /// that node.
    pub async fn start_node(&self, network_id: NetworkId, name: &str) -> Result<(), LabError> {
        let network = self.store.get(network_id)?;
        if !network.contains_node(name) {
            return Err(LabError::NodeNotFound {
                network_id,
                name: name.to_string(),
            });
        }
        self.guard_images(&network, Some(name)).await?;
        self.store
            .set_node_status(network_id, name, Status::Starting, None)?;
        if let Err(err) = self.runtime.start_node(&network, name).await {
            let _ = self.store.set_node_status(
                network_id,
                name,
                Status::Error,
                Some(err.to_string()),
            );
            return Err(err);
        }
        self.spawn_monitor(network_id, Some(name.to_string()));
        Ok(())
    }

    /// Stop one node, leaving the rest of the network running.
    pub async fn stop_node(&self, network_id: NetworkId, name: &str) -> Result<(), LabError> {
        let network = self.store.get(network_id)?;
        if !network.contains_node(name) {
            return Err(LabError::NodeNotFound {
                network_id,
                name: name.to_string(),
            });
        }
        self.store
            .set_node_status(network_id, name, Status::Stopping, None)?;
        if let Some(node) = network.lightning_node(name).cloned() {
            self.lightning.service(&node).remove_listener(name).await;
        }
        if let Err(err) = self.runtime.stop_node(&network, name).await {
            let _ = self.store.set_node_status(
                network_id,
                name,
                Status::Error,
                Some(err.to_string()),
            );
            return Err(err);
        }
        self.store
            .set_node_status(network_id, name, Status::Stopped, None)?;
        Ok(())
    }

    /// Start or stop one node based on its current status.
    pub async fn toggle_node(&self, network_id: NetworkId, name: &str) -> Result<(), LabError> {
        let network = self.store.get(network_id)?;
        let status = node_status(&network, name).ok_or_else(|| LabError::NodeNotFound {
            network_id,
            name: name.to_string(),
        })?;
        match status {
            Status::Stopped | Status::Error => self.start_node(network_id, name).await,
            Status::Started => self.stop_node(network_id, name).await,
            Status::Starting | Status::Stopping => Ok(()),
        }
    }

    /// Mine the network's configured manual block count on its first
    /// chain node and return the block hashes.
    pub async fn mine(&self, network_id: NetworkId) -> Result<Vec<String>, LabError> {
        let network = self.store.get(network_id)?;
        let node = network
            .chain
            .first()
            .cloned()
            .ok_or(LabError::NoChainBackend(network_id))?;
        let hashes = self
            .chain
            .service(&node)
            .mine(&node, network.manual_mine_count)
            .await?;
        Ok(hashes)
    }

    /// Set the manual mine block count. Clamped to at least one block.
    pub fn set_manual_mine_count(
        &self,
        network_id: NetworkId,
        count: u32,
    ) -> Result<(), LabError> {
        self.store
            .update(network_id, |n| n.manual_mine_count = count.max(1))
    }

    /// Apply an auto-mine mode.
    pub fn set_auto_mine(
        &self,
        network_id: NetworkId,
        mode: AutoMineMode,
    ) -> Result<(), LabError> {
        self.auto_miner.set_mode(network_id, mode)
    }

    /// Reject the start when a custom image is absent from the host.
    /// Managed images are pulled by the runtime on demand.
    async fn guard_images(
        &self,
        network: &Network,
        only: Option<&str>,
    ) -> Result<(), LabError> {
        let mut required: Vec<(&str, String)> = Vec::new();
        for node in &network.chain {
            if !node.managed_image {
                required.push((
                    &node.name,
                    format!("{}:{}", node.implementation.tag(), node.version),
                ));
            }
        }
        for node in &network.lightning {
            if !node.managed_image {
                required.push((
                    &node.name,
                    format!("{}:{}", node.implementation.tag(), node.version),
                ));
            }
        }
        for node in &network.tap {
            if !node.managed_image {
                required.push((
                    &node.name,
                    format!("{}:{}", node.implementation.tag(), node.version),
                ));
            }
        }
        for (name, image) in required {
            if only.is_some_and(|o| o != name) {
                continue;
            }
            if !self.runtime.has_image(&image).await {
                return Err(LabError::ImageMissing {
                    node: name.to_string(),
                    image,
                });
            }
        }
        Ok(())
    }

    async fn persist(&self, network_id: NetworkId) -> Result<(), LabError> {
        let network = self.store.get(network_id)?;
        self.persistence.save(&network).await?;
        self.runtime.save_compose_definition(&network).await
    }

    fn spawn_monitor(&self, network_id: NetworkId, only: Option<String>) {
        let monitor = Arc::clone(&self.monitor);
        tokio::spawn(async move {
            monitor.monitor_startup(network_id, only.as_deref()).await;
        });
    }
}

fn node_status(network: &Network, name: &str) -> Option<Status> {
    network
        .chain_node(name)
        .map(|n| n.status)
        .or_else(|| network.lightning_node(name).map(|n| n.status))
        .or_else(|| network.tap_node(name).map(|n| n.status))
}

fn apply_port_replacements(
    network: &mut Network,
    replacements: &std::collections::HashMap<String, NodePorts>,
) {
    for node in &mut network.chain {
        if let Some(NodePorts::Chain(ports)) = replacements.get(&node.name) {
            node.ports = *ports;
        }
    }
    for node in &mut network.lightning {
        if let Some(NodePorts::Lightning(ports)) = replacements.get(&node.name) {
            node.ports = *ports;
        }
    }
    for node in &mut network.tap {
        if let Some(NodePorts::Tap(ports)) = replacements.get(&node.name) {
            node.ports = *ports;
        }
    }
}
