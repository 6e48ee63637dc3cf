//! # Orchestrator Ports
//!
//! Driven ports for the external collaborators the lifecycle layer
//! consumes: the container runtime, the port allocator and topology
//! persistence. The orchestrator is the only caller; tests swap in
//! recording fakes.

use async_trait::async_trait;
use shared_types::{ChainPorts, LabError, LightningPorts, Network, TapPorts};
use std::collections::HashMap;

/// Freshly allocated ports for one node, category-shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePorts {
    /// Replacement ports for a chain node.
    Chain(ChainPorts),
    /// Replacement ports for a Lightning node.
    Lightning(LightningPorts),
    /// Replacement ports for a tap node.
    Tap(TapPorts),
}

/// Driven port: the container runtime hosting the lab nodes.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Start every container of the network.
    async fn start_network(&self, network: &Network) -> Result<(), LabError>;

    /// Stop every container of the network.
    async fn stop_network(&self, network: &Network) -> Result<(), LabError>;

    /// Start the single named node's container.
    async fn start_node(&self, network: &Network, node_name: &str) -> Result<(), LabError>;

    /// Stop the single named node's container.
    async fn stop_node(&self, network: &Network, node_name: &str) -> Result<(), LabError>;

    /// Regenerate the network's container definitions from its current
    /// node list and ports.
    async fn save_compose_definition(&self, network: &Network) -> Result<(), LabError>;

    /// Whether `image` is present on the host. Managed images are pulled
    /// on demand; unmanaged ones must already exist.
    async fn has_image(&self, image: &str) -> bool;
}

/// Driven port: host port allocation.
#[async_trait]
pub trait PortAllocator: Send + Sync {
    /// Resolve port conflicts for the network. Returns `None` when every
    /// currently assigned port is still free, otherwise replacement ports
    /// keyed by node name.
    async fn open_ports(
        &self,
        network: &Network,
    ) -> Result<Option<HashMap<String, NodePorts>>, LabError>;
}

/// Driven port: durable topology storage.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Persist the network definition.
    async fn save(&self, network: &Network) -> Result<(), LabError>;
}
