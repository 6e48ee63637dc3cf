//! # Core Domain Entities
//!
//! Defines the topology model VoltLab orchestrates: networks of chain,
//! Lightning and tap (Taproot-Assets) nodes, their status machine and
//! their backend references.
//!
//! ## Clusters
//!
//! - **Identity & status**: `NetworkId`, `Status`, `NodeKind`
//! - **Nodes**: `ChainNode`, `LightningNode`, `TapNode` + per-category ports
//! - **Topology**: `Network`, `AutoMineMode`

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a network (topology). Unique across the lab session.
pub type NetworkId = u64;

/// Lifecycle status shared by networks and nodes.
///
/// Transitions are monotonic along Stopped -> Starting -> Started ->
/// Stopping -> Stopped; `Error` is reachable from Starting, Started and
/// Stopping and is only left by an explicit start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Status {
    /// Not running.
    #[default]
    Stopped,
    /// Containers launched, readiness not yet confirmed.
    Starting,
    /// Reachable and reconciled.
    Started,
    /// Shutdown in progress.
    Stopping,
    /// A lifecycle operation failed; see `error_message` on the node.
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "Stopped"),
            Self::Starting => write!(f, "Starting"),
            Self::Started => write!(f, "Started"),
            Self::Stopping => write!(f, "Stopping"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// Node categories. Every node belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Bitcoin full node.
    Chain,
    /// Lightning Network payment-channel node.
    Lightning,
    /// Taproot-Assets daemon layered on a Lightning node.
    Tap,
}

/// Supported chain-node implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainImplementation {
    /// Bitcoin Core.
    Bitcoind,
    /// btcd (btcsuite).
    Btcd,
}

impl ChainImplementation {
    /// Lowercase tag used in logs and container names.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Bitcoind => "bitcoind",
            Self::Btcd => "btcd",
        }
    }
}

/// Supported Lightning-node implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightningImplementation {
    /// Lightning Network Daemon (lnd).
    Lnd,
    /// Core Lightning (cln).
    CoreLightning,
    /// Eclair (ACINQ).
    Eclair,
    /// Lightning Terminal (litd) - bundles an lnd and a tapd.
    Litd,
}

impl LightningImplementation {
    /// Lowercase tag used in logs and container names.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Lnd => "lnd",
            Self::CoreLightning => "clightning",
            Self::Eclair => "eclair",
            Self::Litd => "litd",
        }
    }

    /// Chain implementations this Lightning implementation can use as a
    /// backend. Used when re-linking dependents after a chain-node removal.
    #[must_use]
    pub fn compatible_backends(&self) -> &'static [ChainImplementation] {
        match self {
            Self::Lnd => &[ChainImplementation::Bitcoind, ChainImplementation::Btcd],
            Self::CoreLightning | Self::Eclair | Self::Litd => {
                &[ChainImplementation::Bitcoind]
            }
        }
    }
}

/// Supported tap-node implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TapImplementation {
    /// Standalone Taproot Assets daemon.
    Tapd,
    /// The tapd integrated inside a litd Lightning node.
    Litd,
}

impl TapImplementation {
    /// Lowercase tag used in logs and container names.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Tapd => "tapd",
            Self::Litd => "litd",
        }
    }
}

/// RPC/P2P ports of a chain node, published on the loopback interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPorts {
    /// JSON-RPC port.
    pub rpc: u16,
    /// P2P port.
    pub p2p: u16,
    /// ZMQ block notifications port.
    pub zmq_block: u16,
    /// ZMQ transaction notifications port.
    pub zmq_tx: u16,
}

/// Ports of a Lightning node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightningPorts {
    /// REST/HTTP API port.
    pub rest: u16,
    /// gRPC port (where the implementation has one).
    pub grpc: u16,
    /// P2P listening port.
    pub p2p: u16,
}

/// Ports of a tap node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapPorts {
    /// REST/HTTP API port.
    pub rest: u16,
    /// gRPC port.
    pub grpc: u16,
}

/// A Bitcoin full node in a topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainNode {
    /// Unique name within the network.
    pub name: String,
    /// Owning network.
    pub network_id: NetworkId,
    /// Backend implementation.
    pub implementation: ChainImplementation,
    /// Implementation version tag (container image tag).
    pub version: String,
    /// Lifecycle status.
    pub status: Status,
    /// Published ports.
    pub ports: ChainPorts,
    /// Whether the container image is one VoltLab manages (pulls itself).
    pub managed_image: bool,
    /// Failure message captured when `status` is `Error`.
    pub error_message: Option<String>,
}

/// A Lightning node in a topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightningNode {
    /// Unique name within the network.
    pub name: String,
    /// Owning network.
    pub network_id: NetworkId,
    /// Backend implementation.
    pub implementation: LightningImplementation,
    /// Implementation version tag (container image tag).
    pub version: String,
    /// Lifecycle status.
    pub status: Status,
    /// Published ports.
    pub ports: LightningPorts,
    /// Name of the chain node this node uses as its backend.
    /// Must always resolve to a chain node in the same network.
    pub backend_name: String,
    /// Whether the container image is one VoltLab manages.
    pub managed_image: bool,
    /// Failure message captured when `status` is `Error`.
    pub error_message: Option<String>,
}

/// A Taproot-Assets node in a topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapNode {
    /// Unique name within the network.
    pub name: String,
    /// Owning network.
    pub network_id: NetworkId,
    /// Backend implementation.
    pub implementation: TapImplementation,
    /// Implementation version tag (container image tag).
    pub version: String,
    /// Lifecycle status.
    pub status: Status,
    /// Published ports.
    pub ports: TapPorts,
    /// Name of the Lightning node this tap node is anchored to.
    /// Must always resolve to a Lightning node in the same network.
    pub lnd_name: String,
    /// Whether the container image is one VoltLab manages.
    pub managed_image: bool,
    /// Failure message captured when `status` is `Error`.
    pub error_message: Option<String>,
}

/// Auto-mining mode of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AutoMineMode {
    /// No unattended mining.
    #[default]
    Off,
    /// Mine one block every given number of seconds.
    Interval(u64),
}

impl AutoMineMode {
    /// Interval in seconds, or `None` when off.
    #[must_use]
    pub fn interval_secs(&self) -> Option<u64> {
        match self {
            Self::Off => None,
            Self::Interval(secs) => Some(*secs),
        }
    }
}

/// A named topology: chain, Lightning and tap nodes plus their relations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    /// Unique identifier.
    pub id: NetworkId,
    /// Display name.
    pub name: String,
    /// Aggregate lifecycle status.
    pub status: Status,
    /// Chain nodes, in insertion order.
    pub chain: Vec<ChainNode>,
    /// Lightning nodes, in insertion order.
    pub lightning: Vec<LightningNode>,
    /// Tap nodes, in insertion order.
    pub tap: Vec<TapNode>,
    /// Unattended mining mode.
    pub auto_mine: AutoMineMode,
    /// Block count used by the manual mine action. Always >= 1.
    pub manual_mine_count: u32,
}

impl Network {
    /// Create an empty network.
    #[must_use]
    pub fn new(id: NetworkId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: Status::Stopped,
            chain: Vec::new(),
            lightning: Vec::new(),
            tap: Vec::new(),
            auto_mine: AutoMineMode::Off,
            manual_mine_count: 1,
        }
    }

    /// Total node count across all categories.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.chain.len() + self.lightning.len() + self.tap.len()
    }

    /// Look up a chain node by name.
    #[must_use]
    pub fn chain_node(&self, name: &str) -> Option<&ChainNode> {
        self.chain.iter().find(|n| n.name == name)
    }

    /// Look up a Lightning node by name.
    #[must_use]
    pub fn lightning_node(&self, name: &str) -> Option<&LightningNode> {
        self.lightning.iter().find(|n| n.name == name)
    }

    /// Look up a tap node by name.
    #[must_use]
    pub fn tap_node(&self, name: &str) -> Option<&TapNode> {
        self.tap.iter().find(|n| n.name == name)
    }

    /// Whether `name` is taken by any node in this network.
    #[must_use]
    pub fn contains_node(&self, name: &str) -> bool {
        self.chain_node(name).is_some()
            || self.lightning_node(name).is_some()
            || self.tap_node(name).is_some()
    }

    /// Recompute the aggregate status from the contained nodes.
    ///
    /// `Started` only if every node is Started; `Error` if any node reports
    /// Error; otherwise the current transition status is kept.
    #[must_use]
    pub fn aggregate_status(&self) -> Status {
        let statuses = self
            .chain
            .iter()
            .map(|n| n.status)
            .chain(self.lightning.iter().map(|n| n.status))
            .chain(self.tap.iter().map(|n| n.status));

        let mut all_started = true;
        let mut any_error = false;
        let mut empty = true;
        for status in statuses {
            empty = false;
            match status {
                Status::Error => any_error = true,
                Status::Started => {}
                _ => all_started = false,
            }
        }

        if any_error {
            Status::Error
        } else if !empty && all_started {
            Status::Started
        } else {
            self.status
        }
    }

    /// Names of Lightning nodes that reference `chain_name` as backend.
    #[must_use]
    pub fn dependents_of_chain(&self, chain_name: &str) -> Vec<String> {
        self.lightning
            .iter()
            .filter(|n| n.backend_name == chain_name)
            .map(|n| n.name.clone())
            .collect()
    }
}
