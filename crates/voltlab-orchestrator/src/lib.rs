//! # VoltLab Orchestrator
//!
//! The network lifecycle layer: owns per-network status, sequences
//! container start/stop through the [`ContainerRuntime`] port, and after
//! containers are up drives inter-node reconciliation (readiness waits,
//! peer meshing, initial mining, channel-event subscriptions).
//!
//! Two unattended components ride on the same event bus: the
//! [`AutoMiner`] periodically mines one block per network, and the
//! [`ChannelReconciler`] throttles channel-graph resyncs whenever channel
//! events or mined blocks are observed.

pub mod automine;
pub mod lifecycle;
#[cfg(test)]
pub(crate) mod test_support;
pub mod monitor;
pub mod ports;
pub mod reconciler;
pub mod store;

pub use automine::AutoMiner;
pub use lifecycle::NetworkOrchestrator;
pub use monitor::StartupMonitor;
pub use ports::{ContainerRuntime, NodePorts, Persistence, PortAllocator};
pub use reconciler::{ChannelReconciler, ProjectionCache};
pub use store::NetworkStore;
