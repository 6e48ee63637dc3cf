//! # Shared Types
//!
//! Core domain entities and cross-cutting primitives for VoltLab:
//!
//! - [`entities`] - topologies, nodes, status machine, port maps
//! - [`errors`] - the error taxonomy shared by adapters and the orchestrator
//! - [`amounts`] - integer satoshi/millisatoshi types (no floating point)
//! - [`retry`] - the time-bounded readiness poller
//! - [`best_effort`] - log-and-discard wrapper for non-fatal operations

pub mod amounts;
pub mod best_effort;
pub mod entities;
pub mod errors;
pub mod retry;

pub use amounts::{MilliSats, Sats};
pub use best_effort::best_effort;
pub use entities::{
    AutoMineMode, ChainImplementation, ChainNode, ChainPorts, LightningImplementation,
    LightningNode, LightningPorts, Network, NetworkId, NodeKind, Status, TapImplementation,
    TapNode, TapPorts,
};
pub use errors::{AdapterError, LabError};
pub use retry::{wait_until_online, PollConfig};
