//! # Error Types
//!
//! The shared error taxonomy:
//!
//! - [`LabError`] - configuration and lifecycle errors surfaced to callers
//!   of the orchestrator, always raised before any state is mutated.
//! - [`AdapterError`] - failures at the adapter boundary (transport,
//!   normalization, unsupported implementations). Transient connectivity
//!   variants are what the readiness poller retries on.

use thiserror::Error;

/// Errors surfaced by orchestrator operations.
#[derive(Debug, Clone, Error)]
pub enum LabError {
    /// Unknown network id.
    #[error("Network not found: {0}")]
    NetworkNotFound(u64),

    /// Unknown node name within a network.
    #[error("Node '{name}' not found in network {network_id}")]
    NodeNotFound { network_id: u64, name: String },

    /// A node with this name already exists in the network.
    #[error("Node '{0}' already exists in this network")]
    DuplicateNodeName(String),

    /// A backend reference does not resolve or is the wrong category.
    #[error("Node '{node}' references backend '{backend}' which does not exist")]
    DanglingBackend { node: String, backend: String },

    /// Removal would leave a dependent without a compatible backend.
    #[error("Cannot remove '{removed}': no compatible backend remains for '{dependent}'")]
    NoCompatibleBackend { removed: String, dependent: String },

    /// The operation needs a chain backend and the network has no usable one.
    #[error("No usable chain backend in network {0}")]
    NoChainBackend(u64),

    /// Removing the sole chain node of a network is rejected.
    #[error("Cannot remove '{0}': a network needs at least one chain node")]
    LastChainNode(String),

    /// A required custom container image is not present on the host.
    #[error("Image '{image}' for node '{node}' is not present; pull it before starting")]
    ImageMissing { node: String, image: String },

    /// The container runtime failed a start/stop operation.
    #[error("Container runtime error: {0}")]
    Runtime(String),

    /// Persisting or regenerating the topology definition failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// An adapter call failed in a context where the failure is fatal.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Errors raised at the adapter boundary.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// The backend is unreachable or refused the connection.
    /// The readiness poller retries on this variant.
    #[error("Node '{node}' unreachable: {reason}")]
    Unreachable { node: String, reason: String },

    /// The backend answered with an RPC-level error.
    #[error("Node '{node}' RPC error: {message}")]
    Rpc { node: String, message: String },

    /// The backend's response did not have the expected shape.
    #[error("Node '{node}' returned malformed response for {operation}: {detail}")]
    Malformed {
        node: String,
        operation: String,
        detail: String,
    },

    /// The operation is not implemented for this backend implementation.
    #[error("Operation '{operation}' is not implemented for {implementation}")]
    NotSupported {
        implementation: String,
        operation: String,
    },

    /// The readiness poll gave up after its timeout.
    #[error("Node '{node}' not online after {timeout_secs}s: {last_error}")]
    Timeout {
        node: String,
        timeout_secs: u64,
        last_error: String,
    },
}

impl AdapterError {
    /// Whether the readiness poller should keep retrying after this error.
    ///
    /// RPC-level errors also count: bitcoind answers RPCs with "loading
    /// wallet" errors for a while after the port opens.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Rpc { .. })
    }
}
