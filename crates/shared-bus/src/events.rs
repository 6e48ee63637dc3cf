//! # Lab Events
//!
//! Defines all event types that flow through the shared bus. Mining and
//! channel activity are the two triggers for channel-graph changes, so
//! both feed the reconciler through the same event path.

use serde::{Deserialize, Serialize};
use shared_types::{LightningImplementation, NetworkId, Status};

/// Discrete channel-event kinds delivered by a Lightning node's event
/// stream, normalized across implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelEventKind {
    /// A channel funding transaction was broadcast.
    Pending,
    /// A channel became active.
    Open,
    /// A channel was closed (cooperatively or by force).
    Closed,
    /// Anything the adapter could not classify. Explicitly ignored by
    /// the reconciler.
    Unknown,
}

/// All events that can be published to the lab bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LabEvent {
    /// One or more blocks were mined on a network's chain backend, by
    /// manual action, the auto-miner, or as a side effect of funding.
    BlockMined {
        /// The network whose chain advanced.
        network_id: NetworkId,
        /// Number of blocks mined in this action.
        blocks: u32,
        /// The chain node that mined them.
        node: String,
    },

    /// A Lightning node reported a channel event.
    ChannelObserved {
        /// The network the node belongs to.
        network_id: NetworkId,
        /// The reporting node.
        node: String,
        /// The node's implementation; selects the reconciler grace delay.
        implementation: LightningImplementation,
        /// Normalized event kind.
        kind: ChannelEventKind,
    },

    /// A node's lifecycle status changed.
    StatusChanged {
        /// The network the node belongs to.
        network_id: NetworkId,
        /// The node whose status changed.
        node: String,
        /// The new status.
        status: Status,
    },
}

impl LabEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::BlockMined { .. } => EventTopic::Chain,
            Self::ChannelObserved { .. } => EventTopic::Channel,
            Self::StatusChanged { .. } => EventTopic::Lifecycle,
        }
    }

    /// The network this event belongs to.
    #[must_use]
    pub fn network_id(&self) -> NetworkId {
        match self {
            Self::BlockMined { network_id, .. }
            | Self::ChannelObserved { network_id, .. }
            | Self::StatusChanged { network_id, .. } => *network_id,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Block mining activity.
    Chain,
    /// Channel events from Lightning nodes.
    Channel,
    /// Node status transitions.
    Lifecycle,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Networks to include. Empty means all networks.
    pub networks: Vec<NetworkId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            networks: Vec::new(),
        }
    }

    /// Create a filter for events from one network.
    #[must_use]
    pub fn network(network_id: NetworkId) -> Self {
        Self {
            topics: Vec::new(),
            networks: vec![network_id],
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &LabEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let network_match = self.networks.is_empty() || self.networks.contains(&event.network_id());

        topic_match && network_match
    }
}
