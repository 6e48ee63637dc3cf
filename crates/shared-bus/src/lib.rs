//! # Shared Bus
//!
//! In-memory event bus connecting the adapters, the auto-miner and the
//! channel reconciler. Mining a block or observing a channel event anywhere
//! publishes a [`LabEvent`]; consumers subscribe with an [`EventFilter`]
//! instead of being called directly, so no category reaches into another.

pub mod events;
pub mod publisher;
pub mod subscriber;
pub mod throttle;

pub use events::{ChannelEventKind, EventFilter, EventTopic, LabEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};
pub use throttle::Throttle;

/// Default broadcast channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
