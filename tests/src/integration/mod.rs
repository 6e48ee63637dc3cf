//! Cross-crate integration flows, driven end to end through the public
//! orchestrator surface with fake category services and a recording
//! container runtime.

pub mod support;

mod channel_events;
mod lifecycle_flows;
