//! # VoltLab Lightning Services
//!
//! The Lightning category: one uniform [`LightningService`] port and one
//! adapter per implementation (lnd, Core Lightning, Eclair, litd) over a
//! REST transport port.
//!
//! Four incompatible wire surfaces are normalized here: field names, units
//! (millisatoshi vs satoshi vs BTC decimals) and channel-status
//! vocabularies are unified at the adapter boundary and never leak upward.
//! Channel-event streams are normalized into
//! [`shared_bus::LabEvent::ChannelObserved`] and published on the bus.

pub mod adapters;
pub mod domain;
pub mod factory;
pub mod listeners;
pub mod ports;
pub mod transport;

pub use adapters::{
    CoreLightningService, EclairService, LitdService, LndService, UnsupportedLightningService,
};
pub use domain::{
    BalanceSnapshot, ChannelInfo, ChannelStatus, DecodedInvoice, LightningNodeInfo,
    OpenChannelOutcome, PaymentOutcome,
};
pub use factory::LightningServiceFactory;
pub use listeners::ListenerRegistry;
pub use ports::{LightningService, RestTransport};
pub use transport::HttpRestTransport;
