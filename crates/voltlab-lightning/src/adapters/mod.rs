//! # Lightning Adapters
//!
//! One adapter per backend implementation, plus the deferred-failure stub
//! returned by the factory for implementations without adapter support.
//! litd bundles an lnd, so its adapter delegates to the lnd adapter.

mod cln;
mod eclair;
mod litd;
mod lnd;
mod unsupported;

pub use cln::CoreLightningService;
pub use eclair::EclairService;
pub use litd::LitdService;
pub use lnd::LndService;
pub use unsupported::UnsupportedLightningService;
