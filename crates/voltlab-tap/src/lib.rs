//! # VoltLab Taproot-Assets Services
//!
//! The asset category: one uniform [`TapService`] port and a tapd adapter
//! over a REST transport port. Only tapd exists as an implementation; it
//! runs standalone or bundled inside litd, with the same REST surface on
//! either node's port, so one adapter serves both tags.
//!
//! Unlike the chain and Lightning factories, the tap factory fails fast
//! on an unregistered implementation: there is no partially-supported
//! asset backend worth listing.

pub mod adapters;
pub mod domain;
pub mod factory;
pub mod ports;
pub mod transport;

pub use adapters::TapdService;
pub use domain::{AssetBalance, DecodedAssetAddress, MintOutcome, TapdInfo};
pub use factory::TapServiceFactory;
pub use ports::{TapRestTransport, TapService};
pub use transport::HttpTapTransport;
