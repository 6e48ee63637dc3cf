//! # VoltLab Chain Services
//!
//! The chain-node category: one uniform [`ChainService`] port, one adapter
//! per backend implementation (bitcoind, btcd) over a JSON-RPC transport
//! port, and a factory mapping implementation tags to adapters.
//!
//! Adapters normalize each backend's native response shapes into the
//! category-wide types in [`domain`]; units and field names never leak
//! upward. Mining publishes a [`shared_bus::LabEvent::BlockMined`] so
//! dependent projections resync without cross-category calls.

pub mod adapters;
pub mod domain;
pub mod factory;
pub mod ports;
pub mod transport;

pub use adapters::{BitcoindService, BtcdService, UnsupportedChainService};
pub use domain::{ChainInfo, WalletInfo};
pub use factory::ChainServiceFactory;
pub use ports::{ChainService, JsonRpcTransport};
pub use transport::HttpJsonRpcTransport;
