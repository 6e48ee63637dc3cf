//! # Chain Adapters
//!
//! One adapter per backend implementation, plus the deferred-failure stub
//! returned by the factory for implementations without adapter support.

mod bitcoind;
mod btcd;
mod unsupported;

pub use bitcoind::BitcoindService;
pub use btcd::BtcdService;
pub use unsupported::UnsupportedChainService;
