//! Tap adapters. tapd is the only asset daemon; standalone and
//! litd-bundled nodes share one adapter because litd proxies the tapd
//! REST surface unchanged on its own port.

mod tapd;

pub use tapd::TapdService;
