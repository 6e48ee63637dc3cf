//! # VoltLab Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Cross-crate choreography
//!     ├── support.rs           # Fakes and the orchestrator harness
//!     ├── lifecycle_flows.rs   # Start/stop/topology flows
//!     └── channel_events.rs    # Event bus, reconciler and auto-miner flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p voltlab-tests
//!
//! # By category
//! cargo test -p voltlab-tests integration::
//!
//! # Benchmarks
//! cargo bench -p voltlab-tests
//! ```

pub mod integration;
