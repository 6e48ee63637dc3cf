//! # Readiness Poller
//!
//! The bounded retry-until-success primitive every adapter's
//! `wait_until_online` builds on. Time-bounded, not attempt-bounded: the
//! probe is retried at a fixed interval until the cumulative elapsed time
//! exceeds the timeout, at which point the last observed error is returned.

use crate::errors::AdapterError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Interval/timeout pair for a readiness poll.
///
/// Defaults differ per category: chain backends come up in seconds while
/// Lightning implementations can spend minutes unlocking wallets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between probe attempts.
    pub interval: Duration,
    /// Total time budget before giving up.
    pub timeout: Duration,
}

impl PollConfig {
    /// Chain-node default: 3s interval, 30s timeout.
    #[must_use]
    pub fn chain() -> Self {
        Self {
            interval: Duration::from_secs(3),
            timeout: Duration::from_secs(30),
        }
    }

    /// Lightning-node default: 3s interval, 120s timeout.
    #[must_use]
    pub fn lightning() -> Self {
        Self {
            interval: Duration::from_secs(3),
            timeout: Duration::from_secs(120),
        }
    }

    /// Tap-node default: same budget as Lightning nodes.
    #[must_use]
    pub fn tap() -> Self {
        Self::lightning()
    }
}

/// Repeatedly invoke `probe` until it succeeds or `config.timeout` elapses.
///
/// On success the probe's value is returned immediately. On failure the
/// poller sleeps `config.interval` and retries; once the elapsed time
/// reaches the timeout it fails with [`AdapterError::Timeout`] carrying the
/// last observed error. There is no attempt cap - an always-failing probe
/// performs `ceil(timeout / interval)` attempts.
pub async fn wait_until_online<F, Fut, T>(
    node: &str,
    config: PollConfig,
    mut probe: F,
) -> Result<T, AdapterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AdapterError>>,
{
    let start = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        match probe().await {
            Ok(value) => {
                debug!(node = %node, attempts, "Node online");
                return Ok(value);
            }
            Err(err) => {
                debug!(node = %node, attempts, error = %err, "Readiness probe failed");
                sleep(config.interval).await;
                if start.elapsed() >= config.timeout {
                    return Err(AdapterError::Timeout {
                        node: node.to_string(),
                        timeout_secs: config.timeout.as_secs(),
                        last_error: err.to_string(),
                    });
                }
            }
        }
    }
}
