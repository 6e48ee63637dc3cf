//! # Best-Effort Operations
//!
//! Peer connections, auto-mine ticks and listener teardowns are expected
//! to fail transiently during bring-up. Their failures are logged and
//! discarded through one helper so no call site grows its own try/catch.

use std::fmt::Display;
use std::future::Future;
use tracing::warn;

/// Run `fut`, logging and discarding any error.
///
/// Returns `Some(value)` on success, `None` on failure. The `operation`
/// label names the call in the log line.
pub async fn best_effort<T, E, Fut>(operation: &str, fut: Fut) -> Option<T>
where
    E: Display,
    Fut: Future<Output = Result<T, E>>,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(operation = %operation, error = %err, "Best-effort operation failed");
            None
        }
    }
}
