//! # Throttle
//!
//! Leading+trailing throttle for burst-prone work. A burst of `fire()`
//! calls inside one window produces exactly two executions: one at
//! burst-start and one at window-end. The reconciler uses this so a storm
//! of channel events triggers one resync now and one after the dust
//! settles, never one per event.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

type Action = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

#[derive(Default)]
struct ThrottleState {
    /// A window is open; new fires only mark `pending`.
    in_window: bool,
    /// At least one fire arrived inside the current window.
    pending: bool,
}

/// A leading+trailing async throttle around one action.
///
/// `fire()` is cheap and non-async; the action runs on a spawned task.
/// Cloning shares the same window state.
#[derive(Clone)]
pub struct Throttle {
    window: Duration,
    action: Action,
    state: Arc<Mutex<ThrottleState>>,
}

impl Throttle {
    /// Create a throttle that runs `action` at most twice per burst.
    pub fn new<F, Fut>(window: Duration, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            window,
            action: Arc::new(move || Box::pin(action()) as Pin<Box<dyn Future<Output = ()> + Send>>),
            state: Arc::new(Mutex::new(ThrottleState::default())),
        }
    }

    /// Request an execution.
    ///
    /// Outside a window: the action runs immediately (leading edge) and a
    /// window opens. Inside a window: the call is coalesced into a single
    /// trailing execution at window end. The trailing execution opens a
    /// fresh window of its own.
    pub fn fire(&self) {
        {
            let mut state = self.state.lock().expect("throttle state poisoned");
            if state.in_window {
                state.pending = true;
                debug!("Throttle fire coalesced into trailing execution");
                return;
            }
            state.in_window = true;
        }

        let action = Arc::clone(&self.action);
        let state = Arc::clone(&self.state);
        let window = self.window;
        tokio::spawn(async move {
            // Leading execution
            action().await;
            loop {
                sleep(window).await;
                let run_trailing = {
                    let mut state = state.lock().expect("throttle state poisoned");
                    if state.pending {
                        state.pending = false;
                        true
                    } else {
                        state.in_window = false;
                        false
                    }
                };
                if !run_trailing {
                    break;
                }
                // Trailing execution; its completion starts a fresh window
                action().await;
            }
        });
    }
}
