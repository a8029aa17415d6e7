//! Timer-driven shutdown.

use crate::state::SharedState;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownCause {
    /// The configured duration elapsed.
    Timer,
    /// A [`ShutdownSignal`] fired first.
    Signal,
}

/// Single-shot timer that ends the run.
///
/// Sleeps for the configured duration, then clears the run flag and sends
/// enough forced releases on both semaphores to wake every worker that
/// could be parked in `acquire`. Without those releases a worker that
/// blocked before the flag flipped could wait forever, because its
/// counterparts stop producing/consuming once they see the flag.
pub struct ShutdownCoordinator {
    state: Arc<SharedState>,
    duration: Duration,
}

impl ShutdownCoordinator {
    /// Creates a timer that fires after `duration`.
    pub fn new(state: Arc<SharedState>, duration: Duration) -> Self {
        Self { state, duration }
    }

    /// Waits out the duration and fires. Returns early if a
    /// [`ShutdownSignal`] fires first.
    pub fn run(self) -> ShutdownCause {
        let started = Instant::now();
        if self.state.wait_for_shutdown(self.duration) {
            tracing::info!(elapsed = ?started.elapsed(), "shutdown signalled before timer");
            return ShutdownCause::Signal;
        }

        match self.state.shut_down() {
            Some((empty, full)) => {
                tracing::info!(
                    elapsed = ?started.elapsed(),
                    empty_releases = empty,
                    full_releases = full,
                    "run time elapsed, stopping workers"
                );
                ShutdownCause::Timer
            }
            // Lost the race against a signal that fired right at the deadline
            None => ShutdownCause::Signal,
        }
    }
}

/// A cloneable handle for ending a run early.
///
/// Only the first trigger (from any clone, or the timer) has effect;
/// later calls are no-ops.
#[derive(Clone)]
pub struct ShutdownSignal {
    state: Arc<SharedState>,
}

impl ShutdownSignal {
    pub(crate) fn new(state: Arc<SharedState>) -> Self {
        Self { state }
    }

    /// Ends the run now. Returns `true` if this call fired the shutdown.
    pub fn shutdown(&self) -> bool {
        self.state.shut_down().is_some()
    }

    /// Returns `true` if the run has been stopped.
    pub fn is_shutdown(&self) -> bool {
        !self.state.is_active()
    }
}
