//! State shared by every thread of a run.

use crate::config::{SimConfig, WakePolicy};
use crate::error::SimError;
use crate::item::Item;
use boundedbuf_rs::{BoundedBuffer, Totals};
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Buffer, run flag and shutdown plumbing of one simulation.
///
/// Passed to every worker and to the shutdown timer as `Arc<SharedState>`.
#[derive(Debug)]
pub struct SharedState {
    /// The packing area.
    buffer: BoundedBuffer<Item>,
    /// `true` while the run is live. Single writer (shutdown), many readers.
    active: CachePadded<AtomicBool>,
    producers: usize,
    consumers: usize,
    wake_policy: WakePolicy,
    /// Set once shutdown has fired; wakes the timer early.
    fired: Mutex<bool>,
    fired_cond: Condvar,
}

impl SharedState {
    /// Builds the shared state for `config`.
    pub fn new(config: &SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            buffer: BoundedBuffer::new(config.capacity)?,
            active: CachePadded::new(AtomicBool::new(true)),
            producers: config.producers,
            consumers: config.consumers,
            wake_policy: config.wake_policy,
            fired: Mutex::new(false),
            fired_cond: Condvar::new(),
        })
    }

    /// The packing area.
    #[inline]
    pub fn buffer(&self) -> &BoundedBuffer<Item> {
        &self.buffer
    }

    /// Returns `true` while the run is live.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Ends the run: clears the flag, then force-releases both semaphores so
    /// every worker parked in `acquire` wakes up and sees the flag.
    ///
    /// Only the first call does anything. Returns the forced releases sent
    /// as `(empty_slots, filled_slots)`, or `None` if shutdown already fired.
    pub fn shut_down(&self) -> Option<(usize, usize)> {
        // The flag must be cleared before the releases: a worker that wakes
        // from a forced release re-reads it through the semaphore's mutex.
        if !self.active.swap(false, Ordering::AcqRel) {
            return None;
        }

        let (empty, full) = self.wake_policy.releases(self.producers, self.consumers);
        self.buffer.force_release(empty, full);
        tracing::debug!(
            producers = self.producers(),
            consumers = self.consumers(),
            policy = ?self.wake_policy,
            empty,
            full,
            "shutdown fired, forced releases sent"
        );

        *self.fired.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.fired_cond.notify_all();

        Some((empty, full))
    }

    /// Blocks until shutdown fires or `timeout` elapses. Returns `true` if
    /// shutdown fired.
    pub fn wait_for_shutdown(&self, timeout: Duration) -> bool {
        let fired = self.fired.lock().unwrap_or_else(PoisonError::into_inner);
        let (fired, _) = self
            .fired_cond
            .wait_timeout_while(fired, timeout, |fired| !*fired)
            .unwrap_or_else(PoisonError::into_inner);
        *fired
    }

    /// Produced/consumed totals and the resident count.
    pub fn totals(&self) -> Totals {
        self.buffer.totals()
    }

    /// Number of cashier threads.
    #[inline]
    pub fn producers(&self) -> usize {
        self.producers
    }

    /// Number of packer threads.
    #[inline]
    pub fn consumers(&self) -> usize {
        self.consumers
    }
}
