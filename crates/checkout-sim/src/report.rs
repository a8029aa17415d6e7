//! End-of-run accounting.

use crate::config::{SimConfig, WakePolicy};
use crate::event::Role;
use crate::item::Item;
use crate::shutdown::ShutdownCause;
use crate::worker::WorkerStats;
use boundedbuf_rs::Totals;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

const RULE: &str = "══════════════════════════════════════════════";

/// Totals of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    /// Packing area size.
    pub capacity: usize,
    /// Cashier threads.
    pub producers: usize,
    /// Packer threads.
    pub consumers: usize,
    /// Forced-release policy used at shutdown.
    pub wake_policy: WakePolicy,
    /// What ended the run.
    pub cause: ShutdownCause,
    /// Wall time from start to the last join, in milliseconds.
    pub elapsed_ms: u64,
    /// Items scanned into the packing area.
    pub produced: u64,
    /// Items packed out of it.
    pub consumed: u64,
    /// Items still in the packing area.
    pub resident: usize,
    /// Per-worker counts, cashiers first.
    pub workers: Vec<WorkerStats>,
    /// What was left in the packing area, oldest first.
    pub leftover: Vec<Item>,
}

impl SimReport {
    pub(crate) fn new(
        config: &SimConfig,
        cause: ShutdownCause,
        elapsed: Duration,
        totals: Totals,
        workers: Vec<WorkerStats>,
        leftover: Vec<Item>,
    ) -> Self {
        Self {
            capacity: config.capacity,
            producers: config.producers,
            consumers: config.consumers,
            wake_policy: config.wake_policy,
            cause,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            produced: totals.produced,
            consumed: totals.consumed,
            resident: totals.resident,
            workers,
            leftover,
        }
    }

    /// `produced - consumed`.
    pub fn outstanding(&self) -> u64 {
        self.produced.saturating_sub(self.consumed)
    }

    /// Sum of `handled` over workers of `role`.
    pub fn handled_by(&self, role: Role) -> u64 {
        self.workers
            .iter()
            .filter(|w| w.role == role)
            .map(|w| w.handled)
            .sum()
    }

    /// Returns `true` if the buffer and per-worker counts agree:
    /// `produced - consumed == resident`, cashiers placed `produced` items,
    /// packers took `consumed`, and the leftover list matches `resident`.
    pub fn is_consistent(&self) -> bool {
        self.produced >= self.consumed
            && self.produced - self.consumed == self.resident as u64
            && self.handled_by(Role::Cashier) == self.produced
            && self.handled_by(Role::Packer) == self.consumed
            && self.leftover.len() == self.resident
            && self.resident <= self.capacity
    }
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "  SIMULATION FINISHED")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "  Items scanned (produced):   {}", self.produced)?;
        writeln!(f, "  Items packed (consumed):    {}", self.consumed)?;
        writeln!(f, "  Outstanding (difference):   {}", self.outstanding())?;
        writeln!(f, "  Left in packing area:       {}", self.resident)?;
        writeln!(f, "  Ended by:                   {:?}", self.cause)?;
        writeln!(f, "  Elapsed:                    {} ms", self.elapsed_ms)?;
        writeln!(f, "{RULE}")?;
        for w in &self.workers {
            writeln!(f, "  {:<8} #{:<3} {:>6}", w.role, w.id, w.handled)?;
        }
        if !self.leftover.is_empty() {
            writeln!(f, "{RULE}")?;
            for item in &self.leftover {
                writeln!(f, "  left: {item}")?;
            }
        }
        write!(f, "{RULE}")
    }
}

/// Startup banner for `config`.
pub fn banner(config: &SimConfig) -> String {
    format!(
        "{RULE}\n  SUPERMARKET CHECKOUT: BOUNDED BUFFER\n{RULE}\n  \
         Packing area size:  {}\n  \
         Cashiers:           {}\n  \
         Packers:            {}\n  \
         Duration:           {:?}\n{RULE}",
        config.capacity, config.producers, config.consumers, config.duration
    )
}
