//! Worker events and the sinks that render them.
//!
//! Workers report every handoff through an [`EventSink`]. Sinks are called
//! outside the buffer's critical section, so a slow sink only slows the
//! worker that reports, never the buffer.

use crate::item::Item;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Which side of the buffer a worker is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Producer: scans items into the packing area.
    Cashier,
    /// Consumer: takes items out of the packing area.
    Packer,
}

impl Role {
    /// Upper-case label used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Cashier => "CASHIER",
            Self::Packer => "PACKER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// What a worker did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// A cashier placed an item in the packing area.
    Placed,
    /// A packer took an item from the packing area.
    Took,
    /// The worker observed the end of the run and exited.
    Stopped,
}

impl Action {
    /// Human-readable description.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Placed => "left critical section - placed item",
            Self::Took => "left critical section - took item",
            Self::Stopped => "finished",
        }
    }
}

/// One observation reported by a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Reporting worker's role.
    pub role: Role,
    /// Reporting worker's id (1-based within its role).
    pub worker_id: usize,
    /// What happened.
    pub action: Action,
    /// The item moved, if any.
    pub item: Option<Item>,
    /// Occupancy seen inside the critical section.
    pub occupancy: usize,
    /// Buffer-order position of the moved item (see
    /// [`Handoff::sequence`](boundedbuf_rs::Handoff::sequence)).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    /// Buffer capacity.
    pub capacity: usize,
    /// Wall-clock time of the observation.
    #[serde(skip)]
    pub at: SystemTime,
}

impl Event {
    /// Creates an event stamped with the current time.
    pub fn now(
        role: Role,
        worker_id: usize,
        action: Action,
        item: Option<Item>,
        occupancy: usize,
        capacity: usize,
    ) -> Self {
        Self {
            role,
            worker_id,
            action,
            item,
            occupancy,
            capacity,
            sequence: None,
            at: SystemTime::now(),
        }
    }

    /// Attaches the buffer-order position of the moved item.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }
}

/// `HH:MM:SS` of a timestamp, always in UTC.
///
/// No time-zone lookup is done, so lines read the same on every host
/// regardless of `TZ`.
pub fn clock(at: SystemTime) -> String {
    let secs = at.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
    let day = secs % 86_400;
    format!("{:02}:{:02}:{:02}", day / 3600, (day % 3600) / 60, day % 60)
}

impl fmt::Display for Event {
    /// `[HH:MM:SS] ROLE       #id | action | Item: name | Buffer: x/cap`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.item.map(|item| item.name);
        write!(
            f,
            "[{}] {:<10} #{} | {:<35} | Item: {:<10} | Buffer: {}/{}",
            clock(self.at),
            self.role,
            self.worker_id,
            self.action.describe(),
            name.as_ref().map_or("-", |n| n.as_str()),
            self.occupancy,
            self.capacity
        )
    }
}

/// Receiver of worker events.
///
/// Object-safe so a run can share one `Arc<dyn EventSink>` among all workers.
/// `record` must not block the caller for long.
pub trait EventSink: Send + Sync {
    /// Handles one event.
    fn record(&self, event: &Event);

    /// Returns the sink name for debugging.
    fn name(&self) -> &str;
}

/// Prints one line per event to stdout, flushed immediately.
///
/// Lines are stamped with [`clock`] (UTC).
#[derive(Debug, Default)]
pub struct ConsoleSink {
    /// Skip `Placed`/`Took` lines, print only `Stopped`.
    quiet: bool,
}

impl ConsoleSink {
    /// Creates a stdout sink.
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl EventSink for ConsoleSink {
    fn record(&self, event: &Event) {
        if self.quiet && event.action != Action::Stopped {
            return;
        }
        let mut out = io::stdout().lock();
        // A closed stdout must not take a worker down.
        let _ = writeln!(out, "{}", event);
        let _ = out.flush();
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// Emits events as structured `tracing` records.
#[derive(Debug, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for TracingSink {
    fn record(&self, event: &Event) {
        let item = event.item.map(|item| item.name);
        tracing::info!(
            role = event.role.label(),
            worker = event.worker_id,
            action = ?event.action,
            item = item.as_ref().map_or("-", |n| n.as_str()),
            code = event.item.map_or(0, |item| item.code),
            occupancy = event.occupancy,
            capacity = event.capacity,
            "buffer event"
        );
    }

    fn name(&self) -> &str {
        "tracing"
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the events recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of events with the given action.
    pub fn count(&self, action: Action) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.action == action)
            .count()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*event);
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Discards all events (for benchmarking).
#[derive(Debug, Default)]
pub struct NullSink;

impl NullSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for NullSink {
    fn record(&self, _event: &Event) {}

    fn name(&self) -> &str {
        "null"
    }
}
