//! Supermarket checkout simulation
//!
//! Cashier threads (producers) scan items into a shared packing area of
//! fixed size; packer threads (consumers) take them out. The packing area is
//! a [`boundedbuf_rs::BoundedBuffer`]: two counting semaphores plus a mutex.
//!
//! A run lasts a fixed time. When it expires the shutdown timer clears the
//! run flag and force-releases both semaphores so that every worker parked
//! on a full or empty packing area wakes up, sees the flag and exits.
//!
//! # Example
//!
//! ```
//! use checkout_sim::{MemorySink, SimConfig, Simulation, Action};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let sink = Arc::new(MemorySink::new());
//! let config = SimConfig::quick().with_duration(Duration::from_millis(100));
//! let report = Simulation::new(config, sink.clone()).unwrap().run().unwrap();
//!
//! assert!(report.is_consistent());
//! // Every worker reports once when it stops
//! assert_eq!(sink.count(Action::Stopped), 5);
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod item;
pub mod report;
pub mod shutdown;
pub mod simulation;
pub mod state;
pub mod worker;

pub use config::{CliArgs, DelayRange, SimConfig, WakePolicy, USAGE};
pub use error::{ConfigError, SimError};
pub use event::{Action, ConsoleSink, Event, EventSink, MemorySink, NullSink, Role, TracingSink};
pub use item::{Item, ItemName};
pub use report::{banner, SimReport};
pub use shutdown::{ShutdownCause, ShutdownCoordinator, ShutdownSignal};
pub use simulation::Simulation;
pub use state::SharedState;
pub use worker::{Cashier, Packer, WorkerStats};

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber writing to stderr.
///
/// The filter comes from `RUST_LOG`, falling back to `default_filter`.
/// Does nothing if a global subscriber is already set.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .with_target(false)
        .try_init();
}
