//! Error types for the checkout simulation.

use boundedbuf_rs::BufferError;
use std::time::Duration;
use thiserror::Error;

/// Invalid simulation parameters or command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The packing area needs at least one slot.
    #[error("capacity must be at least 1")]
    ZeroCapacity,

    /// At least one cashier is required.
    #[error("at least one cashier (producer) is required")]
    NoProducers,

    /// At least one packer is required.
    #[error("at least one packer (consumer) is required")]
    NoConsumers,

    /// A delay range with `min > max`.
    #[error("{which} delay range is inverted ({min:?} > {max:?})")]
    InvertedDelay {
        /// Which delay ("scan" or "pack").
        which: &'static str,
        /// Lower bound.
        min: Duration,
        /// Upper bound.
        max: Duration,
    },

    /// A flag that is not recognized.
    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    /// A flag that expects a value was last on the command line.
    #[error("missing value for {0}")]
    MissingValue(String),

    /// A flag value that does not parse.
    #[error("invalid value {value:?} for {flag}")]
    InvalidValue {
        /// The flag.
        flag: String,
        /// The offending value.
        value: String,
    },
}

/// Errors that abort a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// The configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The shared buffer could not be built.
    #[error("buffer setup failed: {0}")]
    Buffer(#[from] BufferError),

    /// The OS refused to create a thread.
    #[error("failed to spawn thread {thread}: {source}")]
    Spawn {
        /// Name of the thread that could not be created.
        thread: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A worker or the timer panicked.
    #[error("thread {thread} panicked")]
    WorkerPanicked {
        /// Name of the thread that panicked.
        thread: String,
    },
}

impl SimError {
    /// Returns `true` if the run never started because of bad input.
    #[inline]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Buffer(_))
    }
}
