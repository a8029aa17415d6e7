//! Error types for bounded buffer construction.

use thiserror::Error;

/// Errors that can occur when building a bounded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// A buffer needs at least one slot.
    #[error("buffer capacity must be at least 1")]
    ZeroCapacity,
}
