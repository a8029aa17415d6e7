//! boundedbuf-rs - Bounded Buffer from First Principles
//!
//! A fixed-capacity slot ring shared by any number of producer and consumer
//! threads, coordinated by two counting semaphores and one mutex. The
//! semaphore is hand-built from a `Mutex` and a `Condvar`.
//!
//! # Key Features
//!
//! - Counting semaphore with signed count, predicate-loop waits (immune to
//!   spurious wakeups) and forced releases for shutdown
//! - Scoped [`Permit`] guards: a semaphore unit is released exactly once
//! - Unbounded sequence numbers: full and empty are never confused
//! - Debug-build invariant checks, loom model tests behind the `loom` feature
//!
//! # Example
//!
//! ```
//! use boundedbuf_rs::BoundedBuffer;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let buffer = Arc::new(BoundedBuffer::new(4).unwrap());
//!
//! let producer = {
//!     let buffer = Arc::clone(&buffer);
//!     thread::spawn(move || {
//!         for i in 0..100u32 {
//!             buffer.put(i).unwrap();
//!         }
//!     })
//! };
//!
//! let mut sum = 0;
//! for _ in 0..100 {
//!     sum += buffer.take().unwrap();
//! }
//! producer.join().unwrap();
//! assert_eq!(sum, 4950);
//! ```

mod buffer;
mod error;
mod invariants;
mod ring;
mod semaphore;
mod sync;

pub use buffer::{BoundedBuffer, Handoff, Totals};
pub use error::BufferError;
pub use ring::SlotRing;
pub use semaphore::{Permit, Semaphore};
