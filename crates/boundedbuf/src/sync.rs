//! Synchronization primitives used by the crate.
//!
//! With the `loom` feature the lock, condition variable and atomics come from
//! loom so the model checker can explore every interleaving of the semaphore
//! protocol. Otherwise they are the std types.

// Atomics are only used by debug-build invariant checks.
#[cfg(feature = "loom")]
#[allow(unused_imports)]
pub(crate) use loom::sync::atomic::{AtomicBool, Ordering};
#[cfg(feature = "loom")]
pub(crate) use loom::sync::{Condvar, Mutex};

#[cfg(not(feature = "loom"))]
#[allow(unused_imports)]
pub(crate) use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(not(feature = "loom"))]
pub(crate) use std::sync::{Condvar, Mutex};

use std::sync::LockResult;

/// Recovers the guard from a poisoned lock.
///
/// Every lock in this crate guards plain counters or slot storage that is
/// never left half-updated by a panic, so the data behind a poisoned lock is
/// still consistent.
#[inline]
pub(crate) fn recover<G>(result: LockResult<G>) -> G {
    result.unwrap_or_else(std::sync::PoisonError::into_inner)
}
