//! Loom-based concurrency tests for boundedbuf-rs.
//!
//! Run with: `cargo test -p boundedbuf-rs --features loom --test loom_tests --release`
//!
//! With the `loom` feature the crate's mutex, condition variable and atomics
//! are loom's, so every interleaving of the semaphore protocol is explored.

#![cfg(feature = "loom")]

use boundedbuf_rs::{BoundedBuffer, Semaphore};
use loom::sync::atomic::{AtomicBool, Ordering};
use loom::sync::Arc;
use loom::thread;

/// A release either wakes the parked acquirer or is banked for it.
#[test]
fn loom_release_never_lost() {
    loom::model(|| {
        let sem = Arc::new(Semaphore::new(0));
        let s = Arc::clone(&sem);

        let waiter = thread::spawn(move || s.acquire());
        sem.release();
        waiter.join().unwrap();

        assert_eq!(sem.value(), 0);
        assert_eq!(sem.waiters(), 0);
    });
}

/// Two acquirers, two releases from different threads: both get through.
#[test]
fn loom_two_waiters_two_releases() {
    loom::model(|| {
        let sem = Arc::new(Semaphore::new(0));

        let a = {
            let s = Arc::clone(&sem);
            thread::spawn(move || s.acquire())
        };
        let b = {
            let s = Arc::clone(&sem);
            thread::spawn(move || s.acquire())
        };
        let releaser = {
            let s = Arc::clone(&sem);
            thread::spawn(move || s.release())
        };

        sem.release();
        releaser.join().unwrap();
        a.join().unwrap();
        b.join().unwrap();

        assert_eq!(sem.value(), 0);
    });
}

/// Capacity-1 handoff preserves order and ends with consistent accounting.
#[test]
fn loom_capacity_one_handoff() {
    loom::model(|| {
        let buffer = Arc::new(BoundedBuffer::new(1).unwrap());

        let producer = {
            let b = Arc::clone(&buffer);
            thread::spawn(move || {
                let first = b.put(1u8).unwrap();
                let second = b.put(2u8).unwrap();
                (first, second)
            })
        };

        let a = buffer.take();
        let b = buffer.take();
        let (first, second) = producer.join().unwrap();

        assert_eq!((a, b), (Some(1), Some(2)));
        assert_eq!((first, second), (1, 1));
        let totals = buffer.totals();
        assert_eq!(totals.produced, 2);
        assert!(totals.is_consistent());
    });
}

/// A producer parked on a full buffer is released by one forced release and
/// hands the unit back after observing the stop flag.
#[test]
fn loom_forced_release_unparks_producer() {
    loom::model(|| {
        let buffer = Arc::new(BoundedBuffer::new(1).unwrap());
        let active = Arc::new(AtomicBool::new(true));
        buffer.put(0u8).unwrap();

        let producer = {
            let b = Arc::clone(&buffer);
            let active = Arc::clone(&active);
            thread::spawn(move || {
                let slot = b.reserve_slot();
                if !active.load(Ordering::Acquire) {
                    drop(slot);
                    return false;
                }
                b.insert(slot, 1).is_ok()
            })
        };

        active.store(false, Ordering::Release);
        buffer.force_release(1, 0);

        assert!(!producer.join().unwrap());
        assert_eq!(buffer.occupancy(), 1);
        assert_eq!(buffer.empty_slots().value(), 1);
    });
}
