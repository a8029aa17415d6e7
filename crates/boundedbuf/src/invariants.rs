//! Debug assertion macros for bounded-buffer invariants.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`), so there is zero
//! overhead in release builds.
//!
//! Used by `SlotRing<T>`, `BoundedBuffer<T>` and `Semaphore`.

// =============================================================================
// INV-OCC-01: Bounded Occupancy
// =============================================================================

/// Assert that occupancy does not exceed capacity.
///
/// **Invariant**: `0 ≤ (tail - head) ≤ capacity`
///
/// Used in: `SlotRing::insert()` after advancing tail
macro_rules! debug_assert_bounded_occupancy {
    ($occupancy:expr, $capacity:expr) => {
        debug_assert!(
            $occupancy <= $capacity,
            "INV-OCC-01 violated: occupancy {} exceeds capacity {}",
            $occupancy,
            $capacity
        )
    };
}

/// Assert that head does not advance past tail.
///
/// **Invariant**: `head ≤ tail` (after advance)
///
/// Used in: `SlotRing::remove_head()` before updating head
macro_rules! debug_assert_head_not_past_tail {
    ($new_head:expr, $tail:expr) => {
        debug_assert!(
            $new_head <= $tail,
            "INV-OCC-01 violated: advancing head {} beyond tail {}",
            $new_head,
            $tail
        )
    };
}

// =============================================================================
// INV-SEQ-01: Monotonic Progress
// =============================================================================

/// Assert that a sequence number advanced by exactly one.
///
/// **Invariant**: head/tail advance by one per successful remove/insert
macro_rules! debug_assert_single_step {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new == $old + 1,
            "INV-SEQ-01 violated: {} moved from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

// =============================================================================
// INV-MUT-01: Exclusive Critical Section
// =============================================================================

/// Assert that no other thread is inside the buffer's critical section.
///
/// **Invariant**: at most one insert/remove executes at any instant
///
/// Used in: `BoundedBuffer::critical()` on entry (flag was clear)
macro_rules! debug_assert_exclusive {
    ($was_inside:expr) => {
        debug_assert!(
            !$was_inside,
            "INV-MUT-01 violated: two threads inside the buffer critical section"
        )
    };
}

// =============================================================================
// INV-SEM-01: Wakeups Never Exceed Waiters
// =============================================================================

/// Assert that pending wakeups never outnumber parked waiters.
///
/// **Invariant**: `wakeups ≤ waiting`. A release only hands out a wakeup
/// when the count shows a parked acquirer that has not been granted one yet.
///
/// Used in: `Semaphore::release()` after handing out a wakeup
macro_rules! debug_assert_wakeups_bounded {
    ($wakeups:expr, $waiters:expr) => {
        debug_assert!(
            $wakeups <= $waiters,
            "INV-SEM-01 violated: {} wakeups pending for {} waiters",
            $wakeups,
            $waiters
        )
    };
}

// =============================================================================
// Re-exports for crate-internal use
// =============================================================================

pub(crate) use debug_assert_bounded_occupancy;
pub(crate) use debug_assert_exclusive;
pub(crate) use debug_assert_head_not_past_tail;
pub(crate) use debug_assert_single_step;
pub(crate) use debug_assert_wakeups_bounded;
