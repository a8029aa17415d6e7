#[cfg(debug_assertions)]
use crate::invariants::debug_assert_wakeups_bounded;
use crate::sync::{recover, Condvar, Mutex};
use std::fmt;
#[cfg(not(feature = "loom"))]
use std::time::{Duration, Instant};

// =============================================================================
// COUNTING PROTOCOL
// =============================================================================
//
// The count follows the textbook signed convention:
//
// - `count > 0`: that many acquires succeed without blocking
// - `count < 0`: `-count` acquirers are parked and have not been granted a
//   release yet
//
// A release that finds a parked acquirer (`count <= 0` after the increment)
// does not just notify the condition variable: it also records a *wakeup*.
// A parked acquirer only leaves its wait loop after consuming a wakeup, so a
// spurious return from `Condvar::wait` puts it straight back to sleep and a
// notification can never be lost between the decrement and the wait.
//
// All three fields live behind one mutex; nothing else is ever locked while
// it is held, so the semaphore cannot take part in a lock-ordering cycle.
//
// =============================================================================

#[derive(Debug)]
struct State {
    /// Signed permit count (negative = parked acquirers without a grant)
    count: isize,
    /// Releases handed to parked acquirers but not yet consumed
    wakeups: usize,
    /// Threads currently inside the wait loop
    waiting: usize,
}

/// Counting semaphore built from a mutex and a condition variable.
///
/// `acquire` blocks while no permit is available; `release` never blocks and
/// never loses a permit: it either wakes exactly one parked acquirer or leaves
/// a positive balance for a future one.
///
/// # Example
///
/// ```
/// use boundedbuf_rs::Semaphore;
///
/// let sem = Semaphore::new(1);
/// sem.acquire();
/// assert!(!sem.try_acquire());
/// sem.release();
/// assert_eq!(sem.value(), 1);
/// ```
pub struct Semaphore {
    state: Mutex<State>,
    cond: Condvar,
}

impl Semaphore {
    /// Creates a semaphore holding `initial` permits.
    pub fn new(initial: usize) -> Self {
        Self {
            state: Mutex::new(State {
                count: initial as isize,
                wakeups: 0,
                waiting: 0,
            }),
            cond: Condvar::new(),
        }
    }

    /// Takes one permit, parking the calling thread until one is available.
    pub fn acquire(&self) {
        let mut state = recover(self.state.lock());
        state.count -= 1;
        if state.count >= 0 {
            return;
        }

        state.waiting += 1;
        while state.wakeups == 0 {
            state = recover(self.cond.wait(state));
        }
        state.wakeups -= 1;
        state.waiting -= 1;
    }

    /// Takes one permit if it is available right now.
    pub fn try_acquire(&self) -> bool {
        let mut state = recover(self.state.lock());
        if state.count > 0 {
            state.count -= 1;
            true
        } else {
            false
        }
    }

    /// Takes one permit, giving up after `timeout`.
    ///
    /// Returns `false` on timeout. A release that raced with the timeout is
    /// not lost: if a wakeup was already handed over, the permit is taken.
    #[cfg(not(feature = "loom"))]
    pub fn acquire_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = recover(self.state.lock());
        state.count -= 1;
        if state.count >= 0 {
            return true;
        }

        state.waiting += 1;
        loop {
            if state.wakeups > 0 {
                state.wakeups -= 1;
                state.waiting -= 1;
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                // Withdraw: nobody granted us a wakeup, so give back the
                // decrement and leave the wait loop.
                state.waiting -= 1;
                state.count += 1;
                return false;
            }
            let (next, _) = recover(self.cond.wait_timeout(state, deadline - now));
            state = next;
        }
    }

    /// Returns one permit, waking a parked acquirer if there is one.
    pub fn release(&self) {
        let mut state = recover(self.state.lock());
        state.count += 1;
        if state.count <= 0 {
            state.wakeups += 1;

            // INV-SEM-01: a wakeup is only handed out to a parked acquirer
            #[cfg(debug_assertions)]
            debug_assert_wakeups_bounded!(state.wakeups, state.waiting);

            drop(state);
            self.cond.notify_one();
        }
    }

    /// Release that does not correspond to a returned unit.
    ///
    /// Used at shutdown to unblock parked threads so they can observe that the
    /// run is over. The count may grow past its initial value; exact
    /// accounting is no longer relied on once this is called.
    #[inline]
    pub fn force_release(&self) {
        self.release();
    }

    /// Calls [`force_release`](Self::force_release) `n` times.
    pub fn force_release_n(&self, n: usize) {
        for _ in 0..n {
            self.force_release();
        }
    }

    /// Takes one permit and returns a guard that gives it back on drop.
    ///
    /// See [`Permit`] for how the unit can be handed to another semaphore.
    pub fn acquire_permit(&self) -> Permit<'_> {
        self.acquire();
        Permit { target: self }
    }

    /// Non-blocking variant of [`acquire_permit`](Self::acquire_permit).
    pub fn try_acquire_permit(&self) -> Option<Permit<'_>> {
        self.try_acquire().then_some(Permit { target: self })
    }

    /// Current signed count (negative = parked acquirers without a grant).
    pub fn value(&self) -> isize {
        recover(self.state.lock()).count
    }

    /// Number of threads parked in `acquire`.
    pub fn waiters(&self) -> usize {
        recover(self.state.lock()).waiting
    }
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = recover(self.state.lock());
        f.debug_struct("Semaphore")
            .field("count", &state.count)
            .field("waiting", &state.waiting)
            .finish()
    }
}

/// One unit taken from a [`Semaphore`].
///
/// Dropping a `Permit` releases the unit to the semaphore it currently
/// targets. [`redirect`](Permit::redirect) moves the unit to a different
/// semaphore instead, which is how a bounded buffer turns an "empty slot"
/// into a "filled slot" once the item is written.
///
/// Because the release happens exactly once, in `Drop`, a unit can neither be
/// leaked nor released twice.
#[must_use = "dropping a Permit releases it immediately"]
pub struct Permit<'a> {
    target: &'a Semaphore,
}

impl<'a> Permit<'a> {
    /// Retargets the unit: it will be released to `to` instead.
    pub fn redirect(mut self, to: &'a Semaphore) -> Permit<'a> {
        self.target = to;
        self
    }

    /// Releases the unit now. Same as dropping the permit.
    pub fn release(self) {
        drop(self);
    }

    /// Returns `true` if this permit will be released to `sem`.
    pub fn targets(&self, sem: &Semaphore) -> bool {
        std::ptr::eq(self.target, sem)
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.target.release();
    }
}

impl fmt::Debug for Permit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permit")
            .field("target", &(self.target as *const Semaphore))
            .finish()
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counts_down_and_up() {
        let sem = Semaphore::new(2);
        sem.acquire();
        sem.acquire();
        assert_eq!(sem.value(), 0);
        assert!(!sem.try_acquire());

        sem.release();
        assert_eq!(sem.value(), 1);
        assert!(sem.try_acquire());
        assert_eq!(sem.value(), 0);
    }

    #[test]
    fn test_release_wakes_parked_acquirer() {
        let sem = Arc::new(Semaphore::new(0));
        let s = Arc::clone(&sem);
        let waiter = thread::spawn(move || s.acquire());

        // Wait until the acquirer is parked
        while sem.waiters() == 0 {
            thread::yield_now();
        }
        assert_eq!(sem.value(), -1);

        sem.release();
        waiter.join().unwrap();
        assert_eq!(sem.value(), 0);
        assert_eq!(sem.waiters(), 0);
    }

    #[test]
    fn test_release_without_waiter_is_banked() {
        let sem = Semaphore::new(0);
        sem.release();
        sem.release();
        assert_eq!(sem.value(), 2);
        sem.acquire();
        sem.acquire();
        assert_eq!(sem.value(), 0);
    }

    #[test]
    fn test_force_release_wakes_every_waiter() {
        const WAITERS: usize = 4;
        let sem = Arc::new(Semaphore::new(0));

        let handles: Vec<_> = (0..WAITERS)
            .map(|_| {
                let s = Arc::clone(&sem);
                thread::spawn(move || s.acquire())
            })
            .collect();

        while sem.waiters() < WAITERS {
            thread::yield_now();
        }

        sem.force_release_n(WAITERS + 2);
        for h in handles {
            h.join().unwrap();
        }
        // Over-provisioned releases stay banked
        assert_eq!(sem.value(), 2);
    }

    #[test]
    fn test_acquire_timeout_gives_back_decrement() {
        let sem = Semaphore::new(0);
        assert!(!sem.acquire_timeout(Duration::from_millis(10)));
        assert_eq!(sem.value(), 0);
        assert_eq!(sem.waiters(), 0);

        sem.release();
        assert!(sem.acquire_timeout(Duration::from_millis(10)));
        assert_eq!(sem.value(), 0);
    }

    #[test]
    fn test_acquire_timeout_woken_by_release() {
        let sem = Arc::new(Semaphore::new(0));
        let s = Arc::clone(&sem);
        let waiter = thread::spawn(move || s.acquire_timeout(Duration::from_secs(10)));

        while sem.waiters() == 0 {
            thread::yield_now();
        }
        sem.release();
        assert!(waiter.join().unwrap());
        assert_eq!(sem.value(), 0);
    }

    #[test]
    fn test_permit_released_on_drop() {
        let sem = Semaphore::new(1);
        {
            let _permit = sem.acquire_permit();
            assert_eq!(sem.value(), 0);
        }
        assert_eq!(sem.value(), 1);
    }

    #[test]
    fn test_permit_redirect_moves_unit() {
        let empty = Semaphore::new(1);
        let full = Semaphore::new(0);

        let permit = empty.acquire_permit();
        assert!(permit.targets(&empty));
        let permit = permit.redirect(&full);
        assert!(permit.targets(&full));
        permit.release();

        assert_eq!(empty.value(), 0);
        assert_eq!(full.value(), 1);
    }

    #[test]
    fn test_try_acquire_permit_none_when_exhausted() {
        let sem = Semaphore::new(0);
        assert!(sem.try_acquire_permit().is_none());
        sem.release();
        let permit = sem.try_acquire_permit();
        assert!(permit.is_some());
        drop(permit);
        assert_eq!(sem.value(), 1);
    }

    #[test]
    fn test_counter_stress() {
        const THREADS: usize = 8;
        const ROUNDS: usize = 2_000;
        let sem = Arc::new(Semaphore::new(2));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let s = Arc::clone(&sem);
                thread::spawn(move || {
                    for _ in 0..ROUNDS {
                        let _p = s.acquire_permit();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(sem.value(), 2);
        assert_eq!(sem.waiters(), 0);
    }
}
