#[cfg(debug_assertions)]
use crate::invariants::debug_assert_exclusive;
#[cfg(debug_assertions)]
use crate::sync::{AtomicBool, Ordering};
use crate::sync::{recover, Mutex};
use crate::{BufferError, Permit, Semaphore, SlotRing};
use crossbeam_utils::CachePadded;

// =============================================================================
// PROTOCOL
// =============================================================================
//
// Producer:  reserve_slot()  -> insert(permit, item) -> publish()
//            acquire(empty)     lock/write/unlock       release(full)
//
// Consumer:  reserve_item()  -> remove(permit)       -> publish()
//            acquire(full)      lock/read/unlock        release(empty)
//
// The unit taken from one semaphore travels inside a `Permit`. `insert` and
// `remove` redirect it to the opposite semaphore, so it is released exactly
// once: to the counterpart after a successful handoff, or back to its origin
// if the caller drops the permit without touching the ring.
//
// Semaphore operations never happen while the ring lock is held. The ring
// lock is held only to write/read one slot and advance one sequence number.
//
// At rest: empty.value() + occupancy == capacity, full.value() == occupancy.
//
// =============================================================================

/// Bounded buffer: a [`SlotRing`] behind one mutex plus two counting
/// semaphores ("empty slots" and "filled slots").
///
/// # Example
///
/// ```
/// use boundedbuf_rs::BoundedBuffer;
///
/// let buffer = BoundedBuffer::new(2).unwrap();
///
/// let slot = buffer.reserve_slot();
/// let placed = buffer.insert(slot, "milk").unwrap();
/// assert_eq!(placed.occupancy(), 1);
/// placed.publish();
///
/// let ready = buffer.reserve_item();
/// let taken = buffer.remove(ready).unwrap();
/// assert_eq!(taken.occupancy(), 0);
/// assert_eq!(taken.publish(), "milk");
/// ```
pub struct BoundedBuffer<T> {
    ring: Mutex<SlotRing<T>>,
    /// Counts vacant slots (starts at capacity)
    empty: CachePadded<Semaphore>,
    /// Counts filled slots (starts at zero)
    full: CachePadded<Semaphore>,
    capacity: usize,
    /// Set while a thread is inside the critical section (debug only)
    #[cfg(debug_assertions)]
    inside: AtomicBool,
}

impl<T> BoundedBuffer<T> {
    /// Creates an empty buffer with `capacity` slots.
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }

        Ok(Self {
            ring: Mutex::new(SlotRing::new(capacity)),
            empty: CachePadded::new(Semaphore::new(capacity)),
            full: CachePadded::new(Semaphore::new(0)),
            capacity,
            #[cfg(debug_assertions)]
            inside: AtomicBool::new(false),
        })
    }

    /// Returns the number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The "empty slots" semaphore.
    #[inline]
    pub fn empty_slots(&self) -> &Semaphore {
        &self.empty
    }

    /// The "filled slots" semaphore.
    #[inline]
    pub fn filled_slots(&self) -> &Semaphore {
        &self.full
    }

    // ---------------------------------------------------------------------
    // PRODUCER SIDE
    // ---------------------------------------------------------------------

    /// Waits for a vacant slot. Blocks while the buffer is full.
    pub fn reserve_slot(&self) -> Permit<'_> {
        self.empty.acquire_permit()
    }

    /// Takes a vacant slot if one is available right now.
    pub fn try_reserve_slot(&self) -> Option<Permit<'_>> {
        self.empty.try_acquire_permit()
    }

    /// Writes `item` into the slot reserved by `slot`.
    ///
    /// This is the producer's critical section. The returned [`Handoff`]
    /// carries the resulting occupancy and, once published or dropped,
    /// releases one "filled slot".
    ///
    /// Returns the item back if the ring has no vacant slot, which can only
    /// happen with a permit produced by a shutdown force-release. The permit
    /// is then returned to the "empty slots" semaphore.
    pub fn insert<'a>(&'a self, slot: Permit<'a>, item: T) -> Result<Handoff<'a, ()>, T> {
        debug_assert!(slot.targets(&self.empty), "insert needs an empty-slot permit");

        let (sequence, occupancy) = self.critical(|ring| {
            let sequence = ring.produced();
            ring.insert(item).map(|occupancy| (sequence, occupancy))
        })?;
        Ok(Handoff {
            value: (),
            sequence,
            occupancy,
            permit: slot.redirect(&self.full),
        })
    }

    /// Blocking put: reserve, insert, publish. Returns the occupancy seen
    /// right after the insert.
    ///
    /// Returns the item back if the slot came from a shutdown force-release
    /// and the ring is still full.
    pub fn put(&self, item: T) -> Result<usize, T> {
        let slot = self.reserve_slot();
        self.insert(slot, item).map(|placed| placed.occupancy())
    }

    /// Non-blocking put. Returns the item back if the buffer is full.
    pub fn try_put(&self, item: T) -> Result<usize, T> {
        match self.try_reserve_slot() {
            Some(slot) => self.insert(slot, item).map(|placed| placed.occupancy()),
            None => Err(item),
        }
    }

    // ---------------------------------------------------------------------
    // CONSUMER SIDE
    // ---------------------------------------------------------------------

    /// Waits for a filled slot. Blocks while the buffer is empty.
    pub fn reserve_item(&self) -> Permit<'_> {
        self.full.acquire_permit()
    }

    /// Takes a filled slot if one is available right now.
    pub fn try_reserve_item(&self) -> Option<Permit<'_>> {
        self.full.try_acquire_permit()
    }

    /// Reads the head item using the unit reserved by `ready`.
    ///
    /// This is the consumer's critical section. The returned [`Handoff`]
    /// carries the item and the resulting occupancy and, once published or
    /// dropped, releases one "empty slot".
    ///
    /// Returns `None` if the ring is empty, which can only happen with a
    /// permit produced by a shutdown force-release.
    pub fn remove<'a>(&'a self, ready: Permit<'a>) -> Option<Handoff<'a, T>> {
        debug_assert!(ready.targets(&self.full), "remove needs a filled-slot permit");

        let (value, sequence, occupancy) = self.critical(|ring| {
            let sequence = ring.consumed();
            ring.remove_head()
                .map(|(value, occupancy)| (value, sequence, occupancy))
        })?;
        Some(Handoff {
            value,
            sequence,
            occupancy,
            permit: ready.redirect(&self.empty),
        })
    }

    /// Blocking take: reserve, remove, publish.
    ///
    /// Returns `None` only when woken by a shutdown force-release with
    /// nothing left to take.
    pub fn take(&self) -> Option<T> {
        let ready = self.reserve_item();
        self.remove(ready).map(Handoff::publish)
    }

    /// Non-blocking take. Returns `None` if the buffer is empty.
    pub fn try_take(&self) -> Option<T> {
        let ready = self.try_reserve_item()?;
        self.remove(ready).map(Handoff::publish)
    }

    // ---------------------------------------------------------------------
    // SHUTDOWN & OBSERVATION
    // ---------------------------------------------------------------------

    /// Force-releases the "empty slots" semaphore `empty` times and the
    /// "filled slots" semaphore `full` times, waking parked threads.
    pub fn force_release(&self, empty: usize, full: usize) {
        self.empty.force_release_n(empty);
        self.full.force_release_n(full);
    }

    /// Current number of filled slots (read under the ring lock).
    pub fn occupancy(&self) -> usize {
        self.critical(|ring| ring.occupancy())
    }

    /// Produced/consumed totals and the resident count, read atomically.
    pub fn totals(&self) -> Totals {
        self.critical(|ring| Totals {
            produced: ring.produced(),
            consumed: ring.consumed(),
            resident: ring.occupancy(),
        })
    }

    /// Copies the resident items from head to tail.
    pub fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.critical(|ring| ring.iter().cloned().collect())
    }

    /// Runs `f` on the ring with the lock held.
    fn critical<R>(&self, f: impl FnOnce(&mut SlotRing<T>) -> R) -> R {
        let mut ring = recover(self.ring.lock());

        // INV-MUT-01: nobody else is inside
        #[cfg(debug_assertions)]
        debug_assert_exclusive!(self.inside.swap(true, Ordering::AcqRel));

        let out = f(&mut ring);

        #[cfg(debug_assertions)]
        self.inside.store(false, Ordering::Release);

        out
    }
}

impl<T> std::fmt::Debug for BoundedBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedBuffer")
            .field("capacity", &self.capacity)
            .field("empty", &*self.empty)
            .field("full", &*self.full)
            .finish_non_exhaustive()
    }
}

/// Result of a critical section whose semaphore unit has not been handed on
/// yet.
///
/// Lets the caller report the outcome outside the ring lock before the
/// counterpart is signalled. [`publish`](Handoff::publish) (or dropping the
/// handoff) releases the unit.
#[must_use = "dropping a Handoff publishes it immediately"]
#[derive(Debug)]
pub struct Handoff<'a, V> {
    value: V,
    sequence: u64,
    occupancy: usize,
    permit: Permit<'a>,
}

impl<V> Handoff<'_, V> {
    /// Occupancy observed inside the critical section.
    #[inline]
    pub fn occupancy(&self) -> usize {
        self.occupancy
    }

    /// Position of the moved item in buffer order: the number of items
    /// inserted (or removed) before it.
    ///
    /// Together with [`occupancy`](Self::occupancy) this pins down both
    /// totals at the instant of the handoff.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The moved value (the removed item, or `()` for an insert).
    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Signals the counterpart semaphore and returns the value.
    pub fn publish(self) -> V {
        let Handoff { value, permit, .. } = self;
        permit.release();
        value
    }
}

/// Accounting snapshot of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    /// Items ever inserted
    pub produced: u64,
    /// Items ever removed
    pub consumed: u64,
    /// Items currently in the buffer
    pub resident: usize,
}

impl Totals {
    /// `produced - consumed`.
    #[inline]
    pub fn outstanding(&self) -> u64 {
        self.produced - self.consumed
    }

    /// Returns `true` if `produced - consumed == resident`.
    #[inline]
    pub fn is_consistent(&self) -> bool {
        self.outstanding() == self.resident as u64
    }
}
