use crate::invariants::{
    debug_assert_bounded_occupancy, debug_assert_head_not_past_tail, debug_assert_single_step,
};

// =============================================================================
// SEQUENCE NUMBERS
// =============================================================================
//
// `head` and `tail` are unbounded u64 sequence numbers rather than wrapped
// indices. The slot index is computed as `sequence % capacity` only when a
// slot is touched. This keeps "full" and "empty" distinguishable
// (`tail - head == capacity` vs `tail == head`) without a separate length
// field, and the two sequences double as the produced/consumed totals.
//
// The ring itself is not synchronized. `BoundedBuffer` owns it behind a mutex
// and only touches it inside its critical section.
//
// =============================================================================

/// Fixed-capacity circular slot storage.
///
/// Items are written at the tail and read at the head in FIFO slot order.
/// The capacity is fixed at construction; the ring never grows or shrinks.
#[derive(Debug)]
pub struct SlotRing<T> {
    /// Fixed-size slot storage (`None` = vacant)
    slots: Box<[Option<T>]>,
    /// Sequence of the next slot to read
    head: u64,
    /// Sequence of the next slot to write
    tail: u64,
}

impl<T> SlotRing<T> {
    /// Creates an empty ring with `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. [`BoundedBuffer::new`](crate::BoundedBuffer::new)
    /// validates this and returns an error instead.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "SlotRing capacity must be non-zero");
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);

        Self {
            slots: slots.into_boxed_slice(),
            head: 0,
            tail: 0,
        }
    }

    /// Returns the number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of filled slots.
    #[inline]
    pub fn occupancy(&self) -> usize {
        (self.tail - self.head) as usize
    }

    /// Returns true if no slot is filled.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tail == self.head
    }

    /// Returns true if every slot is filled.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.occupancy() >= self.capacity()
    }

    /// Total number of items ever inserted.
    #[inline]
    pub fn produced(&self) -> u64 {
        self.tail
    }

    /// Total number of items ever removed.
    #[inline]
    pub fn consumed(&self) -> u64 {
        self.head
    }

    /// Slot index the next insert writes to.
    #[inline]
    pub fn tail_index(&self) -> usize {
        self.index(self.tail)
    }

    /// Slot index the next remove reads from.
    #[inline]
    pub fn head_index(&self) -> usize {
        self.index(self.head)
    }

    #[inline]
    fn index(&self, sequence: u64) -> usize {
        (sequence % self.slots.len() as u64) as usize
    }

    /// Writes `item` at the tail and returns the resulting occupancy.
    ///
    /// Returns the item back if the ring is full. Under the bounded-buffer
    /// protocol the caller holds an "empty slot" unit, so a full ring here
    /// means the protocol was broken.
    pub fn insert(&mut self, item: T) -> Result<usize, T> {
        if self.is_full() {
            return Err(item);
        }

        let idx = self.tail_index();
        self.slots[idx] = Some(item);

        let old_tail = self.tail;
        self.tail += 1;

        // INV-SEQ-01: tail advances by exactly one
        debug_assert_single_step!("tail", old_tail, self.tail);
        // INV-OCC-01: never above capacity
        debug_assert_bounded_occupancy!(self.occupancy(), self.capacity());

        Ok(self.occupancy())
    }

    /// Takes the item at the head and returns it with the resulting occupancy.
    ///
    /// Returns `None` if the ring is empty.
    pub fn remove_head(&mut self) -> Option<(T, usize)> {
        if self.is_empty() {
            return None;
        }

        let idx = self.head_index();
        let item = self.slots[idx].take()?;

        let new_head = self.head + 1;
        // INV-OCC-01: never below zero
        debug_assert_head_not_past_tail!(new_head, self.tail);
        // INV-SEQ-01: head advances by exactly one
        debug_assert_single_step!("head", self.head, new_head);
        self.head = new_head;

        Some((item, self.occupancy()))
    }

    /// Iterates the resident items from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (self.head..self.tail).filter_map(move |seq| self.slots[self.index(seq)].as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_slot_order() {
        let mut ring = SlotRing::new(3);
        assert_eq!(ring.insert(1), Ok(1));
        assert_eq!(ring.insert(2), Ok(2));
        assert_eq!(ring.remove_head(), Some((1, 1)));
        assert_eq!(ring.insert(3), Ok(2));
        assert_eq!(ring.insert(4), Ok(3));
        assert_eq!(ring.remove_head(), Some((2, 2)));
        assert_eq!(ring.remove_head(), Some((3, 1)));
        assert_eq!(ring.remove_head(), Some((4, 0)));
        assert_eq!(ring.remove_head(), None);
    }

    #[test]
    fn test_full_and_empty_are_distinct() {
        let mut ring = SlotRing::new(2);
        assert!(ring.is_empty());
        ring.insert('a').unwrap();
        ring.insert('b').unwrap();
        assert!(ring.is_full());
        assert_eq!(ring.occupancy(), 2);
        // Both indices wrapped to the same slot, occupancy still reads full
        assert_eq!(ring.head_index(), ring.tail_index());
    }

    #[test]
    fn test_insert_into_full_returns_item() {
        let mut ring = SlotRing::new(1);
        ring.insert(10).unwrap();
        assert_eq!(ring.insert(11), Err(11));
        assert_eq!(ring.occupancy(), 1);
        assert_eq!(ring.produced(), 1);
    }

    #[test]
    fn test_indices_wrap_modulo_capacity() {
        let mut ring = SlotRing::new(3);
        for i in 0..10 {
            assert_eq!(ring.tail_index(), i % 3);
            ring.insert(i).unwrap();
            assert_eq!(ring.head_index(), i % 3);
            ring.remove_head().unwrap();
        }
        assert_eq!(ring.produced(), 10);
        assert_eq!(ring.consumed(), 10);
    }

    #[test]
    fn test_iter_resident_items() {
        let mut ring = SlotRing::new(4);
        for i in 0..6 {
            ring.insert(i).unwrap();
            if i % 2 == 1 {
                ring.remove_head();
            }
        }
        let resident: Vec<_> = ring.iter().copied().collect();
        assert_eq!(resident, vec![3, 4, 5]);
        assert_eq!(ring.produced() - ring.consumed(), resident.len() as u64);
    }

    #[test]
    #[should_panic(expected = "capacity must be non-zero")]
    fn test_zero_capacity_panics() {
        let _ = SlotRing::<u8>::new(0);
    }
}
