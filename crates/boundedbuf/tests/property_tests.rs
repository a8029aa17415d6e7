//! Property-based tests for the slot ring and the bounded buffer.
//!
//! Random operation sequences are replayed against a `VecDeque` model; after
//! every step the accounting invariants must hold:
//!
//! - `0 ≤ occupancy ≤ capacity`
//! - `produced - consumed == occupancy`
//! - items come out in insertion order
//! - at rest, `empty + occupancy == capacity` and `full == occupancy`

#![cfg(not(feature = "loom"))]

use boundedbuf_rs::{BoundedBuffer, SlotRing};
use proptest::prelude::*;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
enum Op {
    Insert(u32),
    Remove,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![any::<u32>().prop_map(Op::Insert), Just(Op::Remove)]
}

proptest! {
    /// The ring agrees with a queue model and its accounting never drifts.
    #[test]
    fn prop_ring_matches_model(
        capacity in 1usize..16,
        ops in prop::collection::vec(op_strategy(), 0..200),
    ) {
        let mut ring = SlotRing::new(capacity);
        let mut model = VecDeque::new();

        for op in ops {
            match op {
                Op::Insert(v) => {
                    let result = ring.insert(v);
                    if model.len() == capacity {
                        prop_assert_eq!(result, Err(v));
                    } else {
                        model.push_back(v);
                        prop_assert_eq!(result, Ok(model.len()));
                    }
                }
                Op::Remove => {
                    let expected = model.pop_front().map(|v| (v, model.len()));
                    prop_assert_eq!(ring.remove_head(), expected);
                }
            }

            prop_assert!(ring.occupancy() <= ring.capacity());
            prop_assert_eq!(ring.occupancy(), model.len());
            prop_assert_eq!(ring.produced() - ring.consumed(), ring.occupancy() as u64);
        }

        let resident: Vec<_> = ring.iter().copied().collect();
        let expected: Vec<_> = model.into_iter().collect();
        prop_assert_eq!(resident, expected);
    }

    /// Head and tail indices always stay within the slot array.
    #[test]
    fn prop_indices_in_range(
        capacity in 1usize..8,
        ops in prop::collection::vec(op_strategy(), 0..100),
    ) {
        let mut ring = SlotRing::new(capacity);
        for op in ops {
            match op {
                Op::Insert(v) => { let _ = ring.insert(v); }
                Op::Remove => { let _ = ring.remove_head(); }
            }
            prop_assert!(ring.head_index() < capacity);
            prop_assert!(ring.tail_index() < capacity);
            prop_assert_eq!(
                (ring.head_index() + ring.occupancy()) % capacity,
                ring.tail_index()
            );
        }
    }

    /// At rest the two semaphore counts mirror the ring occupancy.
    #[test]
    fn prop_semaphores_mirror_occupancy(
        capacity in 1usize..10,
        ops in prop::collection::vec(op_strategy(), 0..100),
    ) {
        let buffer = BoundedBuffer::new(capacity).unwrap();

        for op in ops {
            match op {
                Op::Insert(v) => { let _ = buffer.try_put(v); }
                Op::Remove => { let _ = buffer.try_take(); }
            }

            let occupancy = buffer.occupancy();
            prop_assert_eq!(buffer.empty_slots().value() as usize + occupancy, capacity);
            prop_assert_eq!(buffer.filled_slots().value() as usize, occupancy);
            prop_assert!(buffer.totals().is_consistent());
        }
    }
}
