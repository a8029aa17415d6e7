//! Cashier (producer) and packer (consumer) loops.

use crate::config::DelayRange;
use crate::event::{Action, Event, EventSink, Role};
use crate::item::Item;
use crate::state::SharedState;
use boundedbuf_rs::Handoff;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use std::thread;

/// What a worker did over the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    /// Worker role.
    pub role: Role,
    /// Worker id (1-based within its role).
    pub id: usize,
    /// Items placed (cashier) or taken (packer).
    pub handled: u64,
}

/// Everything a worker thread needs.
struct WorkerCtx {
    id: usize,
    state: Arc<SharedState>,
    sink: Arc<dyn EventSink>,
    delay: DelayRange,
    rng: SmallRng,
}

impl WorkerCtx {
    fn new(
        role: Role,
        id: usize,
        state: Arc<SharedState>,
        sink: Arc<dyn EventSink>,
        delay: DelayRange,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            // Distinct, reproducible stream per worker
            Some(seed) => SmallRng::seed_from_u64(seed ^ stream_key(role, id)),
            None => SmallRng::from_entropy(),
        };
        Self {
            id,
            state,
            sink,
            delay,
            rng,
        }
    }

    fn pause(&mut self) {
        let delay = self.delay.sample(&mut self.rng);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    fn report(&self, role: Role, action: Action, item: Option<Item>, occupancy: usize) {
        let capacity = self.state.buffer().capacity();
        self.sink
            .record(&Event::now(role, self.id, action, item, occupancy, capacity));
    }

    fn report_handoff<V>(&self, role: Role, action: Action, item: Item, handoff: &Handoff<'_, V>) {
        let capacity = self.state.buffer().capacity();
        let event = Event::now(role, self.id, action, Some(item), handoff.occupancy(), capacity)
            .with_sequence(handoff.sequence());
        self.sink.record(&event);
    }
}

fn stream_key(role: Role, id: usize) -> u64 {
    let salt: u64 = match role {
        Role::Cashier => 1234,
        Role::Packer => 5678,
    };
    salt.wrapping_mul(id as u64 + 1)
}

/// Producer: scans items and places them in the packing area.
///
/// Loop: scan delay → check run flag → scan item → wait for a vacant slot →
/// re-check run flag → critical section → report → signal packers.
pub struct Cashier {
    ctx: WorkerCtx,
}

impl Cashier {
    /// Creates cashier `id`.
    pub fn new(
        id: usize,
        state: Arc<SharedState>,
        sink: Arc<dyn EventSink>,
        scan_delay: DelayRange,
        seed: Option<u64>,
    ) -> Self {
        Self {
            ctx: WorkerCtx::new(Role::Cashier, id, state, sink, scan_delay, seed),
        }
    }

    /// Runs until the run flag clears.
    pub fn run(mut self) -> WorkerStats {
        let mut handled = 0;
        let state = Arc::clone(&self.ctx.state);
        let buffer = state.buffer();

        while state.is_active() {
            self.ctx.pause();
            if !state.is_active() {
                break;
            }

            let item = Item::random(&mut self.ctx.rng);
            let slot = buffer.reserve_slot();

            if !state.is_active() {
                // Dropping the permit hands the vacant slot back
                drop(slot);
                break;
            }

            let Ok(placed) = buffer.insert(slot, item) else {
                break;
            };
            self.ctx
                .report_handoff(Role::Cashier, Action::Placed, item, &placed);
            placed.publish();
            handled += 1;
        }

        let occupancy = buffer.occupancy();
        self.ctx.report(Role::Cashier, Action::Stopped, None, occupancy);
        tracing::debug!(cashier = self.ctx.id, handled, "cashier finished");

        WorkerStats {
            role: Role::Cashier,
            id: self.ctx.id,
            handled,
        }
    }
}

/// Consumer: takes items from the packing area and packs them.
///
/// Loop: wait for a filled slot → check run flag → critical section →
/// report → signal cashiers → pack delay.
pub struct Packer {
    ctx: WorkerCtx,
}

impl Packer {
    /// Creates packer `id`.
    pub fn new(
        id: usize,
        state: Arc<SharedState>,
        sink: Arc<dyn EventSink>,
        pack_delay: DelayRange,
        seed: Option<u64>,
    ) -> Self {
        Self {
            ctx: WorkerCtx::new(Role::Packer, id, state, sink, pack_delay, seed),
        }
    }

    /// Runs until the run flag clears.
    pub fn run(mut self) -> WorkerStats {
        let mut handled = 0;
        let state = Arc::clone(&self.ctx.state);
        let buffer = state.buffer();

        while state.is_active() {
            let ready = buffer.reserve_item();

            if !state.is_active() {
                // Dropping the permit keeps the item counted as available
                drop(ready);
                break;
            }

            let Some(taken) = buffer.remove(ready) else {
                break;
            };
            let item = *taken.value();
            self.ctx
                .report_handoff(Role::Packer, Action::Took, item, &taken);
            taken.publish();
            handled += 1;

            self.ctx.pause();
        }

        let occupancy = buffer.occupancy();
        self.ctx.report(Role::Packer, Action::Stopped, None, occupancy);
        tracing::debug!(packer = self.ctx.id, handled, "packer finished");

        WorkerStats {
            role: Role::Packer,
            id: self.ctx.id,
            handled,
        }
    }
}
