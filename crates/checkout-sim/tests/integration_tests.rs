//! End-to-end runs of the checkout simulation.

use checkout_sim::{
    Action, DelayRange, MemorySink, NullSink, Role, ShutdownCause, SimConfig, SimError,
    Simulation, WakePolicy,
};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn fast(duration_ms: u64) -> SimConfig {
    SimConfig::default()
        .with_duration(Duration::from_millis(duration_ms))
        .with_scan_delay(DelayRange::from_millis(1, 5))
        .with_pack_delay(DelayRange::from_millis(2, 8))
        .with_seed(42)
}

#[test]
fn test_default_shape_terminates_within_margin() {
    let started = Instant::now();
    let report = Simulation::new(fast(200), Arc::new(NullSink::new()))
        .unwrap()
        .run()
        .unwrap();

    // Duration plus at most one scan/pack delay per worker
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(report.cause, ShutdownCause::Timer);
    assert!(report.produced > 0);
    assert!(report.is_consistent());
}

#[test]
fn test_outstanding_matches_resident_after_join() {
    let sink = Arc::new(MemorySink::new());
    let report = Simulation::new(fast(150), sink.clone())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.outstanding(), report.resident as u64);
    assert_eq!(report.leftover.len(), report.resident);
    assert_eq!(sink.count(Action::Placed) as u64, report.produced);
    assert_eq!(sink.count(Action::Took) as u64, report.consumed);
}

#[test]
fn test_every_worker_reports_stop_once() {
    let sink = Arc::new(MemorySink::new());
    let report = Simulation::new(fast(100), sink.clone())
        .unwrap()
        .run()
        .unwrap();

    let stopped: Vec<_> = sink
        .events()
        .into_iter()
        .filter(|e| e.action == Action::Stopped)
        .map(|e| (e.role, e.worker_id))
        .collect();
    assert_eq!(stopped.len(), 5);
    for id in 1..=3 {
        assert!(stopped.contains(&(Role::Cashier, id)));
    }
    for id in 1..=2 {
        assert!(stopped.contains(&(Role::Packer, id)));
    }
    assert_eq!(report.workers.len(), 5);
}

#[test]
fn test_observed_occupancy_never_exceeds_capacity() {
    let sink = Arc::new(MemorySink::new());
    let config = fast(150).with_capacity(2).with_producers(4).with_consumers(1);
    Simulation::new(config, sink.clone()).unwrap().run().unwrap();

    assert!(sink.events().iter().all(|e| e.occupancy <= 2 && e.capacity == 2));
}

#[test]
fn test_capacity_one_alternates() {
    let sink = Arc::new(MemorySink::new());
    let config = fast(150)
        .with_capacity(1)
        .with_producers(2)
        .with_consumers(2)
        .with_scan_delay(DelayRange::zero())
        .with_pack_delay(DelayRange::zero());
    let report = Simulation::new(config, sink.clone()).unwrap().run().unwrap();
    assert!(report.is_consistent());

    let mut placed = BTreeMap::new();
    let mut took = BTreeMap::new();
    for e in sink.events() {
        let Some(seq) = e.sequence else { continue };
        // Totals inside the critical section follow from position + occupancy
        match e.action {
            Action::Placed => {
                let consumed_before = seq + 1 - e.occupancy as u64;
                assert_eq!(consumed_before, seq, "insert #{seq} landed on an unconsumed item");
                assert!(placed.insert(seq, e.item).is_none());
            }
            Action::Took => {
                let produced_at = seq + 1 + e.occupancy as u64;
                assert_eq!(produced_at, seq + 1, "remove #{seq} saw a second resident item");
                assert!(took.insert(seq, e.item).is_none());
            }
            Action::Stopped => unreachable!("stop events carry no position"),
        }
    }

    assert!(!took.is_empty());
    assert_eq!(placed.len() as u64, report.produced);
    assert_eq!(took.len() as u64, report.consumed);
    // Positions are dense and every removal returns the item placed at it
    assert!(placed.keys().copied().eq(0..report.produced));
    assert!(took.keys().copied().eq(0..report.consumed));
    for (seq, item) in &took {
        assert_eq!(placed.get(seq), Some(item));
    }
}

#[test]
fn test_packers_parked_on_empty_area_are_released() {
    // Cashiers are far slower than the run: packers block on an empty area
    // and only the forced releases can wake them.
    let config = fast(50)
        .with_scan_delay(DelayRange::from_millis(300, 300))
        .with_producers(1)
        .with_consumers(3);
    let started = Instant::now();
    let report = Simulation::new(config, Arc::new(NullSink::new()))
        .unwrap()
        .run()
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(report.produced, 0);
    assert_eq!(report.consumed, 0);
}

#[test]
fn test_cashiers_parked_on_full_area_are_released() {
    // Packers are far slower than the run: cashiers fill the area and block.
    let config = fast(80)
        .with_scan_delay(DelayRange::zero())
        .with_pack_delay(DelayRange::from_millis(400, 400))
        .with_consumers(1);
    let started = Instant::now();
    let report = Simulation::new(config, Arc::new(NullSink::new()))
        .unwrap()
        .run()
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(report.resident <= report.capacity);
    assert!(report.is_consistent());
}

#[test]
fn test_per_role_wake_policy_terminates() {
    let config = fast(100)
        .with_wake_policy(WakePolicy::PerRole)
        .with_capacity(1)
        .with_producers(4)
        .with_consumers(4);
    let report = Simulation::new(config, Arc::new(NullSink::new()))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(report.wake_policy, WakePolicy::PerRole);
    assert!(report.is_consistent());
}

#[test]
fn test_signal_ends_run_before_timer() {
    let sim = Simulation::new(fast(60_000), Arc::new(NullSink::new())).unwrap();
    let signal = sim.signal();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        signal.shutdown()
    });

    let started = Instant::now();
    let report = sim.run().unwrap();
    assert!(stopper.join().unwrap());
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(report.cause, ShutdownCause::Signal);
    assert!(report.is_consistent());
}

#[test]
fn test_invalid_config_is_rejected_before_start() {
    let err = Simulation::new(fast(10).with_consumers(0), Arc::new(NullSink::new()))
        .err()
        .unwrap();
    assert!(err.is_config());
    assert!(matches!(err, SimError::Config(_)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_any_shape_is_consistent(
        capacity in 1usize..6,
        producers in 1usize..4,
        consumers in 1usize..4,
        seed in any::<u64>(),
    ) {
        let config = SimConfig::default()
            .with_capacity(capacity)
            .with_producers(producers)
            .with_consumers(consumers)
            .with_duration(Duration::from_millis(30))
            .with_scan_delay(DelayRange::from_millis(0, 3))
            .with_pack_delay(DelayRange::from_millis(0, 3))
            .with_seed(seed);
        let report = Simulation::new(config, Arc::new(NullSink::new()))
            .unwrap()
            .run()
            .unwrap();

        prop_assert!(report.is_consistent());
        prop_assert!(report.resident <= capacity);
        prop_assert_eq!(report.workers.len(), producers + consumers);
    }
}
