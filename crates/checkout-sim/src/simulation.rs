//! Spawning, joining and accounting for one simulation run.

use crate::config::SimConfig;
use crate::error::SimError;
use crate::event::EventSink;
use crate::report::SimReport;
use crate::shutdown::{ShutdownCause, ShutdownCoordinator, ShutdownSignal};
use crate::state::SharedState;
use crate::worker::{Cashier, Packer, WorkerStats};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// One configured run: `producers` cashiers, `consumers` packers and a
/// shutdown timer sharing one packing area.
///
/// # Example
///
/// ```
/// use checkout_sim::{DelayRange, NullSink, SimConfig, Simulation};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let config = SimConfig::default()
///     .with_duration(Duration::from_millis(50))
///     .with_scan_delay(DelayRange::from_millis(1, 5))
///     .with_pack_delay(DelayRange::from_millis(1, 5));
///
/// let report = Simulation::new(config, Arc::new(NullSink::new()))
///     .unwrap()
///     .run()
///     .unwrap();
/// assert!(report.is_consistent());
/// ```
pub struct Simulation {
    config: SimConfig,
    state: Arc<SharedState>,
    sink: Arc<dyn EventSink>,
}

impl Simulation {
    /// Validates `config` and builds the shared state.
    pub fn new(config: SimConfig, sink: Arc<dyn EventSink>) -> Result<Self, SimError> {
        let state = Arc::new(SharedState::new(&config)?);
        Ok(Self {
            config,
            state,
            sink,
        })
    }

    /// Handle for ending the run before the timer does.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal::new(Arc::clone(&self.state))
    }

    /// The state shared with the workers.
    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    /// The run configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Starts every thread, waits for all of them and reports the totals.
    ///
    /// If a thread cannot be created, the threads already running are shut
    /// down and joined before the error is returned.
    pub fn run(self) -> Result<SimReport, SimError> {
        let started = Instant::now();
        tracing::info!(
            capacity = self.config.capacity,
            producers = self.config.producers,
            consumers = self.config.consumers,
            duration = ?self.config.duration,
            sink = self.sink.name(),
            "starting simulation"
        );

        let coordinator = ShutdownCoordinator::new(Arc::clone(&self.state), self.config.duration);
        let timer = spawn("shutdown-timer".to_string(), move || coordinator.run())?;

        let mut workers: Vec<(String, JoinHandle<WorkerStats>)> =
            Vec::with_capacity(self.config.workers());

        for id in 1..=self.config.producers {
            let cashier = Cashier::new(
                id,
                Arc::clone(&self.state),
                Arc::clone(&self.sink),
                self.config.scan_delay,
                self.config.seed,
            );
            let name = format!("cashier-{id}");
            match spawn(name.clone(), move || cashier.run()) {
                Ok(handle) => workers.push((name, handle)),
                Err(e) => return Err(self.abort(timer, workers, e)),
            }
        }

        for id in 1..=self.config.consumers {
            let packer = Packer::new(
                id,
                Arc::clone(&self.state),
                Arc::clone(&self.sink),
                self.config.pack_delay,
                self.config.seed,
            );
            let name = format!("packer-{id}");
            match spawn(name.clone(), move || packer.run()) {
                Ok(handle) => workers.push((name, handle)),
                Err(e) => return Err(self.abort(timer, workers, e)),
            }
        }

        // Timer first, then every worker
        let cause = timer.join().map_err(|_| SimError::WorkerPanicked {
            thread: "shutdown-timer".to_string(),
        });
        if cause.is_err() {
            // Workers only stop once the flag clears
            self.state.shut_down();
        }

        let mut stats = Vec::with_capacity(workers.len());
        let mut panicked = None;
        for (name, handle) in workers {
            match handle.join() {
                Ok(s) => stats.push(s),
                Err(_) => {
                    tracing::error!(thread = %name, "worker panicked");
                    panicked.get_or_insert(SimError::WorkerPanicked { thread: name });
                }
            }
        }

        let cause = cause?;
        if let Some(err) = panicked {
            return Err(err);
        }

        let totals = self.state.totals();
        let leftover = self.state.buffer().snapshot();
        tracing::info!(
            produced = totals.produced,
            consumed = totals.consumed,
            resident = totals.resident,
            elapsed = ?started.elapsed(),
            "simulation finished"
        );

        Ok(SimReport::new(
            &self.config,
            cause,
            started.elapsed(),
            totals,
            stats,
            leftover,
        ))
    }

    /// Stops and joins everything started so far after a spawn failure.
    fn abort(
        &self,
        timer: JoinHandle<ShutdownCause>,
        workers: Vec<(String, JoinHandle<WorkerStats>)>,
        err: SimError,
    ) -> SimError {
        tracing::error!(error = %err, "startup failed, stopping started threads");
        self.state.shut_down();
        let _ = timer.join();
        for (_, handle) in workers {
            let _ = handle.join();
        }
        err
    }
}

fn spawn<T, F>(name: String, f: F) -> Result<JoinHandle<T>, SimError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(f)
        .map_err(|source| SimError::Spawn {
            thread: name,
            source,
        })
}
