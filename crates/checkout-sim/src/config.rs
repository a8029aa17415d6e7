//! Configuration for the checkout simulation.

use crate::error::ConfigError;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;

/// Inclusive range a randomized delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DelayRange {
    /// Shortest delay.
    pub min: Duration,
    /// Longest delay.
    pub max: Duration,
}

impl DelayRange {
    /// Creates a range from millisecond bounds.
    pub const fn from_millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }

    /// A range that never sleeps.
    pub const fn zero() -> Self {
        Self::from_millis(0, 0)
    }

    /// Draws a delay uniformly from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    fn is_inverted(&self) -> bool {
        self.min > self.max
    }
}

/// How many forced releases the shutdown timer sends to each semaphore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WakePolicy {
    /// `producers + consumers` releases on both semaphores.
    #[default]
    AllWorkers,
    /// `producers` releases on "empty slots", `consumers` on "filled slots":
    /// only the semaphore each role can park on.
    PerRole,
}

impl WakePolicy {
    /// Forced releases as `(empty_slots, filled_slots)`.
    pub fn releases(self, producers: usize, consumers: usize) -> (usize, usize) {
        match self {
            Self::AllWorkers => {
                let all = producers + consumers;
                (all, all)
            }
            Self::PerRole => (producers, consumers),
        }
    }
}

/// Parameters of one simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimConfig {
    /// Slots in the packing area.
    ///
    /// Default: 5
    pub capacity: usize,

    /// Cashier (producer) threads.
    ///
    /// Default: 3
    pub producers: usize,

    /// Packer (consumer) threads.
    ///
    /// Default: 2
    pub consumers: usize,

    /// How long the shutdown timer waits before ending the run.
    ///
    /// Default: 60s
    pub duration: Duration,

    /// Time a cashier spends scanning each item.
    ///
    /// Default: 200ms..=1000ms
    pub scan_delay: DelayRange,

    /// Time a packer spends packing each item.
    ///
    /// Default: 400ms..=1600ms
    pub pack_delay: DelayRange,

    /// Forced-release policy at shutdown.
    pub wake_policy: WakePolicy,

    /// Seed for the per-worker RNGs. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            producers: 3,
            consumers: 2,
            duration: Duration::from_secs(60),
            scan_delay: DelayRange::from_millis(200, 1000),
            pack_delay: DelayRange::from_millis(400, 1600),
            wake_policy: WakePolicy::AllWorkers,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Short run with faster workers, for demos.
    pub fn quick() -> Self {
        Self {
            duration: Duration::from_secs(5),
            scan_delay: DelayRange::from_millis(50, 250),
            pack_delay: DelayRange::from_millis(100, 400),
            ..Self::default()
        }
    }

    /// Sets the number of slots.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the number of cashiers.
    pub fn with_producers(mut self, producers: usize) -> Self {
        self.producers = producers;
        self
    }

    /// Sets the number of packers.
    pub fn with_consumers(mut self, consumers: usize) -> Self {
        self.consumers = consumers;
        self
    }

    /// Sets the run duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the scan delay range.
    pub fn with_scan_delay(mut self, delay: DelayRange) -> Self {
        self.scan_delay = delay;
        self
    }

    /// Sets the pack delay range.
    pub fn with_pack_delay(mut self, delay: DelayRange) -> Self {
        self.pack_delay = delay;
        self
    }

    /// Sets the forced-release policy.
    pub fn with_wake_policy(mut self, policy: WakePolicy) -> Self {
        self.wake_policy = policy;
        self
    }

    /// Makes the run reproducible (up to thread scheduling).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Total worker threads.
    #[inline]
    pub fn workers(&self) -> usize {
        self.producers + self.consumers
    }

    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.producers == 0 {
            return Err(ConfigError::NoProducers);
        }
        if self.consumers == 0 {
            return Err(ConfigError::NoConsumers);
        }
        for (which, range) in [("scan", self.scan_delay), ("pack", self.pack_delay)] {
            if range.is_inverted() {
                return Err(ConfigError::InvertedDelay {
                    which,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }
}

/// Parsed command line of the `checkout` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    /// Simulation parameters.
    pub config: SimConfig,
    /// Print the final report as JSON.
    pub json: bool,
    /// Suppress per-item event lines.
    pub quiet: bool,
    /// Send events through `tracing` instead of stdout lines.
    pub trace_events: bool,
    /// Print usage and exit.
    pub help: bool,
}

/// Usage text for the `checkout` binary.
pub const USAGE: &str = "\
usage: checkout [options]

  --capacity N        slots in the packing area (default 5)
  --producers N       cashier threads (default 3)
  --consumers N       packer threads (default 2)
  --duration SECS     run time in seconds, fractions allowed (default 60)
  --seed N            seed the worker RNGs
  --quick             5 second run with faster workers
  --per-role-wake     only wake the semaphore each role can block on
  --json              print the final report as JSON
  --quiet             do not print per-item events
  --trace-events      emit events as tracing records (see RUST_LOG)
  -h, --help          show this help";

impl CliArgs {
    /// Parses flags (without the program name).
    ///
    /// `--quick` resets the base configuration, so it applies before any
    /// other flag regardless of its position.
    pub fn parse<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();

        let mut config = if args.iter().any(|a| a == "--quick") {
            SimConfig::quick()
        } else {
            SimConfig::default()
        };
        let mut json = false;
        let mut quiet = false;
        let mut trace_events = false;
        let mut help = false;

        let mut iter = args.iter();
        while let Some(flag) = iter.next() {
            match flag.as_str() {
                "--quick" => {}
                "--json" => json = true,
                "--quiet" => quiet = true,
                "--trace-events" => trace_events = true,
                "--per-role-wake" => config.wake_policy = WakePolicy::PerRole,
                "-h" | "--help" => help = true,
                "--capacity" => config.capacity = parse_value(flag, iter.next())?,
                "--producers" => config.producers = parse_value(flag, iter.next())?,
                "--consumers" => config.consumers = parse_value(flag, iter.next())?,
                "--seed" => config.seed = Some(parse_value(flag, iter.next())?),
                "--duration" => {
                    let secs: f64 = parse_value(flag, iter.next())?;
                    config.duration = Duration::try_from_secs_f64(secs).map_err(|_| {
                        ConfigError::InvalidValue {
                            flag: flag.clone(),
                            value: secs.to_string(),
                        }
                    })?;
                }
                other => return Err(ConfigError::UnknownFlag(other.to_string())),
            }
        }

        Ok(Self {
            config,
            json,
            quiet,
            trace_events,
            help,
        })
    }
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> Result<T, ConfigError> {
    let value = value.ok_or_else(|| ConfigError::MissingValue(flag.to_string()))?;
    value.parse().map_err(|_| ConfigError::InvalidValue {
        flag: flag.to_string(),
        value: value.clone(),
    })
}
