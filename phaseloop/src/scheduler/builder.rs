use super::PhaseScheduler;
use crate::time::{Clock, MAX_DELAY, VirtualClock};

use std::time::Duration;

/// Tunables of one scheduler instance.
pub(crate) struct SchedulerConfig {
    /// Maximum number of microtask callbacks in one drain.
    pub(crate) microtask_limit: usize,

    /// Maximum number of ticks in one `run`.
    pub(crate) max_ticks: u64,

    /// Maximum virtual time one poll-phase block may skip.
    pub(crate) poll_budget: Duration,

    /// Maximum number of I/O callbacks executed by one poll phase.
    pub(crate) poll_callback_limit: usize,

    /// Minimum virtual time between registering and firing a timer.
    pub(crate) timer_resolution: Duration,

    /// Virtual time elapsed between the top-level script and the first tick.
    pub(crate) startup_cost: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            microtask_limit: 10_000,
            max_ticks: 1_000_000,
            poll_budget: Duration::from_secs(3600),
            poll_callback_limit: 1024,
            timer_resolution: Duration::from_millis(1),
            startup_cost: Duration::ZERO,
        }
    }
}

/// Builder for configuring and creating a scheduler.
///
/// `SchedulerBuilder` allows customizing the loop's bounds and timing model
/// before constructing a [`PhaseScheduler`].
///
/// # Examples
///
/// ```rust
/// use phaseloop::SchedulerBuilder;
///
/// let scheduler = SchedulerBuilder::new()
///     .microtask_limit(64)
///     .max_ticks(1_000)
///     .build();
/// # drop(scheduler);
/// ```
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    clock: Box<dyn Clock>,
}

impl SchedulerBuilder {
    /// Creates a new `SchedulerBuilder` with default configuration.
    ///
    /// Defaults: 10 000 microtasks per drain, 1 000 000 ticks per run, a
    /// one hour poll budget, 1 024 I/O callbacks per poll phase, 1 ms timer
    /// resolution, no startup cost and a [`VirtualClock`] at zero.
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
            clock: Box::new(VirtualClock::new()),
        }
    }

    /// Sets how many microtask callbacks one drain may execute before the
    /// run is halted with [`Error::Starvation`](crate::Error::Starvation).
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn microtask_limit(mut self, n: usize) -> Self {
        assert!(n > 0, "microtask_limit must be > 0");

        self.config.microtask_limit = n;
        self
    }

    /// Sets how many ticks one `run` may take before it is halted with
    /// [`Error::TickLimitExceeded`](crate::Error::TickLimitExceeded).
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn max_ticks(mut self, n: u64) -> Self {
        assert!(n > 0, "max_ticks must be > 0");

        self.config.max_ticks = n;
        self
    }

    /// Sets the largest clock jump a blocking poll phase performs before
    /// re-checking its queues. [`Duration::MAX`] lifts the bound.
    ///
    /// # Panics
    ///
    /// Panics if `budget` is zero.
    pub fn poll_budget(mut self, budget: Duration) -> Self {
        assert!(!budget.is_zero(), "poll_budget must be > 0");

        self.config.poll_budget = budget;
        self
    }

    /// Sets how many I/O callbacks one poll phase runs. The rest is carried
    /// over to the next tick's pending phase.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn poll_callback_limit(mut self, n: usize) -> Self {
        assert!(n > 0, "poll_callback_limit must be > 0");

        self.config.poll_callback_limit = n;
        self
    }

    /// Sets the minimum virtual time between registering a timer and
    /// firing it.
    ///
    /// # Panics
    ///
    /// Panics if `resolution` is zero or exceeds [`MAX_DELAY`].
    pub fn timer_resolution(mut self, resolution: Duration) -> Self {
        assert!(!resolution.is_zero(), "timer_resolution must be > 0");
        assert!(
            resolution <= MAX_DELAY,
            "timer_resolution must not exceed MAX_DELAY"
        );

        self.config.timer_resolution = resolution;
        self
    }

    /// Sets the virtual time that elapses between the end of the top-level
    /// script and the first tick of every `run`.
    ///
    /// Every timer registered by the script whose deadline falls within the
    /// cost is already due at the first tick, so it fires before the
    /// script's immediates. In particular, with a cost of at least the timer
    /// resolution a top-level 0 ms timer beats a top-level immediate; with no
    /// cost the immediate wins.
    pub fn startup_cost(mut self, cost: Duration) -> Self {
        self.config.startup_cost = cost;
        self
    }

    /// Replaces the default [`VirtualClock`].
    pub fn clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    /// Builds the scheduler with the configured options.
    pub fn build(self) -> PhaseScheduler {
        PhaseScheduler::with_config(self.config, self.clock)
    }
}

impl Default for SchedulerBuilder {
    /// Creates a default `SchedulerBuilder`.
    fn default() -> Self {
        Self::new()
    }
}
