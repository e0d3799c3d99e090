use crate::scheduler::RunSummary;

use std::time::Duration;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the scheduler and its handles.
///
/// Scheduling calls only ever fail with [`Error::InvalidArgument`].
/// The halting variants are surfaced from [`PhaseScheduler::run`] wrapped in
/// a [`RunError`]. [`Error::AlreadyFired`] and [`Error::AlreadyCancelled`] are
/// informational and safe to ignore.
///
/// [`PhaseScheduler::run`]: crate::PhaseScheduler::run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A scheduling parameter was rejected before anything was queued.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The microtask lanes did not empty within the configured bound.
    #[error("microtask queue did not drain within {limit} callbacks")]
    Starvation { limit: usize },

    /// The loop kept finding work for more ticks than allowed.
    #[error("event loop exceeded {limit} ticks")]
    TickLimitExceeded { limit: u64 },

    /// Only externally completed I/O remains and nothing can complete it.
    #[error("event loop stalled with {pending_io} I/O completion(s) never marked ready")]
    Stalled { pending_io: usize },

    /// `run` was called while the scheduler was already running.
    #[error("scheduler is already running")]
    Reentrant,

    /// The entry behind the handle has already executed.
    #[error("entry has already fired")]
    AlreadyFired,

    /// The entry behind the handle was cancelled earlier.
    #[error("entry has already been cancelled")]
    AlreadyCancelled,
}

impl Error {
    pub(crate) fn delay_out_of_range(delay: Duration, max: Duration) -> Self {
        Error::InvalidArgument(format!("delay {delay:?} exceeds the maximum of {max:?}"))
    }
}

/// A run that halted before the loop became idle.
///
/// Carries everything observed up to the failure so the ordered log is
/// never lost.
#[derive(Debug, thiserror::Error)]
#[error("event loop halted at tick {}: {error}", .summary.ticks)]
pub struct RunError {
    /// Why the loop stopped.
    #[source]
    pub error: Error,

    /// Side effects recorded before the halt.
    pub summary: RunSummary,
}

impl RunError {
    pub(crate) fn new(error: Error, summary: RunSummary) -> Self {
        Self { error, summary }
    }
}
