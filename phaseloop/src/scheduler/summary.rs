use super::state::{Phase, Source};

use std::fmt;
use std::time::Duration;

/// One side effect recorded through [`PhaseScheduler::log`].
///
/// [`PhaseScheduler::log`]: crate::PhaseScheduler::log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Tick during which the entry was recorded; `0` before the first tick.
    pub tick: u64,

    /// Phase the loop was in.
    pub phase: Phase,

    /// Kind of callback that produced the entry.
    pub source: Source,

    /// Virtual time of the record.
    pub at: Duration,

    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[tick {:>3} | {:>8?} | {:<7} | {:<10}] {}",
            self.tick, self.at, self.phase, self.source, self.message
        )
    }
}

/// Result of a run: the ordered side-effect log and where the loop ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Side effects in the order they happened.
    pub log: Vec<LogEntry>,

    /// Number of ticks the run took.
    pub ticks: u64,

    /// Virtual time when the run stopped.
    pub clock: Duration,
}

impl RunSummary {
    /// The logged messages, in order.
    pub fn messages(&self) -> Vec<&str> {
        self.log.iter().map(|entry| entry.message.as_str()).collect()
    }

    /// Position of the first entry with `message`, if any.
    pub fn position(&self, message: &str) -> Option<usize> {
        self.log.iter().position(|entry| entry.message == message)
    }

    /// The first entry with `message`, if any.
    pub fn find(&self, message: &str) -> Option<&LogEntry> {
        self.log.iter().find(|entry| entry.message == message)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.log {
            writeln!(f, "{entry}")?;
        }

        writeln!(f, "-- idle after {} tick(s) at {:?}", self.ticks, self.clock)
    }
}
