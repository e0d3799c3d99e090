use crate::callback::OnceFn;
use crate::handle::{SharedState, is_live};

use std::collections::BTreeMap;
use std::time::Duration;

/// A simulated I/O completion registered with the scheduler.
///
/// An `IoEntry` is either time-driven (`ready_at` is set at registration
/// from the simulated latency) or externally driven (`ready_at` stays
/// `None` until a [`CompletionSink`](crate::CompletionSink) marks it ready).
pub(crate) struct IoEntry {
    /// Registration order.
    pub(crate) seq: u64,

    /// Virtual instant from which the completion may be polled.
    pub(crate) ready_at: Option<Duration>,

    pub(crate) callback: OnceFn,

    /// Lifecycle cell shared with the [`IoHandle`](crate::IoHandle).
    pub(crate) state: SharedState,
}

impl IoEntry {
    fn is_ready(&self, now: Duration) -> bool {
        self.ready_at.is_some_and(|at| at <= now)
    }
}

/// Outstanding I/O completions, keyed by registration order.
pub(crate) struct IoQueue {
    entries: BTreeMap<u64, IoEntry>,
}

impl IoQueue {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, entry: IoEntry) {
        self.entries.insert(entry.seq, entry);
    }

    /// Makes the completion `seq` pollable from `now` on.
    ///
    /// Returns `false` if no such completion is waiting, for instance
    /// because it has already been handed to the poll phase.
    pub(crate) fn mark_ready(&mut self, seq: u64, now: Duration) -> bool {
        match self.entries.get_mut(&seq) {
            Some(entry) => {
                if entry.ready_at.is_none_or(|at| at > now) {
                    entry.ready_at = Some(now);
                }
                true
            }
            None => false,
        }
    }

    /// Removes and returns every completion ready at `now`, ordered by
    /// `(ready_at, seq)`. Cancelled completions stay behind for
    /// [`take_cancelled`](Self::take_cancelled).
    pub(crate) fn take_ready(&mut self, now: Duration) -> Vec<IoEntry> {
        let seqs: Vec<u64> = self
            .entries
            .values()
            .filter(|entry| is_live(&entry.state) && entry.is_ready(now))
            .map(|entry| entry.seq)
            .collect();

        let mut ready: Vec<IoEntry> = seqs
            .into_iter()
            .filter_map(|seq| self.entries.remove(&seq))
            .collect();

        ready.sort_by_key(|entry| (entry.ready_at, entry.seq));
        ready
    }

    /// Earliest instant at which a time-driven completion becomes ready.
    pub(crate) fn next_ready_at(&self) -> Option<Duration> {
        self.entries
            .values()
            .filter(|entry| is_live(&entry.state))
            .filter_map(|entry| entry.ready_at)
            .min()
    }

    pub(crate) fn has_live(&self) -> bool {
        self.entries.values().any(|entry| is_live(&entry.state))
    }

    /// Number of live completions waiting for an external `mark_ready`.
    pub(crate) fn awaiting_completion(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| is_live(&entry.state) && entry.ready_at.is_none())
            .count()
    }

    /// Removes every cancelled completion.
    pub(crate) fn take_cancelled(&mut self) -> Vec<IoEntry> {
        let seqs: Vec<u64> = self
            .entries
            .values()
            .filter(|entry| !is_live(&entry.state))
            .map(|entry| entry.seq)
            .collect();

        seqs.into_iter()
            .filter_map(|seq| self.entries.remove(&seq))
            .collect()
    }

    /// Puts back completions that were taken but not executed.
    pub(crate) fn restore(&mut self, entries: impl IntoIterator<Item = IoEntry>) {
        for entry in entries {
            self.insert(entry);
        }
    }
}
