use crate::callback::OnceFn;
use crate::handle::{SharedState, is_live};

use std::collections::VecDeque;

/// A callback queued for the check or close phase.
pub(crate) struct FifoEntry {
    pub(crate) seq: u64,
    pub(crate) callback: OnceFn,
    pub(crate) state: SharedState,
}

/// First-in first-out queue serviced in batches.
///
/// A phase takes the whole batch present when it starts; entries pushed
/// while the batch runs land in the queue for the next tick.
pub(crate) struct FifoQueue {
    entries: VecDeque<FifoEntry>,
}

impl FifoQueue {
    pub(crate) fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    pub(crate) fn push(&mut self, entry: FifoEntry) {
        self.entries.push_back(entry);
    }

    /// Takes every queued entry. Cancelled ones are skipped by the caller.
    pub(crate) fn take_batch(&mut self) -> VecDeque<FifoEntry> {
        std::mem::take(&mut self.entries)
    }

    /// Removes every cancelled entry.
    pub(crate) fn take_cancelled(&mut self) -> Vec<FifoEntry> {
        let (live, cancelled): (VecDeque<_>, VecDeque<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| is_live(&entry.state));

        self.entries = live;
        cancelled.into()
    }

    pub(crate) fn has_live(&self) -> bool {
        self.entries.iter().any(|entry| is_live(&entry.state))
    }

    /// Puts an unfinished batch back in front of anything queued since.
    pub(crate) fn restore(&mut self, batch: VecDeque<FifoEntry>) {
        let newer = std::mem::replace(&mut self.entries, batch);
        self.entries.extend(newer);
    }
}
