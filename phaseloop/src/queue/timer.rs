use crate::callback::Callback;
use crate::handle::{SharedState, is_live};

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

/// An entry in the timer queue.
///
/// `TimerEntry` represents a callback due at a virtual instant. Entries are
/// stored in a [`TimerQueue`] ordered by `(due_at, seq)`.
///
/// The entry may be cancelled through its handle before it fires.
pub(crate) struct TimerEntry {
    /// Virtual instant at which the timer becomes due.
    pub(crate) due_at: Duration,

    /// Virtual instant at which the timer was registered.
    pub(crate) registered_at: Duration,

    /// Registration order, used to break ties between equal deadlines.
    pub(crate) seq: u64,

    /// Re-arm period for intervals; `None` for one-shot timers.
    pub(crate) period: Option<Duration>,

    pub(crate) callback: Callback,

    /// Lifecycle cell shared with the [`TimerHandle`](crate::TimerHandle).
    pub(crate) state: SharedState,
}

impl TimerEntry {
    /// Earliest virtual instant at which the timer may fire.
    ///
    /// A timer never fires in the instant it was registered: at least
    /// `resolution` of virtual time has to pass first.
    pub(crate) fn eligible_at(&self, resolution: Duration) -> Duration {
        self.due_at.max(self.registered_at.saturating_add(resolution))
    }
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    /// Two timer entries are equal if deadline and registration order match.
    fn eq(&self, other: &Self) -> bool {
        self.due_at == other.due_at && self.seq == other.seq
    }
}

impl Ord for TimerEntry {
    /// Orders timer entries by `(due_at, seq)`.
    ///
    /// Note that the comparison is **reversed** so that a
    /// `BinaryHeap<TimerEntry>` behaves as a min-heap,
    /// where the earliest deadline is popped first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_at
            .cmp(&self.due_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimerEntry {
    /// Partial ordering consistent with [`Ord`].
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of pending timers.
pub(crate) struct TimerQueue {
    heap: BinaryHeap<TimerEntry>,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub(crate) fn push(&mut self, entry: TimerEntry) {
        self.heap.push(entry);
    }

    /// Removes and returns every timer that may fire at `now`, in
    /// `(due_at, seq)` order.
    ///
    /// Cancelled entries met along the way are returned too, so that they
    /// are dropped by the caller rather than inside the queue. Due timers
    /// that were registered too recently to fire stay queued.
    pub(crate) fn take_due(&mut self, now: Duration, resolution: Duration) -> Vec<TimerEntry> {
        let mut due = Vec::new();
        let mut held_back = Vec::new();

        while let Some(timer) = self.heap.peek() {
            if timer.due_at > now {
                break;
            }

            let Some(timer) = self.heap.pop() else {
                break;
            };

            if !is_live(&timer.state) || timer.eligible_at(resolution) <= now {
                due.push(timer);
            } else {
                held_back.push(timer);
            }
        }

        self.heap.extend(held_back);
        due
    }

    /// Earliest instant at which any live timer may fire.
    pub(crate) fn next_eligible(&self, resolution: Duration) -> Option<Duration> {
        self.heap
            .iter()
            .filter(|timer| is_live(&timer.state))
            .map(|timer| timer.eligible_at(resolution))
            .min()
    }

    /// Returns `true` if at least one timer may still fire.
    pub(crate) fn has_live(&self) -> bool {
        self.heap.iter().any(|timer| is_live(&timer.state))
    }

    /// Removes every cancelled timer, wherever its deadline lies.
    pub(crate) fn take_cancelled(&mut self) -> Vec<TimerEntry> {
        let (live, cancelled): (Vec<_>, Vec<_>) = std::mem::take(&mut self.heap)
            .into_iter()
            .partition(|timer| is_live(&timer.state));

        self.heap = BinaryHeap::from(live);
        cancelled
    }

    /// Puts back timers that were taken but not executed.
    pub(crate) fn restore(&mut self, timers: impl IntoIterator<Item = TimerEntry>) {
        self.heap.extend(timers);
    }
}
