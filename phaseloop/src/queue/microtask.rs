use crate::callback::OnceFn;
use crate::scheduler::Source;

use std::collections::VecDeque;

/// The two microtask lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lane {
    /// `next_tick` callbacks; always serviced first.
    NextTick,

    /// Plain microtasks.
    Microtask,
}

impl Lane {
    pub(crate) fn source(self) -> Source {
        match self {
            Lane::NextTick => Source::NextTick,
            Lane::Microtask => Source::Microtask,
        }
    }
}

/// Next-tick and microtask queues.
///
/// Drain order: every queued next-tick (including ones queued by
/// next-ticks), then every queued microtask (including ones queued by
/// microtasks), repeated until both lanes are empty. A next-tick queued by
/// a microtask waits until the microtask lane has emptied.
pub(crate) struct MicrotaskQueue {
    ticks: VecDeque<OnceFn>,
    microtasks: VecDeque<OnceFn>,

    /// Set while the microtask lane is being drained.
    draining_microtasks: bool,
}

impl MicrotaskQueue {
    pub(crate) fn new() -> Self {
        Self {
            ticks: VecDeque::new(),
            microtasks: VecDeque::new(),
            draining_microtasks: false,
        }
    }

    pub(crate) fn push(&mut self, lane: Lane, callback: OnceFn) {
        match lane {
            Lane::NextTick => self.ticks.push_back(callback),
            Lane::Microtask => self.microtasks.push_back(callback),
        }
    }

    /// Pops the next callback according to the drain order.
    ///
    /// Returns `None` once both lanes are empty, which also ends the
    /// current pass over the microtask lane.
    pub(crate) fn pop(&mut self) -> Option<(Lane, OnceFn)> {
        if self.draining_microtasks {
            if let Some(callback) = self.microtasks.pop_front() {
                return Some((Lane::Microtask, callback));
            }

            self.draining_microtasks = false;
        }

        if let Some(callback) = self.ticks.pop_front() {
            return Some((Lane::NextTick, callback));
        }

        let callback = self.microtasks.pop_front()?;
        self.draining_microtasks = true;

        Some((Lane::Microtask, callback))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ticks.is_empty() && self.microtasks.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.ticks.len() + self.microtasks.len()
    }
}
