use super::builder::SchedulerConfig;
use super::summary::LogEntry;
use crate::handle::is_live;
use crate::queue::{FifoEntry, FifoQueue, IoEntry, IoQueue, MicrotaskQueue, TimerEntry, TimerQueue};
use crate::time::Clock;

use std::collections::VecDeque;
use std::fmt;
use std::mem;

/// A stage of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Expired timers run.
    Timers,

    /// I/O completions carried over from the previous poll phase run.
    Pending,

    /// Ready I/O completions run; the loop blocks here when idle.
    Poll,

    /// Immediates run.
    Check,

    /// Close callbacks run.
    Close,

    /// The loop is not iterating.
    Idle,
}

impl Phase {
    /// Phases of one tick, in execution order.
    pub const CYCLE: [Phase; 5] = [
        Phase::Timers,
        Phase::Pending,
        Phase::Poll,
        Phase::Check,
        Phase::Close,
    ];

    /// Lowercase name used in log output.
    pub fn name(self) -> &'static str {
        match self {
            Phase::Timers => "timers",
            Phase::Pending => "pending",
            Phase::Poll => "poll",
            Phase::Check => "check",
            Phase::Close => "close",
            Phase::Idle => "idle",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// The kind of callback that is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Top-level code, outside of any callback.
    Script,

    /// A callback from the next-tick lane.
    NextTick,

    /// A callback from the microtask lane.
    Microtask,

    /// An expired timer or interval.
    Timer,

    /// A carried-over I/O completion.
    Pending,

    /// An I/O completion run by the poll phase.
    Io,

    /// An immediate run by the check phase.
    Immediate,

    /// A close callback.
    Close,
}

impl Source {
    /// Lowercase name used in log output.
    pub fn name(self) -> &'static str {
        match self {
            Source::Script => "script",
            Source::NextTick => "next-tick",
            Source::Microtask => "microtask",
            Source::Timer => "timer",
            Source::Pending => "pending",
            Source::Io => "io",
            Source::Immediate => "immediate",
            Source::Close => "close",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Everything a scheduler owns.
///
/// Only [`PhaseScheduler`](super::PhaseScheduler) touches this value, and
/// never while a callback is executing.
pub(crate) struct SchedulerState {
    /// Process-unique identifier, stamped into every handle.
    pub(crate) id: usize,

    pub(crate) config: SchedulerConfig,
    pub(crate) clock: Box<dyn Clock>,

    pub(crate) phase: Phase,
    pub(crate) tick: u64,

    /// Kind of the callback currently executing.
    pub(crate) source: Source,

    /// Set for the duration of `run`.
    pub(crate) running: bool,

    /// Next registration order.
    pub(crate) next_seq: u64,

    pub(crate) timers: TimerQueue,
    pub(crate) io: IoQueue,

    /// I/O completions deferred by a saturated poll phase.
    pub(crate) pending: VecDeque<IoEntry>,

    pub(crate) immediates: FifoQueue,
    pub(crate) closing: FifoQueue,
    pub(crate) microtasks: MicrotaskQueue,

    pub(crate) log: Vec<LogEntry>,
}

impl SchedulerState {
    pub(crate) fn new(id: usize, config: SchedulerConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            id,
            config,
            clock,
            phase: Phase::Idle,
            tick: 0,
            source: Source::Script,
            running: false,
            next_seq: 0,
            timers: TimerQueue::new(),
            io: IoQueue::new(),
            pending: VecDeque::new(),
            immediates: FifoQueue::new(),
            closing: FifoQueue::new(),
            microtasks: MicrotaskQueue::new(),
            log: Vec::new(),
        }
    }

    pub(crate) fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Returns `true` if an immediate, carried-over or close callback is
    /// waiting, in which case the poll phase must not block.
    pub(crate) fn has_non_blocking_work(&self) -> bool {
        self.immediates.has_live() || self.closing.has_live() || self.has_live_pending()
    }

    fn has_live_pending(&self) -> bool {
        self.pending.iter().any(|entry| is_live(&entry.state))
    }

    /// Takes every cancelled entry out of the queues.
    pub(crate) fn take_cancelled(&mut self) -> Discarded {
        let (pending, cancelled_pending): (VecDeque<_>, VecDeque<_>) = mem::take(&mut self.pending)
            .into_iter()
            .partition(|entry| is_live(&entry.state));
        self.pending = pending;

        let mut io = self.io.take_cancelled();
        io.extend(cancelled_pending);

        let mut fifo = self.immediates.take_cancelled();
        fifo.extend(self.closing.take_cancelled());

        Discarded {
            timers: self.timers.take_cancelled(),
            io,
            fifo,
        }
    }

    /// Returns `true` once nothing can run anymore.
    pub(crate) fn is_idle(&self) -> bool {
        self.microtasks.is_empty()
            && !self.timers.has_live()
            && !self.io.has_live()
            && !self.has_non_blocking_work()
    }
}

/// Cancelled entries taken out of the queues.
///
/// A callback may own values whose `Drop` reaches back into the scheduler,
/// so this must only be dropped once the state is no longer borrowed.
pub(crate) struct Discarded {
    timers: Vec<TimerEntry>,
    io: Vec<IoEntry>,
    fifo: Vec<FifoEntry>,
}

impl Discarded {
    pub(crate) fn len(&self) -> usize {
        self.timers.len() + self.io.len() + self.fifo.len()
    }
}
