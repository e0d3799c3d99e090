use super::builder::{SchedulerBuilder, SchedulerConfig};
use super::context::enter_context;
use super::state::{Phase, SchedulerState, Source};
use super::summary::{LogEntry, RunSummary};
use crate::callback::{Callback, OnceFn};
use crate::error::{Error, Result, RunError};
use crate::handle::{
    CloseHandle, EntryState, Handle, ImmediateHandle, IoHandle, SharedState, TimerHandle, is_live,
    new_state,
};
use crate::queue::{FifoEntry, IoEntry, Lane, TimerEntry};
use crate::time::{Clock, MAX_DELAY};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tracing::{debug, trace, warn};

static NEXT_SCHEDULER_ID: AtomicUsize = AtomicUsize::new(1);

/// A deterministic, single-threaded event loop.
///
/// `PhaseScheduler` owns the timer, I/O, immediate, close and microtask
/// queues together with a virtual clock, and runs them in a fixed phase
/// order:
///
/// ```text
/// timers -> pending -> poll -> check -> close -> (timers ...)
/// ```
///
/// The microtask lanes are drained to empty after every single callback,
/// whatever the phase. Time never passes for real: when the poll phase
/// would block, the clock jumps to the next known event.
///
/// The scheduler is a cheap, clonable handle over its state. Callbacks
/// receive it by reference and may schedule more work from anywhere.
///
/// # Examples
///
/// ```rust
/// use phaseloop::PhaseScheduler;
/// use std::time::Duration;
///
/// let scheduler = PhaseScheduler::new();
///
/// scheduler
///     .schedule_timer(|s| s.log("timeout"), Duration::ZERO)
///     .unwrap();
/// scheduler.schedule_immediate(|s| s.log("immediate"));
/// scheduler.schedule_microtask(|s| s.log("microtask"));
///
/// let summary = scheduler.run().unwrap();
/// assert_eq!(summary.messages(), ["microtask", "immediate", "timeout"]);
/// ```
#[derive(Clone)]
pub struct PhaseScheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl PhaseScheduler {
    /// Creates a scheduler with the default configuration.
    pub fn new() -> Self {
        SchedulerBuilder::new().build()
    }

    /// Returns a [`SchedulerBuilder`].
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub(crate) fn with_config(config: SchedulerConfig, clock: Box<dyn Clock>) -> Self {
        let id = NEXT_SCHEDULER_ID.fetch_add(1, Ordering::Relaxed);

        Self {
            state: Rc::new(RefCell::new(SchedulerState::new(id, config, clock))),
        }
    }

    /// Schedules `callback` to run once `delay` of virtual time has passed.
    ///
    /// A zero delay still waits for at least one full pass of the loop; the
    /// timer becomes eligible once the timer resolution has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `delay` exceeds [`MAX_DELAY`].
    pub fn schedule_timer<F>(&self, callback: F, delay: Duration) -> Result<TimerHandle>
    where
        F: FnOnce(&PhaseScheduler) + 'static,
    {
        check_delay(delay)?;

        Ok(self.insert_timer(Callback::once(callback), delay, None))
    }

    /// Schedules `callback` to run every `period` until its handle is
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `period` exceeds [`MAX_DELAY`].
    pub fn schedule_interval<F>(&self, callback: F, period: Duration) -> Result<TimerHandle>
    where
        F: FnMut(&PhaseScheduler) + 'static,
    {
        check_delay(period)?;

        Ok(self.insert_timer(Callback::repeat(callback), period, Some(period)))
    }

    fn insert_timer(
        &self,
        callback: Callback,
        delay: Duration,
        period: Option<Duration>,
    ) -> TimerHandle {
        let mut state = self.state.borrow_mut();

        let seq = state.next_seq();
        let now = state.clock.now();
        let entry_state = new_state();

        trace!(seq, ?delay, periodic = period.is_some(), "timer scheduled");

        state.timers.push(TimerEntry {
            due_at: now.saturating_add(delay),
            registered_at: now,
            seq,
            period,
            callback,
            state: entry_state.clone(),
        });

        Handle::new(seq, state.id, entry_state)
    }

    /// Queues `callback` for the check phase.
    ///
    /// Immediates run FIFO. One queued while the check phase is running
    /// waits for the next tick.
    pub fn schedule_immediate<F>(&self, callback: F) -> ImmediateHandle
    where
        F: FnOnce(&PhaseScheduler) + 'static,
    {
        let mut state = self.state.borrow_mut();

        let seq = state.next_seq();
        let entry_state = new_state();

        trace!(seq, "immediate scheduled");

        state.immediates.push(FifoEntry {
            seq,
            callback: Box::new(callback),
            state: entry_state.clone(),
        });

        Handle::new(seq, state.id, entry_state)
    }

    /// Simulates an I/O operation whose completion `callback` becomes
    /// pollable once `latency` of virtual time has passed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `latency` exceeds [`MAX_DELAY`].
    pub fn schedule_io<F>(&self, callback: F, latency: Duration) -> Result<IoHandle>
    where
        F: FnOnce(&PhaseScheduler) + 'static,
    {
        check_delay(latency)?;

        let ready_at = self.now().saturating_add(latency);
        Ok(self.insert_io(Box::new(callback), Some(ready_at)))
    }

    /// Registers an I/O operation with no known latency.
    ///
    /// The completion only becomes pollable once it is reported through
    /// [`CompletionSink::mark_ready`].
    pub fn schedule_io_pending<F>(&self, callback: F) -> IoHandle
    where
        F: FnOnce(&PhaseScheduler) + 'static,
    {
        self.insert_io(Box::new(callback), None)
    }

    fn insert_io(&self, callback: OnceFn, ready_at: Option<Duration>) -> IoHandle {
        let mut state = self.state.borrow_mut();

        let seq = state.next_seq();
        let entry_state = new_state();

        trace!(seq, ?ready_at, "I/O registered");

        state.io.insert(IoEntry {
            seq,
            ready_at,
            callback,
            state: entry_state.clone(),
        });

        Handle::new(seq, state.id, entry_state)
    }

    /// Queues `callback` for the close phase.
    pub fn schedule_close<F>(&self, callback: F) -> CloseHandle
    where
        F: FnOnce(&PhaseScheduler) + 'static,
    {
        let mut state = self.state.borrow_mut();

        let seq = state.next_seq();
        let entry_state = new_state();

        state.closing.push(FifoEntry {
            seq,
            callback: Box::new(callback),
            state: entry_state.clone(),
        });

        Handle::new(seq, state.id, entry_state)
    }

    /// Queues `callback` on the microtask lane.
    ///
    /// The lane is drained after the currently executing callback returns,
    /// before the loop moves on.
    pub fn schedule_microtask<F>(&self, callback: F)
    where
        F: FnOnce(&PhaseScheduler) + 'static,
    {
        self.state
            .borrow_mut()
            .microtasks
            .push(Lane::Microtask, Box::new(callback));
    }

    /// Queues `callback` on the next-tick lane, which is always serviced
    /// before the microtask lane.
    pub fn next_tick<F>(&self, callback: F)
    where
        F: FnOnce(&PhaseScheduler) + 'static,
    {
        self.state
            .borrow_mut()
            .microtasks
            .push(Lane::NextTick, Box::new(callback));
    }

    /// Records a side effect in the ordered log.
    pub fn log(&self, message: impl Into<String>) {
        let mut state = self.state.borrow_mut();

        let entry = LogEntry {
            tick: state.tick,
            phase: state.phase,
            source: state.source,
            at: state.clock.now(),
            message: message.into(),
        };

        trace!(target: "phaseloop::log", "{entry}");

        state.log.push(entry);
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.state.borrow().clock.now()
    }

    /// Phase the loop is in.
    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    /// Current tick of the running loop; the last tick once it stopped.
    pub fn tick(&self) -> u64 {
        self.state.borrow().tick
    }

    /// Returns `true` if nothing is queued or outstanding.
    pub fn is_idle(&self) -> bool {
        self.state.borrow().is_idle()
    }

    /// Runs `f` with this scheduler installed as the thread's current one,
    /// so that the functions of [`task`](crate::task) reach it.
    pub fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        enter_context(self.clone(), f)
    }

    /// Runs `script` as the top-level program, then runs the loop.
    ///
    /// The script executes inside the scheduler context. Microtasks it
    /// queues run before the first tick.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn block_on<F>(&self, script: F) -> std::result::Result<RunSummary, RunError>
    where
        F: FnOnce(&PhaseScheduler),
    {
        if self.state.borrow().running {
            return Err(self.reentrant());
        }

        self.enter(|| {
            {
                let mut state = self.state.borrow_mut();
                state.tick = 0;
                state.source = Source::Script;
            }

            script(self);
        });

        self.run()
    }

    /// Runs the loop until nothing is left to do.
    ///
    /// The clock first advances by the configured startup cost and the
    /// microtask lanes are drained. Then ticks run until every queue is
    /// empty and no timer or I/O is outstanding.
    ///
    /// # Errors
    ///
    /// The returned [`RunError`] carries the log recorded before the halt:
    ///
    /// - [`Error::Starvation`] if a microtask drain exceeds its bound,
    /// - [`Error::TickLimitExceeded`] if the loop never becomes idle,
    /// - [`Error::Stalled`] if only never-completed I/O remains,
    /// - [`Error::Reentrant`] if called from inside a callback.
    pub fn run(&self) -> std::result::Result<RunSummary, RunError> {
        {
            let mut state = self.state.borrow_mut();

            if state.running {
                drop(state);
                return Err(self.reentrant());
            }

            state.running = true;
            state.tick = 0;

            let startup = state.config.startup_cost;
            if !startup.is_zero() {
                let target = state.clock.now().saturating_add(startup);
                state.clock.advance_to(target);
            }

            debug!(scheduler = state.id, now = ?state.clock.now(), "run started");
        }

        let outcome = self.enter(|| self.drive());

        let discarded = {
            let mut state = self.state.borrow_mut();

            state.running = false;
            state.phase = Phase::Idle;
            state.source = Source::Script;

            state.take_cancelled()
        };

        // Released outside the borrow: a dropped callback may log or schedule.
        trace!(released = discarded.len(), "cancelled entries released");
        drop(discarded);

        let mut state = self.state.borrow_mut();

        let id = state.id;
        let summary = RunSummary {
            log: mem::take(&mut state.log),
            ticks: state.tick,
            clock: state.clock.now(),
        };
        drop(state);

        match outcome {
            Ok(()) => {
                debug!(scheduler = id, ticks = summary.ticks, "run finished");
                Ok(summary)
            }
            Err(error) => {
                warn!(scheduler = id, ticks = summary.ticks, %error, "run halted");
                Err(RunError::new(error, summary))
            }
        }
    }

    fn reentrant(&self) -> RunError {
        let state = self.state.borrow();

        RunError::new(
            Error::Reentrant,
            RunSummary {
                log: Vec::new(),
                ticks: state.tick,
                clock: state.clock.now(),
            },
        )
    }

    /// The loop proper.
    fn drive(&self) -> Result<()> {
        self.drain_microtasks()?;

        loop {
            {
                let mut state = self.state.borrow_mut();

                if state.is_idle() {
                    return Ok(());
                }

                if state.tick >= state.config.max_ticks {
                    return Err(Error::TickLimitExceeded {
                        limit: state.config.max_ticks,
                    });
                }

                state.tick += 1;
                debug!(tick = state.tick, now = ?state.clock.now(), "tick started");
            }

            for phase in Phase::CYCLE {
                self.state.borrow_mut().phase = phase;
                trace!(?phase, "entering phase");

                match phase {
                    Phase::Timers => self.run_timers()?,
                    Phase::Pending => self.run_pending()?,
                    Phase::Poll => self.run_poll()?,
                    Phase::Check => self.run_check()?,
                    Phase::Close => self.run_close()?,
                    Phase::Idle => {}
                }

                if self.state.borrow().is_idle() {
                    debug!(?phase, "loop is idle");
                    return Ok(());
                }
            }
        }
    }

    /// Executes one callback, marking who is running for the log.
    fn invoke(&self, source: Source, callback: Callback) -> Option<Callback> {
        self.state.borrow_mut().source = source;
        trace!(?source, "running callback");

        callback.invoke(self)
    }

    /// Runs the microtask lanes to exhaustion.
    fn drain_microtasks(&self) -> Result<()> {
        let limit = self.state.borrow().config.microtask_limit;
        let mut executed = 0;

        loop {
            let (lane, callback) = {
                let mut state = self.state.borrow_mut();

                if executed == limit && !state.microtasks.is_empty() {
                    warn!(
                        limit,
                        queued = state.microtasks.len(),
                        "microtask queue is starving the loop"
                    );
                    return Err(Error::Starvation { limit });
                }

                match state.microtasks.pop() {
                    Some(next) => next,
                    None => return Ok(()),
                }
            };

            executed += 1;
            self.invoke(lane.source(), Callback::Once(callback));
        }
    }

    fn run_timers(&self) -> Result<()> {
        let due = {
            let mut state = self.state.borrow_mut();
            let now = state.clock.now();
            let resolution = state.config.timer_resolution;

            state.timers.take_due(now, resolution)
        };

        let mut due = due.into_iter();

        while let Some(timer) = due.next() {
            // Cancelled by an earlier callback of this phase.
            if !is_live(&timer.state) {
                continue;
            }

            if timer.period.is_none() {
                timer.state.set(EntryState::Fired);
            }

            let rest = self.invoke(Source::Timer, timer.callback);

            if let (Some(period), Some(callback)) = (timer.period, rest) {
                if is_live(&timer.state) {
                    self.rearm(timer.state, period, callback);
                }
            }

            if let Err(error) = self.drain_microtasks() {
                self.state.borrow_mut().timers.restore(due);
                return Err(error);
            }
        }

        Ok(())
    }

    fn rearm(&self, entry_state: SharedState, period: Duration, callback: Callback) {
        let mut state = self.state.borrow_mut();

        let seq = state.next_seq();
        let now = state.clock.now();

        state.timers.push(TimerEntry {
            due_at: now.saturating_add(period),
            registered_at: now,
            seq,
            period: Some(period),
            callback,
            state: entry_state,
        });
    }

    fn run_pending(&self) -> Result<()> {
        let mut batch = mem::take(&mut self.state.borrow_mut().pending);

        while let Some(entry) = batch.pop_front() {
            if let Err(error) = self.complete_io(Source::Pending, entry) {
                let mut state = self.state.borrow_mut();
                let newer = mem::replace(&mut state.pending, batch);
                state.pending.extend(newer);
                return Err(error);
            }
        }

        Ok(())
    }

    fn run_poll(&self) -> Result<()> {
        loop {
            let ready = {
                let mut state = self.state.borrow_mut();
                let now = state.clock.now();
                let limit = state.config.poll_callback_limit;

                let mut ready = state.io.take_ready(now);
                if ready.len() > limit {
                    let deferred = ready.split_off(limit);
                    debug!(deferred = deferred.len(), "poll limit reached");
                    state.pending.extend(deferred);
                }

                ready
            };

            if !ready.is_empty() {
                let mut ready = ready.into_iter();

                while let Some(entry) = ready.next() {
                    if let Err(error) = self.complete_io(Source::Io, entry) {
                        self.state.borrow_mut().io.restore(ready);
                        return Err(error);
                    }
                }

                return Ok(());
            }

            let mut state = self.state.borrow_mut();

            if state.has_non_blocking_work() {
                return Ok(());
            }

            let now = state.clock.now();
            let next_timer = state.timers.next_eligible(state.config.timer_resolution);

            if next_timer.is_some_and(|at| at <= now) {
                return Ok(());
            }

            let next_event = match (next_timer, state.io.next_ready_at()) {
                (Some(timer), Some(io)) => Some(timer.min(io)),
                (timer, io) => timer.or(io),
            };

            match next_event {
                Some(at) => {
                    let target = at.min(now.saturating_add(state.config.poll_budget));
                    debug!(from = ?now, to = ?target, "poll blocking");
                    state.clock.advance_to(target);
                }
                None => {
                    let pending_io = state.io.awaiting_completion();
                    if pending_io > 0 {
                        return Err(Error::Stalled { pending_io });
                    }

                    return Ok(());
                }
            }
        }
    }

    fn complete_io(&self, source: Source, entry: IoEntry) -> Result<()> {
        if !is_live(&entry.state) {
            return Ok(());
        }

        entry.state.set(EntryState::Fired);
        self.invoke(source, Callback::Once(entry.callback));

        self.drain_microtasks()
    }

    fn run_check(&self) -> Result<()> {
        let batch = self.state.borrow_mut().immediates.take_batch();

        self.run_batch(Source::Immediate, batch, |state, rest| {
            state.immediates.restore(rest)
        })
    }

    fn run_close(&self) -> Result<()> {
        let batch = self.state.borrow_mut().closing.take_batch();

        self.run_batch(Source::Close, batch, |state, rest| state.closing.restore(rest))
    }

    /// Runs a FIFO batch, handing the unexecuted rest back on failure.
    fn run_batch(
        &self,
        source: Source,
        mut batch: VecDeque<FifoEntry>,
        restore: impl FnOnce(&mut SchedulerState, VecDeque<FifoEntry>),
    ) -> Result<()> {
        while let Some(entry) = batch.pop_front() {
            if !is_live(&entry.state) {
                continue;
            }

            entry.state.set(EntryState::Fired);
            trace!(seq = entry.seq, "batch entry");
            self.invoke(source, Callback::Once(entry.callback));

            if let Err(error) = self.drain_microtasks() {
                restore(&mut *self.state.borrow_mut(), batch);
                return Err(error);
            }
        }

        Ok(())
    }
}

impl Default for PhaseScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PhaseScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => f
                .debug_struct("PhaseScheduler")
                .field("id", &state.id)
                .field("phase", &state.phase)
                .field("tick", &state.tick)
                .field("now", &state.clock.now())
                .finish(),
            Err(_) => f.debug_struct("PhaseScheduler").finish_non_exhaustive(),
        }
    }
}

/// Collaborator that reports I/O completions to the scheduler.
///
/// The scheduler only needs to learn *that* an operation finished; whatever
/// produced the result lives outside of it. [`PhaseScheduler`] implements
/// the trait itself, so a callback (or test) holding the scheduler can
/// complete I/O registered with
/// [`schedule_io_pending`](PhaseScheduler::schedule_io_pending).
pub trait CompletionSink {
    /// Makes the completion behind `handle` pollable from now on.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the handle belongs to another sink.
    /// - [`Error::AlreadyFired`] / [`Error::AlreadyCancelled`] if the
    ///   completion was consumed or cancelled.
    fn mark_ready(&self, handle: &IoHandle) -> Result<()>;
}

impl CompletionSink for PhaseScheduler {
    fn mark_ready(&self, handle: &IoHandle) -> Result<()> {
        let mut state = self.state.borrow_mut();

        if handle.owner() != state.id {
            return Err(Error::InvalidArgument(format!(
                "I/O handle {} was not issued by this scheduler",
                handle.id()
            )));
        }

        match handle.state() {
            EntryState::Fired => Err(Error::AlreadyFired),
            EntryState::Cancelled => Err(Error::AlreadyCancelled),
            EntryState::Pending => {
                let now = state.clock.now();

                // Already carried over into the pending queue otherwise.
                if state.io.mark_ready(handle.id(), now) {
                    trace!(seq = handle.id(), ?now, "I/O marked ready");
                }

                Ok(())
            }
        }
    }
}

fn check_delay(delay: Duration) -> Result<()> {
    if delay > MAX_DELAY {
        return Err(Error::delay_out_of_range(delay, MAX_DELAY));
    }

    Ok(())
}
