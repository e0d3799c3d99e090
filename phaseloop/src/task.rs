//! Scheduling from inside callbacks without passing the scheduler around.
//!
//! While a [`PhaseScheduler`] runs its loop (or a script through
//! [`block_on`](PhaseScheduler::block_on) or [`enter`](PhaseScheduler::enter)),
//! it is installed as the thread's current scheduler. The functions here
//! reach it through that context, which lets simulated programs read like
//! the callback-style code they model:
//!
//! ```rust
//! use phaseloop::{PhaseScheduler, task};
//! use std::time::Duration;
//!
//! let summary = PhaseScheduler::new()
//!     .block_on(|_| {
//!         task::set_timeout(|| task::log("timeout"), Duration::ZERO).unwrap();
//!         task::set_immediate(|| task::log("immediate"));
//!         task::next_tick(|| task::log("next tick"));
//!     })
//!     .unwrap();
//!
//! assert_eq!(summary.messages(), ["next tick", "immediate", "timeout"]);
//! ```
//!
//! # Panics
//!
//! Every function panics if called outside the context of a scheduler.

use crate::error::Result;
use crate::handle::{CloseHandle, ImmediateHandle, IoHandle, TimerHandle};
use crate::scheduler::PhaseScheduler;
use crate::scheduler::context::{current, try_current};

use std::time::Duration;

/// Runs `callback` once `delay` of virtual time has passed.
///
/// See [`PhaseScheduler::schedule_timer`].
pub fn set_timeout<F>(callback: F, delay: Duration) -> Result<TimerHandle>
where
    F: FnOnce() + 'static,
{
    current().schedule_timer(move |_| callback(), delay)
}

/// Runs `callback` every `period` until the handle is cancelled.
///
/// See [`PhaseScheduler::schedule_interval`].
pub fn set_interval<F>(mut callback: F, period: Duration) -> Result<TimerHandle>
where
    F: FnMut() + 'static,
{
    current().schedule_interval(move |_| callback(), period)
}

/// Runs `callback` in the next check phase.
pub fn set_immediate<F>(callback: F) -> ImmediateHandle
where
    F: FnOnce() + 'static,
{
    current().schedule_immediate(move |_| callback())
}

/// Runs `callback` as soon as the current callback returns, before any
/// plain microtask.
pub fn next_tick<F>(callback: F)
where
    F: FnOnce() + 'static,
{
    current().next_tick(move |_| callback())
}

/// Runs `callback` as soon as the current callback returns.
pub fn queue_microtask<F>(callback: F)
where
    F: FnOnce() + 'static,
{
    current().schedule_microtask(move |_| callback())
}

/// Simulates an I/O operation completing after `latency`.
///
/// See [`PhaseScheduler::schedule_io`].
pub fn io<F>(callback: F, latency: Duration) -> Result<IoHandle>
where
    F: FnOnce() + 'static,
{
    current().schedule_io(move |_| callback(), latency)
}

/// Runs `callback` in the next close phase.
pub fn on_close<F>(callback: F) -> CloseHandle
where
    F: FnOnce() + 'static,
{
    current().schedule_close(move |_| callback())
}

/// Records a side effect in the current scheduler's log.
pub fn log(message: impl Into<String>) {
    current().log(message)
}

/// Returns the current scheduler, if any.
pub fn scheduler() -> Option<PhaseScheduler> {
    try_current()
}
