//! Queues owned by the scheduler.
//!
//! Each phase of the loop services one queue:
//! - [`TimerQueue`] for the timers phase,
//! - [`IoQueue`] for the poll phase,
//! - [`FifoQueue`] for the check and close phases,
//! - [`MicrotaskQueue`] drained after every callback.

mod fifo;
mod io;
mod microtask;
mod timer;

pub(crate) use fifo::{FifoEntry, FifoQueue};
pub(crate) use io::{IoEntry, IoQueue};
pub(crate) use microtask::{Lane, MicrotaskQueue};
pub(crate) use timer::{TimerEntry, TimerQueue};
