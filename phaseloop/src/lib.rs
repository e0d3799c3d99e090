//! # phaseloop
//!
//! **phaseloop** is a deterministic simulator of a single-threaded,
//! cooperative event loop, built for the **Nebula** ecosystem's test suites.
//!
//! Real event loops decide *when* deferred callbacks run through a fixed
//! sequence of phases, and most ordering questions ("does the immediate run
//! before the zero-delay timer?") are answered by that sequence rather than
//! by wall-clock timing. phaseloop reproduces the sequence on a virtual
//! clock so such questions become assertions instead of folklore:
//!
//! - a **timers phase** firing expired timers in `(deadline, registration)`
//!   order,
//! - a **pending phase** running I/O completions carried over from the
//!   previous iteration,
//! - a **poll phase** running ready I/O completions, or jumping the clock to
//!   the next event when there is nothing else to do,
//! - a **check phase** running immediates,
//! - a **close phase** running teardown callbacks,
//! - **next-tick and microtask lanes** drained to exhaustion after every
//!   single callback, with starvation reported instead of hanging.
//!
//! ## Quick Start
//!
//! ```rust
//! use phaseloop::PhaseScheduler;
//! use std::time::Duration;
//!
//! let scheduler = PhaseScheduler::new();
//!
//! scheduler
//!     .schedule_io(
//!         |s| {
//!             s.schedule_timer(|s| s.log("timeout"), Duration::ZERO).unwrap();
//!             s.schedule_immediate(|s| s.log("immediate"));
//!         },
//!         Duration::from_millis(5),
//!     )
//!     .unwrap();
//!
//! let summary = scheduler.run().unwrap();
//!
//! // Inside an I/O callback the check phase always comes first.
//! assert_eq!(summary.messages(), ["immediate", "timeout"]);
//! ```
//!
//! ## Modules
//!
//! - [`task`] — Free scheduling functions resolving the current scheduler
//! - [`time`] — Virtual clock
//! - [`handle`] — Cancellation handles
//!
//! ## Attribute macros
//!
//! `#[phaseloop::main]` and `#[phaseloop::test]` build a scheduler from
//! `key = value` options and run the function body as its top-level script.

mod callback;
mod error;
mod queue;
mod scheduler;

pub mod handle;
pub mod task;
pub mod time;

pub use error::{Error, Result, RunError};
pub use handle::{CloseHandle, EntryState, Handle, ImmediateHandle, IoHandle, TimerHandle};
pub use scheduler::{
    CompletionSink, LogEntry, Phase, PhaseScheduler, RunSummary, SchedulerBuilder, Source,
};

pub use phaseloop_macros::*;
