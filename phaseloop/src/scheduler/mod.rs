//! The event loop.
//!
//! This module contains the [`PhaseScheduler`] and everything it owns:
//! - the phase state machine and its run loop,
//! - the builder used to configure it,
//! - the thread-local context used by [`task`](crate::task),
//! - the ordered side-effect log returned by a run.

mod core;
mod state;
mod summary;

pub(crate) mod builder;
pub(crate) mod context;

pub use builder::SchedulerBuilder;
pub use core::{CompletionSink, PhaseScheduler};
pub use state::{Phase, Source};
pub use summary::{LogEntry, RunSummary};
