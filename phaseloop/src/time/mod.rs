//! Virtual time.
//!
//! The simulator never reads the wall clock. Time is a [`Duration`] since
//! the origin of a [`Clock`], advanced only by the scheduler's poll phase
//! (and by the configured startup cost).
//!
//! [`Duration`]: std::time::Duration

mod clock;

#[doc(inline)]
pub use clock::{Clock, VirtualClock};

use std::time::Duration;

/// Longest accepted timer delay or I/O latency (2^31 - 1 ms).
pub const MAX_DELAY: Duration = Duration::from_millis(2_147_483_647);
