use std::time::Duration;

/// A monotonic clock source the scheduler can advance.
///
/// Instants are expressed as the [`Duration`] elapsed since the clock's
/// origin. The scheduler never waits: whenever the poll phase would block,
/// it calls [`advance_to`](Clock::advance_to) with the next known event.
///
/// Implementations must never move backwards; an `advance_to` with an
/// instant in the past is ignored.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Duration;

    /// Moves the clock forward to `instant`.
    fn advance_to(&mut self, instant: Duration);
}

/// The default clock: starts at zero and only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Duration,
}

impl VirtualClock {
    /// Creates a clock at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock already advanced to `instant`.
    pub fn starting_at(instant: Duration) -> Self {
        Self { now: instant }
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn advance_to(&mut self, instant: Duration) {
        if instant > self.now {
            self.now = instant;
        }
    }
}
