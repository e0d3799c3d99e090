use crate::scheduler::PhaseScheduler;

/// A one-shot unit of work.
pub(crate) type OnceFn = Box<dyn FnOnce(&PhaseScheduler)>;

/// A unit of work that may run many times (interval timers).
pub(crate) type RepeatFn = Box<dyn FnMut(&PhaseScheduler)>;

/// A queued callback.
///
/// Callbacks receive the scheduler that runs them so they can register
/// follow-up work. Whatever state they capture belongs to the caller; the
/// scheduler only decides *when* they run.
pub(crate) enum Callback {
    Once(OnceFn),
    Repeat(RepeatFn),
}

impl Callback {
    pub(crate) fn once<F>(f: F) -> Self
    where
        F: FnOnce(&PhaseScheduler) + 'static,
    {
        Callback::Once(Box::new(f))
    }

    pub(crate) fn repeat<F>(f: F) -> Self
    where
        F: FnMut(&PhaseScheduler) + 'static,
    {
        Callback::Repeat(Box::new(f))
    }

    /// Runs the callback, handing a repeating one back for re-arming.
    pub(crate) fn invoke(self, scheduler: &PhaseScheduler) -> Option<Callback> {
        match self {
            Callback::Once(f) => {
                f(scheduler);
                None
            }
            Callback::Repeat(mut f) => {
                f(scheduler);
                Some(Callback::Repeat(f))
            }
        }
    }
}
