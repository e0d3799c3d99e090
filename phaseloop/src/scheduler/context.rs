use super::PhaseScheduler;

use std::cell::RefCell;

thread_local! {
    /// Thread-local handle to the scheduler currently driving callbacks.
    ///
    /// This is set while a scheduler runs its loop or a top-level script,
    /// and allows the free functions of [`task`](crate::task) to reach the
    /// scheduler without explicit parameter passing.
    pub(crate) static CURRENT_SCHEDULER: RefCell<Option<PhaseScheduler>> =
        const { RefCell::new(None) };
}

/// Enters the scheduler context for the current thread.
///
/// This function temporarily installs `scheduler` as the current one for
/// the duration of the closure `f`. After the closure completes, the
/// previous context is restored, so contexts nest.
pub(crate) fn enter_context<R>(scheduler: PhaseScheduler, f: impl FnOnce() -> R) -> R {
    CURRENT_SCHEDULER.with(|current| {
        let previous = current.replace(Some(scheduler));

        let out = f();

        current.replace(previous);

        out
    })
}

/// Returns the scheduler installed on this thread, if any.
pub(crate) fn try_current() -> Option<PhaseScheduler> {
    CURRENT_SCHEDULER.with(|current| current.borrow().clone())
}

/// Returns the scheduler installed on this thread.
///
/// # Panics
///
/// Panics if called outside the context of a scheduler.
pub(crate) fn current() -> PhaseScheduler {
    try_current().expect("must be called within the context of a phaseloop scheduler")
}
