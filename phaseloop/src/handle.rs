//! Handles returned by the scheduling calls.
//!
//! A handle shares a small lifecycle cell with the queued entry. The
//! scheduler flips it to [`EntryState::Fired`] when the entry runs, and
//! [`Handle::cancel`] flips it to [`EntryState::Cancelled`]. Queues skip
//! cancelled entries the next time they are serviced.

use crate::error::{Error, Result};

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// Lifecycle of a queued entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Queued and not yet executed. Interval timers stay here between runs.
    Pending,

    /// Executed; one-shot entries never run again.
    Fired,

    /// Removed from execution by [`Handle::cancel`].
    Cancelled,
}

/// Lifecycle cell shared between an entry and its handle.
pub(crate) type SharedState = Rc<Cell<EntryState>>;

pub(crate) fn new_state() -> SharedState {
    Rc::new(Cell::new(EntryState::Pending))
}

pub(crate) fn is_live(state: &SharedState) -> bool {
    state.get() == EntryState::Pending
}

/// Marker types distinguishing the handle flavours.
pub mod kind {
    /// Marker for [`TimerHandle`](super::TimerHandle).
    #[derive(Debug)]
    pub enum Timer {}

    /// Marker for [`ImmediateHandle`](super::ImmediateHandle).
    #[derive(Debug)]
    pub enum Immediate {}

    /// Marker for [`IoHandle`](super::IoHandle).
    #[derive(Debug)]
    pub enum Io {}

    /// Marker for [`CloseHandle`](super::CloseHandle).
    #[derive(Debug)]
    pub enum Close {}
}

/// Handle to a timer or interval.
pub type TimerHandle = Handle<kind::Timer>;

/// Handle to an immediate.
pub type ImmediateHandle = Handle<kind::Immediate>;

/// Handle to a simulated I/O completion.
pub type IoHandle = Handle<kind::Io>;

/// Handle to a close-phase callback.
pub type CloseHandle = Handle<kind::Close>;

/// A reference to a queued entry.
///
/// Handles are cheap to clone and may be moved into callbacks, which is how
/// an interval cancels itself.
pub struct Handle<K> {
    /// Registration order of the entry inside its scheduler.
    id: u64,

    /// Identifier of the scheduler that issued the handle.
    owner: usize,

    state: SharedState,

    _kind: PhantomData<K>,
}

impl<K> Handle<K> {
    pub(crate) fn new(id: u64, owner: usize, state: SharedState) -> Self {
        Self {
            id,
            owner,
            state,
            _kind: PhantomData,
        }
    }

    /// Registration order of the entry. Unique within one scheduler.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current lifecycle state of the entry.
    pub fn state(&self) -> EntryState {
        self.state.get()
    }

    /// Returns `true` while the entry may still run.
    pub fn is_pending(&self) -> bool {
        is_live(&self.state)
    }

    /// Removes the entry from execution.
    ///
    /// Cancelling is idempotent in effect: a consumed or already cancelled
    /// entry is left untouched and the call reports why.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyFired`] if a one-shot entry has already run.
    /// - [`Error::AlreadyCancelled`] if the entry was cancelled before.
    pub fn cancel(&self) -> Result<()> {
        match self.state.get() {
            EntryState::Pending => {
                self.state.set(EntryState::Cancelled);
                Ok(())
            }
            EntryState::Fired => Err(Error::AlreadyFired),
            EntryState::Cancelled => Err(Error::AlreadyCancelled),
        }
    }

    pub(crate) fn owner(&self) -> usize {
        self.owner
    }
}

impl<K> Clone for Handle<K> {
    fn clone(&self) -> Self {
        Self::new(self.id, self.owner, self.state.clone())
    }
}

impl<K> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &std::any::type_name::<K>())
            .field("id", &self.id)
            .field("state", &self.state.get())
            .finish()
    }
}
