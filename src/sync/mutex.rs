//! Owner-tracking mutex with optional recursion.
//!
//! Unlike `std::sync::Mutex` this one does not wrap data: it guards a
//! critical section, knows which thread holds it, and refuses to be released
//! by anyone else.

use super::park;
use crate::error::{Error, Result};
use crate::isr;
use crate::thread::{self, ThreadId};
use crate::time::Timeout;
use core::marker::PhantomData;
use parking_lot::Condvar;

/// Whether the owner may acquire the mutex again while holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutexType {
    Normal,
    Recursive,
}

#[derive(Debug, Default)]
struct State {
    owner: Option<ThreadId>,
    depth: u32,
}

/// Mutex with owner tracking and timeouts.
///
/// Dropping a mutex that some thread still holds is a fatal error.
pub struct Mutex {
    kind: MutexType,
    state: parking_lot::Mutex<State>,
    released: Condvar,
}

impl Mutex {
    pub fn new(kind: MutexType) -> Self {
        Self {
            kind,
            state: parking_lot::Mutex::new(State::default()),
            released: Condvar::new(),
        }
    }

    pub fn kind(&self) -> MutexType {
        self.kind
    }

    /// Acquire the mutex for the calling thread.
    ///
    /// # Arguments
    ///
    /// * `timeout` - How long to wait while another thread holds it
    ///
    /// # Returns
    ///
    /// `Ok(())` once held, [`Error::Resource`] if a poll found it held,
    /// [`Error::Timeout`] if a bounded wait ran out, and
    /// [`Error::WouldBlockInInterrupt`] from interrupt context.
    pub fn acquire(&self, timeout: Timeout) -> Result<()> {
        if isr::is_active() {
            return Err(Error::WouldBlockInInterrupt);
        }
        let me = thread::current_id();
        let deadline = timeout.deadline();
        let mut state = self.state.lock();

        if state.owner == Some(me) {
            match self.kind {
                MutexType::Recursive => {
                    state.depth += 1;
                    return Ok(());
                }
                MutexType::Normal if timeout.is_forever() => {
                    log::error!(target: "FurryMutex", "thread {me} deadlocks on its own mutex");
                    panic!("FurryMutex: thread {me} acquired a non-recursive mutex it already holds");
                }
                MutexType::Normal => {}
            }
        }

        let mut expired = false;
        loop {
            if state.owner.is_none() {
                state.owner = Some(me);
                state.depth = 1;
                return Ok(());
            }
            if timeout.is_poll() || expired {
                return Err(timeout.expired_error());
            }
            expired = !park(&self.released, &mut state, deadline);
        }
    }

    /// Release one level of ownership.
    ///
    /// # Returns
    ///
    /// [`Error::NotOwned`] if the calling thread does not hold the mutex,
    /// [`Error::InvalidInInterrupt`] from interrupt context.
    pub fn release(&self) -> Result<()> {
        if isr::is_active() {
            return Err(Error::InvalidInInterrupt);
        }
        let me = thread::current_id();
        let mut state = self.state.lock();
        if state.owner != Some(me) {
            return Err(Error::NotOwned);
        }
        state.depth -= 1;
        if state.depth == 0 {
            state.owner = None;
            self.released.notify_one();
        }
        Ok(())
    }

    /// Thread currently holding the mutex.
    pub fn owner(&self) -> Option<ThreadId> {
        self.state.lock().owner
    }

    /// Acquire and return a guard that releases on drop.
    pub fn lock(&self, timeout: Timeout) -> Result<MutexGuard<'_>> {
        self.acquire(timeout)?;
        Ok(MutexGuard {
            mutex: self,
            _not_send: PhantomData,
        })
    }
}

impl Drop for Mutex {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        if let Some(owner) = self.state.get_mut().owner {
            log::error!(target: "FurryMutex", "mutex destroyed while held by thread {owner}");
            panic!("FurryMutex: destroyed while held by thread {owner}");
        }
    }
}

/// Holds a [`Mutex`] until dropped. Must be dropped on the acquiring thread.
pub struct MutexGuard<'a> {
    mutex: &'a Mutex,
    _not_send: PhantomData<*const ()>,
}

impl Drop for MutexGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.mutex.release() {
            log::error!(target: "FurryMutex", "guard release failed: {err}");
        }
    }
}
