//! Counting semaphore.

use super::park;
use crate::error::{Error, Result};
use crate::isr;
use crate::time::Timeout;
use parking_lot::{Condvar, Mutex};

/// Counting semaphore bounded by `max_count`.
pub struct Semaphore {
    max_count: u32,
    count: Mutex<u32>,
    available: Condvar,
}

impl Semaphore {
    /// Create a semaphore holding `initial_count` of `max_count` tokens.
    ///
    /// A zero `max_count` or an `initial_count` above it is a fatal error.
    pub fn new(max_count: u32, initial_count: u32) -> Self {
        if max_count == 0 || initial_count > max_count {
            log::error!(target: "FurrySemaphore", "bad counts {initial_count}/{max_count}");
            panic!("FurrySemaphore: initial count {initial_count} with max count {max_count}");
        }
        Self {
            max_count,
            count: Mutex::new(initial_count),
            available: Condvar::new(),
        }
    }

    /// Take one token, waiting up to `timeout` for one to be released.
    ///
    /// Interrupt handlers may only poll; any other timeout there fails with
    /// [`Error::InvalidInInterrupt`].
    pub fn acquire(&self, timeout: Timeout) -> Result<()> {
        if isr::is_active() && !timeout.is_poll() {
            return Err(Error::InvalidInInterrupt);
        }
        let deadline = timeout.deadline();
        let mut count = self.count.lock();
        let mut expired = false;
        loop {
            if *count > 0 {
                *count -= 1;
                return Ok(());
            }
            if timeout.is_poll() || expired {
                return Err(timeout.expired_error());
            }
            expired = !park(&self.available, &mut count, deadline);
        }
    }

    /// Return one token and wake a waiter.
    ///
    /// Fails with [`Error::Resource`] when the count is already at its maximum.
    pub fn release(&self) -> Result<()> {
        let mut count = self.count.lock();
        if *count >= self.max_count {
            return Err(Error::Resource);
        }
        *count += 1;
        self.available.notify_one();
        Ok(())
    }

    pub fn count(&self) -> u32 {
        *self.count.lock()
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    /// Non-blocking view for interrupt handlers.
    pub fn isr(&self) -> SemaphoreIsr<'_> {
        SemaphoreIsr { semaphore: self }
    }
}

/// The interrupt-safe subset of [`Semaphore`].
#[derive(Clone, Copy)]
pub struct SemaphoreIsr<'a> {
    semaphore: &'a Semaphore,
}

impl SemaphoreIsr<'_> {
    /// Take a token if one is available right now.
    pub fn try_acquire(&self) -> Result<()> {
        self.semaphore.acquire(Timeout::NONE)
    }

    pub fn release(&self) -> Result<()> {
        self.semaphore.release()
    }

    pub fn count(&self) -> u32 {
        self.semaphore.count()
    }
}
