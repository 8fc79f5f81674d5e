//! Flag word shared by event flags and thread flags.
//!
//! Bits live in an atomic so readers never take the lock; every mutation and
//! every wait goes through the lock so a setter cannot slip between a
//! waiter's check and its sleep.

use super::park;
use crate::error::Result;
use crate::time::Timeout;
use parking_lot::{Condvar, Mutex};
use portable_atomic::{AtomicU32, Ordering};

/// Whether a wait needs any or all of the requested bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    Any,
    All,
}

/// Options for a flag wait: the mode plus whether satisfied bits are cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagWait {
    pub mode: WaitMode,
    pub clear: bool,
}

impl FlagWait {
    /// Wake when any requested bit is set, then clear the requested bits.
    pub const ANY: FlagWait = FlagWait {
        mode: WaitMode::Any,
        clear: true,
    };
    /// Wake when all requested bits are set, then clear them.
    pub const ALL: FlagWait = FlagWait {
        mode: WaitMode::All,
        clear: true,
    };

    /// Leave the bits set after the wait is satisfied.
    pub const fn no_clear(self) -> Self {
        FlagWait {
            mode: self.mode,
            clear: false,
        }
    }

    fn satisfied(&self, bits: u32, mask: u32) -> bool {
        match self.mode {
            WaitMode::Any => bits & mask != 0,
            WaitMode::All => bits & mask == mask,
        }
    }
}

pub(crate) struct FlagWord {
    bits: AtomicU32,
    lock: Mutex<()>,
    changed: Condvar,
    valid: u32,
    kind: &'static str,
}

impl FlagWord {
    pub(crate) fn new(valid: u32, kind: &'static str) -> Self {
        Self {
            bits: AtomicU32::new(0),
            lock: Mutex::new(()),
            changed: Condvar::new(),
            valid,
            kind,
        }
    }

    fn check(&self, mask: u32) {
        if mask & !self.valid != 0 {
            log::error!("{}: invalid flag bits {mask:#010x}", self.kind);
            panic!("{}: flag bits {:#010x} outside {:#010x}", self.kind, mask, self.valid);
        }
    }

    pub(crate) fn get(&self) -> u32 {
        self.bits.load(Ordering::Acquire)
    }

    /// OR `mask` in and wake waiters. Returns the word after the update.
    pub(crate) fn set(&self, mask: u32) -> u32 {
        self.check(mask);
        let _guard = self.lock.lock();
        let bits = self.bits.fetch_or(mask, Ordering::AcqRel) | mask;
        self.changed.notify_all();
        bits
    }

    /// Clear `mask`. Returns the word before the update.
    pub(crate) fn clear(&self, mask: u32) -> u32 {
        self.check(mask);
        let _guard = self.lock.lock();
        self.bits.fetch_and(!mask, Ordering::AcqRel)
    }

    /// Block until `wait` is satisfied for `mask` or `timeout` runs out.
    ///
    /// Returns the word as it was when the wait was satisfied, before any
    /// clearing.
    pub(crate) fn wait(&self, mask: u32, wait: FlagWait, timeout: Timeout) -> Result<u32> {
        self.check(mask);
        let deadline = timeout.deadline();
        let mut guard = self.lock.lock();
        let mut expired = false;
        loop {
            let bits = self.bits.load(Ordering::Acquire);
            if wait.satisfied(bits, mask) {
                if wait.clear {
                    self.bits.fetch_and(!mask, Ordering::AcqRel);
                }
                return Ok(bits);
            }
            if timeout.is_poll() || expired {
                return Err(timeout.expired_error());
            }
            expired = !park(&self.changed, &mut guard, deadline);
        }
    }
}
