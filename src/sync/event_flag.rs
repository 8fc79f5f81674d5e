//! Event flag: a 24-bit word that threads wait on and anyone may set.

use super::flags::{FlagWait, FlagWord};
use crate::config::EVENT_FLAG_MASK;
use crate::error::{Error, Result};
use crate::isr;
use crate::time::Timeout;

/// Group of 24 event bits with blocking waits.
///
/// `set` and `clear` are legal from interrupt context, `wait` is not.
pub struct EventFlag {
    word: FlagWord,
}

impl EventFlag {
    /// Create an event flag with every bit clear.
    pub fn new() -> Self {
        Self {
            word: FlagWord::new(EVENT_FLAG_MASK, "FurryEventFlag"),
        }
    }

    /// OR `bits` into the word and wake waiters.
    ///
    /// # Returns
    ///
    /// The flag word after the update.
    pub fn set(&self, bits: u32) -> u32 {
        self.word.set(bits)
    }

    /// Clear `bits`.
    ///
    /// # Returns
    ///
    /// The flag word before the update.
    pub fn clear(&self, bits: u32) -> u32 {
        self.word.clear(bits)
    }

    /// Current flag word.
    pub fn get(&self) -> u32 {
        self.word.get()
    }

    /// Block until `bits` satisfy `wait` or `timeout` runs out.
    ///
    /// # Arguments
    ///
    /// * `bits` - Bits to wait for
    /// * `wait` - Any/all and whether to clear the bits on success
    /// * `timeout` - How long to block
    ///
    /// # Returns
    ///
    /// The flag word at the moment the wait was satisfied, before clearing.
    pub fn wait(&self, bits: u32, wait: FlagWait, timeout: Timeout) -> Result<u32> {
        if isr::is_active() {
            return Err(Error::WouldBlockInInterrupt);
        }
        self.word.wait(bits, wait, timeout)
    }

    /// Non-blocking view for interrupt handlers.
    pub fn isr(&self) -> EventFlagIsr<'_> {
        EventFlagIsr { flag: self }
    }
}

impl Default for EventFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// The interrupt-safe subset of [`EventFlag`].
#[derive(Clone, Copy)]
pub struct EventFlagIsr<'a> {
    flag: &'a EventFlag,
}

impl EventFlagIsr<'_> {
    pub fn set(&self, bits: u32) -> u32 {
        self.flag.set(bits)
    }

    pub fn clear(&self, bits: u32) -> u32 {
        self.flag.clear(bits)
    }

    pub fn get(&self) -> u32 {
        self.flag.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_new_flag_is_clear() {
        assert_eq!(EventFlag::new().get(), 0);
    }

    #[test]
    fn test_wait_from_isr_is_rejected() {
        let flag = EventFlag::new();
        flag.set(1);
        let result = isr::run(|| flag.wait(1, FlagWait::ANY, Timeout::NONE));
        assert_eq!(result, Err(Error::WouldBlockInInterrupt));
        assert_eq!(flag.get(), 1);
    }

    #[test]
    fn test_isr_view_sets_bits_for_waiter() {
        let flag = Arc::new(EventFlag::new());
        let irq = {
            let flag = flag.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(10));
                isr::run(|| flag.isr().set(0b1000))
            })
        };
        let seen = flag.wait(0b1000, FlagWait::ANY, Timeout::from_millis(2000));
        assert_eq!(seen, Ok(0b1000));
        assert_eq!(irq.join().unwrap(), 0b1000);
        assert_eq!(flag.get(), 0);
    }

    #[test]
    fn test_highest_valid_bit() {
        let flag = EventFlag::new();
        assert_eq!(flag.set(1 << 23), 1 << 23);
        assert_eq!(flag.clear(1 << 23), 1 << 23);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_bit_24_is_fatal() {
        EventFlag::new().set(1 << 24);
    }
}
