//! Bounded FIFO message queue.
//!
//! The queue holds at most `capacity` items of one type. Producers block
//! while it is full and consumers while it is empty, each up to their
//! timeout. Interrupt handlers may only use zero timeouts, which is what the
//! [`MessageQueueIsr`] view enforces.

use super::park;
use crate::error::{Error, Result};
use crate::isr;
use crate::time::Timeout;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Fixed-capacity FIFO of `T`.
pub struct MessageQueue<T> {
    capacity: usize,
    items: Mutex<VecDeque<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T: Send> MessageQueue<T> {
    /// Create a queue for `capacity` items. A zero capacity is a fatal error.
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            log::error!(target: "FurryQueue", "zero capacity");
            panic!("FurryQueue: capacity must be non-zero");
        }
        Self {
            capacity,
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Append `item`, waiting up to `timeout` for space.
    ///
    /// On failure the item is dropped.
    ///
    /// # Returns
    ///
    /// [`Error::Resource`] if a poll found the queue full,
    /// [`Error::Timeout`] if a bounded wait ran out, and
    /// [`Error::InvalidInInterrupt`] for a non-zero timeout in interrupt context.
    pub fn put(&self, item: T, timeout: Timeout) -> Result<()> {
        if isr::is_active() && !timeout.is_poll() {
            return Err(Error::InvalidInInterrupt);
        }
        let deadline = timeout.deadline();
        let mut items = self.items.lock();
        let mut expired = false;
        loop {
            if items.len() < self.capacity {
                items.push_back(item);
                self.not_empty.notify_one();
                return Ok(());
            }
            if timeout.is_poll() || expired {
                return Err(timeout.expired_error());
            }
            expired = !park(&self.not_full, &mut items, deadline);
        }
    }

    /// Remove the oldest item, waiting up to `timeout` for one to arrive.
    pub fn get(&self, timeout: Timeout) -> Result<T> {
        if isr::is_active() && !timeout.is_poll() {
            return Err(Error::InvalidInInterrupt);
        }
        let deadline = timeout.deadline();
        let mut items = self.items.lock();
        let mut expired = false;
        loop {
            if let Some(item) = items.pop_front() {
                self.not_full.notify_one();
                return Ok(item);
            }
            if timeout.is_poll() || expired {
                return Err(timeout.expired_error());
            }
            expired = !park(&self.not_empty, &mut items, deadline);
        }
    }

    /// Drop every queued item. Not allowed from interrupt context.
    pub fn reset(&self) -> Result<()> {
        if isr::is_active() {
            return Err(Error::InvalidInInterrupt);
        }
        let dropped = {
            let mut items = self.items.lock();
            let dropped = items.len();
            items.clear();
            self.not_full.notify_all();
            dropped
        };
        log::debug!(target: "FurryQueue", "reset dropped {dropped} messages");
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Size in bytes of one message.
    pub fn item_size(&self) -> usize {
        core::mem::size_of::<T>()
    }

    /// Number of queued messages.
    pub fn count(&self) -> usize {
        self.items.lock().len()
    }

    /// Number of free slots.
    pub fn space(&self) -> usize {
        self.capacity - self.count()
    }

    /// Non-blocking view for interrupt handlers.
    pub fn isr(&self) -> MessageQueueIsr<'_, T> {
        MessageQueueIsr { queue: self }
    }
}

/// The interrupt-safe subset of [`MessageQueue`]: every call is a poll.
pub struct MessageQueueIsr<'a, T> {
    queue: &'a MessageQueue<T>,
}

impl<T: Send> MessageQueueIsr<'_, T> {
    pub fn put(&self, item: T) -> Result<()> {
        self.queue.put(item, Timeout::NONE)
    }

    pub fn get(&self) -> Result<T> {
        self.queue.get(Timeout::NONE)
    }

    pub fn count(&self) -> usize {
        self.queue.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_fifo() {
        let queue = MessageQueue::new(3);
        for i in 1..=3u32 {
            queue.put(i, Timeout::NONE).unwrap();
        }
        assert_eq!(queue.count(), 3);
        assert_eq!(queue.space(), 0);
        assert_eq!(queue.get(Timeout::NONE), Ok(1));
        assert_eq!(queue.get(Timeout::NONE), Ok(2));
        assert_eq!(queue.get(Timeout::NONE), Ok(3));
    }

    #[test]
    fn test_full_and_empty() {
        let queue = MessageQueue::new(1);
        assert_eq!(queue.get(Timeout::NONE), Err(Error::Resource));
        assert_eq!(queue.get(Timeout::from_millis(5)), Err(Error::Timeout));
        queue.put(7u8, Timeout::NONE).unwrap();
        assert_eq!(queue.put(8, Timeout::NONE), Err(Error::Resource));
        assert_eq!(queue.put(8, Timeout::from_millis(5)), Err(Error::Timeout));
        assert_eq!(queue.get(Timeout::NONE), Ok(7));
    }

    #[test]
    fn test_item_size_and_capacity() {
        let queue: MessageQueue<[u8; 12]> = MessageQueue::new(4);
        assert_eq!(queue.item_size(), 12);
        assert_eq!(queue.capacity(), 4);
        assert_eq!(queue.space(), 4);
    }

    #[test]
    fn test_reset() {
        let queue = MessageQueue::new(2);
        queue.put('a', Timeout::NONE).unwrap();
        queue.put('b', Timeout::NONE).unwrap();
        queue.reset().unwrap();
        assert_eq!(queue.count(), 0);
        assert_eq!(isr::run(|| queue.reset()), Err(Error::InvalidInInterrupt));
    }

    #[test]
    fn test_isr_rules() {
        let queue = MessageQueue::new(1);
        isr::run(|| {
            assert_eq!(queue.put(1, Timeout::from_millis(1)), Err(Error::InvalidInInterrupt));
            assert_eq!(queue.get(Timeout::FOREVER), Err(Error::InvalidInInterrupt));
            queue.isr().put(1).unwrap();
            assert_eq!(queue.isr().put(2), Err(Error::Resource));
            assert_eq!(queue.isr().count(), 1);
        });
        assert_eq!(queue.get(Timeout::NONE), Ok(1));
    }

    #[test]
    fn test_blocked_producer_resumes() {
        let queue = Arc::new(MessageQueue::new(1));
        queue.put(1, Timeout::NONE).unwrap();
        let producer = {
            let queue = queue.clone();
            std::thread::spawn(move || queue.put(2, Timeout::from_millis(2000)))
        };
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(queue.get(Timeout::NONE), Ok(1));
        assert_eq!(producer.join().unwrap(), Ok(()));
        assert_eq!(queue.get(Timeout::from_millis(2000)), Ok(2));
    }

    #[test]
    #[should_panic(expected = "capacity")]
    fn test_zero_capacity_is_fatal() {
        let _ = MessageQueue::<u8>::new(0);
    }
}
