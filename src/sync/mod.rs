//! Blocking synchronization primitives.
//!
//! Every blocking call takes a [`Timeout`](crate::Timeout) and follows the
//! same rules:
//! - a poll that cannot complete fails with [`Error::Resource`](crate::Error::Resource)
//! - a bounded wait that runs out fails with [`Error::Timeout`](crate::Error::Timeout)
//! - blocking from interrupt context is refused, never silently ignored
//!
//! Interrupt handlers get a separate view type per primitive (`isr()`) that
//! only exposes the calls that are legal there.

pub mod event_flag;
pub(crate) mod flags;
pub mod message_queue;
pub mod mutex;
pub mod semaphore;

pub use event_flag::{EventFlag, EventFlagIsr};
pub use flags::{FlagWait, WaitMode};
pub use message_queue::{MessageQueue, MessageQueueIsr};
pub use mutex::{Mutex, MutexGuard, MutexType};
pub use semaphore::{Semaphore, SemaphoreIsr};

use parking_lot::{Condvar, MutexGuard as RawGuard};
use std::time::Instant;

/// Sleep on `cond` until notified or until `deadline` passes.
///
/// # Returns
///
/// `false` once the deadline has passed, `true` after a wakeup.
pub(crate) fn park<T>(cond: &Condvar, guard: &mut RawGuard<'_, T>, deadline: Option<Instant>) -> bool {
    match deadline {
        None => {
            cond.wait(guard);
            true
        }
        Some(deadline) => !cond.wait_until(guard, deadline).timed_out(),
    }
}
