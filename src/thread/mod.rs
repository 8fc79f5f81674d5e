//! Threads as the rest of the core sees them.
//!
//! Any OS thread that calls into the core is registered on first use and
//! gets a [`ThreadId`] plus its own 31-bit flag word. Threads started with
//! [`ThreadBuilder`] are registered before they run, so their id and flags
//! are usable as soon as `spawn` returns. Registration ends when the thread
//! exits.
//!
//! Thread flags are the cheap sibling of [`EventFlag`](crate::sync::EventFlag):
//! anyone may set them, but only the owning thread waits on or clears them.

pub mod builder;

pub use builder::{JoinHandle, ThreadBuilder};

use crate::config::THREAD_FLAG_MASK;
use crate::error::{Error, Result};
use crate::isr;
use crate::sync::flags::{FlagWait, FlagWord};
use crate::time::Timeout;
use core::cell::RefCell;
use core::fmt;
use core::num::NonZeroUsize;
use portable_atomic::{AtomicU8, AtomicUsize, Ordering};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Unique identifier for threads.
///
/// Thread IDs are never reused and are guaranteed to be non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(NonZeroUsize);

impl ThreadId {
    fn next() -> Self {
        let raw = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        match NonZeroUsize::new(raw) {
            Some(id) => Self(id),
            None => panic!("thread id counter wrapped"),
        }
    }

    /// Get the raw ID value.
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Thread lifecycle as seen by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThreadState {
    /// Registered but its body has not started yet
    Starting = 0,
    /// Running its body
    Running = 1,
    /// Finished; the id stays unique but the thread is gone
    Stopped = 2,
}

impl ThreadState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ThreadState::Starting,
            1 => ThreadState::Running,
            _ => ThreadState::Stopped,
        }
    }
}

pub(crate) struct ThreadInner {
    id: ThreadId,
    name: Option<String>,
    state: AtomicU8,
    flags: FlagWord,
}

impl ThreadInner {
    fn new(name: Option<String>, state: ThreadState) -> Arc<Self> {
        Arc::new(Self {
            id: ThreadId::next(),
            name,
            state: AtomicU8::new(state as u8),
            flags: FlagWord::new(THREAD_FLAG_MASK, "Thread"),
        })
    }

    fn set_state(&self, state: ThreadState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// Every live thread known to the core.
static THREADS: spin::RwLock<BTreeMap<ThreadId, Arc<ThreadInner>>> =
    spin::RwLock::new(BTreeMap::new());

/// Ties a registry entry to the lifetime of the OS thread holding it.
struct Registration {
    inner: Arc<ThreadInner>,
}

impl Registration {
    fn install(inner: Arc<ThreadInner>) -> Self {
        THREADS.write().insert(inner.id, inner.clone());
        Self { inner }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        unregister(&self.inner);
        log::debug!(target: "Thread", "thread {} exited", self.inner.id);
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Registration>> = const { RefCell::new(None) };
}

/// Register a thread that has not started yet.
fn register(name: Option<String>) -> Arc<ThreadInner> {
    let inner = ThreadInner::new(name, ThreadState::Starting);
    THREADS.write().insert(inner.id, inner.clone());
    inner
}

fn unregister(inner: &ThreadInner) {
    inner.set_state(ThreadState::Stopped);
    THREADS.write().remove(&inner.id);
}

/// Make `inner` the identity of the calling thread.
fn adopt(inner: Arc<ThreadInner>) {
    inner.set_state(ThreadState::Running);
    CURRENT.with(|slot| *slot.borrow_mut() = Some(Registration { inner }));
}

/// Handle to a registered thread.
#[derive(Clone)]
pub struct Thread {
    inner: Arc<ThreadInner>,
}

impl Thread {
    /// Get the thread's unique identifier.
    pub fn id(&self) -> ThreadId {
        self.inner.id
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Get the thread's current state.
    pub fn state(&self) -> ThreadState {
        ThreadState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    /// Set flag bits on this thread and wake it if it waits for them.
    ///
    /// # Returns
    ///
    /// The thread's flag word after the update.
    pub fn flags_set(&self, bits: u32) -> u32 {
        self.inner.flags.set(bits)
    }

    /// Interrupt-safe view of this thread.
    pub fn signal(&self) -> ThreadSignal<'_> {
        ThreadSignal { thread: self }
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}

/// The part of a [`Thread`] an interrupt handler may touch.
#[derive(Clone, Copy)]
pub struct ThreadSignal<'a> {
    thread: &'a Thread,
}

impl ThreadSignal<'_> {
    pub fn id(&self) -> ThreadId {
        self.thread.id()
    }

    pub fn flags_set(&self, bits: u32) -> u32 {
        self.thread.flags_set(bits)
    }
}

/// Handle of the calling thread, registering it on first use.
pub fn current() -> Thread {
    CURRENT.with(|slot| {
        let mut slot = slot.borrow_mut();
        let registration = slot.get_or_insert_with(|| {
            let name = std::thread::current().name().map(str::to_owned);
            let registration = Registration::install(ThreadInner::new(name, ThreadState::Running));
            log::debug!(target: "Thread", "adopted thread {}", registration.inner.id);
            registration
        });
        Thread {
            inner: registration.inner.clone(),
        }
    })
}

/// Id of the calling thread.
pub fn current_id() -> ThreadId {
    current().id()
}

/// Look up a live thread by id.
pub fn find(id: ThreadId) -> Option<Thread> {
    THREADS
        .read()
        .get(&id)
        .map(|inner| Thread { inner: inner.clone() })
}

/// Give up the rest of the time slice.
pub fn yield_now() {
    std::thread::yield_now();
}

/// Set flag bits on thread `id`. Legal from interrupt context.
///
/// # Returns
///
/// The target's flag word after the update, or [`Error::InvalidParameter`]
/// if no live thread has that id.
pub fn flags_set(id: ThreadId, bits: u32) -> Result<u32> {
    let inner = THREADS
        .read()
        .get(&id)
        .cloned()
        .ok_or(Error::InvalidParameter)?;
    Ok(inner.flags.set(bits))
}

/// Clear bits in the calling thread's flag word.
///
/// # Returns
///
/// The flag word before the update.
pub fn flags_clear(bits: u32) -> Result<u32> {
    if isr::is_active() {
        return Err(Error::InvalidInInterrupt);
    }
    Ok(current().inner.flags.clear(bits))
}

/// The calling thread's flag word.
pub fn flags_get() -> Result<u32> {
    if isr::is_active() {
        return Err(Error::InvalidInInterrupt);
    }
    Ok(current().inner.flags.get())
}

/// Block until the calling thread's flags satisfy `wait` for `bits`.
///
/// # Returns
///
/// The flag word at the moment the wait was satisfied, before clearing.
pub fn flags_wait(bits: u32, wait: FlagWait, timeout: Timeout) -> Result<u32> {
    if isr::is_active() {
        return Err(Error::WouldBlockInInterrupt);
    }
    current().inner.flags.wait(bits, wait, timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_current_is_stable_per_thread() {
        let first = current_id();
        assert_eq!(current_id(), first);
        assert_eq!(current().state(), ThreadState::Running);
        let other = std::thread::spawn(current_id).join().unwrap();
        assert_ne!(other, first);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let a = std::thread::spawn(current_id).join().unwrap();
        let b = std::thread::spawn(current_id).join().unwrap();
        assert!(b > a);
        assert!(find(a).is_none());
    }

    #[test]
    fn test_flags_on_own_thread() {
        let me = current();
        flags_clear(THREAD_FLAG_MASK).unwrap();
        assert_eq!(flags_set(me.id(), 0b110), Ok(0b110));
        assert_eq!(flags_get(), Ok(0b110));
        assert_eq!(flags_wait(0b010, FlagWait::ANY, Timeout::NONE), Ok(0b110));
        assert_eq!(flags_get(), Ok(0b100));
        assert_eq!(flags_clear(0b100), Ok(0b100));
        assert_eq!(
            flags_wait(0b001, FlagWait::ANY, Timeout::NONE),
            Err(Error::Resource)
        );
    }

    #[test]
    fn test_flags_set_unknown_thread() {
        let gone = std::thread::spawn(current_id).join().unwrap();
        assert_eq!(flags_set(gone, 1), Err(Error::InvalidParameter));
    }

    #[test]
    fn test_flags_from_isr() {
        let me = current();
        isr::run(|| {
            assert_eq!(flags_get(), Err(Error::InvalidInInterrupt));
            assert_eq!(flags_clear(1), Err(Error::InvalidInInterrupt));
            assert_eq!(
                flags_wait(1, FlagWait::ANY, Timeout::NONE),
                Err(Error::WouldBlockInInterrupt)
            );
            me.signal().flags_set(1 << 30);
        });
        assert_eq!(flags_wait(1 << 30, FlagWait::ALL, Timeout::NONE), Ok(1 << 30));
    }

    #[test]
    fn test_wait_woken_by_other_thread() {
        let me = current();
        let waker = {
            let me = me.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(10));
                me.flags_set(0b1);
            })
        };
        assert_eq!(
            flags_wait(0b1, FlagWait::ANY, Timeout::from_millis(2000)),
            Ok(0b1)
        );
        waker.join().unwrap();
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_bit_31_is_fatal() {
        let me = current();
        me.flags_set(1 << 31);
    }
}
