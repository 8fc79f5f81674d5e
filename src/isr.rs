//! Interrupt-context model for hosted builds.
//!
//! A real MCU enters an ISR on a hardware event. Here a thread enters
//! "interrupt context" by holding an [`IsrGuard`]; while it does, every
//! primitive behaves as it would inside an interrupt handler:
//! - No blocking waits
//! - No mutex operations
//! - Only non-blocking signaling (flag set/clear, zero-timeout queue put)

use core::cell::Cell;
use core::marker::PhantomData;
use portable_atomic::{AtomicU64, Ordering};

static ISR_ENTRIES: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static NESTING: Cell<u32> = const { Cell::new(0) };
}

/// Marks the current thread as running in interrupt context until dropped.
///
/// Guards nest; the thread leaves interrupt context when the outermost one
/// is dropped. The guard is tied to the thread that created it.
pub struct IsrGuard {
    _not_send: PhantomData<*const ()>,
}

/// Enter interrupt context on the current thread.
pub fn enter() -> IsrGuard {
    NESTING.with(|n| n.set(n.get() + 1));
    ISR_ENTRIES.fetch_add(1, Ordering::Relaxed);
    IsrGuard {
        _not_send: PhantomData,
    }
}

impl Drop for IsrGuard {
    fn drop(&mut self) {
        NESTING.with(|n| n.set(n.get() - 1));
    }
}

/// Run `f` as if it were an interrupt handler.
pub fn run<R>(f: impl FnOnce() -> R) -> R {
    let _guard = enter();
    f()
}

/// Whether the current thread is executing in interrupt context.
pub fn is_active() -> bool {
    NESTING.with(|n| n.get() > 0)
}

/// Current interrupt nesting depth of the calling thread.
pub fn nesting() -> u32 {
    NESTING.with(|n| n.get())
}

/// Total number of interrupt-context entries since process start.
pub fn total_entries() -> u64 {
    ISR_ENTRIES.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_nesting() {
        assert!(!is_active());
        let before = total_entries();
        {
            let _outer = enter();
            assert!(is_active());
            {
                let _inner = enter();
                assert_eq!(nesting(), 2);
            }
            assert_eq!(nesting(), 1);
            assert!(is_active());
        }
        assert!(!is_active());
        assert!(total_entries() >= before + 2);
    }

    #[test]
    fn test_run_returns_value() {
        let value = run(|| {
            assert!(is_active());
            7
        });
        assert_eq!(value, 7);
        assert!(!is_active());
    }

    #[test]
    fn test_context_is_per_thread() {
        let _guard = enter();
        let other = std::thread::spawn(is_active).join().unwrap();
        assert!(!other);
    }
}
