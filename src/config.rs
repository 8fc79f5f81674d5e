//! Kernel-wide configuration.
//!
//! Values that never change at runtime are constants; everything an
//! application may want to tune lives in [`KernelConfig`].

use core::time::Duration;

/// Kernel tick rate. One tick is one millisecond.
pub const TICK_FREQUENCY_HZ: u32 = 1000;

/// Usable bits of an event flag word.
pub const EVENT_FLAG_BITS: u32 = 24;

/// Usable bits of a thread flag word.
pub const THREAD_FLAG_BITS: u32 = 31;

/// Mask of the bits an event flag accepts.
pub const EVENT_FLAG_MASK: u32 = (1 << EVENT_FLAG_BITS) - 1;

/// Mask of the bits a thread flag word accepts.
pub const THREAD_FLAG_MASK: u32 = (1 << THREAD_FLAG_BITS) - 1;

/// Runtime configuration for a [`Kernel`](crate::kernel::Kernel).
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Application name, used as a prefix in kernel log lines
    pub name: &'static str,
    /// How long a record open may stay pending before a warning is logged
    pub record_wait_warn_interval: Duration,
    /// Default stack size for threads created through the kernel
    pub thread_stack_size: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            name: "furry",
            record_wait_warn_interval: Duration::from_secs(5),
            thread_stack_size: 64 * 1024,
        }
    }
}
