//! Kernel services: the tick counter, delays, and the application context.
//!
//! [`Kernel`] is the one object an application builds at start-up. It owns
//! the record [`Registry`] and the configuration, and hands out thread
//! builders with the configured defaults, so nothing in the core depends on
//! hidden global state beyond the tick epoch and the thread table.

use crate::config::{KernelConfig, TICK_FREQUENCY_HZ};
use crate::error::{Error, Result};
use crate::isr;
use crate::record::Registry;
use crate::thread::ThreadBuilder;
use crate::time::ticks_to_ms;
use core::time::Duration;
use portable_atomic::{AtomicBool, Ordering};
use std::time::Instant;

static EPOCH: spin::Lazy<Instant> = spin::Lazy::new(Instant::now);

/// Ticks elapsed since the core was first used. Wraps like a 32-bit counter.
pub fn tick() -> u32 {
    let elapsed = EPOCH.elapsed();
    (elapsed.as_millis() * u128::from(TICK_FREQUENCY_HZ) / 1000) as u32
}

pub fn tick_frequency() -> u32 {
    TICK_FREQUENCY_HZ
}

/// Whether the caller runs in interrupt context.
pub fn is_irq() -> bool {
    isr::is_active()
}

fn forbid_interrupt(op: &str) {
    if isr::is_active() {
        log::error!(target: "Kernel", "{op} called from interrupt context");
        panic!("Kernel: {op} from interrupt context");
    }
}

/// Sleep for `ticks` kernel ticks. Fatal in interrupt context.
pub fn delay_tick(ticks: u32) {
    forbid_interrupt("delay_tick");
    std::thread::sleep(Duration::from_millis(u64::from(ticks_to_ms(ticks))));
}

/// Sleep for `ms` milliseconds. Fatal in interrupt context.
pub fn delay_ms(ms: u32) {
    forbid_interrupt("delay_ms");
    std::thread::sleep(Duration::from_millis(u64::from(ms)));
}

/// Sleep for `us` microseconds. Fatal in interrupt context.
pub fn delay_us(us: u32) {
    forbid_interrupt("delay_us");
    std::thread::sleep(Duration::from_micros(u64::from(us)));
}

/// Application-wide context.
pub struct Kernel {
    config: KernelConfig,
    registry: Registry,
    /// Whether the kernel has been initialized
    initialized: AtomicBool,
}

impl Kernel {
    /// Create a new kernel instance.
    ///
    /// # Arguments
    ///
    /// * `config` - Application name, record wait warning interval and
    ///   default thread stack size
    ///
    /// # Returns
    ///
    /// A new kernel instance ready for initialization.
    pub fn new(config: KernelConfig) -> Self {
        Self {
            registry: Registry::with_wait_warn_interval(config.record_wait_warn_interval),
            config,
            initialized: AtomicBool::new(false),
        }
    }

    /// Initialize the kernel.
    ///
    /// # Returns
    ///
    /// `Ok(())` on the first call, [`Error::InvalidParameter`] afterwards.
    pub fn init(&self) -> Result<()> {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::InvalidParameter);
        }
        spin::Lazy::force(&EPOCH);
        log::debug!(
            target: "Kernel",
            "{} up, tick {} Hz, default stack {} bytes",
            self.config.name,
            TICK_FREQUENCY_HZ,
            self.config.thread_stack_size
        );
        Ok(())
    }

    /// Check if the kernel has been initialized.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// The record registry owned by this kernel.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Thread builder preset with the configured stack size.
    pub fn thread_builder(&self) -> ThreadBuilder {
        ThreadBuilder::new().stack_size(self.config.thread_stack_size)
    }

    /// Shut down, tearing down the registry.
    ///
    /// Fails with [`Error::InUse`] if records are still held.
    pub fn teardown(self) -> Result<()> {
        let name = self.config.name;
        let result = self.registry.teardown();
        match result {
            Ok(()) => log::debug!(target: "Kernel", "{name} down"),
            Err(err) => log::warn!(target: "Kernel", "{name} teardown: {err}"),
        }
        result
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_init_once() {
        let kernel = Kernel::default();
        assert!(!kernel.is_initialized());
        assert_eq!(kernel.init(), Ok(()));
        assert!(kernel.is_initialized());
        assert_eq!(kernel.init(), Err(Error::InvalidParameter));
    }

    #[test]
    fn test_tick_advances() {
        let start = tick();
        delay_ms(20);
        let elapsed = tick().wrapping_sub(start);
        assert!(elapsed >= 20, "only {elapsed} ticks passed");
        assert_eq!(tick_frequency(), 1000);
    }

    #[test]
    fn test_is_irq() {
        assert!(!is_irq());
        isr::run(|| assert!(is_irq()));
    }

    #[test]
    #[should_panic(expected = "interrupt context")]
    fn test_delay_in_isr_is_fatal() {
        let _guard = isr::enter();
        delay_us(1);
    }

    #[test]
    fn test_thread_builder_uses_registry() {
        let kernel = Arc::new(Kernel::default());
        kernel.init().unwrap();
        let opener = {
            let kernel = kernel.clone();
            kernel
                .thread_builder()
                .name("opener")
                .spawn(move || {
                    let value: Arc<u32> = kernel.registry().open("service");
                    kernel.registry().close("service");
                    *value
                })
                .unwrap()
        };
        kernel.registry().create("service", Arc::new(9u32));
        assert_eq!(opener.join().unwrap(), 9);
        let kernel = Arc::try_unwrap(kernel).ok().unwrap();
        assert_eq!(kernel.teardown(), Ok(()));
    }
}
