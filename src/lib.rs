//! Core runtime of the Furry firmware, hosted on `std`.
//!
//! - [`string`]: [`FurryString`], a growable NUL-terminated byte string with
//!   C-compatible `printf` formatting, search/replace and UTF-8 helpers
//! - [`sync`]: mutex, semaphore, event flag and message queue with timeouts
//! - [`thread`]: thread registration, builder and per-thread flags
//! - [`record`]: named singletons with blocking lookup
//! - [`kernel`]: tick counter, delays and the [`Kernel`] application context
//! - [`isr`]: the interrupt-context model every primitive checks

pub mod config;
pub mod error;
pub mod isr;
pub mod kernel;
pub mod record;
pub mod string;
pub mod sync;
pub mod thread;
pub mod time;

pub use config::KernelConfig;
pub use error::{Error, Result};
pub use kernel::Kernel;
pub use record::Registry;
pub use string::FurryString;
pub use sync::{EventFlag, FlagWait, MessageQueue, Mutex, MutexType, Semaphore, WaitMode};
pub use thread::{Thread, ThreadBuilder, ThreadId, ThreadState};
pub use time::Timeout;
