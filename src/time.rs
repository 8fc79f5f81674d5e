//! Timeouts and tick conversions.
//!
//! Every blocking call in the crate takes a [`Timeout`]. A timeout is either
//! a poll (do not wait at all), a bounded wait, or a wait without limit.

use crate::config::TICK_FREQUENCY_HZ;
use core::time::Duration;
use std::time::Instant;

/// How long a blocking operation may wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timeout(Option<Duration>);

impl Timeout {
    /// Do not wait: fail immediately if the operation cannot complete.
    pub const NONE: Timeout = Timeout(Some(Duration::ZERO));
    /// Wait until the operation completes.
    pub const FOREVER: Timeout = Timeout(None);

    /// Bounded wait of `ms` milliseconds.
    pub const fn from_millis(ms: u64) -> Self {
        Timeout(Some(Duration::from_millis(ms)))
    }

    /// Bounded wait expressed in kernel ticks.
    ///
    /// `u32::MAX` ticks means [`Timeout::FOREVER`], `0` means [`Timeout::NONE`].
    pub const fn from_ticks(ticks: u32) -> Self {
        if ticks == u32::MAX {
            Timeout::FOREVER
        } else {
            Timeout::from_millis(ticks_to_ms(ticks) as u64)
        }
    }

    pub fn is_poll(&self) -> bool {
        matches!(self.0, Some(d) if d.is_zero())
    }

    pub fn is_forever(&self) -> bool {
        self.0.is_none()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.0
    }

    /// Absolute point in time at which a wait started now gives up.
    ///
    /// Returns `None` for [`Timeout::FOREVER`].
    pub fn deadline(&self) -> Option<Instant> {
        self.0.map(|d| {
            let now = Instant::now();
            now.checked_add(d)
                .unwrap_or_else(|| now + Duration::from_secs(365 * 24 * 60 * 60))
        })
    }

    /// Error to report when a wait under this timeout did not succeed.
    pub(crate) fn expired_error(&self) -> crate::Error {
        if self.is_poll() {
            crate::Error::Resource
        } else {
            crate::Error::Timeout
        }
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Timeout(Some(d))
    }
}

/// Convert milliseconds to kernel ticks.
pub const fn ms_to_ticks(ms: u32) -> u32 {
    if TICK_FREQUENCY_HZ == 1000 {
        ms
    } else {
        ((ms as u64 * TICK_FREQUENCY_HZ as u64) / 1000) as u32
    }
}

/// Convert kernel ticks to milliseconds.
pub const fn ticks_to_ms(ticks: u32) -> u32 {
    if TICK_FREQUENCY_HZ == 1000 {
        ticks
    } else {
        ((ticks as u64 * 1000) / TICK_FREQUENCY_HZ as u64) as u32
    }
}
