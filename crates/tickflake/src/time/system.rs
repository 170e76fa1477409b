use core::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};
#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};

use crate::time::{CUSTOM_EPOCH, TimeSource};

/// A wall-clock time source measuring milliseconds since a fixed epoch.
///
/// Every call reads `SystemTime::now()`, so the value follows any adjustment
/// made to the system clock, including backward steps. Backward steps are not
/// compensated here; see [`MonotonicClock`] for a source that never goes
/// back.
///
/// A wall clock earlier than the epoch does not panic: the difference wraps
/// modulo `2^64`, and the [`TimestampSource`] then reduces it to the
/// timestamp width like any other reading.
///
/// [`MonotonicClock`]: crate::MonotonicClock
/// [`TimestampSource`]: crate::TimestampSource
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SystemClock {
    epoch_millis: u64,
}

impl SystemClock {
    /// Creates a clock whose zero point is `epoch`, given as a [`Duration`]
    /// since 1970-01-01 UTC.
    pub const fn with_epoch(epoch: Duration) -> Self {
        Self {
            epoch_millis: epoch.as_millis() as u64,
        }
    }

    /// The configured epoch.
    pub const fn epoch(&self) -> Duration {
        Duration::from_millis(self.epoch_millis)
    }
}

impl Default for SystemClock {
    /// A clock aligned to [`CUSTOM_EPOCH`].
    fn default() -> Self {
        Self::with_epoch(CUSTOM_EPOCH)
    }
}

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        // A clock before 1970 reads as 0.
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64);
        now.wrapping_sub(self.epoch_millis)
    }
}
