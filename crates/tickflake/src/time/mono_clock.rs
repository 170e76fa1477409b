use core::time::Duration;
use std::{
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
};

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

use crate::time::{CUSTOM_EPOCH, SystemClock, TimeSource};

/// Shared ticker thread that updates every millisecond.
#[derive(Debug)]
struct SharedTickerInner {
    current: AtomicU64,
    _handle: OnceLock<JoinHandle<()>>,
}

/// A time source that never goes backward.
///
/// The wall clock is read once, at construction, to anchor the epoch offset.
/// After that a background thread advances a shared counter from a monotonic
/// [`Instant`], so NTP steps or manual clock changes cannot move readings
/// backward. Identifiers minted with this clock cannot hit the clock
/// regression wait of the period-gated sequence; the trade-off is that
/// readings drift from the wall clock by whatever adjustment the system
/// applies while the process runs.
///
/// Clones share the same ticker. The thread exits once the last clone is
/// dropped.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    inner: Arc<SharedTickerInner>,
    epoch_offset: u64, // in milliseconds
}

impl Default for MonotonicClock {
    /// Constructs a monotonic clock aligned to [`CUSTOM_EPOCH`].
    fn default() -> Self {
        Self::with_epoch(CUSTOM_EPOCH)
    }
}

impl MonotonicClock {
    /// Constructs a monotonic clock with `epoch` (a [`Duration`] since
    /// 1970-01-01 UTC) as its zero point.
    ///
    /// # Panics
    ///
    /// Panics if the ticker thread cannot be spawned.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use tickflake::{MonotonicClock, TimeSource};
    ///
    /// let clock = MonotonicClock::with_epoch(Duration::ZERO);
    /// let first = clock.current_millis();
    /// std::thread::sleep(Duration::from_millis(5));
    /// assert!(clock.current_millis() >= first);
    /// ```
    pub fn with_epoch(epoch: Duration) -> Self {
        let start = Instant::now();
        let epoch_offset = SystemClock::with_epoch(epoch).current_millis();

        let inner = Arc::new(SharedTickerInner {
            current: AtomicU64::new(0),
            _handle: OnceLock::new(),
        });

        let weak_inner = Arc::downgrade(&inner);
        let handle = thread::spawn(move || {
            let mut tick = 0;

            loop {
                let Some(inner_ref) = weak_inner.upgrade() else {
                    break;
                };

                // Absolute target time of the next tick
                let target = start + Duration::from_millis(tick);

                let now = Instant::now();
                if now < target {
                    thread::sleep(target - now);
                }

                let now_ms = start.elapsed().as_millis() as u64;
                inner_ref.current.store(now_ms, Ordering::Relaxed);

                tick = now_ms + 1;
            }
        });

        // Freshly created, so the cell is empty.
        let _ = inner._handle.set(handle);

        Self {
            inner,
            epoch_offset,
        }
    }
}

impl TimeSource for MonotonicClock {
    fn current_millis(&self) -> u64 {
        self.epoch_offset
            .wrapping_add(self.inner.current.load(Ordering::Relaxed))
    }
}
