use crate::{
    id::{Layout, low_mask},
    time::TimeSource,
};

/// A clock reduced to the width of the timestamp field.
///
/// [`TimestampSource::next`] returns `clock.current_millis() mod 2^bits`.
///
/// # Wraparound
///
/// Once the clock has run for `2^bits` milliseconds past its epoch the
/// reading silently wraps to `0`. From then on new identifiers sort before
/// old ones and may collide with identifiers minted `2^bits` milliseconds
/// earlier. This bounds the usable lifetime of a layout (about 69 years for
/// 41 bits). The gated sequences detect the wrap and start a fresh period.
#[derive(Clone, Debug)]
pub struct TimestampSource<T> {
    clock: T,
    bits: u32,
    mask: u64,
}

impl<T: TimeSource> TimestampSource<T> {
    /// Creates a source producing `bits`-wide timestamps. Widths above
    /// [`Layout::MAX_BITS`] are clamped to it.
    pub fn new(clock: T, bits: u32) -> Self {
        let bits = bits.min(Layout::MAX_BITS);
        Self {
            clock,
            bits,
            mask: low_mask(bits),
        }
    }

    /// Creates a source sized to the timestamp field of `layout`.
    pub fn for_layout(clock: T, layout: &Layout) -> Self {
        Self::new(clock, layout.timestamp_bits())
    }

    /// Returns the current timestamp, wrapped to the configured width.
    pub fn next(&self) -> u64 {
        self.clock.current_millis() & self.mask
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Largest value [`TimestampSource::next`] can return.
    pub fn max(&self) -> u64 {
        self.mask
    }

    pub fn clock(&self) -> &T {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct ManualClock(AtomicU64);

    impl TimeSource for ManualClock {
        fn current_millis(&self) -> u64 {
            self.0.load(Ordering::Relaxed)
        }
    }

    #[test]
    fn passes_through_in_range_values() {
        let clock = ManualClock(AtomicU64::new(1_000));
        let source = TimestampSource::new(&clock, 41);
        assert_eq!(source.next(), 1_000);
        assert_eq!(source.max(), (1 << 41) - 1);
    }

    #[test]
    fn wraps_at_width() {
        let clock = ManualClock(AtomicU64::new(255));
        let source = TimestampSource::new(&clock, 8);
        assert_eq!(source.next(), 255);

        clock.0.store(256, Ordering::Relaxed);
        assert_eq!(source.next(), 0);

        clock.0.store(256 + 17, Ordering::Relaxed);
        assert_eq!(source.next(), 17);
    }

    #[test]
    fn clamps_width_to_usable_bits() {
        let clock = ManualClock(AtomicU64::new(u64::MAX));
        let source = TimestampSource::new(&clock, 64);
        assert_eq!(source.bits(), 63);
        assert_eq!(source.next(), i64::MAX as u64);
    }

    #[test]
    fn sized_from_layout() {
        let clock = ManualClock(AtomicU64::new(0));
        let source = TimestampSource::for_layout(&clock, &Layout::TWITTER);
        assert_eq!(source.bits(), 41);
    }
}
