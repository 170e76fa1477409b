use core::cmp::Ordering;

use crate::{Error, Result, id::Layout};

/// How a timestamp reading relates to the period currently installed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// The reading falls in the installed period.
    Current,
    /// The reading is in a later period; a fresh counter must be installed.
    Advance,
    /// The reading is in an earlier period, either because the caller read
    /// the clock just before another caller moved the period on, or because
    /// the clock went backward.
    Behind,
}

/// The period granularity and per-period bound shared by the gated
/// sequences.
///
/// A timestamp `ts` belongs to period `ts >> shift`, so each period spans
/// `2^shift` timestamp units. Timestamps only wrap forward, so a reading
/// numerically above the installed period always counts as
/// [`Step::Advance`], however far ahead it is. A reading below it is
/// [`Step::Behind`] unless it trails by more than half of the
/// `2^(timestamp_bits - shift)` period circle, in which case the timestamp
/// wrapped and it also counts as [`Step::Advance`]. Trailing by exactly half
/// the circle is [`Step::Behind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodGate {
    shift: u32,
    bound: u64,
    period_bits: u32,
}

impl PeriodGate {
    /// Creates a gate for timestamps of `layout`.
    ///
    /// # Errors
    ///
    /// - [`Error::PeriodShiftTooWide`] when `shift` is not smaller than the
    ///   timestamp width.
    /// - [`Error::InvalidBound`] when `bound` is `0` or larger than
    ///   `2^sequence_bits`.
    pub fn new(layout: &Layout, shift: u32, bound: u64) -> Result<Self> {
        let timestamp_bits = layout.timestamp_bits();
        if shift >= timestamp_bits {
            return Err(Error::PeriodShiftTooWide {
                shift,
                timestamp_bits,
            });
        }

        let max = layout.max_sequence() + 1;
        if bound == 0 || bound > max {
            return Err(Error::InvalidBound { bound, max });
        }

        Ok(Self {
            shift,
            bound,
            period_bits: timestamp_bits - shift,
        })
    }

    pub fn shift(&self) -> u32 {
        self.shift
    }

    pub fn bound(&self) -> u64 {
        self.bound
    }

    /// Width of a period index in bits.
    pub fn period_bits(&self) -> u32 {
        self.period_bits
    }

    /// Maps a timestamp to its period index.
    pub fn period_of(&self, timestamp: u64) -> u64 {
        timestamp >> self.shift
    }

    /// First timestamp of `period`.
    pub fn start_of(&self, period: u64) -> u64 {
        (period & self.period_mask()) << self.shift
    }

    /// Classifies a reading's period against the installed one.
    pub fn step(&self, now: u64, installed: u64) -> Step {
        match now.cmp(&installed) {
            Ordering::Equal => Step::Current,
            Ordering::Greater => Step::Advance,
            Ordering::Less if self.wrapped(now, installed) => Step::Advance,
            Ordering::Less => Step::Behind,
        }
    }

    /// Returns `true` if moving from `installed` to `now` means the timestamp
    /// wrapped past its maximum.
    pub fn wrapped(&self, now: u64, installed: u64) -> bool {
        now < installed && installed - now > self.half_circle()
    }

    /// Logs a period transition, at `warn` when it follows a wrap.
    #[inline]
    pub(crate) fn note_advance(&self, _period: u64, _installed: u64) {
        #[cfg(feature = "tracing")]
        {
            if self.wrapped(_period, _installed) {
                tracing::warn!(period = _period, installed = _installed, "timestamp wrapped");
            } else {
                tracing::trace!(period = _period, installed = _installed, "period advanced");
            }
        }
    }

    fn half_circle(&self) -> u64 {
        1 << (self.period_bits - 1)
    }

    fn period_mask(&self) -> u64 {
        crate::id::low_mask(self.period_bits)
    }

    /// Bits needed to hold a live count in `0..=bound`.
    pub(crate) fn count_bits(&self) -> u32 {
        u64::BITS - self.bound.leading_zeros()
    }
}
