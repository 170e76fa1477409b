use core::convert::Infallible;

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    id::low_mask,
    sequence::{Draw, GatedSequence, PeriodGate, SequenceStatus, Step},
    time::{TimeSource, TimestampSource},
};

/// A lock-free period-gated sequence.
///
/// The installed period key and the live count share a single [`AtomicU64`]:
///
/// ```text
///  +-----------------------------+---------------------+
///  | period key (period bits)    | count (count bits)  |
///  +-----------------------------+---------------------+
/// ```
///
/// Drawing a value and installing a fresh counter for a new period are both
/// one compare-and-swap on that word, so the period transition and the hot
/// increment path never take a lock, and a reader can never pair one
/// period's key with another period's count.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Lock-free
///
/// ## See Also
/// - [`LockGatedSequence`]
///
/// [`LockGatedSequence`]: crate::LockGatedSequence
pub struct AtomicGatedSequence<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    source: TimestampSource<T>,
    gate: PeriodGate,
    count_bits: u32,
}

impl<T> AtomicGatedSequence<T>
where
    T: TimeSource,
{
    /// Creates a sequence whose first counter serves the period of the
    /// current reading.
    ///
    /// # Example
    /// ```
    /// use tickflake::{
    ///     AtomicGatedSequence, Layout, PeriodGate, SequenceStatus, SystemClock, TimestampSource,
    /// };
    ///
    /// let layout = Layout::TWITTER;
    /// let source = TimestampSource::for_layout(SystemClock::default(), &layout);
    /// let gate = PeriodGate::new(&layout, 0, 4096).unwrap();
    /// let sequence = AtomicGatedSequence::new(source, gate);
    ///
    /// let draw = loop {
    ///     match sequence.poll() {
    ///         SequenceStatus::Ready(draw) => break draw,
    ///         SequenceStatus::Pending { .. } => core::hint::spin_loop(),
    ///     }
    /// };
    /// assert!(draw.sequence < 4096);
    /// ```
    pub fn new(source: TimestampSource<T>, gate: PeriodGate) -> Self {
        let count_bits = gate.count_bits();
        let period = gate.period_of(source.next());
        let initial = pack(period, 0, count_bits);
        Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(initial)),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(initial),
            source,
            gate,
            count_bits,
        }
    }

    /// Attempts one draw.
    ///
    /// Returns [`SequenceStatus::Pending`] when the current period is
    /// exhausted or the reading lags the installed period. Losing a
    /// compare-and-swap race is not exhaustion and is retried internally.
    pub fn poll(&self) -> SequenceStatus {
        match self.try_poll() {
            Ok(status) => status,
            Err(e) =>
            {
                #[allow(unreachable_code)]
                match e {}
            }
        }
    }

    /// A fallible version of [`Self::poll`], kept for parity with
    /// [`LockGatedSequence`](crate::LockGatedSequence). It never fails.
    ///
    /// # Errors
    /// - This method currently does not return any errors and always returns
    ///   `Ok`.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll(&self) -> Result<SequenceStatus, Infallible> {
        let timestamp = self.source.next();
        let period = self.gate.period_of(timestamp);

        let mut current = self.state.load(Ordering::Relaxed);
        loop {
            let (installed, count) = unpack(current, self.count_bits);

            let (next, sequence) = match self.gate.step(period, installed) {
                Step::Current if count < self.gate.bound() => {
                    (pack(installed, count + 1, self.count_bits), count)
                }
                Step::Current => return Ok(self.cold_exhausted(installed)),
                Step::Advance => {
                    self.gate.note_advance(period, installed);
                    (pack(period, 1, self.count_bits), 0)
                }
                Step::Behind => return Ok(self.cold_behind(period, installed)),
            };

            match self.state.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(SequenceStatus::Ready(Draw { timestamp, sequence })),
                Err(actual) => current = actual,
            }
        }
    }

    /// The period whose counter is currently installed.
    pub fn period_key(&self) -> u64 {
        unpack(self.state.load(Ordering::Relaxed), self.count_bits).0
    }

    pub fn gate(&self) -> &PeriodGate {
        &self.gate
    }

    pub fn source(&self) -> &TimestampSource<T> {
        &self.source
    }

    #[cold]
    #[inline(never)]
    fn cold_exhausted(&self, installed: u64) -> SequenceStatus {
        #[cfg(feature = "tracing")]
        tracing::debug!(period = installed, "period exhausted, waiting for the clock");
        SequenceStatus::Pending {
            yield_until: self.gate.start_of(installed.wrapping_add(1)),
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_behind(&self, _period: u64, installed: u64) -> SequenceStatus {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            period = _period,
            installed,
            "reading behind installed period"
        );
        SequenceStatus::Pending {
            yield_until: self.gate.start_of(installed),
        }
    }
}

impl<T> GatedSequence for AtomicGatedSequence<T>
where
    T: TimeSource,
{
    type Clock = T;
    type Err = Infallible;

    fn new(source: TimestampSource<T>, gate: PeriodGate) -> Self {
        Self::new(source, gate)
    }

    fn try_poll(&self) -> Result<SequenceStatus, Self::Err> {
        self.try_poll()
    }
}

fn pack(period: u64, count: u64, count_bits: u32) -> u64 {
    (period << count_bits) | count
}

fn unpack(word: u64, count_bits: u32) -> (u64, u64) {
    (word >> count_bits, word & low_mask(count_bits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_period_and_count() {
        let word = pack(123_456, 4096, 13);
        assert_eq!(unpack(word, 13), (123_456, 4096));

        // 41-bit period with the widest count a 41/10/12 layout allows.
        let max_period = (1 << 41) - 1;
        let word = pack(max_period, 4096, 13);
        assert_eq!(unpack(word, 13), (max_period, 4096));
    }
}
