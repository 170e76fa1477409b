use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    sequence::{Draw, GatedSequence, Mutex, PeriodCounter, PeriodGate, SequenceStatus, Step},
    time::{TimeSource, TimestampSource},
};

/// Error type of [`LockGatedSequence`]: [`Error`](crate::Error) with a std
/// mutex, which can be poisoned, and infallible with `parking-lot`.
#[cfg(feature = "parking-lot")]
pub type LockError = core::convert::Infallible;
/// Error type of [`LockGatedSequence`]: [`Error`](crate::Error) with a std
/// mutex, which can be poisoned, and infallible with `parking-lot`.
#[cfg(not(feature = "parking-lot"))]
pub type LockError = crate::Error;

/// A period-gated sequence that swaps whole [`PeriodCounter`]s.
///
/// The live counter sits behind an [`Arc`] guarded by a mutex. The lock is
/// held only to compare the installed period with the caller's reading,
/// install a fresh counter when the period has moved on, and clone the
/// reference. The increment itself runs on the counter after the lock is
/// released, and a draw is accepted only if the counter serves the same
/// period as the caller's reading.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Counter increments are lock-free
/// - ❌ Every draw briefly takes the transition lock
///
/// ## Recommended When
/// - You want to inspect or share the live [`PeriodCounter`]
/// - You prefer a mutex over a packed atomic word for the transition
///
/// ## See Also
/// - [`AtomicGatedSequence`]
///
/// [`AtomicGatedSequence`]: crate::AtomicGatedSequence
pub struct LockGatedSequence<T>
where
    T: TimeSource,
{
    current: Mutex<Arc<PeriodCounter>>,
    source: TimestampSource<T>,
    gate: PeriodGate,
}

impl<T> LockGatedSequence<T>
where
    T: TimeSource,
{
    /// Creates a sequence whose first counter serves the period of the
    /// current reading.
    pub fn new(source: TimestampSource<T>, gate: PeriodGate) -> Self {
        let period = gate.period_of(source.next());
        Self {
            current: Mutex::new(Arc::new(PeriodCounter::new(period, gate.bound()))),
            source,
            gate,
        }
    }

    /// Attempts one draw.
    ///
    /// # Errors
    /// - Returns [`Error::LockPoisoned`] if a thread panicked while holding
    ///   the transition lock. Never fails with the `parking-lot` feature.
    ///
    /// [`Error::LockPoisoned`]: crate::Error
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll(&self) -> Result<SequenceStatus, LockError> {
        let timestamp = self.source.next();
        let period = self.gate.period_of(timestamp);

        let counter = {
            #[cfg(feature = "parking-lot")]
            let mut current = self.current.lock();
            #[cfg(not(feature = "parking-lot"))]
            let mut current = self.current.lock()?;

            if self.gate.step(period, current.period()) == Step::Advance {
                self.gate.note_advance(period, current.period());
                *current = Arc::new(PeriodCounter::new(period, self.gate.bound()));
            }
            Arc::clone(&current)
        };

        if counter.period() != period {
            return Ok(self.cold_behind(period, counter.period()));
        }

        match counter.try_next() {
            Some(sequence) => Ok(SequenceStatus::Ready(Draw {
                timestamp,
                sequence,
            })),
            None => Ok(self.cold_exhausted(period)),
        }
    }

    /// The counter serving the installed period.
    ///
    /// # Errors
    /// - Returns [`Error::LockPoisoned`](crate::Error) if the lock is
    ///   poisoned. Never fails with the `parking-lot` feature.
    pub fn current_counter(&self) -> Result<Arc<PeriodCounter>, LockError> {
        #[cfg(feature = "parking-lot")]
        let current = self.current.lock();
        #[cfg(not(feature = "parking-lot"))]
        let current = self.current.lock()?;
        Ok(Arc::clone(&current))
    }

    pub fn gate(&self) -> &PeriodGate {
        &self.gate
    }

    pub fn source(&self) -> &TimestampSource<T> {
        &self.source
    }

    #[cold]
    #[inline(never)]
    fn cold_exhausted(&self, period: u64) -> SequenceStatus {
        #[cfg(feature = "tracing")]
        tracing::debug!(period, "period exhausted, waiting for the clock");
        SequenceStatus::Pending {
            yield_until: self.gate.start_of(period.wrapping_add(1)),
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

impl<T> GatedSequence for LockGatedSequence<T>
where
    T: TimeSource,
{
    type Clock = T;
    type Err = LockError;

    fn new(source: TimestampSource<T>, gate: PeriodGate) -> Self {
        Self::new(source, gate)
    }

    fn try_poll(&self) -> Result<SequenceStatus, Self::Err> {
        self.try_poll()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Layout;

    struct FixedTime;

    impl TimeSource for FixedTime {
        fn current_millis(&self) -> u64 {
            500
        }
    }

    fn sequence(bound: u64) -> LockGatedSequence<FixedTime> {
        let layout = Layout::TWITTER;
        let gate = PeriodGate::new(&layout, 0, bound).unwrap();
        LockGatedSequence::new(TimestampSource::for_layout(FixedTime, &layout), gate)
    }

    #[test]
    fn exposes_live_counter() {
        let sequence = sequence(8);
        sequence.try_poll().unwrap();
        sequence.try_poll().unwrap();

        let counter = sequence.current_counter().unwrap();
        assert_eq!(counter.period(), 500);
        assert_eq!(counter.issued(), 2);
        assert_eq!(counter.bound(), 8);
    }

    #[cfg(not(feature = "parking-lot"))]
    #[test]
    fn poisoned_lock_surfaces_as_error() {
        let sequence = sequence(8);

        let result = std::thread::scope(|s| {
            s.spawn(|| {
                let _guard = sequence.current.lock().unwrap();
                panic!("poison the transition lock");
            })
            .join()
        });
        assert!(result.is_err());

        assert_eq!(sequence.try_poll(), Err(crate::Error::LockPoisoned));
        assert!(sequence.current_counter().is_err());
    }
}
