use core::{convert::Infallible, fmt, time::Duration};

use crossbeam_utils::Backoff;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

use crate::{
    Error, Result,
    sequence::PeriodGate,
    time::{TimeSource, TimestampSource},
};

/// A sequence number together with the timestamp reading it was drawn
/// against.
///
/// `timestamp` always lies in the period whose counter produced `sequence`,
/// so `(timestamp, sequence)` pairs are unique for the lifetime of one
/// sequence (until the timestamp wraps).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Draw {
    pub timestamp: u64,
    pub sequence: u64,
}

/// The outcome of polling a gated sequence once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceStatus {
    /// A sequence number was handed out.
    Ready(Draw),
    /// No sequence number is available until the clock reaches
    /// `yield_until` (in timestamp units). Either the current period's
    /// counter is exhausted, or the reading lagged the installed period.
    Pending { yield_until: u64 },
}

/// A bounded, per-period sequence driven by a timestamp source.
///
/// Implementations rotate to a fresh counter whenever the clock enters a new
/// period and report [`SequenceStatus::Pending`] when the live period has
/// handed out all `bound` values. The blocking helpers turn `Pending` into a
/// wait: first a short spin, then yielding the thread, until the clock moves
/// on.
pub trait GatedSequence {
    /// The clock behind the timestamp source.
    type Clock: TimeSource;

    /// The error type returned by [`GatedSequence::try_poll`].
    type Err: fmt::Debug;

    /// Creates a sequence reading `source` and gated by `gate`.
    fn new(source: TimestampSource<Self::Clock>, gate: PeriodGate) -> Self;

    /// Attempts one draw without waiting.
    ///
    /// # Errors
    ///
    /// May return an error if the implementation uses a lock and it is
    /// poisoned.
    fn try_poll(&self) -> Result<SequenceStatus, Self::Err>;

    /// The infallible counterpart to [`GatedSequence::try_poll`].
    fn poll(&self) -> SequenceStatus
    where
        Self::Err: Into<Infallible>,
    {
        match self.try_poll() {
            Ok(status) => status,
            Err(e) => {
                #[allow(unreachable_code)]
                // `into()` satisfies the trait bound at compile time.
                match Into::<Infallible>::into(e) {}
            }
        }
    }

    /// Draws the next sequence number, waiting for the next period if the
    /// current one is exhausted.
    ///
    /// There is no upper bound on the wait: if the clock stalls or has moved
    /// backward, this keeps waiting until it catches up. Use
    /// [`GatedSequence::try_next_timeout`] to put a bound on it.
    ///
    /// # Errors
    ///
    /// May return an error if the implementation uses a lock and it is
    /// poisoned.
    fn try_next(&self) -> Result<Draw, Self::Err> {
        let backoff = Backoff::new();
        loop {
            match self.try_poll()? {
                SequenceStatus::Ready(draw) => return Ok(draw),
                SequenceStatus::Pending { .. } => backoff.snooze(),
            }
        }
    }

    /// The infallible counterpart to [`GatedSequence::try_next`].
    fn next(&self) -> Draw
    where
        Self::Err: Into<Infallible>,
    {
        match self.try_next() {
            Ok(draw) => draw,
            Err(e) => {
                #[allow(unreachable_code)]
                // `into()` satisfies the trait bound at compile time.
                match Into::<Infallible>::into(e) {}
            }
        }
    }

    /// Like [`GatedSequence::try_next`], but gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// - [`Error::Stalled`] if no value became available in time.
    /// - Any error from [`GatedSequence::try_poll`], converted into [`Error`].
    fn try_next_timeout(&self, timeout: Duration) -> Result<Draw>
    where
        Self::Err: Into<Error>,
    {
        let started = Instant::now();
        let backoff = Backoff::new();
        loop {
            match self.try_poll().map_err(Into::into)? {
                SequenceStatus::Ready(draw) => return Ok(draw),
                SequenceStatus::Pending { .. } => {
                    let waited = started.elapsed();
                    if waited >= timeout {
                        return Err(Error::Stalled { waited });
                    }
                    backoff.snooze();
                }
            }
        }
    }
}
