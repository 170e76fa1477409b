use portable_atomic::{AtomicU64, Ordering};

/// A lock-free counter handing out sequence numbers for a single period.
///
/// The counter is tagged with the period it serves and bounded to
/// `0..bound`. It offers two views over the same register:
///
/// - [`PeriodCounter::next`] increments and reduces modulo `bound`, so after
///   `bound` calls it rolls back to `0`.
/// - [`PeriodCounter::try_next`] reports exhaustion instead of rolling over.
///   This is the one the gated sequences use, since a rollover inside a
///   period would hand out duplicates.
///
/// Neither ever returns a value `>= bound`.
#[derive(Debug)]
pub struct PeriodCounter {
    period: u64,
    bound: u64,
    #[cfg(feature = "cache-padded")]
    count: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    count: AtomicU64,
}

impl PeriodCounter {
    /// Creates a fresh counter for `period`. A `bound` of zero is treated as
    /// one.
    pub fn new(period: u64, bound: u64) -> Self {
        Self {
            period,
            bound: bound.max(1),
            #[cfg(feature = "cache-padded")]
            count: crossbeam_utils::CachePadded::new(AtomicU64::new(0)),
            #[cfg(not(feature = "cache-padded"))]
            count: AtomicU64::new(0),
        }
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn bound(&self) -> u64 {
        self.bound
    }

    /// Increments the counter and returns the previous value modulo `bound`.
    ///
    /// The register uses unsigned wraparound, so this never fails.
    pub fn next(&self) -> u64 {
        self.count.fetch_add(1, Ordering::Relaxed) % self.bound
    }

    /// Returns the next unused value, or `None` once `bound` values have been
    /// handed out.
    ///
    /// An exhausted counter stops incrementing, so the register can only
    /// overshoot `bound` by the number of threads racing past the check.
    pub fn try_next(&self) -> Option<u64> {
        if self.count.load(Ordering::Relaxed) >= self.bound {
            return None;
        }
        let value = self.count.fetch_add(1, Ordering::Relaxed);
        (value < self.bound).then_some(value)
    }

    /// Number of values handed out so far, capped at `bound`.
    pub fn issued(&self) -> u64 {
        self.count.load(Ordering::Relaxed).min(self.bound)
    }

    pub fn is_exhausted(&self) -> bool {
        self.count.load(Ordering::Relaxed) >= self.bound
    }
}
