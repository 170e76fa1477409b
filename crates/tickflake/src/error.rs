use core::{convert::Infallible, fmt, time::Duration};

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// One of the three packed fields of an identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Timestamp,
    NodeId,
    Sequence,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timestamp => "timestamp",
            Self::NodeId => "node id",
            Self::Sequence => "sequence",
        })
    }
}

/// All error variants that `tickflake` can emit.
///
/// Everything except [`Error::Stalled`] and [`Error::LockPoisoned`] is a
/// configuration error raised while building a layout, generator or registry.
/// Minting an identifier through the blocking APIs cannot fail.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The three field widths add up to more than the 63 usable bits.
    #[error("layout needs {total} bits but only 63 are available")]
    LayoutTooWide { total: u32 },

    /// A field value does not fit in its configured width.
    #[error("{field} value {value} exceeds the field maximum {max}")]
    FieldOverflow { field: Field, value: u64, max: u64 },

    /// The node id does not fit in the node field.
    #[error("node id {node_id} exceeds the node field maximum {max}")]
    NodeIdOverflow { node_id: u64, max: u64 },

    /// Shifting the timestamp by the period shift would leave no period bits.
    #[error("period shift {shift} must be smaller than the {timestamp_bits}-bit timestamp")]
    PeriodShiftTooWide { shift: u32, timestamp_bits: u32 },

    /// The per-period bound is zero or larger than the sequence field holds.
    #[error("per-period bound {bound} must be within 1..={max}")]
    InvalidBound { bound: u64, max: u64 },

    /// A registry key was registered twice.
    #[error("key `{key}` is already registered")]
    DuplicateKey { key: String },

    /// No identifier became available before the deadline, meaning the clock
    /// did not advance into a period with spare sequence numbers.
    #[error("no identifier available after waiting {waited:?}")]
    Stalled { waited: Duration },

    /// A thread panicked while holding the period transition lock.
    ///
    /// `parking_lot` mutexes do not poison, so this variant only exists
    /// without the `parking-lot` feature.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("period transition lock poisoned")]
    LockPoisoned,
}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

#[cfg(not(feature = "parking-lot"))]
impl<T> From<std::sync::PoisonError<std::sync::MutexGuard<'_, T>>> for Error {
    fn from(_: std::sync::PoisonError<std::sync::MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
