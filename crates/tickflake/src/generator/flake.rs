use core::{convert::Infallible, time::Duration};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Error, Result,
    generator::{GeneratorConfig, IdGenStatus, IdSource},
    id::{FlakeId, Layout, Parts},
    sequence::{AtomicGatedSequence, Draw, GatedSequence, LockGatedSequence, SequenceStatus},
    time::{SystemClock, TimeSource, TimestampSource},
};

/// Mints identifiers for one node.
///
/// A generator pairs a fixed node ID with a [`GatedSequence`] (which owns the
/// timestamp source) and packs each draw with the configured [`Layout`].
/// Build one per node or process and share it by reference across every
/// thread that mints IDs; all methods take `&self`.
///
/// The timestamp encoded in an ID is the very reading its sequence number
/// was drawn against, so a caller whose clock read races a period change can
/// never pair an old timestamp with the next period's counter.
///
/// ## Ordering
///
/// IDs are not handed to racing callers in call order, but within one
/// generator the encoded `(timestamp, sequence)` tracks issuance time to
/// within one period.
///
/// # Example
///
/// ```
/// use tickflake::{Generator, GeneratorConfig, MonotonicClock};
///
/// let config = GeneratorConfig {
///     bound: 4096,
///     ..GeneratorConfig::twitter(3)
/// };
/// let generator = Generator::atomic(&config, MonotonicClock::default()).unwrap();
///
/// let a = generator.next_id();
/// let b = generator.next_id();
/// assert!(a < b);
/// assert_eq!(b.node_id(generator.layout()), 3);
/// ```
pub struct Generator<S = AtomicGatedSequence<SystemClock>>
where
    S: GatedSequence,
{
    node_id: u64,
    layout: Layout,
    sequence: S,
}

impl Generator {
    /// The Twitter-compatible generator for `node_id`: see
    /// [`GeneratorConfig::twitter`] for the exact settings. Reads the wall
    /// clock relative to [`TWITTER_EPOCH`](crate::TWITTER_EPOCH).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeIdOverflow`] if `node_id` is above 1023.
    pub fn twitter(node_id: u64) -> Result<Self> {
        Self::from_config(&GeneratorConfig::twitter(node_id))
    }

    /// Builds a lock-free generator reading the wall clock relative to
    /// `config.epoch`.
    ///
    /// # Errors
    ///
    /// Any configuration error reported by [`GeneratorConfig::validate`].
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock::with_epoch(config.epoch))
    }
}

impl<T> Generator<AtomicGatedSequence<T>>
where
    T: TimeSource,
{
    /// Builds a generator over an [`AtomicGatedSequence`] with the given
    /// clock. `config.epoch` is ignored; the clock defines its own.
    ///
    /// # Errors
    ///
    /// Any configuration error reported by [`GeneratorConfig::validate`].
    pub fn atomic(config: &GeneratorConfig, clock: T) -> Result<Self> {
        Self::with_clock(config, clock)
    }
}

impl<T> Generator<LockGatedSequence<T>>
where
    T: TimeSource,
{
    /// Builds a generator over a [`LockGatedSequence`] with the given clock.
    /// `config.epoch` is ignored; the clock defines its own.
    ///
    /// # Errors
    ///
    /// Any configuration error reported by [`GeneratorConfig::validate`].
    pub fn lock(config: &GeneratorConfig, clock: T) -> Result<Self> {
        Self::with_clock(config, clock)
    }
}

impl<S> Generator<S>
where
    S: GatedSequence,
{
    /// Builds a generator over any [`GatedSequence`] with the given clock.
    ///
    /// # Errors
    ///
    /// Any configuration error reported by [`GeneratorConfig::validate`].
    pub fn with_clock(config: &GeneratorConfig, clock: S::Clock) -> Result<Self> {
        let gate = config.validate()?;
        let source = TimestampSource::for_layout(clock, &config.layout);
        Ok(Self {
            node_id: config.node_id,
            layout: config.layout,
            sequence: S::new(source, gate),
        })
    }

    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn sequence(&self) -> &S {
        &self.sequence
    }

    /// Splits a word minted with this generator's layout into its fields.
    pub fn decode(&self, word: u64) -> Parts {
        self.layout.decode(word)
    }

    fn encode(&self, draw: Draw) -> FlakeId {
        FlakeId::from_raw(
            self.layout
                .encode(draw.timestamp, self.node_id, draw.sequence),
        )
    }

    /// Attempts to mint an ID without waiting.
    ///
    /// # Errors
    ///
    /// May return an error if the sequence uses a lock and it is poisoned.
    pub fn try_poll_id(&self) -> Result<IdGenStatus, S::Err> {
        Ok(match self.sequence.try_poll()? {
            SequenceStatus::Ready(draw) => IdGenStatus::Ready {
                id: self.encode(draw),
            },
            SequenceStatus::Pending { yield_until } => IdGenStatus::Pending { yield_until },
        })
    }

    /// The infallible counterpart to [`Self::try_poll_id`].
    pub fn poll_id(&self) -> IdGenStatus
    where
        S::Err: Into<Infallible>,
    {
        match self.try_poll_id() {
            Ok(status) => status,
            Err(e) => {
                #[allow(unreachable_code)]
                // `into()` satisfies the trait bound at compile time.
                match Into::<Infallible>::into(e) {}
            }
        }
    }

    /// Mints an ID, waiting for the next period if the current one is
    /// exhausted.
    ///
    /// # Errors
    ///
    /// May return an error if the sequence uses a lock and it is poisoned.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self), fields(node_id = self.node_id))
    )]
    pub fn try_next_id(&self) -> Result<FlakeId, S::Err> {
        self.sequence.try_next().map(|draw| self.encode(draw))
    }

    /// Mints an ID, waiting for the next period if the current one is
    /// exhausted.
    ///
    /// This never fails and never gives up: if the clock stalls or jumps
    /// backward, the call keeps waiting until it catches up. Use
    /// [`Self::next_timeout`] to bound the wait.
    pub fn next_id(&self) -> FlakeId
    where
        S::Err: Into<Infallible>,
    {
        match self.try_next_id() {
            Ok(id) => id,
            Err(e) => {
                #[allow(unreachable_code)]
                // `into()` satisfies the trait bound at compile time.
                match Into::<Infallible>::into(e) {}
            }
        }
    }

    /// Same as [`Self::next_id`], returning the raw word.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> u64
    where
        S::Err: Into<Infallible>,
    {
        self.next_id().to_raw()
    }

    /// Mints an ID, giving up if none becomes available within `timeout`.
    ///
    /// # Errors
    ///
    /// - [`Error::Stalled`] if the clock did not reach a period with spare
    ///   sequence numbers in time.
    /// - [`Error::LockPoisoned`] from a poisoned lock-based sequence.
    pub fn next_timeout(&self, timeout: Duration) -> Result<FlakeId>
    where
        S::Err: Into<Error>,
    {
        self.sequence
            .try_next_timeout(timeout)
            .map(|draw| self.encode(draw))
    }

    /// An endless iterator of freshly minted IDs.
    pub fn iter(&self) -> impl Iterator<Item = FlakeId> + '_
    where
        S::Err: Into<Infallible>,
    {
        core::iter::repeat_with(move || self.next_id())
    }
}

impl<S> IdSource for Generator<S>
where
    S: GatedSequence + Send + Sync,
    S::Err: Into<Infallible>,
{
    fn next_id(&self) -> u64 {
        Generator::next(self)
    }
}
