use crate::id::FlakeId;

/// Represents the result of attempting to mint an identifier without
/// waiting.
///
/// - [`IdGenStatus::Ready`] indicates a new ID was minted.
/// - [`IdGenStatus::Pending`] means the current period has no sequence
///   numbers left (or the clock lags the installed period) and nothing can be
///   minted until the clock reaches `yield_until`.
///
/// This allows non-blocking generation loops and custom backoff strategies.
///
/// # Example
///
/// ```
/// use tickflake::{Generator, GeneratorConfig, IdGenStatus, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1
///     }
/// }
///
/// let generator = Generator::atomic(&GeneratorConfig::twitter(0), FixedTime).unwrap();
/// match generator.poll_id() {
///     IdGenStatus::Ready { id } => println!("ID: {id}"),
///     IdGenStatus::Pending { yield_until } => println!("Back off until: {yield_until}"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique ID was minted and is ready to use.
    Ready {
        /// The minted ID.
        id: FlakeId,
    },
    /// No ID could be minted in the current period.
    ///
    /// Wait until the timestamp source reaches or exceeds `yield_until`
    /// before trying again.
    Pending {
        /// The next timestamp (inclusive) at which minting may resume.
        yield_until: u64,
    },
}
