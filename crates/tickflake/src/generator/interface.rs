/// Anything that hands out 64-bit identifiers.
///
/// This is the only contract the [`SequenceRegistry`] relies on, so
/// applications can register their own sources next to [`Generator`]s.
///
/// [`SequenceRegistry`]: crate::SequenceRegistry
/// [`Generator`]: crate::Generator
pub trait IdSource: Send + Sync {
    /// Returns the next identifier. Must not fail under normal operation.
    fn next_id(&self) -> u64;
}
