use core::time::Duration;

use crate::{Error, Result, id::Layout, sequence::PeriodGate, time::TWITTER_EPOCH};

/// Everything needed to build a [`Generator`].
///
/// All values are supplied by the embedding application. With the `serde`
/// feature the struct can be deserialized from any format the application
/// owns; missing fields take their [`Default`] values and the layout widths
/// are checked while deserializing.
///
/// [`Generator`]: crate::Generator
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeneratorConfig {
    /// The node (process or host) minting IDs, assigned out of band.
    pub node_id: u64,
    /// Field widths.
    pub layout: Layout,
    /// Zero point of the timestamp field, as a duration since 1970-01-01 UTC.
    /// Only used when the generator builds its own clock.
    pub epoch: Duration,
    /// A period spans `2^period_shift` timestamp units.
    pub period_shift: u32,
    /// Identifiers available per period.
    pub bound: u64,
}

impl GeneratorConfig {
    /// Per-period bound of the Twitter-compatible configuration.
    pub const TWITTER_BOUND: u64 = 1024;

    /// Period shift of the Twitter-compatible configuration: one period per
    /// millisecond, the unit of the timestamp field.
    pub const TWITTER_PERIOD_SHIFT: u32 = 0;

    /// The Twitter-compatible configuration for `node_id`.
    ///
    /// - [`Layout::TWITTER`] (41/10/12 bits)
    /// - [`TWITTER_EPOCH`]
    /// - one-millisecond periods
    /// - 1024 identifiers per period, a quarter of what the 12-bit sequence
    ///   field could hold; raise [`GeneratorConfig::bound`] up to 4096 for
    ///   the textbook rate
    pub const fn twitter(node_id: u64) -> Self {
        Self {
            node_id,
            layout: Layout::TWITTER,
            epoch: TWITTER_EPOCH,
            period_shift: Self::TWITTER_PERIOD_SHIFT,
            bound: Self::TWITTER_BOUND,
        }
    }

    /// Checks every construction-time constraint and returns the resulting
    /// period gate.
    ///
    /// # Errors
    ///
    /// - [`Error::NodeIdOverflow`] when `node_id` does not fit the node
    ///   field.
    /// - [`Error::PeriodShiftTooWide`] or [`Error::InvalidBound`] from
    ///   [`PeriodGate::new`].
    pub fn validate(&self) -> Result<PeriodGate> {
        let max = self.layout.max_node_id();
        if self.node_id > max {
            return Err(Error::NodeIdOverflow {
                node_id: self.node_id,
                max,
            });
        }
        PeriodGate::new(&self.layout, self.period_shift, self.bound)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::twitter(0)
    }
}
