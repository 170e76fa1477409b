use crate::{Error, Field, Result};

/// Returns a mask covering the lowest `bits` bits.
pub(crate) const fn low_mask(bits: u32) -> u64 {
    if bits == 0 {
        0
    } else if bits >= u64::BITS {
        u64::MAX
    } else {
        u64::MAX >> (u64::BITS - bits)
    }
}

/// The bit widths of the three identifier fields.
///
/// Fields are packed from **MSB to LSB** in the order timestamp, node ID,
/// sequence, with the top bit always left at zero so the word stays
/// non-negative when read as an `i64`:
///
/// ```text
///  Bit Index:  63    63 62 ........... S+N+Q-1 ... Q+N-1 ....... Q-1 ....... 0
///              +-------+-------------------+---------------+-----------------+
///  Field:      | 0 ... | timestamp (S)     | node ID (N)   | sequence (Q)    |
///              +-------+-------------------+---------------+-----------------+
/// ```
///
/// Because the fields are laid out in that order, comparing two words as
/// unsigned integers is the same as comparing their `(timestamp, node_id,
/// sequence)` tuples.
///
/// # Truncation
///
/// [`Layout::encode`] trusts the caller: every field is masked to its width
/// and any higher bits are dropped without a check in either debug or release
/// builds. With [`Layout::TWITTER`], a sequence of `4096` (`1 << 12`) encodes
/// as sequence `0` and a node ID of `1025` encodes as node ID `1`. Use
/// [`Layout::checked_encode`] when the inputs are not already known to fit.
///
/// # Example
///
/// ```
/// use tickflake::Layout;
///
/// let layout = Layout::TWITTER;
/// let word = layout.encode(1000, 2, 1);
/// assert_eq!(layout.timestamp(word), 1000);
/// assert_eq!(layout.node_id(word), 2);
/// assert_eq!(layout.sequence(word), 1);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawLayout")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    timestamp_bits: u32,
    node_bits: u32,
    sequence_bits: u32,
}

impl Layout {
    /// Number of bits available to the three fields. The 64th bit is
    /// reserved and always zero.
    pub const MAX_BITS: u32 = 63;

    /// The Twitter layout: 41 bits of milliseconds, 10 bits of node ID and 12
    /// bits of sequence.
    pub const TWITTER: Self = Self {
        timestamp_bits: 41,
        node_bits: 10,
        sequence_bits: 12,
    };

    /// Creates a layout from three field widths.
    ///
    /// Zero-width fields are allowed and always decode to `0`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LayoutTooWide`] when the widths add up to more than
    /// [`Layout::MAX_BITS`].
    pub const fn new(timestamp_bits: u32, node_bits: u32, sequence_bits: u32) -> Result<Self> {
        let total = timestamp_bits as u64 + node_bits as u64 + sequence_bits as u64;
        if total > Self::MAX_BITS as u64 {
            return Err(Error::LayoutTooWide {
                total: if total > u32::MAX as u64 {
                    u32::MAX
                } else {
                    total as u32
                },
            });
        }
        Ok(Self {
            timestamp_bits,
            node_bits,
            sequence_bits,
        })
    }

    pub const fn timestamp_bits(&self) -> u32 {
        self.timestamp_bits
    }

    pub const fn node_bits(&self) -> u32 {
        self.node_bits
    }

    pub const fn sequence_bits(&self) -> u32 {
        self.sequence_bits
    }

    /// Total number of bits used by the three fields.
    pub const fn total_bits(&self) -> u32 {
        self.timestamp_bits + self.node_bits + self.sequence_bits
    }

    /// Number of bits to shift the timestamp to its position.
    pub const fn timestamp_shift(&self) -> u32 {
        self.node_bits + self.sequence_bits
    }

    /// Number of bits to shift the node ID to its position.
    pub const fn node_shift(&self) -> u32 {
        self.sequence_bits
    }

    /// Number of bits to shift the sequence (always `0`).
    pub const fn sequence_shift(&self) -> u32 {
        0
    }

    /// Largest value the timestamp field can hold.
    pub const fn max_timestamp(&self) -> u64 {
        low_mask(self.timestamp_bits)
    }

    /// Largest value the node ID field can hold.
    pub const fn max_node_id(&self) -> u64 {
        low_mask(self.node_bits)
    }

    /// Largest value the sequence field can hold.
    pub const fn max_sequence(&self) -> u64 {
        low_mask(self.sequence_bits)
    }

    /// Packs the three fields into one word, masking each to its width.
    pub const fn encode(&self, timestamp: u64, node_id: u64, sequence: u64) -> u64 {
        let mut word = timestamp & self.max_timestamp();
        word = (word << self.node_bits) | (node_id & self.max_node_id());
        word = (word << self.sequence_bits) | (sequence & self.max_sequence());
        word
    }

    /// Packs the three fields into one word, rejecting values that would be
    /// truncated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] for the first field (in packing order)
    /// whose value exceeds its maximum.
    pub fn checked_encode(&self, timestamp: u64, node_id: u64, sequence: u64) -> Result<u64> {
        for (field, value, max) in [
            (Field::Timestamp, timestamp, self.max_timestamp()),
            (Field::NodeId, node_id, self.max_node_id()),
            (Field::Sequence, sequence, self.max_sequence()),
        ] {
            if value > max {
                return Err(Error::FieldOverflow { field, value, max });
            }
        }
        Ok(self.encode(timestamp, node_id, sequence))
    }

    /// Extracts the timestamp field.
    pub const fn timestamp(&self, word: u64) -> u64 {
        (word >> self.timestamp_shift()) & self.max_timestamp()
    }

    /// Extracts the node ID field.
    pub const fn node_id(&self, word: u64) -> u64 {
        (word >> self.node_shift()) & self.max_node_id()
    }

    /// Extracts the sequence field.
    pub const fn sequence(&self, word: u64) -> u64 {
        (word >> self.sequence_shift()) & self.max_sequence()
    }

    /// Extracts all three fields.
    pub const fn decode(&self, word: u64) -> Parts {
        Parts {
            timestamp: self.timestamp(word),
            node_id: self.node_id(word),
            sequence: self.sequence(word),
        }
    }

    /// Returns `true` if no bit above the layout's fields is set, i.e. the
    /// word could have been produced by [`Layout::encode`].
    pub const fn is_valid(&self, word: u64) -> bool {
        word & !low_mask(self.total_bits()) == 0
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::TWITTER
    }
}

/// The decoded fields of an identifier.
///
/// The derived ordering compares `timestamp`, then `node_id`, then
/// `sequence`, which matches the ordering of the packed words.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Parts {
    pub timestamp: u64,
    pub node_id: u64,
    pub sequence: u64,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawLayout {
    timestamp_bits: u32,
    node_bits: u32,
    sequence_bits: u32,
}

#[cfg(feature = "serde")]
impl TryFrom<RawLayout> for Layout {
    type Error = Error;

    fn try_from(raw: RawLayout) -> Result<Self> {
        Self::new(raw.timestamp_bits, raw.node_bits, raw.sequence_bits)
    }
}
