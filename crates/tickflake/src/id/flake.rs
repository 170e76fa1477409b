use core::{fmt, num::ParseIntError, str::FromStr};

use crate::id::{Layout, Parts};

/// A minted identifier.
///
/// `FlakeId` is a thin wrapper over the packed `u64`. It does not carry its
/// [`Layout`]; decoding takes the layout that produced it. Equality, hashing
/// and ordering are those of the raw word, so sorting `FlakeId`s sorts by
/// timestamp, then node ID, then sequence.
///
/// With the `serde` feature the ID (de)serializes as the plain integer.
///
/// # Example
///
/// ```
/// use tickflake::{FlakeId, Layout};
///
/// let layout = Layout::TWITTER;
/// let id = FlakeId::from_raw(layout.encode(1000, 2, 1));
/// assert_eq!(id.timestamp(&layout), 1000);
/// assert_eq!(id.node_id(&layout), 2);
/// assert_eq!(id.sequence(&layout), 1);
/// assert_eq!(id.to_string(), "4194312193");
/// ```
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FlakeId(u64);

impl FlakeId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn to_raw(&self) -> u64 {
        self.0
    }

    pub const fn timestamp(&self, layout: &Layout) -> u64 {
        layout.timestamp(self.0)
    }

    pub const fn node_id(&self, layout: &Layout) -> u64 {
        layout.node_id(self.0)
    }

    pub const fn sequence(&self, layout: &Layout) -> u64 {
        layout.sequence(self.0)
    }

    pub const fn decode(&self, layout: &Layout) -> Parts {
        layout.decode(self.0)
    }

    /// Returns the ID as a zero-padded 20-digit string, which sorts
    /// lexicographically in the same order as the numeric value.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.0)
    }
}

impl From<u64> for FlakeId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<FlakeId> for u64 {
    fn from(id: FlakeId) -> Self {
        id.0
    }
}

impl fmt::Display for FlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FlakeId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}
