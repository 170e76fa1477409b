//! # tickflake
//!
//! Snowflake-style 64-bit identifiers built from three packed fields, most
//! significant first:
//!
//! ```text
//!  Bit Index:  63           63 62                                          0
//!              +--------------+-----------+---------------+---------------+
//!  Field:      | reserved (1) | timestamp | node ID       | sequence      |
//!              +--------------+-----------+---------------+---------------+
//!              |<----------- MSB ------- 64 bits ------- LSB ------------>|
//! ```
//!
//! Field widths are chosen at construction time through a [`Layout`]. The
//! sequence is drawn from a per-period counter that is swapped for a fresh
//! one each time the clock enters a new period, and callers wait (rather than
//! fail) when the current period's counter runs dry.
//!
//! ```
//! use tickflake::Generator;
//!
//! let generator = Generator::twitter(7).unwrap();
//! let id = generator.next_id();
//!
//! let parts = generator.decode(id.to_raw());
//! assert_eq!(parts.node_id, 7);
//! assert!(parts.sequence < 1024);
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod generator;
mod id;
mod registry;
mod sequence;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::registry::*;
pub use crate::sequence::*;
pub use crate::time::*;
