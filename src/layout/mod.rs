//! Layout Module
//!
//! Describes where, inside an opaque fixed-size record, the engine may write
//! the identity and timestamp fields.
//!
//! ## Responsibilities
//! - Capability flags (identity, created_at, updated_at)
//! - The `RecordLayout` interface a record schema implements
//! - Field offsets, either by the historic positional convention or explicit
//!   (`FieldLayout`)
//!
//! The engine never interprets any other byte of a record.

mod field;

use std::fmt;
use std::ops::BitOr;

pub use field::{FieldLayout, FieldLayoutBuilder};

/// Width in bytes of the identity and timestamp fields
pub const WORD: usize = 8;

// =============================================================================
// Capabilities
// =============================================================================

/// Set of engine-managed fields a record schema carries.
///
/// The numeric values are the ones written into the persisted header.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u64);

impl Capabilities {
    /// Record carries a permanent identity
    pub const HAS_ID: Capabilities = Capabilities(1);
    /// Record carries a creation timestamp
    pub const HAS_CREATED_AT: Capabilities = Capabilities(2);
    /// Record carries a last-update timestamp
    pub const HAS_UPDATED_AT: Capabilities = Capabilities(4);
    /// Both timestamps
    pub const TIMESTAMPS: Capabilities = Capabilities(2 | 4);

    const ALL: u64 = 1 | 2 | 4;

    /// No capabilities
    pub const fn empty() -> Self {
        Capabilities(0)
    }

    /// Raw flag bits
    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// Parse flag bits, rejecting unknown ones
    pub fn from_bits(bits: u64) -> Option<Self> {
        if bits & !Self::ALL == 0 {
            Some(Capabilities(bits))
        } else {
            None
        }
    }

    /// True if every flag in `other` is set
    pub const fn contains(&self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if at least one flag in `other` is set
    pub const fn intersects(&self, other: Capabilities) -> bool {
        self.0 & other.0 != 0
    }

    /// Number of timestamp slots (0, 1 or 2)
    pub fn timestamp_slots(&self) -> usize {
        (self.contains(Self::HAS_CREATED_AT) as usize) + (self.contains(Self::HAS_UPDATED_AT) as usize)
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        Capabilities(self.0 | rhs.0)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::HAS_ID) {
            names.push("HAS_ID");
        }
        if self.contains(Self::HAS_CREATED_AT) {
            names.push("HAS_CREATED_AT");
        }
        if self.contains(Self::HAS_UPDATED_AT) {
            names.push("HAS_UPDATED_AT");
        }
        write!(f, "Capabilities({})", names.join(" | "))
    }
}

// =============================================================================
// RecordLayout
// =============================================================================

/// Accessors the engine uses to inject engine-managed fields into a record.
///
/// Every slice handed to these methods is exactly `record_size()` bytes.
/// Timestamp writers are no-ops when the matching capability is absent, and
/// the readers return `None`.
pub trait RecordLayout {
    /// Byte length of one record
    fn record_size(&self) -> usize;

    /// Engine-managed fields this schema carries (always includes `HAS_ID`)
    fn capabilities(&self) -> Capabilities;

    /// Identity stored in the record
    fn read_id(&self, record: &[u8]) -> u64;

    /// Overwrite the identity field
    fn write_id(&self, record: &mut [u8], id: u64);

    fn read_created_at(&self, record: &[u8]) -> Option<i64>;

    fn write_created_at(&self, record: &mut [u8], ts: i64);

    fn read_updated_at(&self, record: &[u8]) -> Option<i64>;

    fn write_updated_at(&self, record: &mut [u8], ts: i64);
}
