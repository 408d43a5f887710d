//! Table Module
//!
//! The record-storage engine: one contiguous record buffer plus an index
//! from identity to slot position.
//!
//! ## Responsibilities
//! - Assign permanent identities on insert (never reused)
//! - Stamp identity and timestamps through the record layout
//! - O(1) lookup and delete by identity
//! - Keep live records packed in ascending-identity order
//! - Grow both buffers when full, leaving the table untouched on failure
//!
//! ## Buffers
//! ```text
//! storage:  [ rec id=1 ][ rec id=3 ][ rec id=4 ][ 0000 ][ 0000 ]
//!              slot 0      slot 1      slot 2     free    free
//!
//! index:    [ Some(0) ][ None ][ Some(1) ][ Some(2) ][ None ]
//!             id=1      id=2     id=3       id=4      unissued
//! ```
//!
//! The index stores slot positions, never addresses, so reallocating the
//! record buffer needs no fix-up. Byte locations handed out by `insert` and
//! `find` are borrows and cannot outlive the next mutating call.

mod store;

pub use store::{Table, TableIter};
pub(crate) use store::absent_index;

/// A freshly inserted record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inserted<'a> {
    /// Identity assigned to the record
    pub id: u64,

    /// The stored bytes, with identity and timestamps already stamped
    pub record: &'a [u8],
}

/// Whether a delete removed anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The record existed and is gone
    Removed,

    /// No live record had that identity
    NotFound,
}

/// Whether the table holds any live records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Empty,
    Populated,
}

/// Result of `Table::delete`: two independent outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub removal: Removal,
    pub occupancy: Occupancy,
}

impl DeleteOutcome {
    /// True if a record was actually removed
    pub fn is_removed(&self) -> bool {
        self.removal == Removal::Removed
    }

    /// True if the table has no live records after the call
    pub fn table_is_empty(&self) -> bool {
        self.occupancy == Occupancy::Empty
    }
}
