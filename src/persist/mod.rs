//! Persist Module
//!
//! Whole-table save/load to a flat byte stream.
//!
//! ## Responsibilities
//! - Encode/decode the fixed-layout table header
//! - Write exactly the live records, in ascending-identity order
//! - Validate headers and payload length on load
//! - Rebuild the index from the identities stored in each record
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header (40 bytes, five native-endian u64)                    │
//! │ ┌───────┬─────────────┬───────────────┬────────────┬───────┐ │
//! │ │ Flags │ Record Size │ Slot Capacity │ Live Count │ Next  │ │
//! │ │       │             │               │            │  Id   │ │
//! │ └───────┴─────────────┴───────────────┴────────────┴───────┘ │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Payload                                                      │
//! │   live_count × record_size bytes, verbatim                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! No magic or version is written here; an outer file wrapper may add one.
//!
//! ## Index rebuild
//! Surviving identities are not dense once anything has been deleted
//! (e.g. 1, 3 after deleting 2), so load reads each record's identity field
//! instead of assuming the record at position `i` carries identity `i + 1`.

mod header;
mod reader;
mod writer;

pub use header::{TableHeader, HEADER_FIELDS, HEADER_SIZE};

/// Counts reported by a successful save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    /// Header fields written (always `HEADER_FIELDS`)
    pub header_fields: usize,

    /// Records written (the table's live count)
    pub records: usize,

    /// Total bytes written
    pub bytes: u64,
}
