//! Table header codec
//!
//! Five fixed-width integers, encoded with bincode (fixint, native endian).

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::error::{PitError, Result};
use crate::layout::{Capabilities, RecordLayout};
use crate::table::Table;

/// Number of integer fields in the header
pub const HEADER_FIELDS: usize = 5;

/// Encoded header size: 5 × u64
pub const HEADER_SIZE: usize = HEADER_FIELDS * 8;

/// The persisted table header, field order = on-disk order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableHeader {
    /// Capability flag bits
    pub flags: u64,
    pub record_size: u64,
    pub slot_capacity: u64,
    pub live_count: u64,
    pub next_id: u64,
}

/// Header fields after validation, in native types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Geometry {
    pub(crate) capabilities: Capabilities,
    pub(crate) record_size: usize,
    pub(crate) slot_capacity: usize,
    pub(crate) live_count: usize,
    pub(crate) next_id: u64,
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_native_endian()
}

impl TableHeader {
    /// Snapshot the header of a table
    pub fn from_table<L: RecordLayout>(table: &Table<L>) -> Self {
        Self {
            flags: table.capabilities().bits(),
            record_size: table.record_size() as u64,
            slot_capacity: table.slot_capacity() as u64,
            live_count: table.live_count() as u64,
            next_id: table.next_id(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(codec().serialize(self)?)
    }

    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Result<Self> {
        Ok(codec().deserialize(bytes)?)
    }

    /// Check the header is internally consistent
    pub(crate) fn validate(&self) -> Result<Geometry> {
        let capabilities = Capabilities::from_bits(self.flags).ok_or_else(|| {
            corrupt(format!("unknown capability flags {:#x}", self.flags))
        })?;
        if !capabilities.contains(Capabilities::HAS_ID) {
            return Err(corrupt("identity flag missing".to_string()));
        }
        if self.record_size == 0 {
            return Err(corrupt("record size is zero".to_string()));
        }
        if self.live_count > self.slot_capacity {
            return Err(corrupt(format!(
                "live count {} exceeds slot capacity {}",
                self.live_count, self.slot_capacity
            )));
        }
        if self.next_id < self.live_count {
            return Err(corrupt(format!(
                "next id {} is below live count {}",
                self.next_id, self.live_count
            )));
        }

        let record_size = to_usize(self.record_size, "record size")?;
        let slot_capacity = to_usize(self.slot_capacity, "slot capacity")?;
        let live_count = to_usize(self.live_count, "live count")?;
        to_usize(self.next_id, "next id")?;

        if slot_capacity.checked_mul(record_size).is_none() {
            return Err(corrupt(format!(
                "{} slots of {} bytes overflow the address space",
                slot_capacity, record_size
            )));
        }

        Ok(Geometry {
            capabilities,
            record_size,
            slot_capacity,
            live_count,
            next_id: self.next_id,
        })
    }
}

fn to_usize(value: u64, field: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| corrupt(format!("{} {} out of range", field, value)))
}

pub(crate) fn corrupt(reason: String) -> PitError {
    PitError::CorruptFile(reason)
}
