//! Table load
//!
//! Reads the header, the live records, and rebuilds the identity index
//! from the identity field of each record.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::config::TableConfig;
use crate::error::{PitError, Result};
use crate::layout::{Capabilities, FieldLayout, RecordLayout};
use crate::table::{self, Table};

use super::header::{corrupt, Geometry};
use super::{TableHeader, HEADER_SIZE};

impl Table<FieldLayout> {
    /// Load a table saved with the positional field convention
    pub fn load<R: Read>(reader: R) -> Result<Self> {
        Self::load_with_config(reader, TableConfig::default())
    }

    /// Load a conventional-layout table with a custom config
    pub fn load_with_config<R: Read>(mut reader: R, config: TableConfig) -> Result<Self> {
        let geometry = read_geometry(&mut reader)?;
        let layout = FieldLayout::conventional(geometry.record_size, geometry.capabilities)
            .map_err(|e| corrupt(e.to_string()))?;
        read_body(reader, geometry, layout, config)
    }

    /// Load from a file path (buffered)
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::load(BufReader::new(file))
    }
}

impl<L: RecordLayout> Table<L> {
    /// Load a table whose records are described by `layout`.
    ///
    /// The header's capabilities and record size must match the layout.
    pub fn load_with<R: Read>(mut reader: R, layout: L, config: TableConfig) -> Result<Self> {
        let geometry = read_geometry(&mut reader)?;

        if geometry.record_size != layout.record_size() {
            return Err(corrupt(format!(
                "record size {} does not match layout size {}",
                geometry.record_size,
                layout.record_size()
            )));
        }
        let expected = layout.capabilities() | Capabilities::HAS_ID;
        if geometry.capabilities != expected {
            return Err(corrupt(format!(
                "{:?} does not match layout {:?}",
                geometry.capabilities, expected
            )));
        }

        read_body(reader, geometry, layout, config)
    }
}

/// Read and validate the header
fn read_geometry<R: Read>(reader: &mut R) -> Result<Geometry> {
    let mut buf = [0u8; HEADER_SIZE];
    read_fully(reader, &mut buf, "header")?;

    let header = TableHeader::decode(&buf)?;
    header.validate().map_err(|e| {
        tracing::warn!(?header, error = %e, "rejecting table file");
        e
    })
}

/// Read the payload and rebuild the index
fn read_body<R: Read, L: RecordLayout>(
    mut reader: R,
    geometry: Geometry,
    layout: L,
    config: TableConfig,
) -> Result<Table<L>> {
    config.validate()?;

    let Geometry {
        record_size,
        slot_capacity,
        live_count,
        next_id,
        ..
    } = geometry;

    // Validated: cannot overflow
    let total_len = slot_capacity * record_size;
    let live_len = live_count * record_size;

    // Read the live records before zero-filling spare capacity, so a header
    // promising more than the stream holds fails fast
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(total_len)
        .map_err(|e| PitError::out_of_memory("record storage", total_len, 1, e))?;
    storage.resize(live_len, 0);
    read_fully(&mut reader, &mut storage, "payload")?;
    storage.resize(total_len, 0);

    let records = &storage[..live_len];
    let largest = check_identities(records, record_size, &layout, next_id)?;

    // Sized by what the payload holds; later inserts extend it on demand
    let mut index = table::absent_index(slot_capacity.max(largest))?;
    for (position, record) in records.chunks_exact(record_size).enumerate() {
        index[(layout.read_id(record) - 1) as usize] = Some(position);
    }

    tracing::debug!(
        records = live_count,
        slots = slot_capacity,
        next_id,
        "table loaded"
    );

    Ok(Table::from_parts(
        layout,
        config,
        slot_capacity,
        live_count,
        next_id,
        storage,
        index,
    ))
}

/// Check identities are non-zero, strictly ascending and at most `next_id`.
///
/// Returns the largest identity (0 for an empty payload).
fn check_identities<L: RecordLayout>(
    records: &[u8],
    record_size: usize,
    layout: &L,
    next_id: u64,
) -> Result<usize> {
    let mut previous = 0u64;
    for (position, record) in records.chunks_exact(record_size).enumerate() {
        let id = layout.read_id(record);
        if id <= previous || id > next_id {
            let reason = format!(
                "record at position {} carries identity {} (previous {}, next id {})",
                position, id, previous, next_id
            );
            tracing::warn!("{}", reason);
            return Err(corrupt(reason));
        }
        previous = id;
    }
    // Validated: next_id fits usize, and previous <= next_id
    Ok(previous as usize)
}

/// `read_exact`, reporting a premature end of stream as a corrupt file
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    let expected = buf.len();
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => {
            corrupt(format!("{} truncated: expected {} bytes", what, expected))
        }
        _ => PitError::Io(e),
    })
}
