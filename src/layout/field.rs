//! Field-offset record layout
//!
//! `FieldLayout` records the byte offset of each engine-managed field.
//! Offsets come either from the positional convention every pit schema
//! follows (identity first, timestamps last) or from an explicit builder.

use crate::error::{PitError, Result};

use super::{Capabilities, RecordLayout, WORD};

/// Engine-managed field offsets for one record schema. Fields are
/// native-endian 8-byte integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    record_size: usize,
    id: usize,
    created_at: Option<usize>,
    updated_at: Option<usize>,
}

impl FieldLayout {
    /// The positional convention:
    /// - identity is the first 8-byte field
    /// - with both timestamps, created_at is the second-to-last and
    ///   updated_at the last 8-byte field
    /// - with a single timestamp, it occupies the last 8-byte field
    ///
    /// `HAS_ID` is added to `capabilities` unconditionally.
    pub fn conventional(record_size: usize, capabilities: Capabilities) -> Result<Self> {
        let caps = capabilities | Capabilities::HAS_ID;
        let needed = WORD * (1 + caps.timestamp_slots());
        if record_size < needed {
            return Err(PitError::Layout(format!(
                "{:?} needs at least {} bytes per record, got {}",
                caps, needed, record_size
            )));
        }

        let last = record_size - WORD;
        let (created_at, updated_at) = match (
            caps.contains(Capabilities::HAS_CREATED_AT),
            caps.contains(Capabilities::HAS_UPDATED_AT),
        ) {
            (true, true) => (Some(last - WORD), Some(last)),
            (true, false) => (Some(last), None),
            (false, true) => (None, Some(last)),
            (false, false) => (None, None),
        };

        let layout = Self {
            record_size,
            id: 0,
            created_at,
            updated_at,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Start an explicit layout for records of `record_size` bytes
    pub fn builder(record_size: usize) -> FieldLayoutBuilder {
        FieldLayoutBuilder {
            record_size,
            id: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Offset of the identity field
    pub fn id_offset(&self) -> usize {
        self.id
    }

    pub fn created_at_offset(&self) -> Option<usize> {
        self.created_at
    }

    pub fn updated_at_offset(&self) -> Option<usize> {
        self.updated_at
    }

    /// Check bounds and that no two managed fields overlap
    fn validate(&self) -> Result<()> {
        if self.record_size == 0 {
            return Err(PitError::Layout("record size must be non-zero".to_string()));
        }

        let mut fields: Vec<(&str, usize)> = vec![("id", self.id)];
        if let Some(off) = self.created_at {
            fields.push(("created_at", off));
        }
        if let Some(off) = self.updated_at {
            fields.push(("updated_at", off));
        }

        for &(name, off) in &fields {
            match off.checked_add(WORD) {
                Some(end) if end <= self.record_size => {}
                _ => {
                    return Err(PitError::Layout(format!(
                        "{} field at offset {} does not fit in a {}-byte record",
                        name, off, self.record_size
                    )))
                }
            }
        }

        fields.sort_by_key(|&(_, off)| off);
        for pair in fields.windows(2) {
            if pair[0].1 + WORD > pair[1].1 {
                return Err(PitError::Layout(format!(
                    "{} and {} fields overlap",
                    pair[0].0, pair[1].0
                )));
            }
        }

        Ok(())
    }
}

fn read_word(record: &[u8], offset: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word.copy_from_slice(&record[offset..offset + WORD]);
    word
}

fn write_word(record: &mut [u8], offset: usize, word: [u8; WORD]) {
    record[offset..offset + WORD].copy_from_slice(&word);
}

impl RecordLayout for FieldLayout {
    fn record_size(&self) -> usize {
        self.record_size
    }

    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::HAS_ID;
        if self.created_at.is_some() {
            caps = caps | Capabilities::HAS_CREATED_AT;
        }
        if self.updated_at.is_some() {
            caps = caps | Capabilities::HAS_UPDATED_AT;
        }
        caps
    }

    fn read_id(&self, record: &[u8]) -> u64 {
        u64::from_ne_bytes(read_word(record, self.id))
    }

    fn write_id(&self, record: &mut [u8], id: u64) {
        write_word(record, self.id, id.to_ne_bytes());
    }

    fn read_created_at(&self, record: &[u8]) -> Option<i64> {
        self.created_at
            .map(|off| i64::from_ne_bytes(read_word(record, off)))
    }

    fn write_created_at(&self, record: &mut [u8], ts: i64) {
        if let Some(off) = self.created_at {
            write_word(record, off, ts.to_ne_bytes());
        }
    }

    fn read_updated_at(&self, record: &[u8]) -> Option<i64> {
        self.updated_at
            .map(|off| i64::from_ne_bytes(read_word(record, off)))
    }

    fn write_updated_at(&self, record: &mut [u8], ts: i64) {
        if let Some(off) = self.updated_at {
            write_word(record, off, ts.to_ne_bytes());
        }
    }
}

/// Builder for explicit `FieldLayout`s
#[derive(Debug, Clone)]
pub struct FieldLayoutBuilder {
    record_size: usize,
    id: Option<usize>,
    created_at: Option<usize>,
    updated_at: Option<usize>,
}

impl FieldLayoutBuilder {
    /// Offset of the identity field (required)
    pub fn id_at(mut self, offset: usize) -> Self {
        self.id = Some(offset);
        self
    }

    pub fn created_at(mut self, offset: usize) -> Self {
        self.created_at = Some(offset);
        self
    }

    pub fn updated_at(mut self, offset: usize) -> Self {
        self.updated_at = Some(offset);
        self
    }

    pub fn build(self) -> Result<FieldLayout> {
        let id = self.id.ok_or_else(|| {
            PitError::Layout("every table is identity-bearing; id_at is required".to_string())
        })?;

        let layout = FieldLayout {
            record_size: self.record_size,
            id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        layout.validate()?;
        Ok(layout)
    }
}
