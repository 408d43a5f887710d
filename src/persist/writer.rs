//! Table save
//!
//! Writes the header followed by the live records.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{PitError, Result};
use crate::layout::RecordLayout;
use crate::table::Table;

use super::{SaveReport, TableHeader, HEADER_FIELDS};

impl<L: RecordLayout> Table<L> {
    /// Serialize the table to `writer`.
    ///
    /// Only the live records are written, never the spare capacity. A short
    /// write surfaces as `PitError::Io`.
    pub fn save<W: Write>(&self, mut writer: W) -> Result<SaveReport> {
        let header = TableHeader::from_table(self).encode()?;
        let payload = self.live_bytes();

        writer.write_all(&header)?;
        writer.write_all(payload)?;
        writer.flush()?;

        let report = SaveReport {
            header_fields: HEADER_FIELDS,
            records: self.live_count(),
            bytes: (header.len() + payload.len()) as u64,
        };

        tracing::debug!(
            records = report.records,
            bytes = report.bytes,
            next_id = self.next_id(),
            "table saved"
        );

        Ok(report)
    }

    /// Save to a file, creating or truncating it, and fsync
    pub fn save_to_path(&self, path: &Path) -> Result<SaveReport> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);
        let report = self.save(&mut writer)?;

        let file = writer
            .into_inner()
            .map_err(|e| PitError::Io(e.into_error()))?;
        file.sync_all()?;

        Ok(report)
    }
}
