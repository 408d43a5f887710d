//! Tests for record layouts
//!
//! These tests verify:
//! - Capability flag parsing
//! - The positional field convention
//! - Explicit field offsets and their validation
//! - Tables driven by a caller-implemented RecordLayout

use std::io::Cursor;

use pitdb::{Capabilities, Clock, FieldLayout, PitError, RecordLayout, Table, TableConfig};

// =============================================================================
// Capabilities Tests
// =============================================================================

#[test]
fn test_capability_bits_match_file_format() {
    assert_eq!(Capabilities::HAS_ID.bits(), 1);
    assert_eq!(Capabilities::HAS_CREATED_AT.bits(), 2);
    assert_eq!(Capabilities::HAS_UPDATED_AT.bits(), 4);
    assert_eq!(Capabilities::TIMESTAMPS.bits(), 6);
}

#[test]
fn test_capabilities_from_bits() {
    assert_eq!(Capabilities::from_bits(7), Some(Capabilities::HAS_ID | Capabilities::TIMESTAMPS));
    assert_eq!(Capabilities::from_bits(0), Some(Capabilities::empty()));
    assert_eq!(Capabilities::from_bits(8), None);
}

#[test]
fn test_capabilities_queries() {
    let caps = Capabilities::HAS_ID | Capabilities::HAS_UPDATED_AT;
    assert!(caps.contains(Capabilities::HAS_ID));
    assert!(!caps.contains(Capabilities::TIMESTAMPS));
    assert!(caps.intersects(Capabilities::TIMESTAMPS));
    assert_eq!(caps.timestamp_slots(), 1);
    assert_eq!(format!("{:?}", caps), "Capabilities(HAS_ID | HAS_UPDATED_AT)");
}

// =============================================================================
// Conventional Layout Tests
// =============================================================================

#[test]
fn test_conventional_offsets_with_both_timestamps() {
    let layout = FieldLayout::conventional(64, Capabilities::TIMESTAMPS).unwrap();

    assert_eq!(layout.id_offset(), 0);
    assert_eq!(layout.created_at_offset(), Some(48));
    assert_eq!(layout.updated_at_offset(), Some(56));
    assert_eq!(layout.capabilities(), Capabilities::HAS_ID | Capabilities::TIMESTAMPS);
}

#[test]
fn test_conventional_single_timestamp_is_last() {
    let created = FieldLayout::conventional(40, Capabilities::HAS_CREATED_AT).unwrap();
    assert_eq!(created.created_at_offset(), Some(32));
    assert_eq!(created.updated_at_offset(), None);

    let updated = FieldLayout::conventional(40, Capabilities::HAS_UPDATED_AT).unwrap();
    assert_eq!(updated.created_at_offset(), None);
    assert_eq!(updated.updated_at_offset(), Some(32));
}

#[test]
fn test_conventional_minimum_sizes() {
    assert!(FieldLayout::conventional(8, Capabilities::empty()).is_ok());
    assert!(FieldLayout::conventional(7, Capabilities::empty()).is_err());
    assert!(FieldLayout::conventional(16, Capabilities::HAS_CREATED_AT).is_ok());
    assert!(FieldLayout::conventional(24, Capabilities::TIMESTAMPS).is_ok());
    assert!(matches!(
        FieldLayout::conventional(23, Capabilities::TIMESTAMPS),
        Err(PitError::Layout(_))
    ));
}

#[test]
fn test_conventional_field_access() {
    let layout = FieldLayout::conventional(32, Capabilities::TIMESTAMPS).unwrap();
    let mut record = vec![0u8; 32];

    layout.write_id(&mut record, 42);
    layout.write_created_at(&mut record, -5);
    layout.write_updated_at(&mut record, 77);

    assert_eq!(layout.read_id(&record), 42);
    assert_eq!(layout.read_created_at(&record), Some(-5));
    assert_eq!(layout.read_updated_at(&record), Some(77));
    assert_eq!(&record[0..8], &42u64.to_ne_bytes());
}

// =============================================================================
// Explicit Layout Tests
// =============================================================================

#[test]
fn test_builder_places_fields() {
    let layout = FieldLayout::builder(40)
        .id_at(8)
        .created_at(0)
        .updated_at(32)
        .build()
        .unwrap();

    let mut record = vec![0u8; 40];
    layout.write_id(&mut record, 3);
    layout.write_created_at(&mut record, 10);
    layout.write_updated_at(&mut record, 20);

    assert_eq!(&record[8..16], &3u64.to_ne_bytes());
    assert_eq!(&record[0..8], &10i64.to_ne_bytes());
    assert_eq!(&record[32..40], &20i64.to_ne_bytes());
}

#[test]
fn test_builder_requires_id() {
    let result = FieldLayout::builder(32).created_at(0).build();
    assert!(matches!(result, Err(PitError::Layout(_))));
}

#[test]
fn test_builder_rejects_out_of_bounds() {
    let result = FieldLayout::builder(32).id_at(25).build();
    assert!(matches!(result, Err(PitError::Layout(_))));

    let result = FieldLayout::builder(32).id_at(usize::MAX).build();
    assert!(matches!(result, Err(PitError::Layout(_))));
}

#[test]
fn test_builder_rejects_overlap() {
    let result = FieldLayout::builder(32).id_at(0).updated_at(4).build();
    assert!(matches!(result, Err(PitError::Layout(_))));
}

#[test]
fn test_table_with_explicit_layout() {
    let layout = FieldLayout::builder(24)
        .id_at(16)
        .updated_at(0)
        .build()
        .unwrap();
    let config = TableConfig::builder().clock(Clock::Fixed(99)).build();
    let mut table = Table::with_layout(layout, config).unwrap();

    let mut record = vec![0u8; 24];
    record[8..16].copy_from_slice(b"payload!");
    let inserted = table.insert(&record).unwrap();

    assert_eq!(inserted.id, 1);
    assert_eq!(&inserted.record[16..24], &1u64.to_ne_bytes());
    assert_eq!(&inserted.record[0..8], &99i64.to_ne_bytes());
    assert_eq!(&inserted.record[8..16], b"payload!");
}

// =============================================================================
// Custom RecordLayout Tests
// =============================================================================

/// Identity as a big-endian u32 at the end of a 12-byte record, no timestamps
struct TrailingBigEndianId;

impl RecordLayout for TrailingBigEndianId {
    fn record_size(&self) -> usize {
        12
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::HAS_ID
    }

    fn read_id(&self, record: &[u8]) -> u64 {
        u32::from_be_bytes(record[8..12].try_into().unwrap()) as u64
    }

    fn write_id(&self, record: &mut [u8], id: u64) {
        record[8..12].copy_from_slice(&(id as u32).to_be_bytes());
    }

    fn read_created_at(&self, _record: &[u8]) -> Option<i64> {
        None
    }

    fn write_created_at(&self, _record: &mut [u8], _ts: i64) {}

    fn read_updated_at(&self, _record: &[u8]) -> Option<i64> {
        None
    }

    fn write_updated_at(&self, _record: &mut [u8], _ts: i64) {}
}

#[test]
fn test_custom_layout_drives_identity_injection() {
    let mut table = Table::with_layout(TrailingBigEndianId, TableConfig::default()).unwrap();

    for i in 0..7u64 {
        let mut record = vec![0u8; 12];
        record[0..8].copy_from_slice(&i.to_le_bytes());
        table.insert(&record).unwrap();
    }
    table.delete(3);

    let record = table.find(7).unwrap();
    assert_eq!(&record[8..12], &7u32.to_be_bytes());
    assert_eq!(&record[0..8], &6u64.to_le_bytes());
}

#[test]
fn test_custom_layout_round_trip() {
    let mut table = Table::with_layout(TrailingBigEndianId, TableConfig::default()).unwrap();
    for _ in 0..6 {
        table.insert(&[0u8; 12]).unwrap();
    }
    table.delete(1);
    table.delete(4);

    let mut bytes = Vec::new();
    table.save(&mut bytes).unwrap();
    let loaded =
        Table::load_with(Cursor::new(bytes), TrailingBigEndianId, TableConfig::default()).unwrap();

    let ids: Vec<u64> = loaded.iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![2, 3, 5, 6]);
    assert_eq!(loaded.next_id(), 6);
}
