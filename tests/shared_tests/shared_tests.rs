//! Tests for SharedTable
//!
//! These tests verify:
//! - Basic operations through the locked handle
//! - Concurrent inserts never hand out the same identity
//! - Readers observe consistent records while writers delete
//! - Consistent snapshots on save

use std::collections::HashSet;
use std::io::Cursor;
use std::thread;

use pitdb::{Capabilities, Clock, SharedTable, Table, TableConfig};

// =============================================================================
// Helper Functions
// =============================================================================

const RECORD_SIZE: usize = 32;

fn make_record(value: u64) -> Vec<u8> {
    let mut record = vec![0u8; RECORD_SIZE];
    record[8..16].copy_from_slice(&value.to_ne_bytes());
    record
}

fn value_of(record: &[u8]) -> u64 {
    u64::from_ne_bytes(record[8..16].try_into().unwrap())
}

fn shared_table() -> SharedTable {
    let config = TableConfig::builder().clock(Clock::Fixed(0)).build();
    Table::create_with_config(RECORD_SIZE, Capabilities::TIMESTAMPS, config)
        .unwrap()
        .into()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_shared_insert_find_delete() {
    let table = shared_table();

    let id = table.insert(&make_record(11)).unwrap();
    assert_eq!(id, 1);
    assert_eq!(value_of(&table.find(1).unwrap()), 11);

    assert!(table.delete(1).is_removed());
    assert!(table.find(1).is_none());
    assert_eq!(table.live_count(), 0);
    assert_eq!(table.next_id(), 1);
}

#[test]
fn test_with_batches_under_one_lock() {
    let table = shared_table();

    let ids = table.with(|t| {
        let a = t.insert(&make_record(1)).unwrap().id;
        let b = t.insert(&make_record(2)).unwrap().id;
        t.delete(a);
        (a, b)
    });

    assert_eq!(ids, (1, 2));
    assert_eq!(table.live_count(), 1);
}

#[test]
fn test_try_into_inner() {
    let table = shared_table();
    let other = table.clone();

    let table = table.try_into_inner().unwrap_err();
    drop(other);

    let inner = table.try_into_inner().unwrap();
    assert!(inner.is_empty());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_inserts_get_unique_identities() {
    let table = shared_table();
    let mut handles = Vec::new();

    for t in 0..8u64 {
        let table = table.clone();
        handles.push(thread::spawn(move || {
            (0..100u64)
                .map(|i| table.insert(&make_record(t * 1_000 + i)).unwrap())
                .collect::<Vec<_>>()
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(seen.insert(id), "identity {} issued twice", id);
        }
    }

    assert_eq!(seen.len(), 800);
    assert_eq!(table.live_count(), 800);
    assert_eq!(table.next_id(), 800);
}

#[test]
fn test_concurrent_readers_and_deleter() {
    let table = shared_table();
    for i in 1..=200u64 {
        table.insert(&make_record(i * 10)).unwrap();
    }

    let deleter = {
        let table = table.clone();
        thread::spawn(move || {
            for id in (1..=200u64).filter(|id| id % 2 == 0) {
                assert!(table.delete(id).is_removed());
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let table = table.clone();
            thread::spawn(move || {
                for id in 1..=200u64 {
                    // Either gone or intact, never shifted content
                    if let Some(record) = table.find(id) {
                        assert_eq!(value_of(&record), id * 10);
                    }
                }
            })
        })
        .collect();

    deleter.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(table.live_count(), 100);
}

#[test]
fn test_save_snapshot_while_writers_run() {
    let table = shared_table();
    let writer = {
        let table = table.clone();
        thread::spawn(move || {
            for i in 0..500u64 {
                table.insert(&make_record(i)).unwrap();
            }
        })
    };

    let mut bytes = Vec::new();
    table.save(&mut bytes).unwrap();
    writer.join().unwrap();

    let loaded = Table::load(Cursor::new(bytes)).unwrap();
    assert_eq!(loaded.live_count() as u64, loaded.next_id());
    for (id, record) in &loaded {
        assert_eq!(value_of(record), id - 1);
    }
}
