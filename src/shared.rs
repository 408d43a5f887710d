//! Shared table handle
//!
//! `Table` has no interior synchronization. `SharedTable` puts one exclusive
//! lock around a table so several threads can use it; every call holds the
//! lock for its full duration and returns owned data, never a location into
//! the record buffer.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::layout::{FieldLayout, RecordLayout};
use crate::persist::SaveReport;
use crate::table::{DeleteOutcome, Table};

/// A table behind a per-table mutex, cheap to clone across threads
pub struct SharedTable<L: RecordLayout = FieldLayout> {
    inner: Arc<Mutex<Table<L>>>,
}

impl<L: RecordLayout> Clone for SharedTable<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: RecordLayout> SharedTable<L> {
    pub fn new(table: Table<L>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(table)),
        }
    }

    /// Run `f` with exclusive access (batch several operations under one lock)
    pub fn with<T>(&self, f: impl FnOnce(&mut Table<L>) -> T) -> T {
        let mut table = self.inner.lock();
        f(&mut table)
    }

    /// Insert a record, returning its identity
    pub fn insert(&self, record: &[u8]) -> Result<u64> {
        let mut table = self.inner.lock();
        let inserted = table.insert(record)?;
        Ok(inserted.id)
    }

    /// Copy of a live record's bytes
    pub fn find(&self, id: u64) -> Option<Vec<u8>> {
        self.inner.lock().find(id).map(<[u8]>::to_vec)
    }

    pub fn delete(&self, id: u64) -> DeleteOutcome {
        self.inner.lock().delete(id)
    }

    pub fn live_count(&self) -> usize {
        self.inner.lock().live_count()
    }

    pub fn next_id(&self) -> u64 {
        self.inner.lock().next_id()
    }

    /// Save while holding the lock, so the snapshot is consistent
    pub fn save<W: Write>(&self, writer: W) -> Result<SaveReport> {
        self.inner.lock().save(writer)
    }

    /// Take the table back if this is the last handle
    pub fn try_into_inner(self) -> std::result::Result<Table<L>, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl<L: RecordLayout> fmt::Debug for SharedTable<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(table) => f.debug_tuple("SharedTable").field(&*table).finish(),
            None => f.write_str("SharedTable(<locked>)"),
        }
    }
}

impl<L: RecordLayout> From<Table<L>> for SharedTable<L> {
    fn from(table: Table<L>) -> Self {
        Self::new(table)
    }
}
