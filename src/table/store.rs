//! Table implementation
//!
//! Packed record buffer + identity index, with fallible growth.

use crate::config::TableConfig;
use crate::error::{PitError, Result};
use crate::layout::{Capabilities, FieldLayout, RecordLayout};

use super::{DeleteOutcome, Inserted, Occupancy, Removal};

/// In-memory table of fixed-size records
///
/// ## Invariants
/// - `storage.len() == slot_capacity * record_size`; bytes past the first
///   `live_count` records are zero
/// - live records are packed in ascending-identity order
/// - `index[k - 1]` is `Some(position)` for every live identity `k`; deleted
///   and unissued identities are `None` or past the end of `index`
/// - `index.len() >= slot_capacity` and covers the largest live identity
/// - `next_id >= live_count`, equal iff nothing was ever deleted
///
/// Not internally synchronized. Wrap in [`SharedTable`](crate::SharedTable)
/// when several threads need the same table.
pub struct Table<L: RecordLayout = FieldLayout> {
    /// Where identity and timestamps live inside a record
    layout: L,

    config: TableConfig,

    /// Declared at creation, always includes HAS_ID
    capabilities: Capabilities,

    record_size: usize,

    /// Number of record slots currently allocated
    slot_capacity: usize,

    /// Number of live records
    live_count: usize,

    /// Identity of the last inserted record (0 = none yet)
    next_id: u64,

    /// Record bytes: live records first, zeroed capacity after
    storage: Vec<u8>,

    /// identity - 1 → slot position in `storage`
    index: Vec<Option<usize>>,

    /// Number of capacity extensions since create/load
    growth_count: u64,
}

impl Table<FieldLayout> {
    /// Create a table using the positional field convention and default config
    pub fn create(record_size: usize, capabilities: Capabilities) -> Result<Self> {
        Self::create_with_config(record_size, capabilities, TableConfig::default())
    }

    /// Create a table using the positional field convention
    pub fn create_with_config(
        record_size: usize,
        capabilities: Capabilities,
        config: TableConfig,
    ) -> Result<Self> {
        let layout = FieldLayout::conventional(record_size, capabilities)?;
        Self::with_layout(layout, config)
    }
}

impl<L: RecordLayout> Table<L> {
    /// Create an empty table for records described by `layout`
    ///
    /// Allocates `config.initial_slots` zeroed slots in both buffers.
    pub fn with_layout(layout: L, config: TableConfig) -> Result<Self> {
        config.validate()?;

        let record_size = layout.record_size();
        if record_size == 0 {
            return Err(PitError::Layout("record size must be non-zero".to_string()));
        }
        let capabilities = layout.capabilities() | Capabilities::HAS_ID;

        let storage = zeroed_storage(config.initial_slots, record_size)?;
        let index = absent_index(config.initial_slots)?;

        tracing::debug!(
            record_size,
            slots = config.initial_slots,
            ?capabilities,
            "table created"
        );

        Ok(Self {
            layout,
            capabilities,
            record_size,
            slot_capacity: config.initial_slots,
            live_count: 0,
            next_id: 0,
            storage,
            index,
            growth_count: 0,
            config,
        })
    }

    /// Assemble a table from already-validated parts (used by load)
    pub(crate) fn from_parts(
        layout: L,
        config: TableConfig,
        slot_capacity: usize,
        live_count: usize,
        next_id: u64,
        storage: Vec<u8>,
        index: Vec<Option<usize>>,
    ) -> Self {
        Self {
            capabilities: layout.capabilities() | Capabilities::HAS_ID,
            record_size: layout.record_size(),
            layout,
            config,
            slot_capacity,
            live_count,
            next_id,
            storage,
            index,
            growth_count: 0,
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Insert a copy of `record`, returning its new identity and stored bytes.
    ///
    /// The identity field is overwritten with the assigned identity. If the
    /// layout has timestamps, created_at and updated_at both receive the same
    /// "now". Grows the table first when it is full.
    pub fn insert(&mut self, record: &[u8]) -> Result<Inserted<'_>> {
        if record.len() != self.record_size {
            return Err(PitError::RecordSize {
                expected: self.record_size,
                actual: record.len(),
            });
        }

        let id = self.next_id.checked_add(1).ok_or_else(|| {
            PitError::Config("identity counter exhausted".to_string())
        })?;
        let slot = usize::try_from(id - 1)
            .map_err(|_| PitError::capacity_overflow("identity index", id))?;

        self.make_room(slot)?;

        // Nothing below can fail
        let position = self.live_count;
        let range = self.slot_range(position);
        let now = self
            .capabilities
            .intersects(Capabilities::TIMESTAMPS)
            .then(|| self.config.clock.now());

        let stored = &mut self.storage[range.clone()];
        stored.copy_from_slice(record);
        self.layout.write_id(stored, id);
        if let Some(now) = now {
            self.layout.write_created_at(stored, now);
            self.layout.write_updated_at(stored, now);
        }

        self.index[slot] = Some(position);
        self.next_id = id;
        self.live_count += 1;

        tracing::trace!(id, position, "record inserted");

        Ok(Inserted {
            id,
            record: &self.storage[range],
        })
    }

    /// Look up a live record by identity in O(1)
    ///
    /// Returns `None` for 0, identities never issued, and deleted identities.
    pub fn find(&self, id: u64) -> Option<&[u8]> {
        let position = self.position(id)?;
        Some(&self.storage[self.slot_range(position)])
    }

    /// Like `find`, but reports a missing record as `PitError::NotFound`
    pub fn get(&self, id: u64) -> Result<&[u8]> {
        self.find(id).ok_or(PitError::NotFound(id))
    }

    /// Mutable access to a live record's bytes.
    ///
    /// Callers must not change the identity field; the index and any later
    /// load rely on it.
    pub fn get_mut(&mut self, id: u64) -> Result<&mut [u8]> {
        let position = self.position(id).ok_or(PitError::NotFound(id))?;
        let range = self.slot_range(position);
        Ok(&mut self.storage[range])
    }

    /// True if `id` names a live record
    pub fn contains(&self, id: u64) -> bool {
        self.position(id).is_some()
    }

    /// Stamp a live record's updated_at with the current time.
    ///
    /// No-op on layouts without an updated_at field.
    pub fn touch(&mut self, id: u64) -> Result<()> {
        let now = self.config.clock.now();
        let position = self.position(id).ok_or(PitError::NotFound(id))?;
        let range = self.slot_range(position);
        self.layout.write_updated_at(&mut self.storage[range], now);
        Ok(())
    }

    /// Delete a record by identity.
    ///
    /// Later records shift left one slot to close the gap, the vacated tail
    /// slot is zeroed, and the identity is retired for good.
    pub fn delete(&mut self, id: u64) -> DeleteOutcome {
        let Some(position) = self.position(id) else {
            return DeleteOutcome {
                removal: Removal::NotFound,
                occupancy: self.occupancy(),
            };
        };

        let last = self.live_count - 1;
        if position != last {
            let tail = self.slot_range(position + 1).start..self.slot_range(last).end;
            let dest = self.slot_range(position).start;
            self.storage.copy_within(tail, dest);
        }
        let vacated = self.slot_range(last);
        self.storage[vacated].fill(0);

        // Position checked above, so id - 1 fits the index
        let slot = (id - 1) as usize;
        self.index[slot] = None;
        // Every record with a larger identity sat after the deleted one
        for entry in self.index[slot + 1..].iter_mut().flatten() {
            *entry -= 1;
        }
        self.live_count -= 1;

        tracing::debug!(id, remaining = self.live_count, "record deleted");

        DeleteOutcome {
            removal: Removal::Removed,
            occupancy: self.occupancy(),
        }
    }

    /// Release both buffers
    pub fn destroy(self) {
        tracing::debug!(
            live = self.live_count,
            slots = self.slot_capacity,
            "table destroyed"
        );
        drop(self);
    }

    /// Live records as `(identity, bytes)` in ascending-identity order
    pub fn iter(&self) -> TableIter<'_, L> {
        TableIter {
            table: self,
            next_slot: 0,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    pub fn slot_capacity(&self) -> usize {
        self.slot_capacity
    }

    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Identity assigned to the most recent insert (0 if none)
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Number of capacity extensions since this table was created or loaded
    pub fn growth_count(&self) -> u64 {
        self.growth_count
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Bytes of the live records, packed (what save writes)
    pub(crate) fn live_bytes(&self) -> &[u8] {
        &self.storage[..self.live_count * self.record_size]
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn occupancy(&self) -> Occupancy {
        if self.live_count == 0 {
            Occupancy::Empty
        } else {
            Occupancy::Populated
        }
    }

    /// Byte range of slot `position` in `storage`
    fn slot_range(&self, position: usize) -> std::ops::Range<usize> {
        let start = position * self.record_size;
        start..start + self.record_size
    }

    fn position(&self, id: u64) -> Option<usize> {
        if self.live_count == 0 || id == 0 || id > self.next_id {
            return None;
        }
        let slot = usize::try_from(id - 1).ok()?;
        self.index.get(slot).copied().flatten()
    }

    /// Make room for one more record whose identity maps to `index[slot]`.
    ///
    /// Extends storage by one step of the growth policy when the table is
    /// full, and the index when `slot` lies past its end. Both reservations
    /// happen before any field changes, so on error the table is untouched.
    fn make_room(&mut self, slot: usize) -> Result<()> {
        let grow_to = if self.live_count == self.slot_capacity {
            Some(self.next_slot_capacity()?)
        } else {
            None
        };
        let capacity = grow_to.unwrap_or(self.slot_capacity);
        let index_len = self.index_len_for(slot, capacity)?;

        let new_bytes = capacity
            .checked_mul(self.record_size)
            .ok_or_else(|| PitError::capacity_overflow("record storage", capacity))?;
        let extra_bytes = new_bytes - self.storage.len();
        self.storage
            .try_reserve_exact(extra_bytes)
            .map_err(|e| PitError::out_of_memory("record storage", extra_bytes, 1, e))?;

        let extra_entries = index_len - self.index.len();
        self.index.try_reserve_exact(extra_entries).map_err(|e| {
            PitError::out_of_memory("identity index", extra_entries, INDEX_ENTRY, e)
        })?;

        // Reserved: nothing below can fail
        self.storage.resize(new_bytes, 0);
        self.index.resize(index_len, None);

        if let Some(new_capacity) = grow_to {
            let old_capacity = self.slot_capacity;
            self.slot_capacity = new_capacity;
            self.growth_count += 1;

            tracing::debug!(
                from = old_capacity,
                to = new_capacity,
                policy = ?self.config.growth,
                "table grown"
            );
        }

        Ok(())
    }

    fn next_slot_capacity(&self) -> Result<usize> {
        self.config
            .growth
            .next_capacity(self.slot_capacity)
            .ok_or_else(|| PitError::OutOfMemory {
                context: format!(
                    "growing {} slots by {:?} overflows the address space",
                    self.slot_capacity, self.config.growth
                ),
                source: None,
            })
    }

    /// Index length needed to cover `slot` and `capacity` slots.
    ///
    /// After deletions, identities run ahead of slot capacity, so the index
    /// can need extending even when storage does not. It then grows by the
    /// same policy as storage.
    fn index_len_for(&self, slot: usize, capacity: usize) -> Result<usize> {
        let current = self.index.len().max(capacity);
        if slot < current {
            return Ok(current);
        }
        let needed = slot
            .checked_add(1)
            .ok_or_else(|| PitError::capacity_overflow("identity index", slot))?;
        Ok(self
            .config
            .growth
            .next_capacity(self.index.len())
            .map_or(needed, |len| len.max(needed))
            .max(capacity))
    }
}

impl<L: RecordLayout> std::fmt::Debug for Table<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("capabilities", &self.capabilities)
            .field("record_size", &self.record_size)
            .field("slot_capacity", &self.slot_capacity)
            .field("live_count", &self.live_count)
            .field("next_id", &self.next_id)
            .field("growth_count", &self.growth_count)
            .finish()
    }
}

impl<'a, L: RecordLayout> IntoIterator for &'a Table<L> {
    type Item = (u64, &'a [u8]);
    type IntoIter = TableIter<'a, L>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over live records, ascending identity
pub struct TableIter<'a, L: RecordLayout> {
    table: &'a Table<L>,
    next_slot: usize,
}

impl<'a, L: RecordLayout> Iterator for TableIter<'a, L> {
    type Item = (u64, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.table;
        let issued = usize::try_from(table.next_id).unwrap_or(usize::MAX);
        let end = table.index.len().min(issued);
        while self.next_slot < end {
            let slot = self.next_slot;
            self.next_slot += 1;
            if let Some(position) = table.index[slot] {
                let range = table.slot_range(position);
                return Some((slot as u64 + 1, &table.storage[range]));
            }
        }
        None
    }
}

// =============================================================================
// Allocation helpers
// =============================================================================

const INDEX_ENTRY: usize = std::mem::size_of::<Option<usize>>();

/// `slots * record_size` zero bytes, reporting allocation failure
fn zeroed_storage(slots: usize, record_size: usize) -> Result<Vec<u8>> {
    let len = slots
        .checked_mul(record_size)
        .ok_or_else(|| PitError::capacity_overflow("record storage", slots))?;
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(len)
        .map_err(|e| PitError::out_of_memory("record storage", len, 1, e))?;
    storage.resize(len, 0);
    Ok(storage)
}

/// An index of `len` absent entries, reporting allocation failure
pub(crate) fn absent_index(len: usize) -> Result<Vec<Option<usize>>> {
    let mut index = Vec::new();
    index
        .try_reserve_exact(len)
        .map_err(|e| PitError::out_of_memory("identity index", len, INDEX_ENTRY, e))?;
    index.resize(len, None);
    Ok(index)
}
