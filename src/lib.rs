//! # pitdb
//!
//! The record store behind the pit task tracker:
//! - Fixed-size binary records (projects, tasks, notes, log actions)
//! - Permanent integer identities, never reused after deletion
//! - O(1) lookup and delete by identity
//! - Whole-table save/load to a flat file
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SharedTable                            │
//! │              (optional per-table Mutex)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Table                                │
//! │        insert / find / delete / growth bookkeeping          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Storage   │          │    Index    │
//!   │ (packed by  │◄─────────│ id → slot   │
//!   │  identity)  │          │  position   │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │   Persist   │
//!   │ header+rows │
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod layout;
pub mod table;
pub mod persist;
pub mod shared;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{PitError, Result};
pub use config::{Clock, GrowthPolicy, TableConfig};
pub use layout::{Capabilities, FieldLayout, RecordLayout};
pub use table::{DeleteOutcome, Inserted, Occupancy, Removal, Table};
pub use persist::{SaveReport, TableHeader};
pub use shared::SharedTable;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of pitdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
