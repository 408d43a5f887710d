//! Error types for pitdb
//!
//! Provides a unified error type for all table operations.

use std::collections::TryReserveError;

use thiserror::Error;

/// Result type alias using PitError
pub type Result<T> = std::result::Result<T, PitError>;

/// Unified error type for pitdb operations
#[derive(Debug, Error)]
pub enum PitError {
    // -------------------------------------------------------------------------
    // Memory Errors
    // -------------------------------------------------------------------------
    #[error("Out of memory: {context}")]
    OutOfMemory {
        context: String,
        #[source]
        source: Option<TryReserveError>,
    },

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Record {0} not found")]
    NotFound(u64),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt table file: {0}")]
    CorruptFile(String),

    // -------------------------------------------------------------------------
    // Record / Layout Errors
    // -------------------------------------------------------------------------
    #[error("Record size mismatch: expected {expected} bytes, got {actual}")]
    RecordSize { expected: usize, actual: usize },

    #[error("Invalid record layout: {0}")]
    Layout(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PitError {
    /// A failed reservation of `elements` items of `width` bytes for `what`
    pub(crate) fn out_of_memory(
        what: &str,
        elements: usize,
        width: usize,
        source: TryReserveError,
    ) -> Self {
        let context = match elements.checked_mul(width) {
            Some(bytes) => format!("failed to reserve {} bytes for {}", bytes, what),
            None => format!("{} entries for {} overflow the address space", elements, what),
        };
        PitError::OutOfMemory {
            context,
            source: Some(source),
        }
    }

    /// A size computation for `what` that does not fit in `usize`
    pub(crate) fn capacity_overflow(what: &str, count: impl std::fmt::Display) -> Self {
        PitError::OutOfMemory {
            context: format!("{} of {} entries overflows the address space", what, count),
            source: None,
        }
    }
}

impl From<bincode::Error> for PitError {
    fn from(e: bincode::Error) -> Self {
        PitError::Serialization(e.to_string())
    }
}
