//! Configuration for pitdb tables
//!
//! Centralized configuration with sensible defaults. Nothing here is
//! persisted; a loaded table takes its config from the caller.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{PitError, Result};

/// Number of slots a fresh table starts with
pub const DEFAULT_INITIAL_SLOTS: usize = 5;

/// Slots added per extension under the default linear policy
pub const DEFAULT_GROWTH_INCREMENT: usize = 5;

/// Per-table configuration
#[derive(Debug, Clone)]
pub struct TableConfig {
    // -------------------------------------------------------------------------
    // Capacity Configuration
    // -------------------------------------------------------------------------
    /// Slots allocated (and zero-filled) by `create`
    pub initial_slots: usize,

    /// How capacity is extended when an insert finds the table full
    pub growth: GrowthPolicy,

    // -------------------------------------------------------------------------
    // Timestamp Configuration
    // -------------------------------------------------------------------------
    /// Source of "now" for created_at / updated_at stamping
    pub clock: Clock,
}

/// Capacity growth strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthPolicy {
    /// Add a fixed number of slots per extension.
    ///
    /// O(n²) total copying for n sequential inserts; kept because it is the
    /// historic behavior and keeps memory tight for small tables.
    Linear { increment: usize },

    /// Multiply capacity by `factor` per extension (amortized O(1) inserts)
    Geometric { factor: usize },
}

impl GrowthPolicy {
    /// Capacity after one extension from `current` slots.
    ///
    /// Returns `None` on arithmetic overflow.
    pub fn next_capacity(&self, current: usize) -> Option<usize> {
        match *self {
            GrowthPolicy::Linear { increment } => current.checked_add(increment),
            GrowthPolicy::Geometric { factor } => {
                // A table may have been loaded with zero slots
                current.max(1).checked_mul(factor)
            }
        }
    }
}

/// Timestamp source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// Wall clock, seconds since the unix epoch
    System,

    /// Always returns the given value (deterministic stamping)
    Fixed(i64),
}

impl Clock {
    /// Current time in unix seconds
    pub fn now(&self) -> i64 {
        match *self {
            Clock::System => match SystemTime::now().duration_since(UNIX_EPOCH) {
                Ok(d) => d.as_secs() as i64,
                Err(e) => -(e.duration().as_secs() as i64),
            },
            Clock::Fixed(ts) => ts,
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_slots: DEFAULT_INITIAL_SLOTS,
            growth: GrowthPolicy::Linear {
                increment: DEFAULT_GROWTH_INCREMENT,
            },
            clock: Clock::System,
        }
    }
}

impl TableConfig {
    /// Create a new config builder
    pub fn builder() -> TableConfigBuilder {
        TableConfigBuilder::default()
    }

    /// Reject configurations that could never grow a table
    pub fn validate(&self) -> Result<()> {
        if self.initial_slots == 0 {
            return Err(PitError::Config(
                "initial_slots must be at least 1".to_string(),
            ));
        }
        match self.growth {
            GrowthPolicy::Linear { increment: 0 } => Err(PitError::Config(
                "linear growth increment must be at least 1".to_string(),
            )),
            GrowthPolicy::Geometric { factor } if factor < 2 => Err(PitError::Config(format!(
                "geometric growth factor must be at least 2, got {}",
                factor
            ))),
            _ => Ok(()),
        }
    }
}

/// Builder for TableConfig
#[derive(Default)]
pub struct TableConfigBuilder {
    config: TableConfig,
}

impl TableConfigBuilder {
    /// Set the number of slots allocated at creation
    pub fn initial_slots(mut self, slots: usize) -> Self {
        self.config.initial_slots = slots;
        self
    }

    /// Set the growth policy
    pub fn growth(mut self, policy: GrowthPolicy) -> Self {
        self.config.growth = policy;
        self
    }

    /// Shorthand for `GrowthPolicy::Linear { increment }`
    pub fn linear_growth(self, increment: usize) -> Self {
        self.growth(GrowthPolicy::Linear { increment })
    }

    /// Shorthand for `GrowthPolicy::Geometric { factor }`
    pub fn geometric_growth(self, factor: usize) -> Self {
        self.growth(GrowthPolicy::Geometric { factor })
    }

    /// Set the timestamp source
    pub fn clock(mut self, clock: Clock) -> Self {
        self.config.clock = clock;
        self
    }

    pub fn build(self) -> TableConfig {
        self.config
    }
}
