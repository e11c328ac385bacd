//! Gas accounting for store access.
//!
//! The meter is shared by every branch of a message (trial branches that are
//! later discarded still pay for the reads they did). It uses a `Cell` so a
//! single `&GasMeter` can be handed to nested contexts.

use std::cell::Cell;

use crate::error::{DexError, DexResult};

/// Per-operation store costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasConfig {
    pub read_cost_flat: u64,
    pub read_cost_per_byte: u64,
    pub write_cost_flat: u64,
    pub write_cost_per_byte: u64,
    pub delete_cost: u64,
    pub iter_next_cost_flat: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        GasConfig {
            read_cost_flat: 1_000,
            read_cost_per_byte: 3,
            write_cost_flat: 2_000,
            write_cost_per_byte: 30,
            delete_cost: 1_000,
            iter_next_cost_flat: 30,
        }
    }
}

/// Gas meter with a hard limit.
#[derive(Debug)]
pub struct GasMeter {
    limit: u64,
    consumed: Cell<u64>,
    config: GasConfig,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        GasMeter {
            limit,
            consumed: Cell::new(0),
            config: GasConfig::default(),
        }
    }

    /// Meter that never runs out. Used for queries and block hooks.
    pub fn infinite() -> Self {
        GasMeter::new(u64::MAX)
    }

    pub fn with_config(mut self, config: GasConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &GasConfig {
        &self.config
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn consumed(&self) -> u64 {
        self.consumed.get()
    }

    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.consumed())
    }

    /// Charge `amount`. The charge is recorded even when it exceeds the limit.
    pub fn consume(&self, amount: u64) -> DexResult<()> {
        let total = self.consumed.get().saturating_add(amount);
        self.consumed.set(total);
        if total > self.limit {
            return Err(DexError::OutOfGas {
                limit: self.limit,
                consumed: total,
            });
        }
        Ok(())
    }

    pub(crate) fn charge_read(&self, key_len: usize, value_len: usize) -> DexResult<()> {
        let bytes = (key_len + value_len) as u64;
        self.consume(self.config.read_cost_flat + self.config.read_cost_per_byte * bytes)
    }

    pub(crate) fn charge_write(&self, key_len: usize, value_len: usize) -> DexResult<()> {
        let bytes = (key_len + value_len) as u64;
        self.consume(self.config.write_cost_flat + self.config.write_cost_per_byte * bytes)
    }

    pub(crate) fn charge_delete(&self) -> DexResult<()> {
        self.consume(self.config.delete_cost)
    }

    pub(crate) fn charge_iter(&self, key_len: usize, value_len: usize) -> DexResult<()> {
        let bytes = (key_len + value_len) as u64;
        self.consume(self.config.iter_next_cost_flat + self.config.read_cost_per_byte * bytes)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
