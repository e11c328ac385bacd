//! Execution context for one message or block hook.
//!
//! ## Branching
//!
//! A [`Context`] wraps a [`BranchableCache`] together with the block info,
//! the gas meter and the events emitted so far. [`Context::branch`] opens a
//! child context whose writes and events stay invisible to the parent until
//! they are applied:
//!
//! ```text
//! ctx.with_branch(|child| {
//!     ...            // Ok  -> writes and events land in ctx
//! })                 // Err -> child is dropped, nothing happened
//! ```
//!
//! Multihop route trials use [`Context::into_write_set`] to detach a
//! finished branch so a sibling branch can be tried before one is applied.
//!
//! ## Gas
//!
//! Every store access is charged on the shared [`GasMeter`]. A branch that
//! runs out of gas fails with `OutOfGas`; since branches are only applied on
//! success, the failed operation leaves no writes behind.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{DexError, DexResult};
use crate::store::{apply_writes, prefix_end, successor, BranchableCache, GasMeter, KvPair, KvStore, StoreWrites};
use crate::types::events::DexEvent;

/// Block the context executes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockInfo {
    pub height: u64,
    /// Unix seconds.
    pub time: u64,
}

impl BlockInfo {
    pub fn new(height: u64, time: u64) -> Self {
        BlockInfo { height, time }
    }
}

/// Detached result of a branch: its store writes and its events.
#[derive(Debug, Clone, Default)]
pub struct WriteSet {
    pub writes: StoreWrites,
    pub events: Vec<DexEvent>,
}

pub struct Context<'a> {
    store: BranchableCache<'a>,
    gas: &'a GasMeter,
    block: BlockInfo,
    events: Vec<DexEvent>,
}

impl<'a> Context<'a> {
    pub fn new(store: &'a mut dyn KvStore, gas: &'a GasMeter, block: BlockInfo) -> Self {
        Context {
            store: BranchableCache::new(store),
            gas,
            block,
            events: Vec::new(),
        }
    }

    pub fn block(&self) -> BlockInfo {
        self.block
    }

    pub fn gas(&self) -> &GasMeter {
        self.gas
    }

    // ========================================================================
    // Branching
    // ========================================================================

    /// Child context sharing the gas meter.
    pub fn branch(&mut self) -> Context<'_> {
        Context {
            store: self.store.branch(),
            gas: self.gas,
            block: self.block,
            events: Vec::new(),
        }
    }

    /// Detach writes and events, releasing the parent.
    pub fn into_write_set(self) -> WriteSet {
        WriteSet {
            writes: self.store.into_write_set(),
            events: self.events,
        }
    }

    /// Apply a detached branch on top of this context.
    pub fn apply(&mut self, write_set: WriteSet) {
        apply_writes(&mut self.store, write_set.writes);
        self.events.extend(write_set.events);
    }

    /// Run `f` in a branch that is applied only if it succeeds.
    pub fn with_branch<T, F>(&mut self, f: F) -> DexResult<T>
    where
        F: FnOnce(&mut Context<'_>) -> DexResult<T>,
    {
        let (result, write_set) = {
            let mut child = self.branch();
            match f(&mut child) {
                Ok(value) => (Ok(value), Some(child.into_write_set())),
                Err(err) => (Err(err), None),
            }
        };
        if let Some(write_set) = write_set {
            self.apply(write_set);
        }
        result
    }

    /// Run `f` in a branch that is always discarded.
    pub fn simulate<T, F>(&mut self, f: F) -> DexResult<T>
    where
        F: FnOnce(&mut Context<'_>) -> DexResult<T>,
    {
        let mut child = self.branch();
        f(&mut child)
    }

    /// Flush writes to the underlying store and hand back the events.
    pub fn commit(self) -> Vec<DexEvent> {
        self.store.commit();
        self.events
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn emit(&mut self, event: DexEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[DexEvent] {
        &self.events
    }

    // ========================================================================
    // Gas-metered store access
    // ========================================================================

    pub fn get(&self, key: &[u8]) -> DexResult<Option<Vec<u8>>> {
        let value = self.store.get(key);
        self.gas
            .charge_read(key.len(), value.as_ref().map_or(0, |v| v.len()))?;
        Ok(value)
    }

    pub fn has(&self, key: &[u8]) -> DexResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> DexResult<()> {
        self.gas.charge_write(key.len(), value.len())?;
        self.store.set(key, value);
        Ok(())
    }

    pub fn delete(&mut self, key: &[u8]) -> DexResult<()> {
        self.gas.charge_delete()?;
        self.store.delete(key);
        Ok(())
    }

    /// First entry in `[start, end)`.
    pub fn seek(&self, start: &[u8], end: Option<&[u8]>) -> DexResult<Option<KvPair>> {
        let hit = self.store.seek(start, end);
        match &hit {
            Some((key, value)) => self.gas.charge_iter(key.len(), value.len())?,
            None => self.gas.charge_iter(0, 0)?,
        }
        Ok(hit)
    }

    /// Every entry under `prefix`, in key order.
    pub fn scan_prefix(&self, prefix: &[u8]) -> DexResult<Vec<KvPair>> {
        let end = prefix_end(prefix);
        let mut out = Vec::new();
        let mut cursor = prefix.to_vec();
        while let Some((key, value)) = self.seek(&cursor, end.as_deref())? {
            cursor = successor(&key);
            out.push((key, value));
        }
        Ok(out)
    }

    // ========================================================================
    // JSON values
    // ========================================================================

    pub fn get_json<T: DeserializeOwned>(&self, key: &[u8]) -> DexResult<Option<T>> {
        match self.get(key)? {
            Some(bytes) => decode(key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize>(&mut self, key: Vec<u8>, value: &T) -> DexResult<()> {
        let bytes = serde_json::to_vec(value).map_err(|e| corrupt(&key, e))?;
        self.set(key, bytes)
    }

    /// Decoded values of every entry under `prefix`.
    pub fn scan_json<T: DeserializeOwned>(&self, prefix: &[u8]) -> DexResult<Vec<T>> {
        self.scan_prefix(prefix)?
            .into_iter()
            .map(|(key, value)| decode(&key, &value))
            .collect()
    }
}

/// Decode a stored value, reporting the key on failure.
pub(crate) fn decode<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> DexResult<T> {
    serde_json::from_slice(bytes).map_err(|e| corrupt(key, e))
}

fn corrupt(key: &[u8], err: serde_json::Error) -> DexError {
    DexError::CorruptState {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: err.to_string(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
