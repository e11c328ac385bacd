//! Copy-on-write overlay with nested branching.
//!
//! ## Model
//!
//! A [`BranchableCache`] sits on top of any [`KvStore`] (including another
//! cache). Reads fall through to the parent unless the key was written or
//! deleted locally; writes never touch the parent until [`commit`] is called.
//! Dropping a cache discards its writes.
//!
//! ```text
//! MemStore  <-  cache (message)  <-  cache (route 1 trial)
//!                                <-  cache (route 2 trial)
//! ```
//!
//! Sibling trials cannot both hold `&mut` to the same parent, so a finished
//! trial is turned into a detached [`StoreWrites`] with [`into_write_set`]
//! and replayed later with [`apply`].
//!
//! [`commit`]: BranchableCache::commit
//! [`into_write_set`]: BranchableCache::into_write_set
//! [`apply`]: apply_writes

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::store::kv::{successor, KvPair, KvStore};

/// Pending writes of a branch; `None` marks a deletion.
pub type StoreWrites = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// Replay detached writes onto a store.
pub fn apply_writes(target: &mut dyn KvStore, writes: StoreWrites) {
    for (key, value) in writes {
        match value {
            Some(v) => target.set(key, v),
            None => target.delete(&key),
        }
    }
}

/// Overlay over a parent store.
pub struct BranchableCache<'a> {
    parent: &'a mut dyn KvStore,
    writes: StoreWrites,
}

impl<'a> BranchableCache<'a> {
    pub fn new(parent: &'a mut dyn KvStore) -> Self {
        BranchableCache {
            parent,
            writes: BTreeMap::new(),
        }
    }

    /// Child overlay whose writes stay invisible here until committed.
    pub fn branch(&mut self) -> BranchableCache<'_> {
        BranchableCache::new(self)
    }

    /// Write every pending change through to the parent.
    pub fn commit(self) {
        apply_writes(self.parent, self.writes);
    }

    /// Detach the pending changes, releasing the parent borrow.
    pub fn into_write_set(self) -> StoreWrites {
        self.writes
    }

    /// Number of pending writes and deletes.
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    fn local_seek(&self, start: &[u8], end: Option<&[u8]>) -> Option<(&Vec<u8>, &Option<Vec<u8>>)> {
        let upper = match end {
            Some(e) => Bound::Excluded(e),
            None => Bound::Unbounded,
        };
        self.writes
            .range::<[u8], _>((Bound::Included(start), upper))
            .next()
    }
}

impl<'a> KvStore for BranchableCache<'a> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.writes.get(key) {
            Some(local) => local.clone(),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.writes.insert(key.to_vec(), None);
    }

    fn seek(&self, start: &[u8], end: Option<&[u8]>) -> Option<KvPair> {
        let mut cursor = start.to_vec();
        loop {
            let parent_hit = self.parent.seek(&cursor, end);
            let local_hit = self.local_seek(&cursor, end);

            match (parent_hit, local_hit) {
                (None, None) => return None,
                (Some(p), None) => return Some(p),
                (parent_hit, Some((local_key, local_value))) => {
                    // Local entries shadow the parent at equal keys.
                    if let Some(p) = parent_hit {
                        if p.0 < *local_key {
                            return Some(p);
                        }
                    }
                    match local_value {
                        Some(v) => return Some((local_key.clone(), v.clone())),
                        None => cursor = successor(local_key),
                    }
                }
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
