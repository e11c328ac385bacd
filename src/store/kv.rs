//! Ordered key-value store abstraction.
//!
//! The engine only needs point reads, writes, deletes and "first key at or
//! after" lookups within a range. Everything else (prefix scans, cursors) is
//! built on top of [`KvStore::seek`].

use std::collections::BTreeMap;
use std::ops::Bound;

use sha2::{Digest, Sha256};

/// Key/value pair returned by range lookups.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Ordered byte-keyed store.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);

    fn delete(&mut self, key: &[u8]);

    /// First entry with `start <= key` and `key < end` (`None` = unbounded).
    fn seek(&self, start: &[u8], end: Option<&[u8]>) -> Option<KvPair>;

    /// Every entry in `[start, end)`, in key order.
    fn scan(&self, start: &[u8], end: Option<&[u8]>) -> Vec<KvPair> {
        let mut out = Vec::new();
        let mut cursor = start.to_vec();
        while let Some((key, value)) = self.seek(&cursor, end) {
            cursor = successor(&key);
            out.push((key, value));
        }
        out
    }
}

/// Smallest key strictly greater than `key`.
pub fn successor(key: &[u8]) -> Vec<u8> {
    let mut next = Vec::with_capacity(key.len() + 1);
    next.extend_from_slice(key);
    next.push(0);
    next
}

/// Exclusive upper bound of all keys starting with `prefix`.
///
/// Returns `None` when the prefix is all `0xFF` (no finite bound).
///
/// # Example
///
/// ```
/// use dark_dex::store::prefix_end;
///
/// assert_eq!(prefix_end(b"ab/"), Some(b"ab0".to_vec()));
/// assert_eq!(prefix_end(&[0x01, 0xFF]), Some(vec![0x02]));
/// assert_eq!(prefix_end(&[0xFF]), None);
/// ```
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xFF {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

// ============================================================================
// MemStore
// ============================================================================

/// In-memory committed store backed by a `BTreeMap`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Vec<u8>)> {
        self.entries.iter()
    }

    /// SHA-256 commitment over every entry in key order.
    ///
    /// Each key and value is length-prefixed (u32 big endian) so that
    /// different splits of the same bytes hash differently.
    pub fn state_root(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for (key, value) in &self.entries {
            hasher.update((key.len() as u32).to_be_bytes());
            hasher.update(key);
            hasher.update((value.len() as u32).to_be_bytes());
            hasher.update(value);
        }
        hasher.finalize().into()
    }

    /// Hex rendering of [`MemStore::state_root`].
    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root())
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.insert(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }

    fn seek(&self, start: &[u8], end: Option<&[u8]>) -> Option<KvPair> {
        let upper = match end {
            Some(e) => Bound::Excluded(e),
            None => Bound::Unbounded,
        };
        self.entries
            .range::<[u8], _>((Bound::Included(start), upper))
            .next()
            .map(|(k, v)| (k.clone(), v.clone()))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
