//! Block receipt summarizing executed messages.
//!
//! The BlockReceipt records what happened in one block and commits to the
//! resulting store with a state root.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Receipt for one block of messages.
///
/// ## State Root
///
/// The 32-byte state root is the SHA-256 commitment over every store entry
/// after the block (see [`crate::store::MemStore::state_root`]). Two nodes
/// that executed the same messages produce the same root.
///
/// ## Example
///
/// ```
/// use dark_dex::types::BlockReceipt;
///
/// let receipt = BlockReceipt::new(
///     7,             // height
///     1_700_000_000, // block time
///     3,             // messages ok
///     1,             // messages failed
///     12,            // events
///     [0u8; 32],     // state root
/// );
/// assert_eq!(receipt.success_rate(), Some(0.75));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockReceipt {
    /// Block height
    pub height: u64,

    /// Block time in unix seconds
    pub time: u64,

    /// Messages that executed and committed
    pub msgs_ok: u64,

    /// Messages rejected or rolled back
    pub msgs_failed: u64,

    /// Events emitted by committed messages and block hooks
    pub events_emitted: u64,

    /// State root after the block
    pub state_root: [u8; 32],
}

impl BlockReceipt {
    /// Create a new block receipt
    ///
    /// # Arguments
    ///
    /// * `height` - Block height
    /// * `time` - Block time in unix seconds
    /// * `msgs_ok` - Count of committed messages
    /// * `msgs_failed` - Count of failed messages
    /// * `events_emitted` - Count of emitted events
    /// * `state_root` - 32-byte commitment to the store
    pub fn new(
        height: u64,
        time: u64,
        msgs_ok: u64,
        msgs_failed: u64,
        events_emitted: u64,
        state_root: [u8; 32],
    ) -> Self {
        Self {
            height,
            time,
            msgs_ok,
            msgs_failed,
            events_emitted,
            state_root,
        }
    }

    /// Compute SHA-256 hash of the given data
    pub fn compute_hash(data: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hasher.finalize().into()
    }

    /// Get the state root as a hex string
    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root)
    }

    /// True when the block carried no messages.
    pub fn is_empty(&self) -> bool {
        self.msgs_ok + self.msgs_failed == 0
    }

    /// Share of messages that committed.
    ///
    /// Returns None if no messages were executed.
    pub fn success_rate(&self) -> Option<f64> {
        let total = self.msgs_ok + self.msgs_failed;
        if total == 0 {
            None
        } else {
            Some(self.msgs_ok as f64 / total as f64)
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_new() {
        let root = [1u8; 32];
        let receipt = BlockReceipt::new(5, 1_700_000_000, 10, 2, 30, root);
        assert_eq!(receipt.height, 5);
        assert_eq!(receipt.msgs_ok, 10);
        assert_eq!(receipt.msgs_failed, 2);
        assert_eq!(receipt.state_root, root);
    }

    #[test]
    fn test_receipt_hash_determinism() {
        let hash1 = BlockReceipt::compute_hash(b"state");
        let hash2 = BlockReceipt::compute_hash(b"state");
        assert_eq!(hash1, hash2);
        assert_ne!(hash1, BlockReceipt::compute_hash(b"other state"));
    }

    #[test]
    fn test_receipt_state_root_hex() {
        let receipt = BlockReceipt::new(1, 0, 0, 0, 0, [0xAB; 32]);
        let hex = receipt.state_root_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with("abab"));
    }

    #[test]
    fn test_receipt_is_empty_and_rate() {
        let empty = BlockReceipt::default();
        assert!(empty.is_empty());
        assert_eq!(empty.success_rate(), None);

        let receipt = BlockReceipt::new(1, 0, 1, 1, 0, [0u8; 32]);
        assert!(!receipt.is_empty());
        assert_eq!(receipt.success_rate(), Some(0.5));
    }

    #[test]
    fn test_receipt_json_roundtrip() {
        let receipt = BlockReceipt::new(9, 100, 4, 0, 8, [7u8; 32]);
        let json = serde_json::to_string(&receipt).unwrap();
        assert_eq!(serde_json::from_str::<BlockReceipt>(&json).unwrap(), receipt);
    }
}
