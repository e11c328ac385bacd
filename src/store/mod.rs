//! State storage for the exchange engine.
//!
//! - [`KvStore`]: ordered byte-keyed store interface
//! - [`MemStore`]: committed in-memory store with a SHA-256 state root
//! - [`BranchableCache`]: nested copy-on-write overlays for trial execution
//! - [`GasMeter`]: store access metering

pub mod cache;
pub mod gas;
pub mod kv;

pub use cache::{apply_writes, BranchableCache, StoreWrites};
pub use gas::{GasConfig, GasMeter};
pub use kv::{prefix_end, successor, KvPair, KvStore, MemStore};
