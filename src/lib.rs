//! # Dark DEX
//!
//! Deterministic exchange engine combining concentrated AMM pools with a
//! tick-indexed limit order book.
//!
//! ## Architecture
//!
//! - **Types**: prices, pairs, pools, tranches, messages and events
//! - **Store**: ordered key-value store, branchable cache, gas metering
//! - **Engine**: keeper logic, message server and block executor
//!
//! ## Design Principles
//!
//! 1. **Determinism**: identical inputs produce identical state roots
//! 2. **No Floating Point**: prices use 30-digit fixed point, amounts are integers
//! 3. **Transactional Branches**: failed messages and losing routes leave no writes
//! 4. **Synchronous Execution**: no async in the state transition
//!
//! ## Liquidity Model
//!
//! Both AMM pool sides and limit order tranches live in one tick-sorted index
//! per trade pair, so a swap simply walks that index from the best price.

// ============================================================================
// Module declarations
// ============================================================================

/// Error taxonomy shared by every operation
pub mod error;

/// Core data types: prices, pools, tranches, messages
pub mod types;

/// Ordered KV store, branching cache and gas
pub mod store;

/// Keeper, message server and block executor
pub mod engine;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use engine::{BlockInfo, Context, DexApp, Keeper, MsgServer};
pub use error::{DexError, DexResult};
pub use types::{
    BlockReceipt, Coin, DexEvent, DexMsg, DexResponse, LimitOrderType, PairID, Params, PrecDec, TradePairID,
};
