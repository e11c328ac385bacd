//! Exchange engine: state transitions over the store.
//!
//! ## Layers
//!
//! - [`Context`]: branchable, gas-metered view of the store plus events
//! - [`Keeper`]: typed state access and the deposit, withdraw, limit order,
//!   swap and multihop logic
//! - [`MsgServer`]: message checks and dispatch in a committed-on-success branch
//! - [`DexApp`]: block executor producing [`crate::types::BlockReceipt`]s
//!
//! ## Design Principles
//!
//! 1. **Determinism**: same store and messages give the same state root
//! 2. **Fixed-Point Math**: every price is a [`crate::types::PrecDec`]
//! 3. **Synchronous Execution**: one message at a time, no async
//! 4. **Best Price First**: swaps walk tick liquidity in key order
//!
//! ## Example
//!
//! ```
//! use dark_dex::engine::{BlockInfo, Context, Keeper, StoreBank, BankKeeper};
//! use dark_dex::store::{GasMeter, MemStore};
//! use dark_dex::types::{Coin, DepositOptions, MsgDeposit};
//!
//! let mut store = MemStore::new();
//! let gas = GasMeter::infinite();
//! let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(1, 0));
//! let keeper: Keeper = Keeper::default();
//! StoreBank.mint(&mut ctx, "alice", &Coin::new("TokenA", 100)).unwrap();
//!
//! let msg = MsgDeposit {
//!     creator: "alice".to_string(),
//!     receiver: "alice".to_string(),
//!     token_a: "TokenA".to_string(),
//!     token_b: "TokenB".to_string(),
//!     amounts_a: vec![100],
//!     amounts_b: vec![0],
//!     tick_indexes_a_to_b: vec![0],
//!     fees: vec![1],
//!     options: vec![DepositOptions::default()],
//! };
//! let resp = keeper.deposit(&mut ctx, &msg).unwrap();
//! assert_eq!(resp.reserve0_deposited, vec![100]);
//! ```

pub mod app;
pub mod bank;
pub mod context;
pub mod deposit;
pub mod expiration;
pub mod keeper;
pub mod limit_order;
pub mod msg_server;
pub mod multihop;
pub mod query;
pub mod swap;
pub mod withdraw;

pub use app::{DexApp, DEFAULT_MSG_GAS_LIMIT};
pub use bank::{BankKeeper, StoreBank, MODULE_ACCOUNT};
pub use context::{BlockInfo, Context, WriteSet};
pub use expiration::PurgeSummary;
pub use keeper::Keeper;
pub use msg_server::MsgServer;
pub use multihop::RouteOutcome;
pub use query::DepositRecord;
pub use swap::{best_liquidity, best_price, best_tick, swap, SwapResult};
