//! Core data types for the exchange.
//!
//! ## Types
//!
//! - [`PrecDec`]: 30-digit fixed-point decimal used for every price
//! - [`PairID`] / [`TradePairID`]: canonical and directional token pairs
//! - [`Pool`] / [`PoolReserves`]: AMM liquidity
//! - [`LimitOrderTranche`] / [`LimitOrderTrancheUser`]: order book liquidity
//! - [`TickLiquidity`]: what a swap walks over
//! - Messages, responses, events, params and the [`BlockReceipt`]
//!
//! ## Fixed-Point Arithmetic
//!
//! Token amounts are `u128` integers. Prices are [`PrecDec`] values with 30
//! fractional digits; every conversion back to an amount rounds explicitly.

pub mod coin;
pub mod events;
pub mod keys;
pub mod liquidity;
pub mod messages;
pub mod metadata;
pub mod order_type;
pub mod pair;
pub mod params;
pub mod pool;
pub mod pool_reserves;
pub mod prec_dec;
pub mod price;
pub mod receipt;
pub mod tranche;
pub mod tranche_user;

pub use coin::Coin;
pub use events::DexEvent;
pub use liquidity::TickLiquidity;
pub use messages::{
    DepositOptions, DexMsg, DexResponse, FailedDeposit, MsgCancelLimitOrder,
    MsgCancelLimitOrderResponse, MsgDeposit, MsgDepositResponse, MsgMultiHopSwap,
    MsgMultiHopSwapResponse, MsgPlaceLimitOrder, MsgPlaceLimitOrderResponse,
    MsgWithdrawFilledLimitOrder, MsgWithdrawFilledLimitOrderResponse, MsgWithdrawal,
    MsgWithdrawalResponse, MsgWithdrawalWithShares, MultiHopRoute,
};
pub use metadata::{LimitOrderExpiration, PoolMetadata};
pub use order_type::LimitOrderType;
pub use pair::{PairID, TradePairID};
pub use params::Params;
pub use pool::{Pool, PoolDeposit};
pub use pool_reserves::{PoolReserves, PoolReservesKey};
pub use prec_dec::PrecDec;
pub use price::{calc_price, calc_tick_index_from_price, MAX_TICK};
pub use receipt::BlockReceipt;
pub use tranche::{LimitOrderTranche, LimitOrderTrancheKey};
pub use tranche_user::LimitOrderTrancheUser;
