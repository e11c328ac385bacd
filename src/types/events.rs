//! Domain events emitted by message handlers and block hooks.
//!
//! Events are buffered on the execution context and only survive if the
//! branch that produced them is committed. [`DexEvent::action`] gives the
//! stable action name used in logs and receipts.

use serde::{Deserialize, Serialize};

use crate::types::coin::Coin;
use crate::types::order_type::LimitOrderType;
use crate::types::pair::TradePairID;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DexEvent {
    Deposit {
        creator: String,
        receiver: String,
        token0: String,
        token1: String,
        tick_index: i64,
        fee: u64,
        reserves0_deposited: u128,
        reserves1_deposited: u128,
        shares_minted: u128,
    },
    Withdraw {
        creator: String,
        receiver: String,
        token0: String,
        token1: String,
        tick_index: i64,
        fee: u64,
        reserves0_withdrawn: u128,
        reserves1_withdrawn: u128,
        shares_removed: u128,
    },
    PlaceLimitOrder {
        creator: String,
        receiver: String,
        token_in: String,
        token_out: String,
        amount_in: u128,
        limit_tick: i64,
        order_type: LimitOrderType,
        shares: u128,
        tranche_key: String,
        swap_amount_in: u128,
        swap_amount_out: u128,
    },
    WithdrawFilledLimitOrder {
        creator: String,
        maker_denom: String,
        taker_denom: String,
        tick_index: i64,
        tranche_key: String,
        taker_amount_out: u128,
        maker_amount_out: u128,
    },
    CancelLimitOrder {
        creator: String,
        maker_denom: String,
        taker_denom: String,
        tick_index: i64,
        tranche_key: String,
        maker_amount_out: u128,
        taker_amount_out: u128,
    },
    MultihopSwap {
        creator: String,
        receiver: String,
        token_in: String,
        token_out: String,
        amount_in: u128,
        amount_out: u128,
        route: Vec<String>,
        dust: Vec<Coin>,
    },
    /// Maker reserves at a liquidity key changed.
    TickUpdate {
        trade_pair_id: TradePairID,
        tick_index: i64,
        /// Pool fee, for pool reserves.
        fee: Option<u64>,
        /// Tranche key, for limit order tranches.
        tranche_key: Option<String>,
        reserves: u128,
    },
    /// The GoodTilTime purge stopped before clearing every expired order.
    GoodTilPurgeHitLimit { gas_used: u64 },
}

impl DexEvent {
    pub fn action(&self) -> &'static str {
        match self {
            DexEvent::Deposit { .. } => "DepositLP",
            DexEvent::Withdraw { .. } => "WithdrawLP",
            DexEvent::PlaceLimitOrder { .. } => "PlaceLimitOrder",
            DexEvent::WithdrawFilledLimitOrder { .. } => "WithdrawLimitOrder",
            DexEvent::CancelLimitOrder { .. } => "CancelLimitOrder",
            DexEvent::MultihopSwap { .. } => "MultihopSwap",
            DexEvent::TickUpdate { .. } => "TickUpdate",
            DexEvent::GoodTilPurgeHitLimit { .. } => "GoodTilPurgeHitGasLimit",
        }
    }
}
