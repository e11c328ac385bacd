//! Transaction messages and their responses.
//!
//! ## Validation
//!
//! Every message has a `validate_basic()` that checks structure only:
//! addresses, denoms, array parity, non-zero amounts, tick and fee ranges and
//! route shape. It never reads state, so a message that fails it is rejected
//! before anything is touched.
//!
//! ## Ticks
//!
//! Deposits and withdrawals take ticks expressed from token A to token B.
//! [`MsgDeposit::normalized`] / [`MsgWithdrawal::normalized`] sort the legs
//! into `(token0, token1)` order and flip ticks to the pair's normalized
//! (token1 maker) direction.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DexError, DexResult};
use crate::types::coin::Coin;
use crate::types::order_type::LimitOrderType;
use crate::types::pair::{validate_denom, PairID};
use crate::types::pool::parse_pool_id_from_denom;
use crate::types::prec_dec::PrecDec;
use crate::types::price::{
    calc_tick_index_from_price, is_price_out_of_range, is_tick_out_of_range, validate_tick_fee,
};

static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9]{1,64}$").unwrap_or_else(|e| panic!("address regex: {}", e))
});

/// Accounts are plain alphanumeric identifiers.
pub fn validate_address(address: &str) -> DexResult<()> {
    if ADDRESS_RE.is_match(address) {
        Ok(())
    } else {
        Err(DexError::InvalidAddress(address.to_string()))
    }
}

fn validate_parties(creator: &str, receiver: &str) -> DexResult<()> {
    validate_address(creator)?;
    validate_address(receiver)
}

/// A-to-B ticks quote token B as maker; normalized ticks quote token1.
fn normalize_tick(token_a: &str, token0: &str, tick_a_to_b: i64) -> i64 {
    if token_a == token0 {
        tick_a_to_b
    } else {
        -tick_a_to_b
    }
}

// ============================================================================
// Deposit
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DepositOptions {
    pub disable_autoswap: bool,
    /// Fail the whole message instead of skipping a deposit behind enemy lines.
    pub fail_tx_on_bel: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDeposit {
    pub creator: String,
    pub receiver: String,
    pub token_a: String,
    pub token_b: String,
    pub amounts_a: Vec<u128>,
    pub amounts_b: Vec<u128>,
    pub tick_indexes_a_to_b: Vec<i64>,
    pub fees: Vec<u64>,
    pub options: Vec<DepositOptions>,
}

/// One leg of a deposit after sorting into pair order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedDeposit {
    pub amount0: u128,
    pub amount1: u128,
    pub tick_index: i64,
    pub fee: u64,
    pub options: DepositOptions,
}

impl MsgDeposit {
    pub fn validate_basic(&self) -> DexResult<()> {
        validate_parties(&self.creator, &self.receiver)?;
        validate_denom(&self.token_a)?;
        validate_denom(&self.token_b)?;
        PairID::new(&self.token_a, &self.token_b)?;

        let n = self.amounts_a.len();
        if n != self.amounts_b.len()
            || n != self.tick_indexes_a_to_b.len()
            || n != self.fees.len()
            || (!self.options.is_empty() && n != self.options.len())
        {
            return Err(DexError::UnbalancedTxArray);
        }
        if n == 0 {
            return Err(DexError::ZeroDeposit);
        }

        let mut seen = BTreeSet::new();
        for i in 0..n {
            if !seen.insert((self.tick_indexes_a_to_b[i], self.fees[i])) {
                return Err(DexError::DuplicatePoolDeposit);
            }
            if self.amounts_a[i] == 0 && self.amounts_b[i] == 0 {
                return Err(DexError::ZeroDeposit);
            }
            validate_tick_fee(self.tick_indexes_a_to_b[i], self.fees[i])?;
        }
        Ok(())
    }

    pub fn pair_id(&self) -> DexResult<PairID> {
        PairID::new(&self.token_a, &self.token_b)
    }

    /// Legs in `(token0, token1)` order with normalized ticks.
    pub fn normalized(&self) -> DexResult<Vec<NormalizedDeposit>> {
        let pair = self.pair_id()?;
        let a_is_0 = self.token_a == pair.token0;
        Ok((0..self.amounts_a.len())
            .map(|i| {
                let (amount0, amount1) = if a_is_0 {
                    (self.amounts_a[i], self.amounts_b[i])
                } else {
                    (self.amounts_b[i], self.amounts_a[i])
                };
                NormalizedDeposit {
                    amount0,
                    amount1,
                    tick_index: normalize_tick(&self.token_a, &pair.token0, self.tick_indexes_a_to_b[i]),
                    fee: self.fees[i],
                    options: self.options.get(i).copied().unwrap_or_default(),
                }
            })
            .collect())
    }
}

/// A deposit leg that was skipped instead of failing the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDeposit {
    pub deposit_idx: usize,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MsgDepositResponse {
    pub reserve0_deposited: Vec<u128>,
    pub reserve1_deposited: Vec<u128>,
    pub shares_issued: Vec<Coin>,
    pub failed_deposits: Vec<FailedDeposit>,
}

// ============================================================================
// Withdrawal
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgWithdrawal {
    pub creator: String,
    pub receiver: String,
    pub token_a: String,
    pub token_b: String,
    pub shares_to_remove: Vec<u128>,
    pub tick_indexes_a_to_b: Vec<i64>,
    pub fees: Vec<u64>,
}

impl MsgWithdrawal {
    pub fn validate_basic(&self) -> DexResult<()> {
        validate_parties(&self.creator, &self.receiver)?;
        validate_denom(&self.token_a)?;
        validate_denom(&self.token_b)?;
        PairID::new(&self.token_a, &self.token_b)?;

        let n = self.shares_to_remove.len();
        if n != self.tick_indexes_a_to_b.len() || n != self.fees.len() {
            return Err(DexError::UnbalancedTxArray);
        }
        if n == 0 {
            return Err(DexError::ZeroWithdraw);
        }
        let mut seen = BTreeSet::new();
        for i in 0..n {
            if self.shares_to_remove[i] == 0 {
                return Err(DexError::ZeroWithdraw);
            }
            validate_tick_fee(self.tick_indexes_a_to_b[i], self.fees[i])?;
            if !seen.insert((self.tick_indexes_a_to_b[i], self.fees[i])) {
                return Err(DexError::DuplicatePoolWithdraw(format!(
                    "tick {} fee {}",
                    self.tick_indexes_a_to_b[i], self.fees[i]
                )));
            }
        }
        Ok(())
    }

    pub fn pair_id(&self) -> DexResult<PairID> {
        PairID::new(&self.token_a, &self.token_b)
    }

    /// `(shares, normalized tick, fee)` per leg.
    pub fn normalized(&self) -> DexResult<Vec<(u128, i64, u64)>> {
        let pair = self.pair_id()?;
        Ok((0..self.shares_to_remove.len())
            .map(|i| {
                (
                    self.shares_to_remove[i],
                    normalize_tick(&self.token_a, &pair.token0, self.tick_indexes_a_to_b[i]),
                    self.fees[i],
                )
            })
            .collect())
    }
}

/// Withdraw by pool share denom rather than by `(pair, tick, fee)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgWithdrawalWithShares {
    pub creator: String,
    pub receiver: String,
    pub shares_to_remove: Vec<Coin>,
}

impl MsgWithdrawalWithShares {
    pub fn validate_basic(&self) -> DexResult<()> {
        validate_parties(&self.creator, &self.receiver)?;
        if self.shares_to_remove.is_empty() {
            return Err(DexError::ZeroWithdraw);
        }
        let mut seen = BTreeSet::new();
        for share in &self.shares_to_remove {
            if share.amount == 0 {
                return Err(DexError::ZeroWithdraw);
            }
            parse_pool_id_from_denom(&share.denom)?;
            if !seen.insert(share.denom.as_str()) {
                return Err(DexError::DuplicatePoolWithdraw(share.denom.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MsgWithdrawalResponse {
    pub reserve0_withdrawn: u128,
    pub reserve1_withdrawn: u128,
    /// Withdrawn tokens for share-denom withdrawals, which may span pairs.
    pub coins_withdrawn: Vec<Coin>,
    pub shares_burned: Vec<Coin>,
}

// ============================================================================
// Limit orders
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgPlaceLimitOrder {
    pub creator: String,
    pub receiver: String,
    pub token_in: String,
    pub token_out: String,
    /// Limit tick from `token_in` to `token_out`.
    pub tick_index_in_to_out: Option<i64>,
    /// Minimum `token_out` per `token_in`; alternative to the tick.
    pub limit_sell_price: Option<PrecDec>,
    pub amount_in: u128,
    pub order_type: LimitOrderType,
    /// Unix seconds, GoodTilTime only.
    pub expiration_time: Option<u64>,
    /// Taker-only orders may cap their output.
    pub max_amount_out: Option<u128>,
    /// Minimum realized `out / in` of the taker leg.
    pub min_average_sell_price: Option<PrecDec>,
}

impl MsgPlaceLimitOrder {
    pub fn validate_basic(&self) -> DexResult<()> {
        validate_parties(&self.creator, &self.receiver)?;
        validate_denom(&self.token_in)?;
        validate_denom(&self.token_out)?;
        PairID::new(&self.token_in, &self.token_out)?;

        if self.amount_in == 0 {
            return Err(DexError::ZeroLimitOrder);
        }
        if self.order_type.is_good_til() && self.expiration_time.is_none() {
            return Err(DexError::GoodTilOrderWithoutExpiration);
        }
        if !self.order_type.is_good_til() && self.expiration_time.is_some() {
            return Err(DexError::ExpirationOnWrongOrderType);
        }
        if let Some(max_out) = self.max_amount_out {
            if max_out == 0 {
                return Err(DexError::ZeroMaxAmountOut);
            }
            if !self.order_type.is_taker_only() {
                return Err(DexError::InvalidMaxAmountOutForMaker);
            }
        }
        match (self.tick_index_in_to_out, self.limit_sell_price) {
            (Some(_), Some(_)) | (None, None) => return Err(DexError::InvalidPriceAndTick),
            (Some(tick), None) if is_tick_out_of_range(tick) => {
                return Err(DexError::TickOutsideRange(tick))
            }
            (None, Some(price)) if is_price_out_of_range(price) => {
                return Err(DexError::PriceOutsideRange(price.to_string()))
            }
            _ => {}
        }
        Ok(())
    }

    /// GoodTilTime orders must expire after the current block.
    pub fn validate_good_til_expiration(&self, block_time: u64) -> DexResult<()> {
        match self.expiration_time {
            Some(expiration) if self.order_type.is_good_til() && expiration <= block_time => {
                Err(DexError::ExpirationTimeInPast {
                    block_time,
                    expiration,
                })
            }
            _ => Ok(()),
        }
    }

    /// Limit tick, resolving a sell price to its nearest tick.
    pub fn resolved_tick_index(&self) -> DexResult<i64> {
        match (self.tick_index_in_to_out, self.limit_sell_price) {
            (Some(tick), None) => Ok(tick),
            (None, Some(price)) => calc_tick_index_from_price(price),
            _ => Err(DexError::InvalidPriceAndTick),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgPlaceLimitOrderResponse {
    pub tranche_key: String,
    /// Total `token_in` taken from the creator.
    pub coin_in: Coin,
    pub taker_coin_in: Coin,
    pub taker_coin_out: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCancelLimitOrder {
    pub creator: String,
    pub tranche_key: String,
}

impl MsgCancelLimitOrder {
    pub fn validate_basic(&self) -> DexResult<()> {
        validate_address(&self.creator)?;
        if self.tranche_key.is_empty() {
            return Err(DexError::ActiveLimitOrderNotFound(self.tranche_key.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCancelLimitOrderResponse {
    pub maker_coin_out: Coin,
    pub taker_coin_out: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgWithdrawFilledLimitOrder {
    pub creator: String,
    pub tranche_key: String,
}

impl MsgWithdrawFilledLimitOrder {
    pub fn validate_basic(&self) -> DexResult<()> {
        validate_address(&self.creator)?;
        if self.tranche_key.is_empty() {
            return Err(DexError::ValidLimitOrderTrancheNotFound(self.tranche_key.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgWithdrawFilledLimitOrderResponse {
    pub taker_coin_out: Coin,
    pub maker_coin_out: Coin,
}

// ============================================================================
// Multihop
// ============================================================================

/// Denoms visited in order, entry token first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MultiHopRoute {
    pub hops: Vec<String>,
}

impl MultiHopRoute {
    pub fn new<S: AsRef<str>>(hops: &[S]) -> Self {
        MultiHopRoute {
            hops: hops.iter().map(|h| h.as_ref().to_string()).collect(),
        }
    }

    /// At least two hops, valid denoms and no repeated token.
    pub fn validate(&self) -> DexResult<()> {
        if self.hops.len() < 2 {
            return Err(DexError::RouteWithoutExitToken);
        }
        let mut seen = BTreeSet::new();
        for hop in &self.hops {
            validate_denom(hop)?;
            if !seen.insert(hop.as_str()) {
                return Err(DexError::CycleInHops);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMultiHopSwap {
    pub creator: String,
    pub receiver: String,
    pub routes: Vec<MultiHopRoute>,
    pub amount_in: u128,
    /// Minimum exit tokens per entry token across the whole route.
    pub exit_limit_price: PrecDec,
    pub pick_best_route: bool,
}

impl MsgMultiHopSwap {
    pub fn validate_basic(&self) -> DexResult<()> {
        validate_parties(&self.creator, &self.receiver)?;
        let first = self.routes.first().ok_or(DexError::MissingMultihopRoute)?;
        for route in &self.routes {
            route.validate()?;
        }
        // validated routes have at least two hops
        let entry = &first.hops[0];
        let exit = &first.hops[first.hops.len() - 1];
        for route in &self.routes[1..] {
            if &route.hops[0] != entry {
                return Err(DexError::MultihopEntryTokensMismatch);
            }
            if &route.hops[route.hops.len() - 1] != exit {
                return Err(DexError::MultihopExitTokensMismatch);
            }
        }
        if self.amount_in == 0 {
            return Err(DexError::ZeroSwap);
        }
        if !self.exit_limit_price.is_positive() {
            return Err(DexError::ZeroExitPrice);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMultiHopSwapResponse {
    pub coin_out: Coin,
    pub route: MultiHopRoute,
    pub dust: Vec<Coin>,
}

// ============================================================================
// Envelope
// ============================================================================

/// Any message the engine accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DexMsg {
    Deposit(MsgDeposit),
    Withdrawal(MsgWithdrawal),
    WithdrawalWithShares(MsgWithdrawalWithShares),
    PlaceLimitOrder(MsgPlaceLimitOrder),
    CancelLimitOrder(MsgCancelLimitOrder),
    WithdrawFilledLimitOrder(MsgWithdrawFilledLimitOrder),
    MultiHopSwap(MsgMultiHopSwap),
}

impl DexMsg {
    pub fn name(&self) -> &'static str {
        match self {
            DexMsg::Deposit(_) => "Deposit",
            DexMsg::Withdrawal(_) => "Withdrawal",
            DexMsg::WithdrawalWithShares(_) => "WithdrawalWithShares",
            DexMsg::PlaceLimitOrder(_) => "PlaceLimitOrder",
            DexMsg::CancelLimitOrder(_) => "CancelLimitOrder",
            DexMsg::WithdrawFilledLimitOrder(_) => "WithdrawFilledLimitOrder",
            DexMsg::MultiHopSwap(_) => "MultiHopSwap",
        }
    }

    pub fn validate_basic(&self) -> DexResult<()> {
        match self {
            DexMsg::Deposit(m) => m.validate_basic(),
            DexMsg::Withdrawal(m) => m.validate_basic(),
            DexMsg::WithdrawalWithShares(m) => m.validate_basic(),
            DexMsg::PlaceLimitOrder(m) => m.validate_basic(),
            DexMsg::CancelLimitOrder(m) => m.validate_basic(),
            DexMsg::WithdrawFilledLimitOrder(m) => m.validate_basic(),
            DexMsg::MultiHopSwap(m) => m.validate_basic(),
        }
    }
}

/// Response matching a [`DexMsg`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DexResponse {
    Deposit(MsgDepositResponse),
    Withdrawal(MsgWithdrawalResponse),
    PlaceLimitOrder(MsgPlaceLimitOrderResponse),
    CancelLimitOrder(MsgCancelLimitOrderResponse),
    WithdrawFilledLimitOrder(MsgWithdrawFilledLimitOrderResponse),
    MultiHopSwap(MsgMultiHopSwapResponse),
}

// ============================================================================
// Unit Tests
// ============================================================================
