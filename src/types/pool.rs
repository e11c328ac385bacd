//! Two-sided AMM pool.
//!
//! ## Geometry
//!
//! A pool is identified by `(pair, center tick, fee)` and owns two
//! [`PoolReserves`]: `lower_tick0` holds token0 and `upper_tick1` holds
//! token1. See [`crate::types::pool_reserves`] for the tick layout.
//!
//! ## Shares
//!
//! Value is measured in token0 at the center price:
//!
//! ```text
//! value = amount0 + amount1 * price1To0Center
//! ```
//!
//! A deposit mints `value * existingShares / existingValue` shares, rounded
//! down. The first deposit into an empty pool mints `value` shares directly.
//!
//! ## Autoswap
//!
//! With autoswap enabled a deposit that does not match the pool ratio is
//! accepted in full. The excess that would notionally have to be swapped to
//! match the ratio is charged the pool fee, and shares are minted on the
//! remaining value.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DexError, DexResult};
use crate::types::pair::{PairID, TradePairID};
use crate::types::pool_reserves::{PoolReserves, PoolReservesKey};
use crate::types::prec_dec::{mul_div_floor, PrecDec};
use crate::types::price::calc_price;

/// Prefix of pool share denoms.
pub const POOL_DENOM_PREFIX: &str = "neutron/pool/";

static POOL_DENOM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^neutron/pool/(\d+)$").unwrap_or_else(|e| panic!("pool denom regex: {}", e))
});

/// Share denom for a pool id.
pub fn pool_denom(id: u64) -> String {
    format!("{}{}", POOL_DENOM_PREFIX, id)
}

/// Pool id encoded in a share denom.
///
/// # Example
///
/// ```
/// use dark_dex::types::pool::parse_pool_id_from_denom;
///
/// assert_eq!(parse_pool_id_from_denom("neutron/pool/12").unwrap(), 12);
/// assert!(parse_pool_id_from_denom("neutron/pool/x").is_err());
/// ```
pub fn parse_pool_id_from_denom(denom: &str) -> DexResult<u64> {
    POOL_DENOM_RE
        .captures(denom)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .ok_or_else(|| DexError::InvalidPoolDenom(denom.to_string()))
}

/// Result of [`Pool::deposit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolDeposit {
    pub in_amount0: u128,
    pub in_amount1: u128,
    pub shares_minted: u128,
}

/// AMM pool with its two reserve sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: u64,
    pub lower_tick0: PoolReserves,
    pub upper_tick1: PoolReserves,
}

impl Pool {
    /// Empty pool for `(pair, center_tick, fee)`.
    pub fn new(pair: &PairID, center_tick_normalized: i64, fee: u64, id: u64) -> DexResult<Self> {
        let upper_key = PoolReservesKey {
            trade_pair_id: pair.trade_pair_for_maker(&pair.token1),
            tick_index_taker_to_maker: center_tick_normalized + fee as i64,
            fee,
        };
        let upper_tick1 = PoolReserves::new(upper_key)?;
        let lower_tick0 = PoolReserves::from_counterpart(&upper_tick1)?;
        Ok(Pool {
            id,
            lower_tick0,
            upper_tick1,
        })
    }

    pub fn fee(&self) -> u64 {
        self.upper_tick1.key.fee
    }

    pub fn center_tick_index(&self) -> i64 {
        self.upper_tick1.key.tick_index_taker_to_maker - self.fee() as i64
    }

    pub fn pair_id(&self) -> PairID {
        self.upper_tick1.key.trade_pair_id.pair_id()
    }

    pub fn pool_denom(&self) -> String {
        pool_denom(self.id)
    }

    pub fn reserves0(&self) -> u128 {
        self.lower_tick0.reserves_maker_denom
    }

    pub fn reserves1(&self) -> u128 {
        self.upper_tick1.reserves_maker_denom
    }

    /// Price a taker of `trade_pair` gets from this pool.
    pub fn price(&self, trade_pair: &TradePairID) -> PrecDec {
        if trade_pair.is_taker_denom0() {
            self.upper_tick1.price_taker_to_maker
        } else {
            self.lower_tick0.price_taker_to_maker
        }
    }

    /// Token1 priced in token0 at the center tick.
    pub fn price1_to0_center(&self) -> DexResult<PrecDec> {
        calc_price(-self.center_tick_index())
    }

    // ========================================================================
    // Swap
    // ========================================================================

    /// Trade against the side `trade_pair` takes from.
    ///
    /// The taker's input is credited to the opposite side.
    ///
    /// # Returns
    ///
    /// `(amount_taker_in, amount_maker_out)`
    pub fn swap(
        &mut self,
        trade_pair: &TradePairID,
        max_amount_taker_in: u128,
        max_amount_maker_out: Option<u128>,
    ) -> DexResult<(u128, u128)> {
        let (maker, taker) = if trade_pair.is_maker_denom0() {
            (&mut self.lower_tick0, &mut self.upper_tick1)
        } else {
            (&mut self.upper_tick1, &mut self.lower_tick0)
        };
        let (amount_in, amount_out) = maker.swap_amounts(max_amount_taker_in, max_amount_maker_out)?;
        maker.reserves_maker_denom -= amount_out;
        taker.reserves_maker_denom = taker
            .reserves_maker_denom
            .checked_add(amount_in)
            .ok_or(DexError::Overflow)?;
        Ok((amount_in, amount_out))
    }

    // ========================================================================
    // Deposit / Withdraw
    // ========================================================================

    /// Add liquidity and compute the shares it earns.
    ///
    /// Mutates the reserves; the caller persists the pool.
    ///
    /// # Arguments
    ///
    /// * `max_amount0` / `max_amount1` - Amounts offered
    /// * `existing_shares` - Current share supply of the pool denom
    /// * `autoswap` - Accept amounts off the pool ratio for a fee
    pub fn deposit(
        &mut self,
        max_amount0: u128,
        max_amount1: u128,
        existing_shares: u128,
        autoswap: bool,
    ) -> DexResult<PoolDeposit> {
        let reserves0 = self.reserves0();
        let reserves1 = self.reserves1();
        let (matched0, matched1) =
            calc_greatest_matching_ratio(reserves0, reserves1, max_amount0, max_amount1)?;

        let price1_to0 = self.price1_to0_center()?;
        let existing_value = calc_amount_as_token0(reserves0, reserves1, price1_to0)?;

        let (in_amount0, in_amount1, deposit_value) = if autoswap {
            let swap_value = calc_autoswap_amount(
                reserves0,
                reserves1,
                max_amount0 - matched0,
                max_amount1 - matched1,
                price1_to0,
            )?;
            let fee = calc_autoswap_fee(swap_value, self.fee())?;
            let gross = calc_amount_as_token0(max_amount0, max_amount1, price1_to0)?;
            (max_amount0, max_amount1, gross.saturating_sub(fee))
        } else {
            let value = calc_amount_as_token0(matched0, matched1, price1_to0)?;
            (matched0, matched1, value)
        };

        if in_amount0 == 0 && in_amount1 == 0 {
            return Ok(PoolDeposit::default());
        }

        let shares_minted = if existing_shares == 0 || existing_value.is_zero() {
            deposit_value.truncate_int()?
        } else {
            deposit_value.mul_int_div_floor(existing_shares, existing_value)?
        };

        self.lower_tick0.reserves_maker_denom = reserves0
            .checked_add(in_amount0)
            .ok_or(DexError::Overflow)?;
        self.upper_tick1.reserves_maker_denom = reserves1
            .checked_add(in_amount1)
            .ok_or(DexError::Overflow)?;

        Ok(PoolDeposit {
            in_amount0,
            in_amount1,
            shares_minted,
        })
    }

    /// Amounts `shares_to_remove` of `total_shares` would redeem.
    pub fn redeem_value(&self, shares_to_remove: u128, total_shares: u128) -> DexResult<(u128, u128)> {
        if total_shares == 0 {
            return Ok((0, 0));
        }
        let out0 = mul_div_floor(self.reserves0(), shares_to_remove, total_shares)?.min(self.reserves0());
        let out1 = mul_div_floor(self.reserves1(), shares_to_remove, total_shares)?.min(self.reserves1());
        Ok((out0, out1))
    }

    /// Remove a proportional slice of both reserves.
    pub fn withdraw(&mut self, shares_to_remove: u128, total_shares: u128) -> DexResult<(u128, u128)> {
        let (out0, out1) = self.redeem_value(shares_to_remove, total_shares)?;
        self.lower_tick0.reserves_maker_denom -= out0;
        self.upper_tick1.reserves_maker_denom -= out1;
        Ok((out0, out1))
    }
}

// ============================================================================
// Deposit math
// ============================================================================

/// Largest amounts not exceeding `(amount0, amount1)` that keep the
/// `target0 : target1` ratio. An empty side places no constraint.
pub fn calc_greatest_matching_ratio(
    target0: u128,
    target1: u128,
    amount0: u128,
    amount1: u128,
) -> DexResult<(u128, u128)> {
    let result0 = if target1 > 0 {
        amount0.min(mul_div_floor(amount1, target0, target1)?)
    } else {
        amount0
    };
    let result1 = if target0 > 0 {
        amount1.min(mul_div_floor(amount0, target1, target0)?)
    } else {
        amount1
    };
    Ok((result0, result1))
}

/// `amount0 + amount1 * price1_to0`.
pub fn calc_amount_as_token0(amount0: u128, amount1: u128, price1_to0: PrecDec) -> DexResult<PrecDec> {
    PrecDec::from_int(amount0).try_add(price1_to0.try_mul_int(amount1)?)
}

/// Token0 value of the part of the residuals that would have to be swapped
/// to match the pool ratio.
///
/// A token0 excess keeps the share `v0 / (v0 + v1)` and swaps the rest; a
/// token1 excess swaps the share `v0 / (v0 + v1)` of its value. A pool with a
/// single side therefore swaps the whole excess of the missing token.
pub fn calc_autoswap_amount(
    reserves0: u128,
    reserves1: u128,
    residual0: u128,
    residual1: u128,
    price1_to0: PrecDec,
) -> DexResult<PrecDec> {
    let value0 = PrecDec::from_int(reserves0);
    let value1 = price1_to0.try_mul_int(reserves1)?;
    let total = value0.try_add(value1)?;
    if total.is_zero() {
        return Ok(PrecDec::zero());
    }

    let mut swap_value = PrecDec::zero();
    if residual0 > 0 {
        swap_value = swap_value.try_add(PrecDec::from_int(residual0).try_mul(value1)?.try_quo(total)?)?;
    }
    if residual1 > 0 {
        let residual1_value = price1_to0.try_mul_int(residual1)?;
        swap_value = swap_value.try_add(residual1_value.try_mul(value0)?.try_quo(total)?)?;
    }
    Ok(swap_value)
}

/// Fee charged on an autoswap of `swap_value`: `swap_value * (1 - price(fee))`.
pub fn calc_autoswap_fee(swap_value: PrecDec, fee: u64) -> DexResult<PrecDec> {
    if swap_value.is_zero() || fee == 0 {
        return Ok(PrecDec::zero());
    }
    let discount = PrecDec::one().saturating_sub(calc_price(fee as i64)?);
    swap_value.try_mul(discount)
}

// ============================================================================
// Unit Tests
// ============================================================================
