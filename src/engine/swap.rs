//! Core swap loop.
//!
//! ## Algorithm
//!
//! Liquidity for a trade pair is keyed so that ascending key order is
//! ascending taker-to-maker tick, which is descending price for the taker.
//! Within a tick, pool sides sort before limit order tranches.
//!
//! ```text
//! for liq in tick_liquidity(trade_pair):
//!     if liq.price < limit: stop
//!     skip empty and expired tranches
//!     fill min(remaining_in, remaining_out) against liq
//!     persist liq
//! ```
//!
//! A fill that rounds to zero output stops the walk: every later tick is a
//! worse price, so the remaining input cannot buy anything there either.

use tracing::trace;

use crate::engine::bank::BankKeeper;
use crate::engine::context::{decode, Context};
use crate::engine::keeper::Keeper;
use crate::error::{DexError, DexResult};
use crate::store::{prefix_end, successor};
use crate::types::keys;
use crate::types::liquidity::TickLiquidity;
use crate::types::pair::TradePairID;
use crate::types::prec_dec::PrecDec;

/// Outcome of a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwapResult {
    pub amount_in: u128,
    pub amount_out: u128,
    /// Input exhausted, max out reached, or the remainder is dust.
    pub order_filled: bool,
}

/// Walk the liquidity of `trade_pair` from the best price down.
///
/// # Arguments
///
/// * `trade_pair` - Taker pays `taker_denom`, receives `maker_denom`
/// * `max_amount_in` - Taker input budget
/// * `max_amount_out` - Optional cap on maker output
/// * `limit_price` - Worst acceptable `price_taker_to_maker`
pub fn swap<B: BankKeeper>(
    keeper: &Keeper<B>,
    ctx: &mut Context<'_>,
    trade_pair: &TradePairID,
    max_amount_in: u128,
    max_amount_out: Option<u128>,
    limit_price: Option<PrecDec>,
) -> DexResult<SwapResult> {
    let prefix = keys::tick_liquidity_prefix(trade_pair);
    let end = prefix_end(&prefix);
    let mut cursor = prefix.clone();

    let mut remaining_in = max_amount_in;
    let mut remaining_out = max_amount_out;
    let mut total_out: u128 = 0;
    let mut order_filled = false;

    loop {
        if remaining_in == 0 || remaining_out == Some(0) {
            order_filled = true;
            break;
        }
        let (key, value) = match ctx.seek(&cursor, end.as_deref())? {
            Some(hit) => hit,
            None => break,
        };
        cursor = successor(&key);
        let liq: TickLiquidity = decode(&key, &value)?;

        if let Some(limit) = limit_price {
            if liq.price_taker_to_maker() < limit {
                break;
            }
        }
        if liq.reserves_maker_denom() == 0 {
            continue;
        }
        if let TickLiquidity::LimitOrderTranche(t) = &liq {
            if t.is_expired(ctx.block().time) {
                continue;
            }
        }
        if !can_buy(remaining_in, liq.maker_price())? {
            order_filled = true;
            break;
        }

        let maker_price = liq.maker_price();
        let (amount_in, amount_out) = match liq {
            TickLiquidity::PoolReserves(reserves) => {
                let center = reserves.key.center_tick_normalized();
                let pair = trade_pair.pair_id();
                let mut pool = keeper
                    .pool(ctx, &pair, center, reserves.key.fee)?
                    .ok_or_else(|| DexError::CorruptState {
                        key: String::from_utf8_lossy(&key).into_owned(),
                        reason: "pool side without a registered pool".to_string(),
                    })?;
                let filled = pool.swap(trade_pair, remaining_in, remaining_out)?;
                keeper.set_pool(ctx, &pool)?;
                filled
            }
            TickLiquidity::LimitOrderTranche(mut tranche) => {
                let filled = tranche.swap(remaining_in, remaining_out)?;
                keeper.save_tranche(ctx, &tranche)?;
                filled
            }
        };
        trace!(trade_pair = %trade_pair, amount_in, amount_out, "filled tick");
        if amount_out == 0 {
            order_filled = true;
            break;
        }
        remaining_in -= amount_in;
        remaining_out = remaining_out.map(|r| r.saturating_sub(amount_out));
        total_out = total_out.checked_add(amount_out).ok_or(DexError::Overflow)?;
        // later ticks only get more expensive
        if remaining_in > 0 && !can_buy(remaining_in, maker_price)? {
            order_filled = true;
            break;
        }
    }

    Ok(SwapResult {
        amount_in: max_amount_in - remaining_in,
        amount_out: total_out,
        order_filled,
    })
}

/// Whether `amount_in` buys at least one maker token at `maker_price`.
fn can_buy(amount_in: u128, maker_price: PrecDec) -> DexResult<bool> {
    match PrecDec::int_div_floor(amount_in, maker_price) {
        Ok(out) => Ok(out > 0),
        Err(DexError::Overflow) => Ok(true),
        Err(e) => Err(e),
    }
}

/// First tradable liquidity of `trade_pair`, skipping drained and expired entries.
pub fn best_liquidity(ctx: &Context<'_>, trade_pair: &TradePairID) -> DexResult<Option<TickLiquidity>> {
    let prefix = keys::tick_liquidity_prefix(trade_pair);
    let end = prefix_end(&prefix);
    let mut cursor = prefix;
    while let Some((key, value)) = ctx.seek(&cursor, end.as_deref())? {
        cursor = successor(&key);
        let liq: TickLiquidity = decode(&key, &value)?;
        if liq.reserves_maker_denom() == 0 {
            continue;
        }
        if let TickLiquidity::LimitOrderTranche(t) = &liq {
            if t.is_expired(ctx.block().time) {
                continue;
            }
        }
        return Ok(Some(liq));
    }
    Ok(None)
}

/// Taker-to-maker tick of the best liquidity of `trade_pair`.
pub fn best_tick(ctx: &Context<'_>, trade_pair: &TradePairID) -> DexResult<Option<i64>> {
    Ok(best_liquidity(ctx, trade_pair)?.map(|liq| liq.tick_index_taker_to_maker()))
}

/// Best `price_taker_to_maker` on offer for `trade_pair`.
pub fn best_price(ctx: &Context<'_>, trade_pair: &TradePairID) -> DexResult<Option<PrecDec>> {
    Ok(best_liquidity(ctx, trade_pair)?.map(|liq| liq.price_taker_to_maker()))
}

/// Reject trades whose output at `price` rounds to nothing.
///
/// Products too large to represent are certainly non-zero.
pub fn validate_fair_output(amount_in: u128, price: PrecDec) -> DexResult<()> {
    match price.mul_int_floor(amount_in) {
        Ok(0) => Err(DexError::TradeTooSmall),
        Ok(_) | Err(DexError::Overflow) => Ok(()),
        Err(e) => Err(e),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
