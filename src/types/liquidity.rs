//! Tick liquidity: the closed set of things a taker can trade against.
//!
//! Swaps walk the tick liquidity index of a trade pair in key order and see
//! either a pool side or a limit order tranche. Both quote a
//! `price_taker_to_maker` and share the same fill rounding in
//! [`swap_amounts`].

use serde::{Deserialize, Serialize};

use crate::error::{DexError, DexResult};
use crate::types::pair::TradePairID;
use crate::types::pool_reserves::PoolReserves;
use crate::types::prec_dec::PrecDec;
use crate::types::tranche::LimitOrderTranche;

/// Fill amounts against `reserves` of maker liquidity priced at `maker_price`.
///
/// `out = min(reserves, floor(max_in / maker_price), max_out)` and
/// `in = min(ceil(out * maker_price), max_in)`. The taker never pays less
/// than the quoted price and never pays more than `max_in`.
///
/// # Returns
///
/// `(amount_taker_in, amount_maker_out)`
pub fn swap_amounts(
    reserves: u128,
    maker_price: PrecDec,
    max_amount_taker_in: u128,
    max_amount_maker_out: Option<u128>,
) -> DexResult<(u128, u128)> {
    if max_amount_taker_in == 0 || reserves == 0 {
        return Ok((0, 0));
    }
    // Past u128 the reserves are the binding cap anyway.
    let max_out_given_in = match PrecDec::int_div_floor(max_amount_taker_in, maker_price) {
        Err(DexError::Overflow) => u128::MAX,
        other => other?,
    };
    let mut amount_out = reserves.min(max_out_given_in);
    if let Some(max_out) = max_amount_maker_out {
        amount_out = amount_out.min(max_out);
    }
    let amount_in = maker_price.mul_int_ceil(amount_out)?.min(max_amount_taker_in);
    Ok((amount_in, amount_out))
}

/// Liquidity entry in the tick index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickLiquidity {
    PoolReserves(PoolReserves),
    LimitOrderTranche(LimitOrderTranche),
}

impl TickLiquidity {
    pub fn trade_pair_id(&self) -> &TradePairID {
        match self {
            TickLiquidity::PoolReserves(r) => &r.key.trade_pair_id,
            TickLiquidity::LimitOrderTranche(t) => &t.key.trade_pair_id,
        }
    }

    pub fn tick_index_taker_to_maker(&self) -> i64 {
        match self {
            TickLiquidity::PoolReserves(r) => r.key.tick_index_taker_to_maker,
            TickLiquidity::LimitOrderTranche(t) => t.key.tick_index_taker_to_maker,
        }
    }

    pub fn price_taker_to_maker(&self) -> PrecDec {
        match self {
            TickLiquidity::PoolReserves(r) => r.price_taker_to_maker,
            TickLiquidity::LimitOrderTranche(t) => t.price_taker_to_maker,
        }
    }

    pub fn maker_price(&self) -> PrecDec {
        match self {
            TickLiquidity::PoolReserves(r) => r.maker_price,
            TickLiquidity::LimitOrderTranche(t) => t.maker_price,
        }
    }

    pub fn reserves_maker_denom(&self) -> u128 {
        match self {
            TickLiquidity::PoolReserves(r) => r.reserves_maker_denom,
            TickLiquidity::LimitOrderTranche(t) => t.reserves_maker_denom,
        }
    }

    pub fn store_key(&self) -> Vec<u8> {
        match self {
            TickLiquidity::PoolReserves(r) => r.key.store_key(),
            TickLiquidity::LimitOrderTranche(t) => t.key.store_key(),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::price::calc_price;

    #[test]
    fn test_swap_amounts_at_par() {
        let (amount_in, amount_out) = swap_amounts(100, PrecDec::one(), 40, None).unwrap();
        assert_eq!((amount_in, amount_out), (40, 40));
    }

    #[test]
    fn test_swap_amounts_capped_by_reserves() {
        let (amount_in, amount_out) = swap_amounts(10, PrecDec::one(), 40, None).unwrap();
        assert_eq!((amount_in, amount_out), (10, 10));
    }

    #[test]
    fn test_swap_amounts_capped_by_max_out() {
        let (amount_in, amount_out) = swap_amounts(100, PrecDec::from_int(2), 40, Some(5)).unwrap();
        assert_eq!((amount_in, amount_out), (10, 5));
    }

    #[test]
    fn test_swap_amounts_rounds_in_up() {
        // maker price 1.0001: 10 out costs 10.001, charged 11
        let maker_price = calc_price(-1).unwrap();
        let (amount_in, amount_out) = swap_amounts(10, maker_price, 20, None).unwrap();
        assert_eq!(amount_out, 10);
        assert_eq!(amount_in, 11);
    }

    #[test]
    fn test_swap_amounts_never_exceeds_max_in() {
        let maker_price = calc_price(-1).unwrap();
        let (amount_in, amount_out) = swap_amounts(1000, maker_price, 10, None).unwrap();
        assert_eq!(amount_out, 9);
        assert!(amount_in <= 10);
    }

    #[test]
    fn test_swap_amounts_too_small() {
        let (amount_in, amount_out) = swap_amounts(1000, PrecDec::from_int(5), 4, None).unwrap();
        assert_eq!((amount_in, amount_out), (0, 0));
    }
}
