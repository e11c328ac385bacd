//! One side of an AMM pool.
//!
//! A pool at center tick `c` with fee `f` is stored as two `PoolReserves`:
//!
//! - `UpperTick1`: token1 is the maker, taker-to-maker tick `c + f`
//! - `LowerTick0`: token0 is the maker, taker-to-maker tick `f - c`
//!
//! Each side quotes its own price, so a taker always pays the fee spread
//! relative to the center price in whichever direction they trade.

use serde::{Deserialize, Serialize};

use crate::error::DexResult;
use crate::types::keys;
use crate::types::liquidity::swap_amounts;
use crate::types::pair::TradePairID;
use crate::types::prec_dec::PrecDec;
use crate::types::price::calc_price;

/// Index of a pool side in the tick liquidity store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolReservesKey {
    pub trade_pair_id: TradePairID,
    pub tick_index_taker_to_maker: i64,
    pub fee: u64,
}

impl PoolReservesKey {
    pub fn store_key(&self) -> Vec<u8> {
        keys::pool_reserves_store_key(&self.trade_pair_id, self.tick_index_taker_to_maker, self.fee)
    }

    /// The other side of the same pool.
    pub fn counterpart(&self) -> PoolReservesKey {
        PoolReservesKey {
            trade_pair_id: self.trade_pair_id.reversed(),
            tick_index_taker_to_maker: -self.tick_index_taker_to_maker + 2 * self.fee as i64,
            fee: self.fee,
        }
    }

    /// Maker tokens received per taker token.
    pub fn price_taker_to_maker(&self) -> DexResult<PrecDec> {
        calc_price(self.tick_index_taker_to_maker)
    }

    /// Taker tokens paid per maker token.
    pub fn maker_price(&self) -> DexResult<PrecDec> {
        calc_price(-self.tick_index_taker_to_maker)
    }

    /// Center tick of the owning pool, in normalized (token1 maker) terms.
    pub fn center_tick_normalized(&self) -> i64 {
        let own_side = self.trade_pair_id.tick_index_normalized(self.tick_index_taker_to_maker);
        if self.trade_pair_id.is_maker_denom0() {
            // own_side = -(f - c) = c - f
            own_side + self.fee as i64
        } else {
            own_side - self.fee as i64
        }
    }
}

/// Maker reserves of one pool side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReserves {
    pub key: PoolReservesKey,
    pub reserves_maker_denom: u128,
    pub price_taker_to_maker: PrecDec,
    pub maker_price: PrecDec,
}

impl PoolReserves {
    /// Empty reserves at `key`; fails if the tick is off the ladder.
    pub fn new(key: PoolReservesKey) -> DexResult<Self> {
        let price_taker_to_maker = key.price_taker_to_maker()?;
        let maker_price = key.maker_price()?;
        Ok(PoolReserves {
            key,
            reserves_maker_denom: 0,
            price_taker_to_maker,
            maker_price,
        })
    }

    /// Empty reserves for the opposite side of `other`'s pool.
    pub fn from_counterpart(other: &PoolReserves) -> DexResult<Self> {
        PoolReserves::new(other.key.counterpart())
    }

    pub fn has_token(&self) -> bool {
        self.reserves_maker_denom > 0
    }

    /// Amounts a taker would trade against this side.
    pub fn swap_amounts(&self, max_amount_taker_in: u128, max_amount_maker_out: Option<u128>) -> DexResult<(u128, u128)> {
        swap_amounts(
            self.reserves_maker_denom,
            self.maker_price,
            max_amount_taker_in,
            max_amount_maker_out,
        )
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn upper_key(center: i64, fee: u64) -> PoolReservesKey {
        PoolReservesKey {
            trade_pair_id: TradePairID::new("TokenA", "TokenB").unwrap(),
            tick_index_taker_to_maker: center + fee as i64,
            fee,
        }
    }

    #[test]
    fn test_counterpart_geometry() {
        let upper = upper_key(5, 2);
        let lower = upper.counterpart();
        assert_eq!(lower.trade_pair_id.maker_denom, "TokenA");
        assert_eq!(lower.tick_index_taker_to_maker, 2 - 5);
        assert_eq!(lower.counterpart(), upper);
    }

    #[test]
    fn test_center_tick_from_either_side() {
        let upper = upper_key(-7, 3);
        assert_eq!(upper.center_tick_normalized(), -7);
        assert_eq!(upper.counterpart().center_tick_normalized(), -7);
    }

    #[test]
    fn test_prices_are_reciprocal() {
        let reserves = PoolReserves::new(upper_key(0, 1)).unwrap();
        let product = reserves.price_taker_to_maker.try_mul(reserves.maker_price).unwrap();
        let one = PrecDec::one();
        let diff = if product > one { product.try_sub(one).unwrap() } else { one.try_sub(product).unwrap() };
        assert!(diff < "0.000000000000000000000000001".parse().unwrap());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(PoolReserves::new(upper_key(559_680, 1)).is_err());
    }
}
