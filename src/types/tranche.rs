//! Limit order tranches.
//!
//! ## Lifecycle
//!
//! ```text
//! placing ──swap──> partially filled ──swap──> filled ──> inactive
//!    │                    │                                  ▲
//!    └──────── expiry (GoodTilTime / JIT) ───────────────────┘
//! ```
//!
//! A tranche pools the maker liquidity of every order placed at the same
//! tick and tranche key. Each user's claim is tracked in shares (one share
//! per maker token placed) by a
//! [`LimitOrderTrancheUser`](crate::types::LimitOrderTrancheUser).
//!
//! ## Accounting
//!
//! - `reserves_maker_denom`: maker tokens still available to takers
//! - `reserves_taker_denom`: taker tokens received and not yet withdrawn
//! - `total_maker_denom` / `total_taker_denom`: lifetime totals, used for
//!   pro-rata fills

use serde::{Deserialize, Serialize};

use crate::error::{DexError, DexResult};
use crate::types::keys;
use crate::types::liquidity::swap_amounts;
use crate::types::pair::TradePairID;
use crate::types::prec_dec::PrecDec;
use crate::types::price::calc_price;
use crate::types::tranche_user::LimitOrderTrancheUser;

/// Expiration time used for JIT tranches.
pub const JIT_EXPIRATION: u64 = 0;

/// Index of a tranche in the tick liquidity store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LimitOrderTrancheKey {
    pub trade_pair_id: TradePairID,
    pub tick_index_taker_to_maker: i64,
    pub tranche_key: String,
}

impl LimitOrderTrancheKey {
    /// Key in the active tick liquidity index.
    pub fn store_key(&self) -> Vec<u8> {
        keys::tranche_store_key(&self.trade_pair_id, self.tick_index_taker_to_maker, &self.tranche_key)
    }

    /// Key in the inactive tranche store.
    pub fn inactive_store_key(&self) -> Vec<u8> {
        keys::inactive_tranche_store_key(&self.trade_pair_id, self.tick_index_taker_to_maker, &self.tranche_key)
    }

    /// Prefix-free reference used by expiration records.
    pub fn key_marshal(&self) -> Vec<u8> {
        keys::tranche_key_tail(&self.trade_pair_id, self.tick_index_taker_to_maker, &self.tranche_key)
    }
}

/// Pooled limit order liquidity at one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderTranche {
    pub key: LimitOrderTrancheKey,
    pub reserves_maker_denom: u128,
    pub reserves_taker_denom: u128,
    pub total_maker_denom: u128,
    pub total_taker_denom: u128,
    /// Unix seconds; `Some(0)` marks a JIT tranche.
    pub expiration_time: Option<u64>,
    pub price_taker_to_maker: PrecDec,
    pub maker_price: PrecDec,
}

impl LimitOrderTranche {
    /// Empty tranche at `key`.
    pub fn new(key: LimitOrderTrancheKey, expiration_time: Option<u64>) -> DexResult<Self> {
        let price_taker_to_maker = calc_price(key.tick_index_taker_to_maker)?;
        let maker_price = calc_price(-key.tick_index_taker_to_maker)?;
        Ok(LimitOrderTranche {
            key,
            reserves_maker_denom: 0,
            reserves_taker_denom: 0,
            total_maker_denom: 0,
            total_taker_denom: 0,
            expiration_time,
            price_taker_to_maker,
            maker_price,
        })
    }

    // ========================================================================
    // State queries
    // ========================================================================

    /// Nothing has been filled yet; new GTC orders may join.
    pub fn is_placing(&self) -> bool {
        self.reserves_maker_denom == self.total_maker_denom
    }

    pub fn is_filled(&self) -> bool {
        self.reserves_maker_denom == 0
    }

    pub fn is_jit(&self) -> bool {
        self.expiration_time == Some(JIT_EXPIRATION)
    }

    /// GoodTilTime tranche whose expiration is at or before `block_time`.
    pub fn is_expired(&self, block_time: u64) -> bool {
        match self.expiration_time {
            Some(t) => t != JIT_EXPIRATION && t <= block_time,
            None => false,
        }
    }

    pub fn has_token_in(&self) -> bool {
        self.reserves_maker_denom > 0
    }

    pub fn has_token_out(&self) -> bool {
        self.reserves_taker_denom > 0
    }

    /// Share of the tranche that has been filled, capped at one.
    pub fn ratio_filled(&self) -> DexResult<PrecDec> {
        if self.total_maker_denom == 0 {
            return Ok(PrecDec::zero());
        }
        let amount_filled = PrecDec::from_int(self.total_taker_denom).try_quo(self.maker_price)?;
        let ratio = amount_filled.try_quo_int(self.total_maker_denom)?;
        Ok(ratio.min(PrecDec::one()))
    }

    /// Maker tokens not yet filled, floored at zero.
    pub fn amount_unfilled(&self) -> DexResult<PrecDec> {
        let amount_filled = PrecDec::from_int(self.total_taker_denom).try_quo(self.maker_price)?;
        Ok(PrecDec::from_int(self.total_maker_denom).saturating_sub(amount_filled))
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add maker liquidity from a newly placed order.
    pub fn place_maker_limit_order(&mut self, amount_in: u128) -> DexResult<()> {
        self.reserves_maker_denom = self
            .reserves_maker_denom
            .checked_add(amount_in)
            .ok_or(DexError::Overflow)?;
        self.total_maker_denom = self
            .total_maker_denom
            .checked_add(amount_in)
            .ok_or(DexError::Overflow)?;
        Ok(())
    }

    /// Fill against this tranche.
    ///
    /// # Returns
    ///
    /// `(amount_taker_in, amount_maker_out)`
    pub fn swap(&mut self, max_amount_taker_in: u128, max_amount_maker_out: Option<u128>) -> DexResult<(u128, u128)> {
        let (amount_in, amount_out) = swap_amounts(
            self.reserves_maker_denom,
            self.maker_price,
            max_amount_taker_in,
            max_amount_maker_out,
        )?;
        self.reserves_maker_denom -= amount_out;
        self.reserves_taker_denom = self
            .reserves_taker_denom
            .checked_add(amount_in)
            .ok_or(DexError::Overflow)?;
        self.total_taker_denom = self
            .total_taker_denom
            .checked_add(amount_in)
            .ok_or(DexError::Overflow)?;
        Ok((amount_in, amount_out))
    }

    /// Pull the user's pro-rata unfilled maker tokens out of the tranche.
    ///
    /// Returns the amount removed. Rounding that would make it negative
    /// yields zero.
    pub fn remove_token_in(&mut self, user: &LimitOrderTrancheUser) -> DexResult<u128> {
        if self.total_maker_denom == 0 {
            return Ok(0);
        }
        let unfilled = self.amount_unfilled()?;
        let max_to_remove =
            unfilled.mul_int_div_floor(user.shares_owned, PrecDec::from_int(self.total_maker_denom))?;
        let amount = max_to_remove
            .saturating_sub(user.shares_cancelled)
            .min(self.reserves_maker_denom);
        self.reserves_maker_denom -= amount;
        Ok(amount)
    }

    /// Shares a user may redeem now and the taker tokens they are worth.
    ///
    /// Shares are rounded up and tokens down. A non-positive claim is
    /// `(0, 0)`.
    ///
    /// # Returns
    ///
    /// `(shares_to_withdraw, amount_out_taker_denom)`
    pub fn calc_withdraw_amount(&self, user: &LimitOrderTrancheUser) -> DexResult<(u128, u128)> {
        let ratio_filled = self.ratio_filled()?;
        let max_allowed = ratio_filled.try_mul_int(user.shares_owned)?;
        let shares_dec = max_allowed.saturating_sub(PrecDec::from_int(user.shares_withdrawn));
        if shares_dec.is_zero() {
            return Ok((0, 0));
        }
        let shares = shares_dec.ceil_int()?;
        let amount_out = shares_dec
            .mul_floor_int(self.maker_price)?
            .min(self.reserves_taker_denom);
        Ok((shares, amount_out))
    }

    /// Apply [`LimitOrderTranche::calc_withdraw_amount`].
    pub fn withdraw(&mut self, user: &LimitOrderTrancheUser) -> DexResult<(u128, u128)> {
        let (shares, amount_out) = self.calc_withdraw_amount(user)?;
        self.reserves_taker_denom -= amount_out;
        Ok((shares, amount_out))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::order_type::LimitOrderType;

    fn key(tick: i64) -> LimitOrderTrancheKey {
        LimitOrderTrancheKey {
            // taker pays TokenB for TokenA
            trade_pair_id: TradePairID::new("TokenB", "TokenA").unwrap(),
            tick_index_taker_to_maker: tick,
            tranche_key: "1a10".to_string(),
        }
    }

    fn user(shares: u128) -> LimitOrderTrancheUser {
        LimitOrderTrancheUser {
            trade_pair_id: key(0).trade_pair_id,
            tick_index_taker_to_maker: 0,
            tranche_key: "1a10".to_string(),
            address: "alice".to_string(),
            shares_owned: shares,
            shares_withdrawn: 0,
            shares_cancelled: 0,
            order_type: LimitOrderType::GoodTilCancelled,
        }
    }

    #[test]
    fn test_place_and_fill() {
        let mut tranche = LimitOrderTranche::new(key(0), None).unwrap();
        tranche.place_maker_limit_order(100).unwrap();
        assert!(tranche.is_placing());

        let (amount_in, amount_out) = tranche.swap(30, None).unwrap();
        assert_eq!((amount_in, amount_out), (30, 30));
        assert!(!tranche.is_placing());
        assert_eq!(tranche.reserves_maker_denom, 70);
        assert_eq!(tranche.reserves_taker_denom, 30);
        assert_eq!(tranche.ratio_filled().unwrap().to_string(), "0.3");
    }

    #[test]
    fn test_ratio_filled_capped_at_one() {
        let mut tranche = LimitOrderTranche::new(key(-1), None).unwrap();
        tranche.place_maker_limit_order(10).unwrap();
        // maker price 1/1.0001: 10 out costs ceil(9.999) = 10
        tranche.swap(100, None).unwrap();
        assert!(tranche.is_filled());
        assert_eq!(tranche.ratio_filled().unwrap(), PrecDec::one());
    }

    #[test]
    fn test_withdraw_rounds_shares_up_and_tokens_down() {
        // maker price 1.0001^-10 ~ 0.999
        let mut tranche = LimitOrderTranche::new(key(-10), None).unwrap();
        tranche.place_maker_limit_order(10).unwrap();
        tranche.swap(10, None).unwrap();
        assert!(tranche.is_filled());

        let alice = user(10);
        let (shares, amount_out) = tranche.withdraw(&alice).unwrap();
        assert_eq!(shares, 10);
        assert_eq!(amount_out, 9);
        assert_eq!(tranche.reserves_taker_denom, 1);
    }

    #[test]
    fn test_withdraw_twice_is_noop() {
        let mut tranche = LimitOrderTranche::new(key(0), None).unwrap();
        tranche.place_maker_limit_order(100).unwrap();
        tranche.swap(50, None).unwrap();

        let mut alice = user(100);
        let (shares, out) = tranche.withdraw(&alice).unwrap();
        assert_eq!((shares, out), (50, 50));
        alice.shares_withdrawn += shares;
        assert_eq!(tranche.calc_withdraw_amount(&alice).unwrap(), (0, 0));
    }

    #[test]
    fn test_remove_token_in_returns_unfilled_share() {
        let mut tranche = LimitOrderTranche::new(key(0), None).unwrap();
        tranche.place_maker_limit_order(60).unwrap();
        tranche.place_maker_limit_order(40).unwrap();
        tranche.swap(50, None).unwrap();

        let alice = user(60);
        let removed = tranche.remove_token_in(&alice).unwrap();
        assert_eq!(removed, 30);
        assert_eq!(tranche.reserves_maker_denom, 20);
    }

    #[test]
    fn test_expiration_flags() {
        let jit = LimitOrderTranche::new(key(0), Some(JIT_EXPIRATION)).unwrap();
        assert!(jit.is_jit());
        assert!(!jit.is_expired(1_000));

        let good_til = LimitOrderTranche::new(key(0), Some(500)).unwrap();
        assert!(!good_til.is_expired(499));
        assert!(good_til.is_expired(500));

        let gtc = LimitOrderTranche::new(key(0), None).unwrap();
        assert!(!gtc.is_expired(u64::MAX));
    }
}
