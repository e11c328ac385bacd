//! Limit order placement, cancellation and withdrawal.
//!
//! ## Placement
//!
//! An order selling `token_in` for `token_out` at limit tick `t` first
//! swaps against liquidity at price `calc_price(t)` or better:
//!
//! - Taker-only orders (IoC, FoK) must trade at least something, FoK must
//!   fill completely, and the realized price may not fall more than
//!   `max_true_taker_spread` below the limit.
//! - Maker orders (GTC, GoodTilTime, JIT) rest whatever the swap left over
//!   as a tranche on the reversed pair at tick `-t`. Any part they swap is
//!   held to the same realized price bound.
//!
//! ## Tranche shares
//!
//! A user's shares equal the maker tokens they placed. Withdrawals pay out
//! the filled fraction; cancellation also refunds the unfilled fraction and
//! closes the position.

use tracing::{debug, info};

use crate::engine::bank::BankKeeper;
use crate::engine::context::Context;
use crate::engine::keeper::Keeper;
use crate::engine::swap::{swap, validate_fair_output, SwapResult};
use crate::error::{DexError, DexResult};
use crate::types::coin::Coin;
use crate::types::events::DexEvent;
use crate::types::messages::{
    MsgCancelLimitOrder, MsgCancelLimitOrderResponse, MsgPlaceLimitOrder, MsgPlaceLimitOrderResponse,
    MsgWithdrawFilledLimitOrder, MsgWithdrawFilledLimitOrderResponse,
};
use crate::types::metadata::LimitOrderExpiration;
use crate::types::pair::TradePairID;
use crate::types::prec_dec::{mul_div_floor, PrecDec};
use crate::types::price::calc_price;
use crate::types::tranche::LimitOrderTranche;
use crate::types::tranche_user::LimitOrderTrancheUser;

/// Extra gas charged for orders that register an expiration record.
pub const EXPIRING_LIMIT_ORDER_GAS: u64 = 10_000;

impl<B: BankKeeper> Keeper<B> {
    // ========================================================================
    // Place
    // ========================================================================

    /// Execute a limit order message.
    pub fn place_limit_order(
        &self,
        ctx: &mut Context<'_>,
        msg: &MsgPlaceLimitOrder,
    ) -> DexResult<MsgPlaceLimitOrderResponse> {
        let tick = msg.resolved_tick_index()?;
        let taker_pair = TradePairID::new(&msg.token_in, &msg.token_out)?;
        let limit_price = calc_price(tick)?;
        validate_fair_output(msg.amount_in, limit_price)?;

        let swapped = if msg.order_type.is_taker_only() {
            self.taker_limit_order_swap(ctx, &taker_pair, msg, limit_price)?
        } else {
            let swapped = swap(self, ctx, &taker_pair, msg.amount_in, None, Some(limit_price))?;
            if swapped.amount_in > 0 {
                self.check_true_price(ctx, &swapped, limit_price)?;
            }
            swapped
        };
        if let Some(min_price) = msg.min_average_sell_price {
            if swapped.amount_in > 0 && PrecDec::from_ratio(swapped.amount_out, swapped.amount_in)? < min_price {
                return Err(DexError::LimitPriceNotSatisfied);
            }
        }

        let amount_left = msg.amount_in - swapped.amount_in;
        let mut total_in = swapped.amount_in;
        let mut shares_issued: u128 = 0;
        let mut tranche_key = String::new();

        let rests = msg.order_type.is_gtc() || msg.order_type.is_jit() || msg.order_type.is_good_til();
        if amount_left > 0 && !swapped.order_filled && rests {
            validate_fair_output(amount_left, limit_price)?;
            let tranche = self.place_maker_order(ctx, &taker_pair.reversed(), -tick, amount_left, msg)?;
            tranche_key = tranche.key.tranche_key;
            total_in += amount_left;
            shares_issued = amount_left;
        }

        if msg.order_type.is_jit() {
            self.assert_can_place_jit(ctx)?;
            self.increment_jits_in_block(ctx)?;
        }

        self.bank()
            .send_to_module(ctx, &msg.creator, &Coin::new(msg.token_in.clone(), total_in))?;
        self.bank()
            .send_from_module(ctx, &msg.receiver, &Coin::new(msg.token_out.clone(), swapped.amount_out))?;

        ctx.emit(DexEvent::PlaceLimitOrder {
            creator: msg.creator.clone(),
            receiver: msg.receiver.clone(),
            token_in: msg.token_in.clone(),
            token_out: msg.token_out.clone(),
            amount_in: msg.amount_in,
            limit_tick: tick,
            order_type: msg.order_type,
            shares: shares_issued,
            tranche_key: tranche_key.clone(),
            swap_amount_in: swapped.amount_in,
            swap_amount_out: swapped.amount_out,
        });
        info!(
            creator = %msg.creator,
            order_type = ?msg.order_type,
            tick,
            amount_in = msg.amount_in,
            swap_in = swapped.amount_in,
            swap_out = swapped.amount_out,
            placed = shares_issued,
            "place limit order"
        );

        Ok(MsgPlaceLimitOrderResponse {
            tranche_key,
            coin_in: Coin::new(msg.token_in.clone(), total_in),
            taker_coin_in: Coin::new(msg.token_in.clone(), swapped.amount_in),
            taker_coin_out: Coin::new(msg.token_out.clone(), swapped.amount_out),
        })
    }

    /// Swap leg of an IoC or FoK order.
    fn taker_limit_order_swap(
        &self,
        ctx: &mut Context<'_>,
        taker_pair: &TradePairID,
        msg: &MsgPlaceLimitOrder,
        limit_price: PrecDec,
    ) -> DexResult<SwapResult> {
        let swapped = swap(self, ctx, taker_pair, msg.amount_in, msg.max_amount_out, Some(limit_price))?;
        if msg.order_type.is_fok() && !swapped.order_filled {
            return Err(DexError::FoKLimitOrderNotFilled);
        }
        if swapped.amount_in == 0 || swapped.amount_out == 0 {
            return Err(DexError::NoLiquidity);
        }

        self.check_true_price(ctx, &swapped, limit_price)?;
        Ok(swapped)
    }

    /// Reject a swap whose realized `out / in` falls more than
    /// `max_true_taker_spread` below the limit price.
    fn check_true_price(&self, ctx: &Context<'_>, swapped: &SwapResult, limit_price: PrecDec) -> DexResult<()> {
        let spread = self.params(ctx)?.max_true_taker_spread;
        let worst_price = limit_price.try_mul(PrecDec::one().saturating_sub(spread))?;
        let true_price = PrecDec::from_ratio(swapped.amount_out, swapped.amount_in)?;
        if true_price < worst_price {
            debug!(true_price = %true_price, worst_price = %worst_price, "swap price too far from limit");
            return Err(DexError::LimitPriceNotSatisfied);
        }
        Ok(())
    }

    /// Rest `amount` of a maker order in the tranche it belongs to.
    fn place_maker_order(
        &self,
        ctx: &mut Context<'_>,
        maker_pair: &TradePairID,
        tick: i64,
        amount: u128,
        msg: &MsgPlaceLimitOrder,
    ) -> DexResult<LimitOrderTranche> {
        let mut tranche =
            self.get_or_init_place_tranche(ctx, maker_pair, tick, msg.order_type, msg.expiration_time)?;
        let mut user = self.get_or_init_tranche_user(ctx, &tranche.key, &msg.receiver, msg.order_type)?;

        tranche.place_maker_limit_order(amount)?;
        user.shares_owned = user.shares_owned.checked_add(amount).ok_or(DexError::Overflow)?;

        if let Some(expiration_time) = tranche.expiration_time {
            self.set_expiration(
                ctx,
                &LimitOrderExpiration {
                    expiration_time,
                    tranche_key: tranche.key.clone(),
                },
            )?;
            ctx.gas().consume(EXPIRING_LIMIT_ORDER_GAS)?;
        }

        self.save_tranche(ctx, &tranche)?;
        self.save_tranche_user(ctx, &user)?;
        Ok(tranche)
    }

    // ========================================================================
    // Cancel
    // ========================================================================

    /// Refund the unfilled part of an active order and pay out the filled part.
    pub fn cancel_limit_order(
        &self,
        ctx: &mut Context<'_>,
        msg: &MsgCancelLimitOrder,
    ) -> DexResult<MsgCancelLimitOrderResponse> {
        let not_found = || DexError::ActiveLimitOrderNotFound(msg.tranche_key.clone());
        let mut user = self
            .tranche_user(ctx, &msg.creator, &msg.tranche_key)?
            .ok_or_else(not_found)?;
        let mut tranche = self.tranche(ctx, &user.tranche_ref())?.ok_or_else(not_found)?;

        let maker_out = tranche.remove_token_in(&user)?;
        let (shares_withdrawn, taker_out) = tranche.withdraw(&user)?;
        if maker_out == 0 && taker_out == 0 {
            return Err(DexError::CancelEmptyLimitOrder(msg.tranche_key.clone()));
        }

        remove_user_from_totals(&mut tranche, &user)?;
        close_user(&mut user, shares_withdrawn);

        self.save_tranche(ctx, &tranche)?;
        self.save_tranche_user(ctx, &user)?;
        if let Some(expiration_time) = tranche.expiration_time {
            self.remove_expiration(
                ctx,
                &LimitOrderExpiration {
                    expiration_time,
                    tranche_key: tranche.key.clone(),
                },
            )?;
        }

        let maker_coin = Coin::new(tranche.key.trade_pair_id.maker_denom.clone(), maker_out);
        let taker_coin = Coin::new(tranche.key.trade_pair_id.taker_denom.clone(), taker_out);
        self.bank().send_from_module(ctx, &msg.creator, &maker_coin)?;
        self.bank().send_from_module(ctx, &msg.creator, &taker_coin)?;

        ctx.emit(DexEvent::CancelLimitOrder {
            creator: msg.creator.clone(),
            maker_denom: maker_coin.denom.clone(),
            taker_denom: taker_coin.denom.clone(),
            tick_index: tranche.key.tick_index_taker_to_maker,
            tranche_key: msg.tranche_key.clone(),
            maker_amount_out: maker_out,
            taker_amount_out: taker_out,
        });
        info!(creator = %msg.creator, tranche_key = %msg.tranche_key, maker_out, taker_out, "cancel limit order");

        Ok(MsgCancelLimitOrderResponse {
            maker_coin_out: maker_coin,
            taker_coin_out: taker_coin,
        })
    }

    // ========================================================================
    // Withdraw filled
    // ========================================================================

    /// Pay out the filled part of an order.
    ///
    /// From an inactive (drained or expired) tranche the unfilled remainder
    /// is refunded as well and the position is closed.
    pub fn withdraw_filled_limit_order(
        &self,
        ctx: &mut Context<'_>,
        msg: &MsgWithdrawFilledLimitOrder,
    ) -> DexResult<MsgWithdrawFilledLimitOrderResponse> {
        let not_found = || DexError::ValidLimitOrderTrancheNotFound(msg.tranche_key.clone());
        let mut user = self
            .tranche_user(ctx, &msg.creator, &msg.tranche_key)?
            .ok_or_else(not_found)?;
        let tranche_ref = user.tranche_ref();

        let (trade_pair, taker_out, maker_out) = if let Some(mut tranche) = self.tranche(ctx, &tranche_ref)? {
            let (shares, taker_out) = tranche.withdraw(&user)?;
            if taker_out == 0 {
                return Err(DexError::WithdrawEmptyLimitOrder);
            }
            user.shares_withdrawn = user.shares_withdrawn.saturating_add(shares);
            self.save_tranche(ctx, &tranche)?;
            (tranche.key.trade_pair_id, taker_out, 0)
        } else if let Some(mut tranche) = self.inactive_tranche(ctx, &tranche_ref)? {
            let (shares, taker_out) = tranche.withdraw(&user)?;
            let maker_out = tranche.remove_token_in(&user)?;
            if taker_out == 0 && maker_out == 0 {
                return Err(DexError::WithdrawEmptyLimitOrder);
            }
            close_user(&mut user, shares);
            self.save_inactive_tranche(ctx, &tranche)?;
            (tranche.key.trade_pair_id, taker_out, maker_out)
        } else {
            return Err(not_found());
        };
        self.save_tranche_user(ctx, &user)?;

        let taker_coin = Coin::new(trade_pair.taker_denom.clone(), taker_out);
        let maker_coin = Coin::new(trade_pair.maker_denom.clone(), maker_out);
        self.bank().send_from_module(ctx, &msg.creator, &taker_coin)?;
        self.bank().send_from_module(ctx, &msg.creator, &maker_coin)?;

        ctx.emit(DexEvent::WithdrawFilledLimitOrder {
            creator: msg.creator.clone(),
            maker_denom: maker_coin.denom.clone(),
            taker_denom: taker_coin.denom.clone(),
            tick_index: tranche_ref.tick_index_taker_to_maker,
            tranche_key: msg.tranche_key.clone(),
            taker_amount_out: taker_out,
            maker_amount_out: maker_out,
        });
        info!(creator = %msg.creator, tranche_key = %msg.tranche_key, taker_out, maker_out, "withdraw filled limit order");

        Ok(MsgWithdrawFilledLimitOrderResponse {
            taker_coin_out: taker_coin,
            maker_coin_out: maker_coin,
        })
    }
}

/// Mark every share of `user` as withdrawn or cancelled.
fn close_user(user: &mut LimitOrderTrancheUser, shares_withdrawn: u128) {
    user.shares_withdrawn = user.shares_withdrawn.saturating_add(shares_withdrawn).min(user.shares_owned);
    user.shares_cancelled = user.shares_owned - user.shares_withdrawn;
}

/// Take a leaving user's slice out of the tranche totals.
///
/// The filled ratio seen by the remaining users is unchanged.
fn remove_user_from_totals(tranche: &mut LimitOrderTranche, user: &LimitOrderTrancheUser) -> DexResult<()> {
    if tranche.total_maker_denom == 0 {
        return Ok(());
    }
    let owned = user.shares_owned.min(tranche.total_maker_denom);
    let taker_share = mul_div_floor(tranche.total_taker_denom, owned, tranche.total_maker_denom)?;
    tranche.total_taker_denom -= taker_share;
    tranche.total_maker_denom = (tranche.total_maker_denom - owned).max(tranche.reserves_maker_denom);
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bank::{StoreBank, MODULE_ACCOUNT};
    use crate::engine::context::BlockInfo;
    use crate::store::{GasMeter, MemStore};
    use crate::types::order_type::LimitOrderType;
    use crate::types::tranche::LimitOrderTrancheKey;

    fn order(creator: &str, token_in: &str, token_out: &str, tick: i64, amount: u128, order_type: LimitOrderType) -> MsgPlaceLimitOrder {
        MsgPlaceLimitOrder {
            creator: creator.to_string(),
            receiver: creator.to_string(),
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            tick_index_in_to_out: Some(tick),
            limit_sell_price: None,
            amount_in: amount,
            order_type,
            expiration_time: None,
            max_amount_out: None,
            min_average_sell_price: None,
        }
    }

    fn fund(ctx: &mut Context<'_>) {
        for who in ["alice", "bob", "carol"] {
            StoreBank.mint(ctx, who, &Coin::new("TokenA", 1_000_000)).unwrap();
            StoreBank.mint(ctx, who, &Coin::new("TokenB", 1_000_000)).unwrap();
        }
    }

    fn maker_key(tranche_key: &str) -> LimitOrderTrancheKey {
        LimitOrderTrancheKey {
            trade_pair_id: TradePairID::new("TokenB", "TokenA").unwrap(),
            tick_index_taker_to_maker: 10,
            tranche_key: tranche_key.to_string(),
        }
    }

    #[test]
    fn test_gtc_order_rests_on_book() {
        let mut store = MemStore::new();
        let gas = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(1, 0));
        let keeper: Keeper = Keeper::default();
        fund(&mut ctx);

        let msg = order("alice", "TokenA", "TokenB", -10, 10, LimitOrderType::GoodTilCancelled);
        let resp = keeper.place_limit_order(&mut ctx, &msg).unwrap();
        assert!(!resp.tranche_key.is_empty());
        assert_eq!(resp.coin_in, Coin::new("TokenA", 10));
        assert_eq!(resp.taker_coin_out, Coin::new("TokenB", 0));

        let tranche = keeper.tranche(&ctx, &maker_key(&resp.tranche_key)).unwrap().unwrap();
        assert_eq!(tranche.reserves_maker_denom, 10);
        let user = keeper.tranche_user(&ctx, "alice", &resp.tranche_key).unwrap().unwrap();
        assert_eq!(user.shares_owned, 10);
        assert_eq!(StoreBank.balance(&ctx, MODULE_ACCOUNT, "TokenA").unwrap(), 10);
    }

    #[test]
    fn test_fill_then_withdraw() {
        let mut store = MemStore::new();
        let gas = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(1, 0));
        let keeper: Keeper = Keeper::default();
        fund(&mut ctx);

        let placed = keeper
            .place_limit_order(&mut ctx, &order("alice", "TokenA", "TokenB", -10, 10_000, LimitOrderType::GoodTilCancelled))
            .unwrap();
        // buy every TokenA at 1.001 TokenB each
        let taker = order("bob", "TokenB", "TokenA", 10, 20_000, LimitOrderType::ImmediateOrCancel);
        let taken = keeper.place_limit_order(&mut ctx, &taker).unwrap();
        assert_eq!(taken.taker_coin_out, Coin::new("TokenA", 10_000));
        assert_eq!(taken.taker_coin_in, Coin::new("TokenB", 10_011));
        assert!(taken.tranche_key.is_empty());

        // drained tranche is inactive, withdrawal pays and closes
        assert!(keeper.tranche(&ctx, &maker_key(&placed.tranche_key)).unwrap().is_none());
        let withdrawn = keeper
            .withdraw_filled_limit_order(
                &mut ctx,
                &MsgWithdrawFilledLimitOrder {
                    creator: "alice".to_string(),
                    tranche_key: placed.tranche_key.clone(),
                },
            )
            .unwrap();
        assert_eq!(withdrawn.taker_coin_out, Coin::new("TokenB", 10_010));
        assert_eq!(withdrawn.maker_coin_out, Coin::new("TokenA", 0));
        assert!(keeper.tranche_user(&ctx, "alice", &placed.tranche_key).unwrap().is_none());
    }

    #[test]
    fn test_small_taker_fill_fails_true_price() {
        let mut store = MemStore::new();
        let gas = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(1, 0));
        let keeper: Keeper = Keeper::default();
        fund(&mut ctx);
        keeper
            .place_limit_order(&mut ctx, &order("alice", "TokenA", "TokenB", -10, 10, LimitOrderType::GoodTilCancelled))
            .unwrap();
        // 10 out for 11 in is 9% worse than the limit
        let taker = order("bob", "TokenB", "TokenA", 10, 20, LimitOrderType::ImmediateOrCancel);
        assert_eq!(
            keeper.place_limit_order(&mut ctx, &taker),
            Err(DexError::LimitPriceNotSatisfied)
        );
    }

    #[test]
    fn test_small_crossing_gtc_fails_true_price() {
        let mut store = MemStore::new();
        let gas = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(1, 0));
        let keeper: Keeper = Keeper::default();
        fund(&mut ctx);
        keeper
            .place_limit_order(&mut ctx, &order("alice", "TokenA", "TokenB", -10, 10, LimitOrderType::GoodTilCancelled))
            .unwrap();
        // crossing part settles at 10 out for 11 in
        let crossing = order("bob", "TokenB", "TokenA", 10, 20, LimitOrderType::GoodTilCancelled);
        assert_eq!(
            ctx.with_branch(|child| keeper.place_limit_order(child, &crossing)),
            Err(DexError::LimitPriceNotSatisfied)
        );

        // rounding dominated cross far from the limit
        keeper
            .place_limit_order(&mut ctx, &order("bob", "TokenB", "TokenA", -5108, 100, LimitOrderType::GoodTilCancelled))
            .unwrap();
        let crossing = order("alice", "TokenA", "TokenB", 5108, 3, LimitOrderType::GoodTilCancelled);
        assert_eq!(
            ctx.with_branch(|child| keeper.place_limit_order(child, &crossing)),
            Err(DexError::LimitPriceNotSatisfied)
        );
    }

    #[test]
    fn test_large_crossing_gtc_swaps_then_rests() {
        let mut store = MemStore::new();
        let gas = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(1, 0));
        let keeper: Keeper = Keeper::default();
        fund(&mut ctx);
        keeper
            .place_limit_order(&mut ctx, &order("alice", "TokenA", "TokenB", -10, 10_000, LimitOrderType::GoodTilCancelled))
            .unwrap();

        let crossing = order("bob", "TokenB", "TokenA", 10, 20_000, LimitOrderType::GoodTilCancelled);
        let resp = keeper.place_limit_order(&mut ctx, &crossing).unwrap();
        assert_eq!(resp.taker_coin_out, Coin::new("TokenA", 10_000));
        assert_eq!(resp.taker_coin_in, Coin::new("TokenB", 10_011));
        assert!(!resp.tranche_key.is_empty());
        assert_eq!(resp.coin_in, Coin::new("TokenB", 20_000));
    }

    #[test]
    fn test_fok_not_filled_leaves_book_untouched() {
        let mut store = MemStore::new();
        let gas = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(1, 0));
        let keeper: Keeper = Keeper::default();
        fund(&mut ctx);
        let placed = keeper
            .place_limit_order(&mut ctx, &order("alice", "TokenA", "TokenB", -10, 10, LimitOrderType::GoodTilCancelled))
            .unwrap();

        let fok = order("bob", "TokenB", "TokenA", 10, 100, LimitOrderType::FillOrKill);
        let result = ctx.with_branch(|child| keeper.place_limit_order(child, &fok));
        assert_eq!(result, Err(DexError::FoKLimitOrderNotFilled));
        let tranche = keeper.tranche(&ctx, &maker_key(&placed.tranche_key)).unwrap().unwrap();
        assert_eq!(tranche.reserves_maker_denom, 10);
    }

    #[test]
    fn test_taker_only_without_liquidity() {
        let mut store = MemStore::new();
        let gas = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(1, 0));
        let keeper: Keeper = Keeper::default();
        fund(&mut ctx);
        let ioc = order("bob", "TokenB", "TokenA", 0, 10, LimitOrderType::ImmediateOrCancel);
        assert_eq!(keeper.place_limit_order(&mut ctx, &ioc), Err(DexError::NoLiquidity));
    }

    #[test]
    fn test_gtc_orders_share_tranche_and_cancel_keeps_ratio() {
        let mut store = MemStore::new();
        let gas = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(1, 0));
        let keeper: Keeper = Keeper::default();
        fund(&mut ctx);

        let a = keeper
            .place_limit_order(&mut ctx, &order("alice", "TokenA", "TokenB", 0, 100, LimitOrderType::GoodTilCancelled))
            .unwrap();
        let c = keeper
            .place_limit_order(&mut ctx, &order("carol", "TokenA", "TokenB", 0, 100, LimitOrderType::GoodTilCancelled))
            .unwrap();
        assert_eq!(a.tranche_key, c.tranche_key);

        // half of the tranche gets filled
        keeper
            .place_limit_order(&mut ctx, &order("bob", "TokenB", "TokenA", 0, 100, LimitOrderType::ImmediateOrCancel))
            .unwrap();

        let cancelled = keeper
            .cancel_limit_order(
                &mut ctx,
                &MsgCancelLimitOrder {
                    creator: "alice".to_string(),
                    tranche_key: a.tranche_key.clone(),
                },
            )
            .unwrap();
        assert_eq!(cancelled.maker_coin_out, Coin::new("TokenA", 50));
        assert_eq!(cancelled.taker_coin_out, Coin::new("TokenB", 50));
        assert!(keeper.tranche_user(&ctx, "alice", &a.tranche_key).unwrap().is_none());

        let key = LimitOrderTrancheKey {
            trade_pair_id: TradePairID::new("TokenB", "TokenA").unwrap(),
            tick_index_taker_to_maker: 0,
            tranche_key: a.tranche_key.clone(),
        };
        let tranche = keeper.tranche(&ctx, &key).unwrap().unwrap();
        assert_eq!(tranche.reserves_maker_denom, 50);
        assert_eq!(tranche.ratio_filled().unwrap(), PrecDec::from_ratio(1, 2).unwrap());

        let carol = keeper
            .withdraw_filled_limit_order(
                &mut ctx,
                &MsgWithdrawFilledLimitOrder {
                    creator: "carol".to_string(),
                    tranche_key: c.tranche_key.clone(),
                },
            )
            .unwrap();
        assert_eq!(carol.taker_coin_out, Coin::new("TokenB", 50));
    }

    #[test]
    fn test_cancel_unknown_and_empty() {
        let mut store = MemStore::new();
        let gas = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(1, 0));
        let keeper: Keeper = Keeper::default();
        fund(&mut ctx);
        let cancel = MsgCancelLimitOrder {
            creator: "alice".to_string(),
            tranche_key: "nope".to_string(),
        };
        assert_eq!(
            keeper.cancel_limit_order(&mut ctx, &cancel),
            Err(DexError::ActiveLimitOrderNotFound("nope".to_string()))
        );

        let placed = keeper
            .place_limit_order(&mut ctx, &order("alice", "TokenA", "TokenB", 0, 100, LimitOrderType::GoodTilCancelled))
            .unwrap();
        let withdraw = MsgWithdrawFilledLimitOrder {
            creator: "alice".to_string(),
            tranche_key: placed.tranche_key,
        };
        assert_eq!(
            keeper.withdraw_filled_limit_order(&mut ctx, &withdraw),
            Err(DexError::WithdrawEmptyLimitOrder)
        );
    }

    #[test]
    fn test_good_til_registers_expiration() {
        let mut store = MemStore::new();
        let gas = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(1, 100));
        let keeper: Keeper = Keeper::default();
        fund(&mut ctx);

        let mut msg = order("alice", "TokenA", "TokenB", 0, 10, LimitOrderType::GoodTilTime);
        msg.expiration_time = Some(500);
        let resp = keeper.place_limit_order(&mut ctx, &msg).unwrap();
        let expirations = keeper.all_expirations(&ctx).unwrap();
        assert_eq!(expirations.len(), 1);
        assert_eq!(expirations[0].expiration_time, 500);
        assert_eq!(expirations[0].tranche_key.tranche_key, resp.tranche_key);
    }

    #[test]
    fn test_jit_budget_enforced() {
        let mut store = MemStore::new();
        let gas = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(1, 0));
        let keeper: Keeper = Keeper::default();
        fund(&mut ctx);
        let mut params = keeper.params(&ctx).unwrap();
        params.max_jits_per_block = 1;
        keeper.set_params(&mut ctx, &params).unwrap();

        let jit = order("alice", "TokenA", "TokenB", 0, 10, LimitOrderType::JustInTime);
        keeper.place_limit_order(&mut ctx, &jit).unwrap();
        assert_eq!(keeper.place_limit_order(&mut ctx, &jit), Err(DexError::OverJITPerBlockLimit));
    }
}
