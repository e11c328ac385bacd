//! Pool liquidity withdrawals.
//!
//! Shares are burned from the creator and the redeemed reserves go to the
//! receiver. Withdrawals address pools either by `(pair, tick, fee)` or by
//! their share denom.

use std::collections::BTreeMap;

use tracing::info;

use crate::engine::bank::BankKeeper;
use crate::engine::context::Context;
use crate::engine::keeper::Keeper;
use crate::error::{DexError, DexResult};
use crate::types::coin::Coin;
use crate::types::events::DexEvent;
use crate::types::messages::{MsgWithdrawal, MsgWithdrawalResponse, MsgWithdrawalWithShares};
use crate::types::pool::{parse_pool_id_from_denom, Pool};

impl<B: BankKeeper> Keeper<B> {
    /// Execute a withdrawal by `(tick, fee)` legs of one pair.
    pub fn withdraw(&self, ctx: &mut Context<'_>, msg: &MsgWithdrawal) -> DexResult<MsgWithdrawalResponse> {
        let pair = msg.pair_id()?;
        let mut total0: u128 = 0;
        let mut total1: u128 = 0;
        let mut shares_burned = Vec::new();

        for (shares, tick, fee) in msg.normalized()? {
            let mut pool = self.get_or_init_pool(ctx, &pair, tick, fee)?;
            let (out0, out1) = self.withdraw_from_pool(ctx, &msg.creator, &msg.receiver, &mut pool, shares)?;
            total0 = total0.checked_add(out0).ok_or(DexError::Overflow)?;
            total1 = total1.checked_add(out1).ok_or(DexError::Overflow)?;
            shares_burned.push(Coin::new(pool.pool_denom(), shares));
        }

        let coins_withdrawn: Vec<Coin> = [
            Coin::new(pair.token0.clone(), total0),
            Coin::new(pair.token1.clone(), total1),
        ]
        .into_iter()
        .filter(Coin::is_positive)
        .collect();
        for coin in &coins_withdrawn {
            self.bank().send_from_module(ctx, &msg.receiver, coin)?;
        }

        info!(creator = %msg.creator, pair = %pair, amount0 = total0, amount1 = total1, "withdraw");
        Ok(MsgWithdrawalResponse {
            reserve0_withdrawn: total0,
            reserve1_withdrawn: total1,
            coins_withdrawn,
            shares_burned,
        })
    }

    /// Execute a withdrawal addressed by pool share denoms.
    ///
    /// Pools may belong to different pairs, so the result is reported as
    /// coins aggregated by denom. The reserve totals sum each pool's own
    /// token0 and token1 sides.
    pub fn withdraw_with_shares(
        &self,
        ctx: &mut Context<'_>,
        msg: &MsgWithdrawalWithShares,
    ) -> DexResult<MsgWithdrawalResponse> {
        let mut withdrawn: BTreeMap<String, u128> = BTreeMap::new();
        let mut total0: u128 = 0;
        let mut total1: u128 = 0;
        let mut shares_burned = Vec::new();

        for share in &msg.shares_to_remove {
            let id = parse_pool_id_from_denom(&share.denom)?;
            let mut pool = self
                .pool_by_id(ctx, id)?
                .ok_or_else(|| DexError::InvalidPoolDenom(share.denom.clone()))?;
            let (out0, out1) =
                self.withdraw_from_pool(ctx, &msg.creator, &msg.receiver, &mut pool, share.amount)?;
            total0 = total0.checked_add(out0).ok_or(DexError::Overflow)?;
            total1 = total1.checked_add(out1).ok_or(DexError::Overflow)?;
            let pair = pool.pair_id();
            for (denom, amount) in [(pair.token0, out0), (pair.token1, out1)] {
                let entry = withdrawn.entry(denom).or_insert(0);
                *entry = entry.checked_add(amount).ok_or(DexError::Overflow)?;
            }
            shares_burned.push(share.clone());
        }

        let coins_withdrawn: Vec<Coin> = withdrawn
            .into_iter()
            .map(|(denom, amount)| Coin::new(denom, amount))
            .filter(Coin::is_positive)
            .collect();
        for coin in &coins_withdrawn {
            self.bank().send_from_module(ctx, &msg.receiver, coin)?;
        }

        info!(creator = %msg.creator, pools = shares_burned.len(), "withdraw with shares");
        Ok(MsgWithdrawalResponse {
            reserve0_withdrawn: total0,
            reserve1_withdrawn: total1,
            coins_withdrawn,
            shares_burned,
        })
    }

    /// Burn `shares` of `pool` held by `creator` and take out their reserves.
    fn withdraw_from_pool(
        &self,
        ctx: &mut Context<'_>,
        creator: &str,
        receiver: &str,
        pool: &mut Pool,
        shares: u128,
    ) -> DexResult<(u128, u128)> {
        let denom = pool.pool_denom();
        let owned = self.bank().balance(ctx, creator, &denom)?;
        if owned < shares {
            return Err(DexError::InsufficientShares {
                address: creator.to_string(),
                shares,
                denom,
            });
        }
        let total_shares = self.bank().supply(ctx, &denom)?;
        let (out0, out1) = pool.withdraw(shares, total_shares)?;
        self.set_pool(ctx, pool)?;
        self.bank().burn(ctx, creator, &Coin::new(denom, shares))?;

        let pair = pool.pair_id();
        ctx.emit(DexEvent::Withdraw {
            creator: creator.to_string(),
            receiver: receiver.to_string(),
            token0: pair.token0,
            token1: pair.token1,
            tick_index: pool.center_tick_index(),
            fee: pool.fee(),
            reserves0_withdrawn: out0,
            reserves1_withdrawn: out1,
            shares_removed: shares,
        });
        Ok((out0, out1))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
