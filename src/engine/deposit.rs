//! Pool liquidity deposits.
//!
//! ## Flow
//!
//! For each leg of a [`MsgDeposit`]:
//!
//! 1. The fee must be a configured tier.
//! 2. Neither side may sit behind enemy lines, i.e. offer its token below
//!    the price the opposing book already pays for it. Depending on
//!    `fail_tx_on_bel` the message fails or the leg is skipped.
//! 3. The pool is created on first use and takes the deposit; shares of the
//!    pool denom are minted to the receiver.
//!
//! The creator pays the summed amounts of every accepted leg at the end.

use tracing::{debug, info};

use crate::engine::bank::BankKeeper;
use crate::engine::context::Context;
use crate::engine::keeper::Keeper;
use crate::engine::swap::best_tick;
use crate::error::{DexError, DexResult};
use crate::types::coin::Coin;
use crate::types::events::DexEvent;
use crate::types::messages::{FailedDeposit, MsgDeposit, MsgDepositResponse, NormalizedDeposit};
use crate::types::pair::{PairID, TradePairID};

impl<B: BankKeeper> Keeper<B> {
    /// Execute a deposit message.
    pub fn deposit(&self, ctx: &mut Context<'_>, msg: &MsgDeposit) -> DexResult<MsgDepositResponse> {
        let params = self.params(ctx)?;
        let pair = msg.pair_id()?;
        let legs = msg.normalized()?;

        let mut response = MsgDepositResponse {
            reserve0_deposited: vec![0; legs.len()],
            reserve1_deposited: vec![0; legs.len()],
            shares_issued: Vec::new(),
            failed_deposits: Vec::new(),
        };
        let mut total0: u128 = 0;
        let mut total1: u128 = 0;

        for (idx, leg) in legs.iter().enumerate() {
            if !params.is_valid_fee(leg.fee) {
                return Err(DexError::InvalidFee(leg.fee));
            }
            if self.is_pool_behind_enemy_lines(ctx, &pair, leg)? {
                let err = DexError::DepositBehindEnemyLines {
                    tick: leg.tick_index,
                    fee: leg.fee,
                };
                if leg.options.fail_tx_on_bel {
                    return Err(err);
                }
                debug!(deposit_idx = idx, tick = leg.tick_index, fee = leg.fee, "deposit leg skipped");
                response.failed_deposits.push(FailedDeposit {
                    deposit_idx: idx,
                    error: err.to_string(),
                });
                continue;
            }

            let mut pool = self.get_or_init_pool(ctx, &pair, leg.tick_index, leg.fee)?;
            let denom = pool.pool_denom();
            let existing_shares = self.bank().supply(ctx, &denom)?;
            let deposited = pool.deposit(
                leg.amount0,
                leg.amount1,
                existing_shares,
                !leg.options.disable_autoswap,
            )?;
            if deposited.in_amount0 == 0 && deposited.in_amount1 == 0 {
                return Err(DexError::ZeroTrueDeposit);
            }
            if deposited.shares_minted == 0 {
                return Err(DexError::DepositShareUnderflow);
            }
            self.set_pool(ctx, &pool)?;

            let shares = Coin::new(denom, deposited.shares_minted);
            self.bank().mint(ctx, &msg.receiver, &shares)?;
            merge_coin(&mut response.shares_issued, shares);

            response.reserve0_deposited[idx] = deposited.in_amount0;
            response.reserve1_deposited[idx] = deposited.in_amount1;
            total0 = total0.checked_add(deposited.in_amount0).ok_or(DexError::Overflow)?;
            total1 = total1.checked_add(deposited.in_amount1).ok_or(DexError::Overflow)?;

            ctx.emit(DexEvent::Deposit {
                creator: msg.creator.clone(),
                receiver: msg.receiver.clone(),
                token0: pair.token0.clone(),
                token1: pair.token1.clone(),
                tick_index: leg.tick_index,
                fee: leg.fee,
                reserves0_deposited: deposited.in_amount0,
                reserves1_deposited: deposited.in_amount1,
                shares_minted: deposited.shares_minted,
            });
        }

        self.bank()
            .send_to_module(ctx, &msg.creator, &Coin::new(pair.token0.clone(), total0))?;
        self.bank()
            .send_to_module(ctx, &msg.creator, &Coin::new(pair.token1.clone(), total1))?;

        info!(
            creator = %msg.creator,
            pair = %pair,
            legs = legs.len(),
            failed = response.failed_deposits.len(),
            amount0 = total0,
            amount1 = total1,
            "deposit"
        );
        Ok(response)
    }

    /// Whether a side the leg deposits into undercuts the opposing book.
    ///
    /// A maker side at taker-to-maker tick `T` is behind enemy lines when the
    /// best tick `E` of the reversed trade pair satisfies `-T > E`.
    pub fn is_pool_behind_enemy_lines(
        &self,
        ctx: &Context<'_>,
        pair: &PairID,
        leg: &NormalizedDeposit,
    ) -> DexResult<bool> {
        let fee = leg.fee as i64;
        if leg.amount0 > 0 {
            // LowerTick0: token0 maker at T = fee - center
            let maker0 = pair.trade_pair_for_maker(&pair.token0);
            if is_behind_enemy_lines(ctx, &maker0, fee - leg.tick_index)? {
                return Ok(true);
            }
        }
        if leg.amount1 > 0 {
            // UpperTick1: token1 maker at T = center + fee
            let maker1 = pair.trade_pair_for_maker(&pair.token1);
            if is_behind_enemy_lines(ctx, &maker1, leg.tick_index + fee)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn is_behind_enemy_lines(ctx: &Context<'_>, trade_pair: &TradePairID, tick: i64) -> DexResult<bool> {
    Ok(match best_tick(ctx, &trade_pair.reversed())? {
        Some(opposite) => -tick > opposite,
        None => false,
    })
}

/// Add `coin` to `coins`, merging with an existing entry of the same denom.
pub(crate) fn merge_coin(coins: &mut Vec<Coin>, coin: Coin) {
    if coin.is_zero() {
        return;
    }
    match coins.iter_mut().find(|c| c.denom == coin.denom) {
        Some(existing) => existing.amount = existing.amount.saturating_add(coin.amount),
        None => coins.push(coin),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
