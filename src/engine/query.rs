//! Read-side lookups over the exchange state.
//!
//! Point lookups return `Option`, range lookups return values in store key
//! order. Queries only read, so callers typically run them on a context that
//! is dropped without committing.

use serde::{Deserialize, Serialize};

use crate::engine::bank::BankKeeper;
use crate::engine::context::Context;
use crate::engine::keeper::Keeper;
use crate::error::{DexError, DexResult};
use crate::types::keys;
use crate::types::liquidity::TickLiquidity;
use crate::types::metadata::PoolMetadata;
use crate::types::pair::TradePairID;
use crate::types::pool::{parse_pool_id_from_denom, Pool, POOL_DENOM_PREFIX};
use crate::types::tranche::LimitOrderTranche;
use crate::types::tranche_user::LimitOrderTrancheUser;

/// Pool shares held by an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub pool: PoolMetadata,
    pub shares_owned: u128,
}

impl<B: BankKeeper> Keeper<B> {
    /// Pool addressed by its share denom.
    pub fn pool_by_denom(&self, ctx: &Context<'_>, denom: &str) -> DexResult<Option<Pool>> {
        let id = parse_pool_id_from_denom(denom)?;
        self.pool_by_id(ctx, id)
    }

    /// Registry entry addressed by a share denom.
    pub fn pool_metadata_by_denom(&self, ctx: &Context<'_>, denom: &str) -> DexResult<Option<PoolMetadata>> {
        let id = parse_pool_id_from_denom(denom)?;
        self.pool_metadata(ctx, id)
    }

    /// Every liquidity entry of `trade_pair` in swap order, drained or not.
    pub fn tick_liquidity(&self, ctx: &Context<'_>, trade_pair: &TradePairID) -> DexResult<Vec<TickLiquidity>> {
        ctx.scan_json(&keys::tick_liquidity_prefix(trade_pair))
    }

    /// Pool positions of `address`, one per share denom it holds.
    pub fn user_deposits(&self, ctx: &Context<'_>, address: &str) -> DexResult<Vec<DepositRecord>> {
        let mut records = Vec::new();
        for coin in self.bank().balances(ctx, address)? {
            if !coin.denom.starts_with(POOL_DENOM_PREFIX) {
                continue;
            }
            let pool = self
                .pool_metadata_by_denom(ctx, &coin.denom)?
                .ok_or_else(|| DexError::InvalidPoolDenom(coin.denom.clone()))?;
            records.push(DepositRecord {
                pool,
                shares_owned: coin.amount,
            });
        }
        Ok(records)
    }

    /// Open limit order positions of `address`.
    pub fn user_limit_orders(&self, ctx: &Context<'_>, address: &str) -> DexResult<Vec<LimitOrderTrancheUser>> {
        self.tranche_users_by_address(ctx, address)
    }

    /// Active tranche behind a user position, falling back to the inactive store.
    pub fn tranche_for_user(&self, ctx: &Context<'_>, user: &LimitOrderTrancheUser) -> DexResult<Option<LimitOrderTranche>> {
        let key = user.tranche_ref();
        match self.tranche(ctx, &key)? {
            Some(tranche) => Ok(Some(tranche)),
            None => self.inactive_tranche(ctx, &key),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
