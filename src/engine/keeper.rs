//! State access for the exchange.
//!
//! ## Layout
//!
//! | Prefix                              | Value                          |
//! |-------------------------------------|--------------------------------|
//! | `TickLiquidity/value/`              | [`TickLiquidity`] (pool sides and active tranches) |
//! | `InactiveLimitOrderTranche/value/`  | drained or expired tranches    |
//! | `LimitOrderTrancheUser/value/`      | user positions by address      |
//! | `LimitOrderExpiration/value/`       | pending expiries by time       |
//! | `Pool/id/`, `PoolMetadata/value/`   | pool registry                  |
//! | `Pool/count/`, `LimitOrderTranche/nonce/`, `JITsInBlock/count/` | counters |
//! | `Params/value/`                     | [`Params`]                     |
//!
//! Drained pool sides are removed from the tick index; the pool itself
//! stays registered and is rebuilt with empty reserves on the next lookup.

use tracing::debug;

use crate::engine::bank::{BankKeeper, StoreBank};
use crate::engine::context::Context;
use crate::error::{DexError, DexResult};
use crate::types::events::DexEvent;
use crate::types::keys;
use crate::types::liquidity::TickLiquidity;
use crate::types::metadata::{LimitOrderExpiration, PoolMetadata};
use crate::types::order_type::LimitOrderType;
use crate::types::pair::{PairID, TradePairID};
use crate::types::params::Params;
use crate::types::pool::Pool;
use crate::types::pool_reserves::{PoolReserves, PoolReservesKey};
use crate::types::tranche::{LimitOrderTranche, LimitOrderTrancheKey, JIT_EXPIRATION};
use crate::types::tranche_user::LimitOrderTrancheUser;

/// Exchange keeper over a balance ledger.
#[derive(Debug, Clone, Default)]
pub struct Keeper<B: BankKeeper = StoreBank> {
    bank: B,
}

impl<B: BankKeeper> Keeper<B> {
    pub fn new(bank: B) -> Self {
        Keeper { bank }
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    // ========================================================================
    // Params
    // ========================================================================

    /// Stored params, or the defaults before any were set.
    pub fn params(&self, ctx: &Context<'_>) -> DexResult<Params> {
        Ok(ctx
            .get_json(keys::PARAMS_KEY.as_bytes())?
            .unwrap_or_default())
    }

    pub fn set_params(&self, ctx: &mut Context<'_>, params: &Params) -> DexResult<()> {
        params.validate()?;
        ctx.set_json(keys::PARAMS_KEY.as_bytes().to_vec(), params)
    }

    // ========================================================================
    // Counters
    // ========================================================================

    fn counter(&self, ctx: &Context<'_>, key: &str) -> DexResult<u64> {
        Ok(ctx.get_json(key.as_bytes())?.unwrap_or(0))
    }

    fn set_counter(&self, ctx: &mut Context<'_>, key: &str, value: u64) -> DexResult<()> {
        ctx.set_json(key.as_bytes().to_vec(), &value)
    }

    /// Next pool id; every registered id is below it.
    pub fn pool_count(&self, ctx: &Context<'_>) -> DexResult<u64> {
        self.counter(ctx, keys::POOL_COUNT_KEY)
    }

    pub fn jits_in_block(&self, ctx: &Context<'_>) -> DexResult<u64> {
        self.counter(ctx, keys::JIT_COUNT_KEY)
    }

    pub fn increment_jits_in_block(&self, ctx: &mut Context<'_>) -> DexResult<()> {
        let count = self.jits_in_block(ctx)?;
        self.set_counter(ctx, keys::JIT_COUNT_KEY, count + 1)
    }

    pub fn reset_jits_in_block(&self, ctx: &mut Context<'_>) -> DexResult<()> {
        ctx.delete(keys::JIT_COUNT_KEY.as_bytes())
    }

    /// Fails once the block's JIT budget is spent.
    pub fn assert_can_place_jit(&self, ctx: &Context<'_>) -> DexResult<()> {
        let params = self.params(ctx)?;
        if self.jits_in_block(ctx)? >= params.max_jits_per_block {
            return Err(DexError::OverJITPerBlockLimit);
        }
        Ok(())
    }

    /// Fresh tranche key for the current block.
    pub fn next_tranche_key(&self, ctx: &mut Context<'_>) -> DexResult<String> {
        let nonce = self.counter(ctx, keys::TRANCHE_NONCE_KEY)?;
        self.set_counter(ctx, keys::TRANCHE_NONCE_KEY, nonce + 1)?;
        Ok(keys::new_tranche_key(ctx.block().height, nonce))
    }

    // ========================================================================
    // Pools
    // ========================================================================

    pub fn pool_id(&self, ctx: &Context<'_>, pair: &PairID, center_tick: i64, fee: u64) -> DexResult<Option<u64>> {
        ctx.get_json(&keys::pool_id_store_key(pair, center_tick, fee))
    }

    pub fn pool_metadata(&self, ctx: &Context<'_>, id: u64) -> DexResult<Option<PoolMetadata>> {
        ctx.get_json(&keys::pool_metadata_store_key(id))
    }

    pub fn all_pool_metadata(&self, ctx: &Context<'_>) -> DexResult<Vec<PoolMetadata>> {
        ctx.scan_json(keys::POOL_METADATA_PREFIX.as_bytes())
    }

    pub fn pool_reserves(&self, ctx: &Context<'_>, key: &PoolReservesKey) -> DexResult<Option<PoolReserves>> {
        match ctx.get_json::<TickLiquidity>(&key.store_key())? {
            Some(TickLiquidity::PoolReserves(reserves)) => Ok(Some(reserves)),
            Some(TickLiquidity::LimitOrderTranche(_)) => Err(DexError::CorruptState {
                key: String::from_utf8_lossy(&key.store_key()).into_owned(),
                reason: "expected pool reserves".to_string(),
            }),
            None => Ok(None),
        }
    }

    /// Registered pool with its current reserves.
    pub fn pool(&self, ctx: &Context<'_>, pair: &PairID, center_tick: i64, fee: u64) -> DexResult<Option<Pool>> {
        let id = match self.pool_id(ctx, pair, center_tick, fee)? {
            Some(id) => id,
            None => return Ok(None),
        };
        let mut pool = Pool::new(pair, center_tick, fee, id)?;
        if let Some(reserves) = self.pool_reserves(ctx, &pool.lower_tick0.key)? {
            pool.lower_tick0 = reserves;
        }
        if let Some(reserves) = self.pool_reserves(ctx, &pool.upper_tick1.key)? {
            pool.upper_tick1 = reserves;
        }
        Ok(Some(pool))
    }

    pub fn pool_by_id(&self, ctx: &Context<'_>, id: u64) -> DexResult<Option<Pool>> {
        match self.pool_metadata(ctx, id)? {
            Some(meta) => self.pool(ctx, &meta.pair_id, meta.tick, meta.fee),
            None => Ok(None),
        }
    }

    /// Existing pool, or a newly registered empty one.
    pub fn get_or_init_pool(&self, ctx: &mut Context<'_>, pair: &PairID, center_tick: i64, fee: u64) -> DexResult<Pool> {
        if let Some(pool) = self.pool(ctx, pair, center_tick, fee)? {
            return Ok(pool);
        }
        let id = self.pool_count(ctx)?;
        let pool = Pool::new(pair, center_tick, fee, id)?;
        self.set_counter(ctx, keys::POOL_COUNT_KEY, id + 1)?;
        ctx.set_json(keys::pool_id_store_key(pair, center_tick, fee), &id)?;
        let meta = PoolMetadata {
            id,
            tick: center_tick,
            fee,
            pair_id: pair.clone(),
        };
        ctx.set_json(meta.store_key(), &meta)?;
        debug!(pool_id = id, pair = %pair, tick = center_tick, fee, "pool registered");
        Ok(pool)
    }

    /// Persist both sides of a pool.
    pub fn set_pool(&self, ctx: &mut Context<'_>, pool: &Pool) -> DexResult<()> {
        self.set_pool_reserves(ctx, &pool.lower_tick0)?;
        self.set_pool_reserves(ctx, &pool.upper_tick1)
    }

    fn set_pool_reserves(&self, ctx: &mut Context<'_>, reserves: &PoolReserves) -> DexResult<()> {
        let key = reserves.key.store_key();
        let existed = ctx.has(&key)?;
        if reserves.has_token() {
            ctx.set_json(key, &TickLiquidity::PoolReserves(reserves.clone()))?;
        } else if existed {
            ctx.delete(&key)?;
        } else {
            return Ok(());
        }
        ctx.emit(DexEvent::TickUpdate {
            trade_pair_id: reserves.key.trade_pair_id.clone(),
            tick_index: reserves.key.tick_index_taker_to_maker,
            fee: Some(reserves.key.fee),
            tranche_key: None,
            reserves: reserves.reserves_maker_denom,
        });
        Ok(())
    }

    // ========================================================================
    // Tranches
    // ========================================================================

    pub fn tranche(&self, ctx: &Context<'_>, key: &LimitOrderTrancheKey) -> DexResult<Option<LimitOrderTranche>> {
        match ctx.get_json::<TickLiquidity>(&key.store_key())? {
            Some(TickLiquidity::LimitOrderTranche(tranche)) => Ok(Some(tranche)),
            Some(TickLiquidity::PoolReserves(_)) => Err(DexError::CorruptState {
                key: String::from_utf8_lossy(&key.store_key()).into_owned(),
                reason: "expected limit order tranche".to_string(),
            }),
            None => Ok(None),
        }
    }

    pub fn inactive_tranche(&self, ctx: &Context<'_>, key: &LimitOrderTrancheKey) -> DexResult<Option<LimitOrderTranche>> {
        ctx.get_json(&key.inactive_store_key())
    }

    pub fn all_inactive_tranches(&self, ctx: &Context<'_>) -> DexResult<Vec<LimitOrderTranche>> {
        ctx.scan_json(keys::INACTIVE_TRANCHE_PREFIX.as_bytes())
    }

    /// Active tranches at one tick, in tranche key order.
    pub fn tranches_at_tick(&self, ctx: &Context<'_>, trade_pair: &TradePairID, tick: i64) -> DexResult<Vec<LimitOrderTranche>> {
        let prefix = keys::tick_liquidity_limit_order_prefix(trade_pair, tick);
        ctx.scan_json::<TickLiquidity>(&prefix)?
            .into_iter()
            .map(|liq| match liq {
                TickLiquidity::LimitOrderTranche(t) => Ok(t),
                TickLiquidity::PoolReserves(r) => Err(DexError::CorruptState {
                    key: String::from_utf8_lossy(&r.key.store_key()).into_owned(),
                    reason: "pool reserves under tranche prefix".to_string(),
                }),
            })
            .collect()
    }

    /// Store a tranche; one with no maker reserves moves to the inactive store.
    pub fn save_tranche(&self, ctx: &mut Context<'_>, tranche: &LimitOrderTranche) -> DexResult<()> {
        if tranche.has_token_in() {
            ctx.set_json(tranche.key.store_key(), &TickLiquidity::LimitOrderTranche(tranche.clone()))?;
        } else {
            ctx.delete(&tranche.key.store_key())?;
            self.save_inactive_tranche(ctx, tranche)?;
        }
        self.emit_tranche_update(ctx, tranche);
        Ok(())
    }

    /// Store an inactive tranche, dropping it once nothing is left to claim.
    pub fn save_inactive_tranche(&self, ctx: &mut Context<'_>, tranche: &LimitOrderTranche) -> DexResult<()> {
        if tranche.has_token_in() || tranche.has_token_out() {
            ctx.set_json(tranche.key.inactive_store_key(), tranche)
        } else {
            ctx.delete(&tranche.key.inactive_store_key())
        }
    }

    fn emit_tranche_update(&self, ctx: &mut Context<'_>, tranche: &LimitOrderTranche) {
        ctx.emit(DexEvent::TickUpdate {
            trade_pair_id: tranche.key.trade_pair_id.clone(),
            tick_index: tranche.key.tick_index_taker_to_maker,
            fee: None,
            tranche_key: Some(tranche.key.tranche_key.clone()),
            reserves: tranche.reserves_maker_denom,
        });
    }

    /// Tranche a new maker order at `tick` should join.
    ///
    /// GTC orders join the placing GTC tranche at the tick if there is one.
    /// JIT and GoodTilTime orders always open a new tranche.
    pub fn get_or_init_place_tranche(
        &self,
        ctx: &mut Context<'_>,
        trade_pair: &TradePairID,
        tick: i64,
        order_type: LimitOrderType,
        expiration_time: Option<u64>,
    ) -> DexResult<LimitOrderTranche> {
        if order_type.is_gtc() {
            let existing = self
                .tranches_at_tick(ctx, trade_pair, tick)?
                .into_iter()
                .find(|t| t.is_placing() && t.expiration_time.is_none());
            if let Some(tranche) = existing {
                return Ok(tranche);
            }
        }
        let expiration = if order_type.is_jit() {
            Some(JIT_EXPIRATION)
        } else if order_type.is_good_til() {
            expiration_time
        } else {
            None
        };
        let key = LimitOrderTrancheKey {
            trade_pair_id: trade_pair.clone(),
            tick_index_taker_to_maker: tick,
            tranche_key: self.next_tranche_key(ctx)?,
        };
        LimitOrderTranche::new(key, expiration)
    }

    // ========================================================================
    // Tranche users
    // ========================================================================

    pub fn tranche_user(&self, ctx: &Context<'_>, address: &str, tranche_key: &str) -> DexResult<Option<LimitOrderTrancheUser>> {
        ctx.get_json(&keys::tranche_user_store_key(address, tranche_key))
    }

    pub fn tranche_users_by_address(&self, ctx: &Context<'_>, address: &str) -> DexResult<Vec<LimitOrderTrancheUser>> {
        ctx.scan_json(&keys::tranche_user_address_prefix(address))
    }

    pub fn get_or_init_tranche_user(
        &self,
        ctx: &Context<'_>,
        tranche: &LimitOrderTrancheKey,
        address: &str,
        order_type: LimitOrderType,
    ) -> DexResult<LimitOrderTrancheUser> {
        if let Some(user) = self.tranche_user(ctx, address, &tranche.tranche_key)? {
            return Ok(user);
        }
        Ok(LimitOrderTrancheUser {
            trade_pair_id: tranche.trade_pair_id.clone(),
            tick_index_taker_to_maker: tranche.tick_index_taker_to_maker,
            tranche_key: tranche.tranche_key.clone(),
            address: address.to_string(),
            shares_owned: 0,
            shares_withdrawn: 0,
            shares_cancelled: 0,
            order_type,
        })
    }

    /// Store a position, removing it once every share is accounted for.
    pub fn save_tranche_user(&self, ctx: &mut Context<'_>, user: &LimitOrderTrancheUser) -> DexResult<()> {
        if user.is_closed() {
            ctx.delete(&user.store_key())
        } else {
            ctx.set_json(user.store_key(), user)
        }
    }

    // ========================================================================
    // Expirations
    // ========================================================================

    pub fn set_expiration(&self, ctx: &mut Context<'_>, record: &LimitOrderExpiration) -> DexResult<()> {
        ctx.set_json(record.store_key(), record)
    }

    pub fn remove_expiration(&self, ctx: &mut Context<'_>, record: &LimitOrderExpiration) -> DexResult<()> {
        ctx.delete(&record.store_key())
    }

    pub fn all_expirations(&self, ctx: &Context<'_>) -> DexResult<Vec<LimitOrderExpiration>> {
        ctx.scan_json(keys::EXPIRATION_PREFIX.as_bytes())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
