//! Block boundary hook: JIT counter reset and expired order purge.
//!
//! Expiration records are keyed by time, with JIT orders at time zero, so
//! a single ascending walk visits every JIT record before any GoodTilTime
//! record. JIT records are always purged. Once the walk reaches GoodTilTime
//! records it stops as soon as the gas spent by the purge reaches
//! `good_til_purge_allowance`; the rest wait for a later block.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::engine::bank::BankKeeper;
use crate::engine::context::{decode, Context};
use crate::engine::keeper::Keeper;
use crate::error::DexResult;
use crate::store::{prefix_end, successor};
use crate::types::events::DexEvent;
use crate::types::keys;
use crate::types::metadata::LimitOrderExpiration;
use crate::types::tranche::JIT_EXPIRATION;

/// Outcome of a purge pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PurgeSummary {
    pub records_removed: usize,
    pub tranches_archived: usize,
    /// The gas allowance ran out before every expired record was handled.
    pub hit_limit: bool,
}

impl<B: BankKeeper> Keeper<B> {
    /// Run at the start of every block.
    pub fn begin_block(&self, ctx: &mut Context<'_>) -> DexResult<PurgeSummary> {
        self.reset_jits_in_block(ctx)?;
        let summary = self.purge_expired_limit_orders(ctx)?;
        debug!(
            height = ctx.block().height,
            removed = summary.records_removed,
            archived = summary.tranches_archived,
            "begin block"
        );
        Ok(summary)
    }

    /// Archive every tranche whose expiration is at or before the block time.
    pub fn purge_expired_limit_orders(&self, ctx: &mut Context<'_>) -> DexResult<PurgeSummary> {
        let block_time = ctx.block().time;
        let allowance = self.params(ctx)?.good_til_purge_allowance;
        let gas_cutoff = ctx.gas().consumed().saturating_add(allowance);

        let prefix = keys::EXPIRATION_PREFIX.as_bytes().to_vec();
        let end = prefix_end(&prefix);
        let mut cursor = prefix;
        let mut archived: BTreeSet<Vec<u8>> = BTreeSet::new();
        let mut in_good_til_segment = false;
        let mut summary = PurgeSummary::default();

        while let Some((key, value)) = ctx.seek(&cursor, end.as_deref())? {
            cursor = successor(&key);
            let record: LimitOrderExpiration = decode(&key, &value)?;
            if record.expiration_time > block_time {
                break;
            }

            in_good_til_segment = in_good_til_segment || record.expiration_time != JIT_EXPIRATION;
            let gas_used = ctx.gas().consumed();
            if in_good_til_segment && gas_used >= gas_cutoff {
                warn!(gas_used, "good til purge hit gas limit");
                ctx.emit(DexEvent::GoodTilPurgeHitLimit { gas_used });
                summary.hit_limit = true;
                break;
            }

            let tranche_ref = record.tranche_key.key_marshal();
            if !archived.contains(&tranche_ref) {
                if let Some(tranche) = self.tranche(ctx, &record.tranche_key)? {
                    self.save_inactive_tranche(ctx, &tranche)?;
                    ctx.delete(&tranche.key.store_key())?;
                    ctx.emit(DexEvent::TickUpdate {
                        trade_pair_id: tranche.key.trade_pair_id.clone(),
                        tick_index: tranche.key.tick_index_taker_to_maker,
                        fee: None,
                        tranche_key: Some(tranche.key.tranche_key.clone()),
                        reserves: 0,
                    });
                    summary.tranches_archived += 1;
                }
                archived.insert(tranche_ref);
            }

            ctx.delete(&key)?;
            summary.records_removed += 1;
        }

        if summary.records_removed > 0 {
            info!(
                block_time,
                removed = summary.records_removed,
                archived = summary.tranches_archived,
                "purged expired limit orders"
            );
        }
        Ok(summary)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bank::StoreBank;
    use crate::engine::context::BlockInfo;
    use crate::store::{GasMeter, MemStore};
    use crate::types::coin::Coin;
    use crate::types::messages::{MsgPlaceLimitOrder, MsgWithdrawFilledLimitOrder};
    use crate::types::order_type::LimitOrderType;
    use crate::types::params::Params;

    fn order(order_type: LimitOrderType, expiration_time: Option<u64>) -> MsgPlaceLimitOrder {
        MsgPlaceLimitOrder {
            creator: "alice".to_string(),
            receiver: "alice".to_string(),
            token_in: "TokenA".to_string(),
            token_out: "TokenB".to_string(),
            tick_index_in_to_out: Some(0),
            limit_sell_price: None,
            amount_in: 10,
            order_type,
            expiration_time,
            max_amount_out: None,
            min_average_sell_price: None,
        }
    }

    #[test]
    fn test_jit_orders_expire_next_block() {
        let mut store = MemStore::new();
        let gas = GasMeter::infinite();
        let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(1, 100));
        let keeper: Keeper = Keeper::default();
        StoreBank.mint(&mut ctx, "alice", &Coin::new("TokenA", 100)).unwrap();

        let resp = keeper
            .place_limit_order(&mut ctx, &order(LimitOrderType::JustInTime, None))
            .unwrap();
        assert_eq!(keeper.jits_in_block(&ctx).unwrap(), 1);

        let summary = keeper.begin_block(&mut ctx).unwrap();
        assert_eq!(summary.records_removed, 1);
        assert_eq!(summary.tranches_archived, 1);
        assert_eq!(keeper.jits_in_block(&ctx).unwrap(), 0);
        assert!(keeper.all_expirations(&ctx).unwrap().is_empty());

        // unfilled JIT liquidity is refunded from the inactive tranche
        let withdrawn = keeper
            .withdraw_filled_limit_order(
                &mut ctx,
                &MsgWithdrawFilledLimitOrder {
                    creator: "alice".to_string(),
                    tranche_key: resp.tranche_key,
                },
            )
            .unwrap();
        assert_eq!(withdrawn.maker_coin_out, Coin::new("TokenA", 10));
    }

    #[test]
    fn test_good_til_waits_for_expiration() {
        let mut store = MemStore::new();
        let gas = GasMeter::infinite();
        let keeper: Keeper = Keeper::default();
        {
            let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(1, 100));
            StoreBank.mint(&mut ctx, "alice", &Coin::new("TokenA", 100)).unwrap();
            keeper
                .place_limit_order(&mut ctx, &order(LimitOrderType::GoodTilTime, Some(200)))
                .unwrap();
            let summary = keeper.begin_block(&mut ctx).unwrap();
            assert_eq!(summary.records_removed, 0);
            ctx.commit();
        }
        let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(2, 200));
        let summary = keeper.begin_block(&mut ctx).unwrap();
        assert_eq!(summary.records_removed, 1);
        assert_eq!(keeper.all_inactive_tranches(&ctx).unwrap().len(), 1);
    }

    #[test]
    fn test_good_til_purge_respects_allowance() {
        let mut store = MemStore::new();
        let gas = GasMeter::infinite();
        let keeper: Keeper = Keeper::default();
        {
            let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(1, 100));
            let params = Params {
                good_til_purge_allowance: 0,
                ..Params::default()
            };
            keeper.set_params(&mut ctx, &params).unwrap();
            StoreBank.mint(&mut ctx, "alice", &Coin::new("TokenA", 100)).unwrap();
            keeper
                .place_limit_order(&mut ctx, &order(LimitOrderType::GoodTilTime, Some(150)))
                .unwrap();
            ctx.commit();
        }

        let mut ctx = Context::new(&mut store, &gas, BlockInfo::new(2, 150));
        let summary = keeper.begin_block(&mut ctx).unwrap();
        assert!(summary.hit_limit);
        assert_eq!(summary.records_removed, 0);
        assert_eq!(keeper.all_expirations(&ctx).unwrap().len(), 1);
        assert!(ctx
            .events()
            .iter()
            .any(|e| matches!(e, DexEvent::GoodTilPurgeHitLimit { .. })));
    }
}
