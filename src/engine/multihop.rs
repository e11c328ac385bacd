//! Multi-hop routed swaps.
//!
//! ## Route trials
//!
//! Every candidate route runs in its own branch of the message context:
//!
//! ```text
//! for route in routes:
//!     branch = ctx.branch()
//!     run hops in branch      -> Ok(out)  keep (out, branch writes)
//!                             -> Err(e)   drop branch, remember e
//!     first success wins unless pick_best_route
//! apply the kept writes to ctx
//! ```
//!
//! With `pick_best_route` every route is tried and the strictly largest
//! output wins, ties going to the earlier route.
//!
//! ## Pricing
//!
//! Before each hop the route is abandoned when even the best quotes of the
//! remaining hops could not reach `exit_limit_price`. After the last hop the
//! realized price `out / amount_in` is checked against the same limit.

use tracing::{debug, info};

use crate::engine::bank::BankKeeper;
use crate::engine::context::{Context, WriteSet};
use crate::engine::deposit::merge_coin;
use crate::engine::keeper::Keeper;
use crate::engine::swap::{best_price, swap};
use crate::error::{DexError, DexResult};
use crate::types::coin::Coin;
use crate::types::events::DexEvent;
use crate::types::messages::{MsgMultiHopSwap, MsgMultiHopSwapResponse, MultiHopRoute};
use crate::types::pair::TradePairID;
use crate::types::prec_dec::PrecDec;

/// Result of one successful route trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOutcome {
    pub coin_out: Coin,
    pub dust: Vec<Coin>,
}

impl<B: BankKeeper> Keeper<B> {
    /// Execute a multi-hop swap message.
    pub fn multi_hop_swap(&self, ctx: &mut Context<'_>, msg: &MsgMultiHopSwap) -> DexResult<MsgMultiHopSwapResponse> {
        let mut best: Option<(usize, RouteOutcome, WriteSet)> = None;
        let mut failures = Vec::new();

        for (idx, route) in msg.routes.iter().enumerate() {
            let mut branch = ctx.branch();
            match self.run_route(&mut branch, route, msg.amount_in, msg.exit_limit_price) {
                Ok(outcome) => {
                    debug!(route = idx, amount_out = outcome.coin_out.amount, "route succeeded");
                    let better = match &best {
                        Some((_, current, _)) => outcome.coin_out.amount > current.coin_out.amount,
                        None => true,
                    };
                    if better {
                        best = Some((idx, outcome, branch.into_write_set()));
                    }
                    if !msg.pick_best_route {
                        break;
                    }
                }
                Err(err) if err.is_engine_fault() => return Err(err),
                Err(err) => {
                    debug!(route = idx, error = %err, "route failed");
                    failures.push(err);
                }
            }
        }

        let (idx, outcome, writes) = best.ok_or(DexError::AllMultiHopRoutesFailed(failures))?;
        ctx.apply(writes);

        let route = msg.routes[idx].clone();
        let entry = route.hops.first().cloned().unwrap_or_default();
        self.bank()
            .send_to_module(ctx, &msg.creator, &Coin::new(entry.clone(), msg.amount_in))?;
        self.bank().send_from_module(ctx, &msg.receiver, &outcome.coin_out)?;
        for coin in &outcome.dust {
            self.bank().send_from_module(ctx, &msg.receiver, coin)?;
        }

        ctx.emit(DexEvent::MultihopSwap {
            creator: msg.creator.clone(),
            receiver: msg.receiver.clone(),
            token_in: entry,
            token_out: outcome.coin_out.denom.clone(),
            amount_in: msg.amount_in,
            amount_out: outcome.coin_out.amount,
            route: route.hops.clone(),
            dust: outcome.dust.clone(),
        });
        info!(
            creator = %msg.creator,
            route = idx,
            amount_in = msg.amount_in,
            amount_out = outcome.coin_out.amount,
            "multihop swap"
        );

        Ok(MsgMultiHopSwapResponse {
            coin_out: outcome.coin_out,
            route,
            dust: outcome.dust,
        })
    }

    /// Swap `amount_in` along `route`, feeding each hop's output to the next.
    pub fn run_route(
        &self,
        ctx: &mut Context<'_>,
        route: &MultiHopRoute,
        amount_in: u128,
        exit_limit_price: PrecDec,
    ) -> DexResult<RouteOutcome> {
        let mut current_price = PrecDec::one();
        let mut amount = amount_in;
        let mut dust = Vec::new();
        let mut out_denom = String::new();

        for (i, hop) in route.hops.windows(2).enumerate() {
            let reachable = current_price.try_mul(best_route_price(ctx, &route.hops[i..])?)?;
            if exit_limit_price > reachable {
                return Err(DexError::LimitPriceNotSatisfied);
            }

            let trade_pair = TradePairID::new(&hop[0], &hop[1])?;
            let swapped = swap(self, ctx, &trade_pair, amount, None, None)?;
            if swapped.amount_in == 0 || swapped.amount_out == 0 || !swapped.order_filled {
                return Err(DexError::NoLiquidity);
            }
            merge_coin(&mut dust, Coin::new(hop[0].clone(), amount - swapped.amount_in));

            amount = swapped.amount_out;
            out_denom = hop[1].clone();
            current_price = PrecDec::from_ratio(amount, amount_in)?;
        }

        if exit_limit_price > current_price {
            return Err(DexError::LimitPriceNotSatisfied);
        }
        Ok(RouteOutcome {
            coin_out: Coin::new(out_denom, amount),
            dust,
        })
    }
}

/// Product of the best quotes along `hops`.
fn best_route_price(ctx: &Context<'_>, hops: &[String]) -> DexResult<PrecDec> {
    let mut price = PrecDec::one();
    for hop in hops.windows(2) {
        let trade_pair = TradePairID::new(&hop[0], &hop[1])?;
        let best = best_price(ctx, &trade_pair)?.ok_or(DexError::NoLiquidity)?;
        price = price.try_mul(best)?;
    }
    Ok(price)
}

// ============================================================================
// Unit Tests
// ============================================================================
