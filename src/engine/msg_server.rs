//! Message dispatch.
//!
//! ## Pipeline
//!
//! ```text
//! DexMsg
//!   -> paused?            DexPaused
//!   -> validate_basic()   structural errors
//!   -> GoodTil in future? ExpirationTimeInPast
//!   -> keeper call in a branch, applied only on success
//! ```
//!
//! Simulation runs the same pipeline in a branch that is always discarded.

use tracing::{debug, info};

use crate::engine::bank::{BankKeeper, StoreBank};
use crate::engine::context::Context;
use crate::engine::keeper::Keeper;
use crate::error::{DexError, DexResult};
use crate::types::messages::{
    DexMsg, DexResponse, MsgDeposit, MsgDepositResponse, MsgMultiHopSwap, MsgMultiHopSwapResponse,
    MsgPlaceLimitOrder, MsgPlaceLimitOrderResponse, MsgWithdrawal, MsgWithdrawalResponse,
};

/// Front door of the exchange: checks and routes messages to the [`Keeper`].
#[derive(Debug, Clone, Default)]
pub struct MsgServer<B: BankKeeper = StoreBank> {
    keeper: Keeper<B>,
}

impl<B: BankKeeper> MsgServer<B> {
    pub fn new(keeper: Keeper<B>) -> Self {
        MsgServer { keeper }
    }

    pub fn keeper(&self) -> &Keeper<B> {
        &self.keeper
    }

    /// Check and execute one message.
    ///
    /// # Returns
    ///
    /// The handler response; on error `ctx` is left exactly as it was.
    pub fn handle(&self, ctx: &mut Context<'_>, msg: &DexMsg) -> DexResult<DexResponse> {
        let result = self
            .check(ctx, msg)
            .and_then(|()| ctx.with_branch(|branch| self.dispatch(branch, msg)));
        match &result {
            Ok(_) => debug!(msg = msg.name(), gas_used = ctx.gas().consumed(), "message executed"),
            Err(err) => info!(msg = msg.name(), code = err.code(), error = %err, "message rejected"),
        }
        result
    }

    /// Stateless and policy checks run before any write.
    fn check(&self, ctx: &Context<'_>, msg: &DexMsg) -> DexResult<()> {
        if self.keeper.params(ctx)?.paused {
            return Err(DexError::DexPaused);
        }
        msg.validate_basic()?;
        if let DexMsg::PlaceLimitOrder(order) = msg {
            order.validate_good_til_expiration(ctx.block().time)?;
        }
        Ok(())
    }

    fn dispatch(&self, ctx: &mut Context<'_>, msg: &DexMsg) -> DexResult<DexResponse> {
        Ok(match msg {
            DexMsg::Deposit(m) => DexResponse::Deposit(self.keeper.deposit(ctx, m)?),
            DexMsg::Withdrawal(m) => DexResponse::Withdrawal(self.keeper.withdraw(ctx, m)?),
            DexMsg::WithdrawalWithShares(m) => DexResponse::Withdrawal(self.keeper.withdraw_with_shares(ctx, m)?),
            DexMsg::PlaceLimitOrder(m) => DexResponse::PlaceLimitOrder(self.keeper.place_limit_order(ctx, m)?),
            DexMsg::CancelLimitOrder(m) => DexResponse::CancelLimitOrder(self.keeper.cancel_limit_order(ctx, m)?),
            DexMsg::WithdrawFilledLimitOrder(m) => {
                DexResponse::WithdrawFilledLimitOrder(self.keeper.withdraw_filled_limit_order(ctx, m)?)
            }
            DexMsg::MultiHopSwap(m) => DexResponse::MultiHopSwap(self.keeper.multi_hop_swap(ctx, m)?),
        })
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Run `msg` and throw the resulting state away.
    pub fn simulate(&self, ctx: &mut Context<'_>, msg: &DexMsg) -> DexResult<DexResponse> {
        ctx.simulate(|branch| self.handle(branch, msg))
    }

    pub fn simulate_deposit(&self, ctx: &mut Context<'_>, msg: &MsgDeposit) -> DexResult<MsgDepositResponse> {
        match self.simulate(ctx, &DexMsg::Deposit(msg.clone()))? {
            DexResponse::Deposit(resp) => Ok(resp),
            other => Err(unexpected(other)),
        }
    }

    pub fn simulate_withdrawal(&self, ctx: &mut Context<'_>, msg: &MsgWithdrawal) -> DexResult<MsgWithdrawalResponse> {
        match self.simulate(ctx, &DexMsg::Withdrawal(msg.clone()))? {
            DexResponse::Withdrawal(resp) => Ok(resp),
            other => Err(unexpected(other)),
        }
    }

    pub fn simulate_place_limit_order(
        &self,
        ctx: &mut Context<'_>,
        msg: &MsgPlaceLimitOrder,
    ) -> DexResult<MsgPlaceLimitOrderResponse> {
        match self.simulate(ctx, &DexMsg::PlaceLimitOrder(msg.clone()))? {
            DexResponse::PlaceLimitOrder(resp) => Ok(resp),
            other => Err(unexpected(other)),
        }
    }

    pub fn simulate_multi_hop_swap(
        &self,
        ctx: &mut Context<'_>,
        msg: &MsgMultiHopSwap,
    ) -> DexResult<MsgMultiHopSwapResponse> {
        match self.simulate(ctx, &DexMsg::MultiHopSwap(msg.clone()))? {
            DexResponse::MultiHopSwap(resp) => Ok(resp),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(resp: DexResponse) -> DexError {
    DexError::CorruptState {
        key: String::new(),
        reason: format!("handler returned mismatched response {:?}", resp),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
