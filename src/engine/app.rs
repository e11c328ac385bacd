//! Block executor tying the store, the gas meter and the message server together.
//!
//! ## Block Lifecycle
//!
//! ```text
//! execute_block(height, time, msgs)
//!   begin_block      reset JIT counter, purge expired orders
//!   for msg in msgs  fresh GasMeter, handle, commit on success
//!   receipt          counts + state root
//! ```
//!
//! Every message gets its own gas meter capped at `msg_gas_limit`. A message
//! that fails (validation, handler error or `OutOfGas`) leaves the store
//! untouched and is counted as failed in the receipt.
//!
//! ## Example
//!
//! ```
//! use dark_dex::engine::DexApp;
//! use dark_dex::types::{Coin, DepositOptions, DexMsg, MsgDeposit, Params};
//!
//! let mut app = DexApp::new(Params::default()).unwrap();
//! app.fund("alice", &[Coin::new("TokenA", 100), Coin::new("TokenB", 100)]).unwrap();
//!
//! let deposit = MsgDeposit {
//!     creator: "alice".to_string(),
//!     receiver: "alice".to_string(),
//!     token_a: "TokenA".to_string(),
//!     token_b: "TokenB".to_string(),
//!     amounts_a: vec![100],
//!     amounts_b: vec![100],
//!     tick_indexes_a_to_b: vec![0],
//!     fees: vec![1],
//!     options: vec![DepositOptions::default()],
//! };
//! let (receipt, results) = app.execute_block(1, 1_700_000_000, &[DexMsg::Deposit(deposit)]).unwrap();
//! assert!(results[0].is_ok());
//! assert_eq!(receipt.msgs_ok, 1);
//! ```

use tracing::info;

use crate::engine::bank::BankKeeper;
use crate::engine::context::{BlockInfo, Context};
use crate::engine::expiration::PurgeSummary;
use crate::engine::keeper::Keeper;
use crate::engine::msg_server::MsgServer;
use crate::error::DexResult;
use crate::store::{GasMeter, MemStore};
use crate::types::coin::Coin;
use crate::types::events::DexEvent;
use crate::types::messages::{DexMsg, DexResponse};
use crate::types::params::Params;
use crate::types::receipt::BlockReceipt;

/// Default per-message gas limit.
pub const DEFAULT_MSG_GAS_LIMIT: u64 = 10_000_000;

/// In-memory exchange node.
#[derive(Debug)]
pub struct DexApp {
    store: MemStore,
    server: MsgServer,
    block: BlockInfo,
    msg_gas_limit: u64,
}

impl DexApp {
    /// Create an app with `params` written to a fresh store.
    pub fn new(params: Params) -> DexResult<Self> {
        let mut app = DexApp {
            store: MemStore::new(),
            server: MsgServer::default(),
            block: BlockInfo::default(),
            msg_gas_limit: DEFAULT_MSG_GAS_LIMIT,
        };
        app.set_params(&params)?;
        Ok(app)
    }

    pub fn with_msg_gas_limit(mut self, limit: u64) -> Self {
        self.msg_gas_limit = limit;
        self
    }

    pub fn keeper(&self) -> &Keeper {
        self.server.keeper()
    }

    pub fn server(&self) -> &MsgServer {
        &self.server
    }

    pub fn store(&self) -> &MemStore {
        &self.store
    }

    pub fn block(&self) -> BlockInfo {
        self.block
    }

    pub fn state_root(&self) -> [u8; 32] {
        self.store.state_root()
    }

    // ========================================================================
    // Privileged writes
    // ========================================================================

    pub fn set_params(&mut self, params: &Params) -> DexResult<()> {
        let server = &self.server;
        run_committed(&mut self.store, self.block, |ctx| server.keeper().set_params(ctx, params))?;
        Ok(())
    }

    /// Mint `coins` to `address`.
    pub fn fund(&mut self, address: &str, coins: &[Coin]) -> DexResult<()> {
        let server = &self.server;
        run_committed(&mut self.store, self.block, |ctx| {
            for coin in coins {
                server.keeper().bank().mint(ctx, address, coin)?;
            }
            Ok(())
        })?;
        Ok(())
    }

    // ========================================================================
    // Block execution
    // ========================================================================

    /// Enter a new block and run the block boundary hook.
    pub fn begin_block(&mut self, height: u64, time: u64) -> DexResult<(PurgeSummary, Vec<DexEvent>)> {
        self.block = BlockInfo::new(height, time);
        let server = &self.server;
        run_committed(&mut self.store, self.block, |ctx| server.keeper().begin_block(ctx))
    }

    /// Execute one message in the current block.
    pub fn deliver(&mut self, msg: &DexMsg) -> DexResult<(DexResponse, Vec<DexEvent>)> {
        let gas = GasMeter::new(self.msg_gas_limit);
        let mut ctx = Context::new(&mut self.store, &gas, self.block);
        let resp = self.server.handle(&mut ctx, msg)?;
        let events = ctx.commit();
        Ok((resp, events))
    }

    /// Run a whole block and summarize it.
    ///
    /// # Returns
    ///
    /// The receipt and the result of each message, in order.
    pub fn execute_block(
        &mut self,
        height: u64,
        time: u64,
        msgs: &[DexMsg],
    ) -> DexResult<(BlockReceipt, Vec<DexResult<DexResponse>>)> {
        let (_, hook_events) = self.begin_block(height, time)?;
        let mut events = hook_events.len() as u64;
        let mut msgs_ok = 0;
        let mut results = Vec::with_capacity(msgs.len());

        for msg in msgs {
            match self.deliver(msg) {
                Ok((resp, emitted)) => {
                    msgs_ok += 1;
                    events += emitted.len() as u64;
                    results.push(Ok(resp));
                }
                Err(err) => results.push(Err(err)),
            }
        }

        let receipt = BlockReceipt::new(
            height,
            time,
            msgs_ok,
            msgs.len() as u64 - msgs_ok,
            events,
            self.state_root(),
        );
        info!(
            height,
            msgs_ok = receipt.msgs_ok,
            msgs_failed = receipt.msgs_failed,
            root = %receipt.state_root_hex(),
            "block executed"
        );
        Ok((receipt, results))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Run `f` against current state; nothing it writes is kept.
    pub fn query<T, F>(&mut self, f: F) -> DexResult<T>
    where
        F: FnOnce(&MsgServer, &mut Context<'_>) -> DexResult<T>,
    {
        let gas = GasMeter::infinite();
        let mut ctx = Context::new(&mut self.store, &gas, self.block);
        f(&self.server, &mut ctx)
    }
}

/// Run `f` with an unmetered context and commit on success.
fn run_committed<T, F>(store: &mut MemStore, block: BlockInfo, f: F) -> DexResult<(T, Vec<DexEvent>)>
where
    F: FnOnce(&mut Context<'_>) -> DexResult<T>,
{
    let gas = GasMeter::infinite();
    let mut ctx = Context::new(store, &gas, block);
    let value = f(&mut ctx)?;
    Ok((value, ctx.commit()))
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DexError;
    use crate::types::messages::{DepositOptions, MsgDeposit, MsgMultiHopSwap, MultiHopRoute};
    use crate::types::prec_dec::PrecDec;

    fn deposit_msg(amount: u128) -> MsgDeposit {
        MsgDeposit {
            creator: "alice".to_string(),
            receiver: "alice".to_string(),
            token_a: "TokenA".to_string(),
            token_b: "TokenB".to_string(),
            amounts_a: vec![amount],
            amounts_b: vec![amount],
            tick_indexes_a_to_b: vec![0],
            fees: vec![1],
            options: vec![DepositOptions::default()],
        }
    }

    fn deposit(amount: u128) -> DexMsg {
        DexMsg::Deposit(deposit_msg(amount))
    }

    fn funded_app() -> DexApp {
        let mut app = DexApp::new(Params::default()).unwrap();
        app.fund("alice", &[Coin::new("TokenA", 1_000), Coin::new("TokenB", 1_000)])
            .unwrap();
        app
    }

    #[test]
    fn test_execute_block_counts_results() {
        let mut app = funded_app();
        let (receipt, results) = app
            .execute_block(1, 100, &[deposit(100), deposit(5_000), deposit(0)])
            .unwrap();
        assert_eq!(receipt.msgs_ok, 1);
        assert_eq!(receipt.msgs_failed, 2);
        assert_eq!(receipt.state_root, app.state_root());
        assert!(matches!(results[1], Err(DexError::InsufficientFunds { .. })));
    }

    #[test]
    fn test_out_of_gas_leaves_no_writes() {
        let mut app = funded_app().with_msg_gas_limit(5_000);
        let root = app.state_root();
        let err = app.deliver(&deposit(100)).unwrap_err();
        assert!(matches!(err, DexError::OutOfGas { .. }));
        assert_eq!(app.state_root(), root);
    }

    #[test]
    fn test_out_of_gas_inside_route_aborts_multihop() {
        let pool = |token_a: &str, token_b: &str| {
            let mut msg = deposit_msg(10_000);
            msg.token_a = token_a.to_string();
            msg.token_b = token_b.to_string();
            DexMsg::Deposit(msg)
        };
        let swap = DexMsg::MultiHopSwap(MsgMultiHopSwap {
            creator: "alice".to_string(),
            receiver: "alice".to_string(),
            routes: vec![
                MultiHopRoute::new(&["TokenA", "TokenB", "TokenC"]),
                MultiHopRoute::new(&["TokenA", "TokenB", "TokenC"]),
            ],
            amount_in: 100,
            exit_limit_price: PrecDec::from_ratio(1, 2).unwrap(),
            pick_best_route: true,
        });

        let mut out_of_gas = 0;
        for limit in (5_000..=200_000).step_by(5_000) {
            let mut app = DexApp::new(Params::default()).unwrap();
            let funds = [
                Coin::new("TokenA", 100_000),
                Coin::new("TokenB", 100_000),
                Coin::new("TokenC", 100_000),
            ];
            app.fund("alice", &funds).unwrap();
            app.deliver(&pool("TokenA", "TokenB")).unwrap();
            app.deliver(&pool("TokenB", "TokenC")).unwrap();

            let mut app = app.with_msg_gas_limit(limit);
            let root = app.state_root();
            match app.deliver(&swap) {
                Ok(_) => {}
                Err(DexError::OutOfGas { .. }) => {
                    out_of_gas += 1;
                    assert_eq!(app.state_root(), root);
                }
                Err(other) => panic!("limit {}: unexpected {:?}", limit, other),
            }
        }
        assert!(out_of_gas > 0);
    }

    #[test]
    fn test_query_does_not_persist() {
        let mut app = funded_app();
        app.deliver(&deposit(100)).unwrap();
        let root = app.state_root();

        let sim = app
            .query(|server, ctx| server.simulate_deposit(ctx, &deposit_msg(50)))
            .unwrap();
        assert_eq!(sim.shares_issued[0].amount, 100);
        assert_eq!(app.state_root(), root);
    }

    #[test]
    fn test_identical_blocks_give_identical_roots() {
        let mut first = funded_app();
        let mut second = funded_app();
        let msgs = [deposit(100), deposit(10)];
        let (a, _) = first.execute_block(1, 100, &msgs).unwrap();
        let (b, _) = second.execute_block(1, 100, &msgs).unwrap();
        assert_eq!(a.state_root, b.state_root);
    }
}
