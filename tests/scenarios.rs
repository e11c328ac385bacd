//! End-to-end scenarios driven through the block executor.
//!
//! Each test builds a fresh [`DexApp`], funds a few accounts and delivers
//! messages exactly as a block would.

use dark_dex::engine::{best_tick, BankKeeper, MODULE_ACCOUNT};
use dark_dex::types::{
    Coin, DepositOptions, DexMsg, DexResponse, LimitOrderType, MsgDeposit, MsgMultiHopSwap, MsgPlaceLimitOrder,
    MsgWithdrawFilledLimitOrder, MultiHopRoute, PairID, Params, PrecDec, TradePairID,
};
use dark_dex::{DexApp, DexError};

// ============================================================================
// HELPERS
// ============================================================================

fn app() -> DexApp {
    let mut app = DexApp::new(Params::default()).unwrap();
    for user in ["alice", "bob", "carol"] {
        app.fund(
            user,
            &[
                Coin::new("TokenA", 1_000_000),
                Coin::new("TokenB", 1_000_000),
                Coin::new("TokenC", 1_000_000),
            ],
        )
        .unwrap();
    }
    app
}

fn deposit(creator: &str, token_a: &str, token_b: &str, amount_a: u128, amount_b: u128, tick: i64, fee: u64) -> DexMsg {
    DexMsg::Deposit(MsgDeposit {
        creator: creator.to_string(),
        receiver: creator.to_string(),
        token_a: token_a.to_string(),
        token_b: token_b.to_string(),
        amounts_a: vec![amount_a],
        amounts_b: vec![amount_b],
        tick_indexes_a_to_b: vec![tick],
        fees: vec![fee],
        options: vec![DepositOptions::default()],
    })
}

fn limit_order(
    creator: &str,
    token_in: &str,
    token_out: &str,
    tick: i64,
    amount_in: u128,
    order_type: LimitOrderType,
) -> MsgPlaceLimitOrder {
    MsgPlaceLimitOrder {
        creator: creator.to_string(),
        receiver: creator.to_string(),
        token_in: token_in.to_string(),
        token_out: token_out.to_string(),
        tick_index_in_to_out: Some(tick),
        limit_sell_price: None,
        amount_in,
        order_type,
        expiration_time: None,
        max_amount_out: None,
        min_average_sell_price: None,
    }
}

fn place(app: &mut DexApp, order: MsgPlaceLimitOrder) -> String {
    match app.deliver(&DexMsg::PlaceLimitOrder(order)).unwrap().0 {
        DexResponse::PlaceLimitOrder(resp) => resp.tranche_key,
        other => panic!("unexpected response {:?}", other),
    }
}

fn balance(app: &mut DexApp, address: &str, denom: &str) -> u128 {
    app.query(|server, ctx| server.keeper().bank().balance(ctx, address, denom))
        .unwrap()
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn scenario_a_balanced_deposit() {
    let mut app = app();
    let (resp, _) = app
        .deliver(&deposit("alice", "TokenA", "TokenB", 100, 100, 0, 1))
        .unwrap();
    let DexResponse::Deposit(resp) = resp else {
        panic!("expected deposit response");
    };
    assert!(resp.shares_issued[0].amount > 0);

    let pair = PairID::new("TokenA", "TokenB").unwrap();
    let pool = app
        .query(|server, ctx| server.keeper().pool(ctx, &pair, 0, 1))
        .unwrap()
        .unwrap();
    assert_eq!(pool.lower_tick0.reserves_maker_denom, 100);
    assert_eq!(pool.upper_tick1.reserves_maker_denom, 100);
    assert_eq!(balance(&mut app, MODULE_ACCOUNT, "TokenA"), 100);
}

#[test]
fn scenario_b_limit_order_filled_and_withdrawn() {
    let mut app = app();
    let tranche_key = place(
        &mut app,
        limit_order("alice", "TokenA", "TokenB", -10, 10_000, LimitOrderType::GoodTilCancelled),
    );

    let (resp, _) = app
        .deliver(&DexMsg::PlaceLimitOrder(limit_order(
            "bob",
            "TokenB",
            "TokenA",
            10,
            20_000,
            LimitOrderType::ImmediateOrCancel,
        )))
        .unwrap();
    let DexResponse::PlaceLimitOrder(taken) = resp else {
        panic!("expected limit order response");
    };
    let delivered = taken.taker_coin_in.amount;
    assert_eq!(taken.taker_coin_out, Coin::new("TokenA", 10_000));

    // drained tranche, fully filled
    let tranche = app
        .query(|server, ctx| {
            let user = server.keeper().tranche_user(ctx, "alice", &tranche_key)?.unwrap();
            server.keeper().tranche_for_user(ctx, &user)
        })
        .unwrap()
        .unwrap();
    assert_eq!(tranche.reserves_maker_denom, 0);
    assert_eq!(tranche.ratio_filled().unwrap(), PrecDec::one());

    let before = balance(&mut app, "alice", "TokenB");
    app.deliver(&DexMsg::WithdrawFilledLimitOrder(MsgWithdrawFilledLimitOrder {
        creator: "alice".to_string(),
        tranche_key,
    }))
    .unwrap();
    let received = balance(&mut app, "alice", "TokenB") - before;
    assert!(received <= delivered);
    assert!(received + 1 >= delivered, "received {} of {}", received, delivered);
}

#[test]
fn scenario_c_fill_or_kill_not_filled() {
    let mut app = app();
    place(
        &mut app,
        limit_order("alice", "TokenA", "TokenB", -10, 10_000, LimitOrderType::GoodTilCancelled),
    );
    let root = app.state_root();

    let fok = limit_order("bob", "TokenB", "TokenA", 10, 50_000, LimitOrderType::FillOrKill);
    assert_eq!(
        app.deliver(&DexMsg::PlaceLimitOrder(fok)).unwrap_err(),
        DexError::FoKLimitOrderNotFilled
    );
    assert_eq!(app.state_root(), root);
}

fn seed_routes(app: &mut DexApp) {
    // direct TokenA -> TokenC quotes about 0.99, the detour quotes 1.0
    app.deliver(&deposit("alice", "TokenA", "TokenC", 0, 100_000, 100, 0)).unwrap();
    app.deliver(&deposit("alice", "TokenA", "TokenB", 0, 100_000, 0, 0)).unwrap();
    app.deliver(&deposit("alice", "TokenB", "TokenC", 0, 100_000, 0, 0)).unwrap();
}

fn multihop(routes: Vec<MultiHopRoute>) -> DexMsg {
    DexMsg::MultiHopSwap(MsgMultiHopSwap {
        creator: "bob".to_string(),
        receiver: "bob".to_string(),
        routes,
        amount_in: 10_000,
        exit_limit_price: PrecDec::from_ratio(9, 10).unwrap(),
        pick_best_route: true,
    })
}

#[test]
fn scenario_d_best_route_commits_only_winner() {
    let direct = MultiHopRoute::new(&["TokenA", "TokenC"]);
    let detour = MultiHopRoute::new(&["TokenA", "TokenB", "TokenC"]);

    let mut both = app();
    seed_routes(&mut both);
    let (resp, _) = both.deliver(&multihop(vec![direct, detour.clone()])).unwrap();
    let DexResponse::MultiHopSwap(resp) = resp else {
        panic!("expected multihop response");
    };
    assert_eq!(resp.route, detour);

    // same state as if only the detour had ever been tried
    let mut only_detour = app();
    seed_routes(&mut only_detour);
    only_detour.deliver(&multihop(vec![detour])).unwrap();
    assert_eq!(both.state_root(), only_detour.state_root());
}

#[test]
fn scenario_e_cyclic_route_rejected() {
    let mut app = app();
    seed_routes(&mut app);
    let root = app.state_root();
    let cyclic = MultiHopRoute::new(&["TokenA", "TokenB", "TokenA", "TokenC"]);
    assert_eq!(
        app.deliver(&multihop(vec![cyclic])).unwrap_err(),
        DexError::CycleInHops
    );
    assert_eq!(app.state_root(), root);
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
fn jit_liquidity_lives_for_one_block() {
    let mut app = app();
    app.begin_block(1, 1_000).unwrap();
    let tranche_key = place(
        &mut app,
        limit_order("alice", "TokenA", "TokenB", 0, 10_000, LimitOrderType::JustInTime),
    );

    // usable within the block
    let b_to_a = TradePairID::new("TokenB", "TokenA").unwrap();
    let best = app.query(|_, ctx| best_tick(ctx, &b_to_a)).unwrap();
    assert_eq!(best, Some(0));

    // gone at the next block, refundable from the inactive store
    app.begin_block(2, 1_006).unwrap();
    let remaining = app.query(|_, ctx| best_tick(ctx, &b_to_a)).unwrap();
    assert_eq!(remaining, None);
    let before = balance(&mut app, "alice", "TokenA");
    app.deliver(&DexMsg::WithdrawFilledLimitOrder(MsgWithdrawFilledLimitOrder {
        creator: "alice".to_string(),
        tranche_key,
    }))
    .unwrap();
    assert_eq!(balance(&mut app, "alice", "TokenA") - before, 10_000);
}

#[test]
fn crossing_maker_order_respects_true_price() {
    let mut app = app();
    place(
        &mut app,
        limit_order("alice", "TokenA", "TokenB", -10, 10, LimitOrderType::GoodTilCancelled),
    );

    // the crossing part would settle at 10 out for 11 in
    let root = app.state_root();
    let small = limit_order("bob", "TokenB", "TokenA", 10, 20, LimitOrderType::GoodTilCancelled);
    let err = app.deliver(&DexMsg::PlaceLimitOrder(small)).unwrap_err();
    assert_eq!(err, DexError::LimitPriceNotSatisfied);
    assert_eq!(app.state_root(), root);

    // a deep cross stays within the spread and rests the remainder
    place(
        &mut app,
        limit_order("alice", "TokenA", "TokenB", -10, 10_000, LimitOrderType::GoodTilCancelled),
    );
    let large = limit_order("bob", "TokenB", "TokenA", 10, 20_000, LimitOrderType::GoodTilCancelled);
    match app.deliver(&DexMsg::PlaceLimitOrder(large)).unwrap().0 {
        DexResponse::PlaceLimitOrder(resp) => {
            assert_eq!(resp.taker_coin_out, Coin::new("TokenA", 10_010));
            assert!(!resp.tranche_key.is_empty());
            assert_eq!(resp.coin_in, Coin::new("TokenB", 20_000));
        }
        other => panic!("unexpected response {:?}", other),
    }
}

#[test]
fn good_til_order_purged_at_expiry() {
    let mut app = app();
    app.begin_block(1, 1_000).unwrap();
    let mut order = limit_order("alice", "TokenA", "TokenB", 0, 10_000, LimitOrderType::GoodTilTime);
    order.expiration_time = Some(1_010);
    place(&mut app, order);

    let (summary, _) = app.begin_block(2, 1_006).unwrap();
    assert_eq!(summary.records_removed, 0);
    let (summary, _) = app.begin_block(3, 1_012).unwrap();
    assert_eq!(summary.records_removed, 1);
    assert_eq!(summary.tranches_archived, 1);
    assert!(app
        .query(|server, ctx| server.keeper().all_expirations(ctx))
        .unwrap()
        .is_empty());
}

#[test]
fn behind_enemy_lines_deposit_is_reported() {
    let mut app = app();
    app.deliver(&deposit("alice", "TokenA", "TokenB", 0, 1_000, 0, 1)).unwrap();
    let (resp, _) = app
        .deliver(&deposit("bob", "TokenA", "TokenB", 1_000, 0, 10, 1))
        .unwrap();
    let DexResponse::Deposit(resp) = resp else {
        panic!("expected deposit response");
    };
    assert_eq!(resp.failed_deposits.len(), 1);
    assert!(resp.shares_issued.is_empty());
    assert_eq!(balance(&mut app, "bob", "TokenA"), 1_000_000);
}

#[test]
fn paused_exchange_rejects_messages() {
    let mut app = app();
    app.set_params(&Params {
        paused: true,
        ..Params::default()
    })
    .unwrap();
    assert_eq!(
        app.deliver(&deposit("alice", "TokenA", "TokenB", 100, 100, 0, 1)).unwrap_err(),
        DexError::DexPaused
    );
}

#[test]
fn out_of_gas_rolls_back() {
    let mut app = app().with_msg_gas_limit(20_000);
    let root = app.state_root();
    let err = app
        .deliver(&deposit("alice", "TokenA", "TokenB", 100, 100, 0, 1))
        .unwrap_err();
    assert!(matches!(err, DexError::OutOfGas { .. }));
    assert_eq!(app.state_root(), root);
}

#[test]
fn simulated_order_changes_nothing() {
    let mut app = app();
    app.deliver(&deposit("alice", "TokenA", "TokenB", 0, 100_000, 0, 1)).unwrap();
    let root = app.state_root();

    let order = limit_order("bob", "TokenA", "TokenB", 10, 1_000, LimitOrderType::ImmediateOrCancel);
    let sim = app
        .query(|server, ctx| server.simulate_place_limit_order(ctx, &order))
        .unwrap();
    assert_eq!(sim.taker_coin_in.amount, 1_000);
    assert!(sim.taker_coin_out.amount > 0);
    assert_eq!(app.state_root(), root);
}

#[test]
fn block_receipts_count_failures() {
    let mut app = app();
    let msgs = vec![
        deposit("alice", "TokenA", "TokenB", 100, 100, 0, 1),
        deposit("alice", "TokenA", "TokenB", 100, 100, 0, 7),
    ];
    let (receipt, results) = app.execute_block(1, 1_000, &msgs).unwrap();
    assert_eq!(receipt.msgs_ok, 1);
    assert_eq!(receipt.msgs_failed, 1);
    assert_eq!(results[1], Err(DexError::InvalidFee(7)));
    assert_eq!(receipt.state_root_hex(), hex::encode(app.state_root()));
}
