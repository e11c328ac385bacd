//! Dark DEX - Binary Entry Point
//!
//! Runs a short scripted session against an in-memory exchange and prints
//! the block receipts.
//!
//! ```text
//! dark-dex [params.json]
//! RUST_LOG=dark_dex=debug dark-dex
//! ```

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use dark_dex::types::{
    Coin, DepositOptions, DexMsg, LimitOrderType, MsgDeposit, MsgMultiHopSwap, MsgPlaceLimitOrder,
    MultiHopRoute, Params, PrecDec,
};
use dark_dex::DexApp;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let params = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path).with_context(|| format!("reading params from {}", path))?;
            Params::from_json(&json).with_context(|| format!("invalid params in {}", path))?
        }
        None => Params::default(),
    };

    println!("===========================================");
    println!("  Dark DEX - hybrid AMM / order book");
    println!("===========================================");
    println!();

    let mut app = DexApp::new(params).context("initializing exchange")?;
    for user in ["alice", "bob"] {
        app.fund(
            user,
            &[
                Coin::new("TokenA", 1_000_000),
                Coin::new("TokenB", 1_000_000),
                Coin::new("TokenC", 1_000_000),
            ],
        )
        .with_context(|| format!("funding {}", user))?;
    }

    let block1 = vec![
        deposit("alice", "TokenA", "TokenB", 100_000, 100_000),
        deposit("alice", "TokenB", "TokenC", 100_000, 100_000),
        DexMsg::PlaceLimitOrder(MsgPlaceLimitOrder {
            creator: "alice".to_string(),
            receiver: "alice".to_string(),
            token_in: "TokenA".to_string(),
            token_out: "TokenB".to_string(),
            tick_index_in_to_out: Some(-20),
            limit_sell_price: None,
            amount_in: 50_000,
            order_type: LimitOrderType::GoodTilCancelled,
            expiration_time: None,
            max_amount_out: None,
            min_average_sell_price: None,
        }),
    ];
    let block2 = vec![
        DexMsg::PlaceLimitOrder(MsgPlaceLimitOrder {
            creator: "bob".to_string(),
            receiver: "bob".to_string(),
            token_in: "TokenB".to_string(),
            token_out: "TokenA".to_string(),
            tick_index_in_to_out: Some(30),
            limit_sell_price: None,
            amount_in: 30_000,
            order_type: LimitOrderType::ImmediateOrCancel,
            expiration_time: None,
            max_amount_out: None,
            min_average_sell_price: None,
        }),
        DexMsg::MultiHopSwap(MsgMultiHopSwap {
            creator: "bob".to_string(),
            receiver: "bob".to_string(),
            routes: vec![
                MultiHopRoute::new(&["TokenA", "TokenC"]),
                MultiHopRoute::new(&["TokenA", "TokenB", "TokenC"]),
            ],
            amount_in: 10_000,
            exit_limit_price: PrecDec::from_ratio(9, 10)?,
            pick_best_route: true,
        }),
    ];

    for (height, msgs) in [(1u64, block1), (2u64, block2)] {
        let (receipt, results) = app
            .execute_block(height, 1_700_000_000 + height * 6, &msgs)
            .with_context(|| format!("executing block {}", height))?;
        println!("Block {}:", receipt.height);
        for (msg, result) in msgs.iter().zip(&results) {
            match result {
                Ok(_) => println!("  {:<18} ok", msg.name()),
                Err(err) => println!("  {:<18} failed ({}): {}", msg.name(), err.code(), err),
            }
        }
        println!("  events: {}", receipt.events_emitted);
        println!("  state root: {}", receipt.state_root_hex());
        println!();
    }

    Ok(())
}

fn deposit(creator: &str, token_a: &str, token_b: &str, amount_a: u128, amount_b: u128) -> DexMsg {
    DexMsg::Deposit(MsgDeposit {
        creator: creator.to_string(),
        receiver: creator.to_string(),
        token_a: token_a.to_string(),
        token_b: token_b.to_string(),
        amounts_a: vec![amount_a],
        amounts_b: vec![amount_b],
        tick_indexes_a_to_b: vec![0],
        fees: vec![1],
        options: vec![DepositOptions::default()],
    })
}
