//! Error taxonomy for the exchange engine.
//!
//! Every recoverable failure is a [`DexError`] variant. Variants are grouped
//! the same way callers reason about them:
//!
//! - **Structural**: malformed messages (array parity, zero amounts, denoms)
//! - **Range**: ticks or prices outside the representable ladder
//! - **Liquidity**: missing tranches, insufficient shares, empty books
//! - **Order type**: expiration and max-amount-out misuse, fill-or-kill
//! - **Routing**: multihop route shape and route exhaustion
//! - **Policy**: pause switch and per-block JIT budget
//! - **Engine**: arithmetic, gas, and store corruption
//!
//! Each variant maps to a stable numeric code via [`DexError::code`], which
//! is what gets surfaced in receipts and logs.

use thiserror::Error;

/// Result alias used across the crate.
pub type DexResult<T> = Result<T, DexError>;

/// All recoverable errors produced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DexError {
    // ========================================================================
    // Structural
    // ========================================================================
    #[error("invalid token pair: {token_a}<>{token_b}")]
    InvalidTradingPair { token_a: String, token_b: String },

    #[error("insufficient shares: {address} does not have {shares} shares of type {denom}")]
    InsufficientShares {
        address: String,
        shares: u128,
        denom: String,
    },

    #[error("transaction input arrays are not of the same length")]
    UnbalancedTxArray,

    #[error("at least one deposit amount must be > 0")]
    ZeroDeposit,

    #[error("withdraw amount must be > 0")]
    ZeroWithdraw,

    #[error("amount in must be > 0 for swap")]
    ZeroSwap,

    #[error("limit order amount must be > 0")]
    ZeroLimitOrder,

    #[error("max amount out must be unset or > 0")]
    ZeroMaxAmountOut,

    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    #[error("invalid token denom: {0:?}")]
    InvalidDenom(String),

    #[error("can only provide a single deposit amount for each tick, fee pair")]
    DuplicatePoolDeposit,

    #[error("can only withdraw once from each pool per message: {0}")]
    DuplicatePoolWithdraw(String),

    #[error("denom is not a pool share denom: {0}")]
    InvalidPoolDenom(String),

    #[error("pair id does not conform to pattern TokenA<>TokenB: {0}")]
    InvalidPairIdStr(String),

    #[error("fee {0} is not a legal fee tier")]
    InvalidFee(u64),

    #[error("only one of limit sell price or tick index in to out may be specified")]
    InvalidPriceAndTick,

    // ========================================================================
    // Range
    // ========================================================================
    #[error("tick {0} is outside the tick range: abs(tick) + fee must be <= 559680")]
    TickOutsideRange(i64),

    #[error("price {0} is outside the representable price range")]
    PriceOutsideRange(String),

    // ========================================================================
    // Liquidity
    // ========================================================================
    #[error("limit order tranche not found: {0}")]
    ValidLimitOrderTrancheNotFound(String),

    #[error("active limit order not found: {0}")]
    ActiveLimitOrderNotFound(String),

    #[error("cannot cancel additional liquidity from limit order tranche: {0}")]
    CancelEmptyLimitOrder(String),

    #[error("cannot withdraw additional liquidity from this limit order at this time")]
    WithdrawEmptyLimitOrder,

    #[error("cannot deposit single-sided liquidity in tick with opposite liquidity while autoswap is disabled")]
    ZeroTrueDeposit,

    #[error("deposit amount is too small to issue shares")]
    DepositShareUnderflow,

    #[error("no tradable liquidity at or better than the limit price")]
    NoLiquidity,

    #[error("specified trade will result in a rounded output of 0")]
    TradeTooSmall,

    #[error("trade cannot be filled at the specified limit price")]
    LimitPriceNotSatisfied,

    #[error("cannot deposit at tick {tick} fee {fee}: price is behind the opposing token's current price")]
    DepositBehindEnemyLines { tick: i64, fee: u64 },

    #[error("insufficient funds: {address} has {available}{denom}, needs {needed}{denom}")]
    InsufficientFunds {
        address: String,
        denom: String,
        needed: u128,
        available: u128,
    },

    // ========================================================================
    // Order type
    // ========================================================================
    #[error("fill or kill limit order couldn't be executed in its entirety")]
    FoKLimitOrderNotFilled,

    #[error("limit orders of type GOOD_TIL_TIME must supply an expiration time")]
    GoodTilOrderWithoutExpiration,

    #[error("only limit orders of type GOOD_TIL_TIME can supply an expiration time")]
    ExpirationOnWrongOrderType,

    #[error("limit order expiration time {expiration} must be after block time {block_time}")]
    ExpirationTimeInPast { block_time: u64, expiration: u64 },

    #[error("max amount out can only be set for taker only limit orders")]
    InvalidMaxAmountOutForMaker,

    // ========================================================================
    // Routing
    // ========================================================================
    #[error("must supply at least 1 route for multihop swap")]
    MissingMultihopRoute,

    #[error("each route should specify at least two hops: input and output tokens")]
    RouteWithoutExitToken,

    #[error("hops cannot have cycles")]
    CycleInHops,

    #[error("multihop swap starting tokens for each route must be the same")]
    MultihopEntryTokensMismatch,

    #[error("all multihop routes must have the same exit token")]
    MultihopExitTokensMismatch,

    #[error("cannot have negative or zero exit price")]
    ZeroExitPrice,

    #[error("all multihop routes failed limit price check or had insufficient liquidity: {0:?}")]
    AllMultiHopRoutesFailed(Vec<DexError>),

    // ========================================================================
    // Policy
    // ========================================================================
    #[error("dex has been paused, all messages are disabled at this time")]
    DexPaused,

    #[error("maximum JIT limit orders per block has already been reached")]
    OverJITPerBlockLimit,

    // ========================================================================
    // Engine
    // ========================================================================
    #[error("arithmetic overflow")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("out of gas: limit {limit}, consumed {consumed}")]
    OutOfGas { limit: u64, consumed: u64 },

    #[error("corrupt store value at {key}: {reason}")]
    CorruptState { key: String, reason: String },

    #[error("invalid params: {0}")]
    InvalidParams(String),
}

impl DexError {
    /// Stable numeric code for the error.
    ///
    /// Codes in the 1100 range follow the module's historical registry so
    /// that off-chain tooling keyed on them keeps working.
    pub fn code(&self) -> u32 {
        match self {
            DexError::InvalidTradingPair { .. } => 1102,
            DexError::InsufficientShares { .. } => 1104,
            DexError::UnbalancedTxArray => 1110,
            DexError::ValidLimitOrderTrancheNotFound(_) => 1111,
            DexError::CancelEmptyLimitOrder(_) => 1112,
            DexError::TickOutsideRange(_) => 1117,
            DexError::InvalidPoolDenom(_) => 1118,
            DexError::InvalidPairIdStr(_) => 1119,
            DexError::ZeroDeposit => 1120,
            DexError::ZeroTrueDeposit => 1121,
            DexError::WithdrawEmptyLimitOrder => 1124,
            DexError::ZeroSwap => 1125,
            DexError::ZeroWithdraw => 1129,
            DexError::ZeroLimitOrder => 1130,
            DexError::DepositShareUnderflow => 1133,
            DexError::FoKLimitOrderNotFilled => 1134,
            DexError::GoodTilOrderWithoutExpiration => 1136,
            DexError::ExpirationOnWrongOrderType => 1137,
            DexError::ExpirationTimeInPast { .. } => 1139,
            DexError::AllMultiHopRoutesFailed(_) => 1141,
            DexError::MultihopExitTokensMismatch => 1142,
            DexError::MissingMultihopRoute => 1143,
            DexError::ZeroMaxAmountOut => 1144,
            DexError::InvalidMaxAmountOutForMaker => 1145,
            DexError::InvalidFee(_) => 1148,
            DexError::InvalidAddress(_) => 1149,
            DexError::RouteWithoutExitToken => 1150,
            DexError::CycleInHops => 1151,
            DexError::ZeroExitPrice => 1152,
            DexError::DuplicatePoolDeposit => 1153,
            DexError::LimitPriceNotSatisfied => 1154,
            DexError::DexPaused => 1155,
            DexError::OverJITPerBlockLimit => 1156,
            DexError::InvalidDenom(_) => 1157,
            DexError::MultihopEntryTokensMismatch => 1158,
            DexError::TradeTooSmall => 1159,
            DexError::PriceOutsideRange(_) => 1160,
            DexError::InvalidPriceAndTick => 1161,
            DexError::DepositBehindEnemyLines { .. } => 1162,
            DexError::NoLiquidity => 1164,
            DexError::DuplicatePoolWithdraw(_) => 1170,
            DexError::ActiveLimitOrderNotFound(_) => 1171,
            DexError::InsufficientFunds { .. } => 1180,
            DexError::Overflow => 1200,
            DexError::DivisionByZero => 1201,
            DexError::OutOfGas { .. } => 1202,
            DexError::CorruptState { .. } => 1203,
            DexError::InvalidParams(_) => 1204,
        }
    }

    /// True for engine faults that must abort the whole operation.
    ///
    /// A multihop swap never falls through to another route on these.
    pub fn is_engine_fault(&self) -> bool {
        matches!(
            self,
            DexError::Overflow | DexError::DivisionByZero | DexError::OutOfGas { .. } | DexError::CorruptState { .. }
        )
    }

    /// True for errors raised by message validation before any state is read.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            DexError::InvalidTradingPair { .. }
                | DexError::UnbalancedTxArray
                | DexError::ZeroDeposit
                | DexError::ZeroWithdraw
                | DexError::ZeroSwap
                | DexError::ZeroLimitOrder
                | DexError::ZeroMaxAmountOut
                | DexError::InvalidAddress(_)
                | DexError::InvalidDenom(_)
                | DexError::DuplicatePoolDeposit
                | DexError::DuplicatePoolWithdraw(_)
                | DexError::InvalidPoolDenom(_)
                | DexError::InvalidPairIdStr(_)
                | DexError::InvalidPriceAndTick
        )
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
