//! Store key layout.
//!
//! ## Tick liquidity
//!
//! ```text
//! TickLiquidity/value/<token0><><token1>/<maker>/<tick:9>/<type>/<discriminator>/
//! ```
//!
//! - `tick` is sign-biased big endian: a `0x00` byte for negative ticks and
//!   `0x01` otherwise, then the two's complement value as a `u64`. Byte order
//!   therefore matches numeric order.
//! - `type` is `A_PoolDeposit` or `B_LODeposit`, so at equal tick the pool
//!   sorts ahead of limit orders.
//! - The discriminator is the fee (8 bytes big endian) for pools and the
//!   tranche key string for limit orders.
//!
//! Iterating the prefix `TickLiquidity/value/<pair>/<maker>/` in byte order
//! visits liquidity best price first.
//!
//! ## Other records
//!
//! Tranche users, inactive tranches, expirations, pool ids, pool metadata,
//! counters and params each live under their own prefix.

use crate::types::pair::{PairID, TradePairID};

pub const TICK_LIQUIDITY_PREFIX: &str = "TickLiquidity/value/";
pub const TRANCHE_USER_PREFIX: &str = "LimitOrderTrancheUser/value/";
pub const INACTIVE_TRANCHE_PREFIX: &str = "InactiveLimitOrderTranche/value/";
pub const EXPIRATION_PREFIX: &str = "LimitOrderExpiration/value/";
pub const POOL_ID_PREFIX: &str = "Pool/id/";
pub const POOL_METADATA_PREFIX: &str = "PoolMetadata/value/";
pub const POOL_COUNT_KEY: &str = "Pool/count/";
pub const PARAMS_KEY: &str = "Params/value/";
pub const JIT_COUNT_KEY: &str = "JITsInBlock/count/";
pub const TRANCHE_NONCE_KEY: &str = "LimitOrderTranche/nonce/";
pub const BANK_BALANCE_PREFIX: &str = "Bank/balance/";
pub const BANK_SUPPLY_PREFIX: &str = "Bank/supply/";

/// Liquidity type tag for pool reserves.
pub const LIQUIDITY_TYPE_POOL: &str = "A_PoolDeposit";
/// Liquidity type tag for limit order tranches.
pub const LIQUIDITY_TYPE_LIMIT_ORDER: &str = "B_LODeposit";

const SEP: u8 = b'/';

// ============================================================================
// Encoding helpers
// ============================================================================

/// Sign-biased big endian tick encoding (9 bytes).
pub fn tick_index_to_bytes(tick: i64) -> [u8; 9] {
    let mut out = [0u8; 9];
    if tick >= 0 {
        out[0] = 0x01;
    }
    out[1..].copy_from_slice(&(tick as u64).to_be_bytes());
    out
}

/// Inverse of [`tick_index_to_bytes`].
pub fn bytes_to_tick_index(bytes: &[u8]) -> Option<i64> {
    if bytes.len() != 9 {
        return None;
    }
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[1..]);
    Some(u64::from_be_bytes(raw) as i64)
}

/// Length-prefixed base 36 rendering that sorts in numeric order.
///
/// # Example
///
/// ```
/// use dark_dex::types::keys::sortable_string;
///
/// assert_eq!(sortable_string(0), "10");
/// assert_eq!(sortable_string(35), "1z");
/// assert_eq!(sortable_string(36), "210");
/// assert!(sortable_string(35) < sortable_string(36));
/// ```
pub fn sortable_string(value: u64) -> String {
    let digits = to_base36(value);
    let len = to_base36(digits.len() as u64);
    format!("{}{}", len, digits)
}

fn to_base36(mut value: u64) -> String {
    const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while value > 0 {
        buf.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}

/// Tranche key from the block height and a store-wide nonce.
pub fn new_tranche_key(block_height: u64, nonce: u64) -> String {
    format!("{}{}", sortable_string(block_height), sortable_string(nonce))
}

fn push_segment(key: &mut Vec<u8>, segment: &[u8]) {
    key.extend_from_slice(segment);
    key.push(SEP);
}

// ============================================================================
// Tick liquidity
// ============================================================================

/// Prefix covering all liquidity a taker of `trade_pair` could consume.
pub fn tick_liquidity_prefix(trade_pair: &TradePairID) -> Vec<u8> {
    let mut key = TICK_LIQUIDITY_PREFIX.as_bytes().to_vec();
    trade_pair_segments(&mut key, trade_pair);
    key
}

fn trade_pair_segments(key: &mut Vec<u8>, trade_pair: &TradePairID) {
    push_segment(key, trade_pair.pair_id().to_string().as_bytes());
    push_segment(key, trade_pair.maker_denom.as_bytes());
}

/// Prefix for every limit order tranche at one tick.
pub fn tick_liquidity_limit_order_prefix(trade_pair: &TradePairID, tick: i64) -> Vec<u8> {
    let mut key = tick_liquidity_prefix(trade_pair);
    push_segment(&mut key, &tick_index_to_bytes(tick));
    push_segment(&mut key, LIQUIDITY_TYPE_LIMIT_ORDER.as_bytes());
    key
}

/// Key tail shared by active and inactive tranches.
pub(crate) fn tranche_key_tail(trade_pair: &TradePairID, tick: i64, tranche_key: &str) -> Vec<u8> {
    let mut key = Vec::new();
    trade_pair_segments(&mut key, trade_pair);
    push_segment(&mut key, &tick_index_to_bytes(tick));
    push_segment(&mut key, LIQUIDITY_TYPE_LIMIT_ORDER.as_bytes());
    push_segment(&mut key, tranche_key.as_bytes());
    key
}

pub fn pool_reserves_store_key(trade_pair: &TradePairID, tick: i64, fee: u64) -> Vec<u8> {
    let mut key = tick_liquidity_prefix(trade_pair);
    push_segment(&mut key, &tick_index_to_bytes(tick));
    push_segment(&mut key, LIQUIDITY_TYPE_POOL.as_bytes());
    push_segment(&mut key, &fee.to_be_bytes());
    key
}

pub fn tranche_store_key(trade_pair: &TradePairID, tick: i64, tranche_key: &str) -> Vec<u8> {
    let mut key = TICK_LIQUIDITY_PREFIX.as_bytes().to_vec();
    key.extend(tranche_key_tail(trade_pair, tick, tranche_key));
    key
}

pub fn inactive_tranche_store_key(trade_pair: &TradePairID, tick: i64, tranche_key: &str) -> Vec<u8> {
    let mut key = INACTIVE_TRANCHE_PREFIX.as_bytes().to_vec();
    key.extend(tranche_key_tail(trade_pair, tick, tranche_key));
    key
}

// ============================================================================
// Users, expirations, pools
// ============================================================================

pub fn tranche_user_address_prefix(address: &str) -> Vec<u8> {
    let mut key = TRANCHE_USER_PREFIX.as_bytes().to_vec();
    push_segment(&mut key, address.as_bytes());
    key
}

pub fn tranche_user_store_key(address: &str, tranche_key: &str) -> Vec<u8> {
    let mut key = tranche_user_address_prefix(address);
    push_segment(&mut key, tranche_key.as_bytes());
    key
}

/// Expiration record key; `0` sorts first and is used for JIT orders.
pub fn expiration_store_key(expiration_time: u64, tranche_ref: &[u8]) -> Vec<u8> {
    let mut key = EXPIRATION_PREFIX.as_bytes().to_vec();
    push_segment(&mut key, sortable_string(expiration_time).as_bytes());
    push_segment(&mut key, tranche_ref);
    key
}

pub fn pool_id_store_key(pair: &PairID, center_tick: i64, fee: u64) -> Vec<u8> {
    let mut key = POOL_ID_PREFIX.as_bytes().to_vec();
    push_segment(&mut key, pair.to_string().as_bytes());
    push_segment(&mut key, &tick_index_to_bytes(center_tick));
    push_segment(&mut key, &fee.to_be_bytes());
    key
}

pub fn pool_metadata_store_key(id: u64) -> Vec<u8> {
    let mut key = POOL_METADATA_PREFIX.as_bytes().to_vec();
    key.extend_from_slice(&id.to_be_bytes());
    key
}

pub fn bank_balance_prefix(address: &str) -> Vec<u8> {
    let mut key = BANK_BALANCE_PREFIX.as_bytes().to_vec();
    push_segment(&mut key, address.as_bytes());
    key
}

pub fn bank_balance_key(address: &str, denom: &str) -> Vec<u8> {
    let mut key = bank_balance_prefix(address);
    key.extend_from_slice(denom.as_bytes());
    key
}

pub fn bank_supply_key(denom: &str) -> Vec<u8> {
    let mut key = BANK_SUPPLY_PREFIX.as_bytes().to_vec();
    key.extend_from_slice(denom.as_bytes());
    key
}

// ============================================================================
// Unit Tests
// ============================================================================
