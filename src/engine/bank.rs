//! Balance ledger.
//!
//! The engine moves tokens through the [`BankKeeper`] trait. [`StoreBank`]
//! keeps balances and supplies in the same store as the exchange state, so a
//! discarded branch also discards its transfers.
//!
//! Liquidity tokens are held by the module account [`MODULE_ACCOUNT`]; pool
//! shares are minted to and burned from users directly.

use crate::engine::context::Context;
use crate::error::{DexError, DexResult};
use crate::types::coin::Coin;
use crate::types::keys;

/// Account holding all deposited liquidity.
pub const MODULE_ACCOUNT: &str = "dex";

pub trait BankKeeper {
    fn balance(&self, ctx: &Context<'_>, address: &str, denom: &str) -> DexResult<u128>;

    fn supply(&self, ctx: &Context<'_>, denom: &str) -> DexResult<u128>;

    /// Every non-zero balance of `address`, ordered by denom.
    fn balances(&self, ctx: &Context<'_>, address: &str) -> DexResult<Vec<Coin>>;

    fn send(&self, ctx: &mut Context<'_>, from: &str, to: &str, coin: &Coin) -> DexResult<()>;

    fn mint(&self, ctx: &mut Context<'_>, to: &str, coin: &Coin) -> DexResult<()>;

    fn burn(&self, ctx: &mut Context<'_>, from: &str, coin: &Coin) -> DexResult<()>;

    fn send_to_module(&self, ctx: &mut Context<'_>, from: &str, coin: &Coin) -> DexResult<()> {
        self.send(ctx, from, MODULE_ACCOUNT, coin)
    }

    fn send_from_module(&self, ctx: &mut Context<'_>, to: &str, coin: &Coin) -> DexResult<()> {
        self.send(ctx, MODULE_ACCOUNT, to, coin)
    }
}

/// Ledger kept under the `Bank/` keys of the exchange store.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreBank;

impl StoreBank {
    fn read_amount(ctx: &Context<'_>, key: &[u8]) -> DexResult<u128> {
        Ok(ctx.get_json::<u128>(key)?.unwrap_or(0))
    }

    fn write_amount(ctx: &mut Context<'_>, key: Vec<u8>, amount: u128) -> DexResult<()> {
        if amount == 0 {
            ctx.delete(&key)
        } else {
            ctx.set_json(key, &amount)
        }
    }

    fn debit(ctx: &mut Context<'_>, address: &str, coin: &Coin) -> DexResult<()> {
        let key = keys::bank_balance_key(address, &coin.denom);
        let available = Self::read_amount(ctx, &key)?;
        if available < coin.amount {
            return Err(DexError::InsufficientFunds {
                address: address.to_string(),
                denom: coin.denom.clone(),
                needed: coin.amount,
                available,
            });
        }
        Self::write_amount(ctx, key, available - coin.amount)
    }

    fn credit(ctx: &mut Context<'_>, address: &str, coin: &Coin) -> DexResult<()> {
        let key = keys::bank_balance_key(address, &coin.denom);
        let current = Self::read_amount(ctx, &key)?;
        let updated = current.checked_add(coin.amount).ok_or(DexError::Overflow)?;
        Self::write_amount(ctx, key, updated)
    }
}

impl BankKeeper for StoreBank {
    fn balance(&self, ctx: &Context<'_>, address: &str, denom: &str) -> DexResult<u128> {
        Self::read_amount(ctx, &keys::bank_balance_key(address, denom))
    }

    fn supply(&self, ctx: &Context<'_>, denom: &str) -> DexResult<u128> {
        Self::read_amount(ctx, &keys::bank_supply_key(denom))
    }

    fn balances(&self, ctx: &Context<'_>, address: &str) -> DexResult<Vec<Coin>> {
        let prefix = keys::bank_balance_prefix(address);
        ctx.scan_prefix(&prefix)?
            .into_iter()
            .map(|(key, value)| {
                let denom = String::from_utf8_lossy(&key[prefix.len()..]).into_owned();
                let amount: u128 = crate::engine::context::decode(&key, &value)?;
                Ok(Coin::new(denom, amount))
            })
            .collect()
    }

    fn send(&self, ctx: &mut Context<'_>, from: &str, to: &str, coin: &Coin) -> DexResult<()> {
        if coin.is_zero() || from == to {
            return Ok(());
        }
        Self::debit(ctx, from, coin)?;
        Self::credit(ctx, to, coin)
    }

    fn mint(&self, ctx: &mut Context<'_>, to: &str, coin: &Coin) -> DexResult<()> {
        if coin.is_zero() {
            return Ok(());
        }
        let key = keys::bank_supply_key(&coin.denom);
        let supply = Self::read_amount(ctx, &key)?;
        Self::write_amount(ctx, key, supply.checked_add(coin.amount).ok_or(DexError::Overflow)?)?;
        Self::credit(ctx, to, coin)
    }

    fn burn(&self, ctx: &mut Context<'_>, from: &str, coin: &Coin) -> DexResult<()> {
        if coin.is_zero() {
            return Ok(());
        }
        Self::debit(ctx, from, coin)?;
        let key = keys::bank_supply_key(&coin.denom);
        let supply = Self::read_amount(ctx, &key)?;
        Self::write_amount(ctx, key, supply.saturating_sub(coin.amount))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
