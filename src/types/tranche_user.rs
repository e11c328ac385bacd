//! A user's position in a limit order tranche.

use serde::{Deserialize, Serialize};

use crate::types::keys;
use crate::types::order_type::LimitOrderType;
use crate::types::pair::TradePairID;
use crate::types::tranche::LimitOrderTrancheKey;

/// Shares a single address holds in one tranche.
///
/// `shares_withdrawn` counts shares already redeemed for taker tokens and
/// `shares_cancelled` counts maker tokens already refunded. Once the two add
/// up to `shares_owned` the position is closed and the record is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderTrancheUser {
    pub trade_pair_id: TradePairID,
    pub tick_index_taker_to_maker: i64,
    pub tranche_key: String,
    pub address: String,
    pub shares_owned: u128,
    pub shares_withdrawn: u128,
    pub shares_cancelled: u128,
    pub order_type: LimitOrderType,
}

impl LimitOrderTrancheUser {
    pub fn store_key(&self) -> Vec<u8> {
        keys::tranche_user_store_key(&self.address, &self.tranche_key)
    }

    /// Key of the tranche this position belongs to.
    pub fn tranche_ref(&self) -> LimitOrderTrancheKey {
        LimitOrderTrancheKey {
            trade_pair_id: self.trade_pair_id.clone(),
            tick_index_taker_to_maker: self.tick_index_taker_to_maker,
            tranche_key: self.tranche_key.clone(),
        }
    }

    /// Every share has been withdrawn or cancelled.
    pub fn is_closed(&self) -> bool {
        self.shares_withdrawn.saturating_add(self.shares_cancelled) >= self.shares_owned
    }
}
