//! Pool registry and expiration records.

use serde::{Deserialize, Serialize};

use crate::types::keys;
use crate::types::pair::PairID;
use crate::types::tranche::LimitOrderTrancheKey;

/// Registry entry for a pool id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMetadata {
    pub id: u64,
    /// Center tick, normalized to token1 as maker.
    pub tick: i64,
    pub fee: u64,
    pub pair_id: PairID,
}

impl PoolMetadata {
    pub fn store_key(&self) -> Vec<u8> {
        keys::pool_metadata_store_key(self.id)
    }
}

/// Pending expiry of a GoodTilTime or JIT tranche.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderExpiration {
    /// Unix seconds; `0` for JIT.
    pub expiration_time: u64,
    pub tranche_key: LimitOrderTrancheKey,
}

impl LimitOrderExpiration {
    pub fn store_key(&self) -> Vec<u8> {
        keys::expiration_store_key(self.expiration_time, &self.tranche_key.key_marshal())
    }
}
