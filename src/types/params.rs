//! Module parameters.
//!
//! ## Defaults
//!
//! | Field                      | Default                                   |
//! |----------------------------|-------------------------------------------|
//! | `fee_tiers`                | 0, 1, 2, 3, 4, 5, 10, 20, 50, 100, 150, 200 |
//! | `max_true_taker_spread`    | 0.005                                     |
//! | `max_jits_per_block`       | 25                                        |
//! | `good_til_purge_allowance` | 540 000 gas                               |
//! | `paused`                   | false                                     |
//!
//! ## Example
//!
//! ```
//! use dark_dex::types::Params;
//!
//! let params = Params::from_json(r#"{"fee_tiers":[1,5],"paused":true}"#).unwrap();
//! assert_eq!(params.fee_tiers, vec![1, 5]);
//! assert!(params.paused);
//! assert_eq!(params.max_jits_per_block, 25);
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{DexError, DexResult};
use crate::types::prec_dec::PrecDec;

pub const DEFAULT_FEE_TIERS: [u64; 12] = [0, 1, 2, 3, 4, 5, 10, 20, 50, 100, 150, 200];
pub const DEFAULT_MAX_JITS_PER_BLOCK: u64 = 25;
pub const DEFAULT_GOOD_TIL_PURGE_ALLOWANCE: u64 = 540_000;

fn default_max_true_taker_spread() -> PrecDec {
    // 0.005
    PrecDec::from_ratio(5, 1000).unwrap_or_else(|_| PrecDec::zero())
}

/// Governance controlled parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Legal pool fees, in ticks.
    pub fee_tiers: Vec<u64>,
    /// Slippage tolerated between the limit price and the realized price.
    pub max_true_taker_spread: PrecDec,
    /// JIT orders allowed per block.
    pub max_jits_per_block: u64,
    /// Gas budget for purging GoodTilTime orders at the start of a block.
    pub good_til_purge_allowance: u64,
    /// Rejects every message while set.
    pub paused: bool,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            fee_tiers: DEFAULT_FEE_TIERS.to_vec(),
            max_true_taker_spread: default_max_true_taker_spread(),
            max_jits_per_block: DEFAULT_MAX_JITS_PER_BLOCK,
            good_til_purge_allowance: DEFAULT_GOOD_TIL_PURGE_ALLOWANCE,
            paused: false,
        }
    }
}

impl Params {
    /// Parse and validate params from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> DexResult<Self> {
        let params: Params =
            serde_json::from_str(json).map_err(|e| DexError::InvalidParams(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> DexResult<()> {
        let unique: BTreeSet<u64> = self.fee_tiers.iter().copied().collect();
        if unique.len() != self.fee_tiers.len() {
            return Err(DexError::InvalidParams("duplicate fee tier".to_string()));
        }
        if self.max_true_taker_spread >= PrecDec::one() {
            return Err(DexError::InvalidParams(format!(
                "max_true_taker_spread {} must be below 1",
                self.max_true_taker_spread
            )));
        }
        Ok(())
    }

    pub fn is_valid_fee(&self, fee: u64) -> bool {
        self.fee_tiers.contains(&fee)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
