//! Token pair identities.
//!
//! ## PairID
//!
//! An unordered pair, canonicalized so that `token0 < token1`. Its string
//! form `token0<>token1` is the prefix of every store key for the pair.
//!
//! ## TradePairID
//!
//! A directional view of a pair: the taker supplies `taker_denom` and
//! receives `maker_denom`. Liquidity is always stored under the trade pair
//! of the taker who would consume it.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DexError, DexResult};

/// Separator between the two denoms of a pair id string.
pub const PAIR_SEPARATOR: &str = "<>";

static DENOM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9/:._-]{2,127}$").unwrap_or_else(|e| panic!("denom regex: {}", e))
});

/// Check a bank denom against the accepted syntax.
pub fn validate_denom(denom: &str) -> DexResult<()> {
    if DENOM_RE.is_match(denom) {
        Ok(())
    } else {
        Err(DexError::InvalidDenom(denom.to_string()))
    }
}

// ============================================================================
// PairID
// ============================================================================

/// Canonical unordered token pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairID {
    pub token0: String,
    pub token1: String,
}

impl PairID {
    /// Build a pair from two denoms in any order.
    ///
    /// # Example
    ///
    /// ```
    /// use dark_dex::types::PairID;
    ///
    /// let pair = PairID::new("TokenB", "TokenA").unwrap();
    /// assert_eq!(pair.token0, "TokenA");
    /// assert_eq!(pair.to_string(), "TokenA<>TokenB");
    /// assert!(PairID::new("TokenA", "TokenA").is_err());
    /// ```
    pub fn new(token_a: &str, token_b: &str) -> DexResult<Self> {
        if token_a == token_b {
            return Err(DexError::InvalidTradingPair {
                token_a: token_a.to_string(),
                token_b: token_b.to_string(),
            });
        }
        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Ok(PairID {
            token0: token0.to_string(),
            token1: token1.to_string(),
        })
    }

    /// The other token of the pair.
    ///
    /// # Panics
    ///
    /// If `token` is not part of the pair.
    pub fn opposite_token(&self, token: &str) -> &str {
        if token == self.token0 {
            &self.token1
        } else if token == self.token1 {
            &self.token0
        } else {
            panic!("token {} is not part of pair {}", token, self)
        }
    }

    /// Trade pair where `maker_denom` is the liquidity being offered.
    ///
    /// # Panics
    ///
    /// If `maker_denom` is not part of the pair.
    pub fn trade_pair_for_maker(&self, maker_denom: &str) -> TradePairID {
        let taker = self.opposite_token(maker_denom).to_string();
        TradePairID {
            maker_denom: maker_denom.to_string(),
            taker_denom: taker,
        }
    }
}

impl fmt::Display for PairID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.token0, PAIR_SEPARATOR, self.token1)
    }
}

impl FromStr for PairID {
    type Err = DexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(PAIR_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), None) if !a.is_empty() && !b.is_empty() => PairID::new(a, b),
            _ => Err(DexError::InvalidPairIdStr(s.to_string())),
        }
    }
}

// ============================================================================
// TradePairID
// ============================================================================

/// Directional pair: taker pays `taker_denom`, receives `maker_denom`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradePairID {
    pub maker_denom: String,
    pub taker_denom: String,
}

impl TradePairID {
    pub fn new(taker_denom: &str, maker_denom: &str) -> DexResult<Self> {
        if taker_denom == maker_denom {
            return Err(DexError::InvalidTradingPair {
                token_a: taker_denom.to_string(),
                token_b: maker_denom.to_string(),
            });
        }
        Ok(TradePairID {
            maker_denom: maker_denom.to_string(),
            taker_denom: taker_denom.to_string(),
        })
    }

    pub fn pair_id(&self) -> PairID {
        let (token0, token1) = if self.maker_denom < self.taker_denom {
            (&self.maker_denom, &self.taker_denom)
        } else {
            (&self.taker_denom, &self.maker_denom)
        };
        PairID {
            token0: token0.clone(),
            token1: token1.clone(),
        }
    }

    /// Same pair, opposite direction.
    pub fn reversed(&self) -> TradePairID {
        TradePairID {
            maker_denom: self.taker_denom.clone(),
            taker_denom: self.maker_denom.clone(),
        }
    }

    pub fn is_maker_denom0(&self) -> bool {
        self.maker_denom < self.taker_denom
    }

    pub fn is_taker_denom0(&self) -> bool {
        self.taker_denom < self.maker_denom
    }

    /// Convert a pair-normalized tick into this direction's taker-to-maker tick.
    ///
    /// Normalized ticks are expressed with token1 as maker, so they flip sign
    /// when token0 is the maker.
    pub fn tick_index_taker_to_maker(&self, tick_index_normalized: i64) -> i64 {
        if self.is_maker_denom0() {
            -tick_index_normalized
        } else {
            tick_index_normalized
        }
    }

    /// Inverse of [`TradePairID::tick_index_taker_to_maker`].
    pub fn tick_index_normalized(&self, tick_index_taker_to_maker: i64) -> i64 {
        self.tick_index_taker_to_maker(tick_index_taker_to_maker)
    }
}

impl fmt::Display for TradePairID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.taker_denom, self.maker_denom)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
