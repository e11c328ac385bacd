//! Limit order types.
//!
//! ## Behaviour by type
//!
//! | Type                | Rests on book | Expires               |
//! |---------------------|---------------|-----------------------|
//! | `GoodTilCancelled`  | yes           | never                 |
//! | `FillOrKill`        | no            | n/a, all or nothing   |
//! | `ImmediateOrCancel` | no            | n/a, partial allowed  |
//! | `JustInTime`        | yes           | end of current block  |
//! | `GoodTilTime`       | yes           | caller supplied time  |
//!
//! Wire values match the module's protobuf enum so that stored tranche users
//! keep their meaning.

use serde::{Deserialize, Serialize};

/// Order type of a `PlaceLimitOrder` message.
///
/// Represented as u8 on the wire:
/// - GoodTilCancelled = 0
/// - FillOrKill = 1
/// - ImmediateOrCancel = 2
/// - JustInTime = 3
/// - GoodTilTime = 4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LimitOrderType {
    #[default]
    GoodTilCancelled,
    FillOrKill,
    ImmediateOrCancel,
    JustInTime,
    GoodTilTime,
}

impl LimitOrderType {
    /// Convert to u8 for serialization
    pub fn to_u8(self) -> u8 {
        match self {
            LimitOrderType::GoodTilCancelled => 0,
            LimitOrderType::FillOrKill => 1,
            LimitOrderType::ImmediateOrCancel => 2,
            LimitOrderType::JustInTime => 3,
            LimitOrderType::GoodTilTime => 4,
        }
    }

    /// Convert from u8 for deserialization
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(LimitOrderType::GoodTilCancelled),
            1 => Some(LimitOrderType::FillOrKill),
            2 => Some(LimitOrderType::ImmediateOrCancel),
            3 => Some(LimitOrderType::JustInTime),
            4 => Some(LimitOrderType::GoodTilTime),
            _ => None,
        }
    }

    /// IoC and FoK only ever take liquidity.
    pub fn is_taker_only(self) -> bool {
        matches!(self, LimitOrderType::FillOrKill | LimitOrderType::ImmediateOrCancel)
    }

    pub fn is_fok(self) -> bool {
        self == LimitOrderType::FillOrKill
    }

    pub fn is_gtc(self) -> bool {
        self == LimitOrderType::GoodTilCancelled
    }

    pub fn is_jit(self) -> bool {
        self == LimitOrderType::JustInTime
    }

    pub fn is_good_til(self) -> bool {
        self == LimitOrderType::GoodTilTime
    }

    /// Types whose tranches get an expiration record.
    pub fn has_expiration(self) -> bool {
        self.is_good_til() || self.is_jit()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_type_conversion() {
        for v in 0u8..5 {
            let t = LimitOrderType::from_u8(v).unwrap();
            assert_eq!(t.to_u8(), v);
        }
        assert_eq!(LimitOrderType::from_u8(5), None);
    }

    #[test]
    fn test_taker_only() {
        assert!(LimitOrderType::FillOrKill.is_taker_only());
        assert!(LimitOrderType::ImmediateOrCancel.is_taker_only());
        assert!(!LimitOrderType::GoodTilCancelled.is_taker_only());
        assert!(!LimitOrderType::JustInTime.is_taker_only());
    }

    #[test]
    fn test_has_expiration() {
        assert!(LimitOrderType::JustInTime.has_expiration());
        assert!(LimitOrderType::GoodTilTime.has_expiration());
        assert!(!LimitOrderType::GoodTilCancelled.has_expiration());
        assert!(!LimitOrderType::FillOrKill.has_expiration());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&LimitOrderType::GoodTilTime).unwrap();
        assert_eq!(json, "\"GOOD_TIL_TIME\"");
        let back: LimitOrderType = serde_json::from_str("\"IMMEDIATE_OR_CANCEL\"").unwrap();
        assert_eq!(back, LimitOrderType::ImmediateOrCancel);
    }

    #[test]
    fn test_default_is_gtc() {
        assert!(LimitOrderType::default().is_gtc());
    }
}
