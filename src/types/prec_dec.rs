//! High precision fixed-point decimal used for every price and ratio.
//!
//! ## Overview
//!
//! `PrecDec` is an unsigned decimal stored as a `U256` scaled by 10^30.
//! Products and quotients are computed exactly in `U512` and rounded
//! half-to-even back to 30 fractional digits, so every node evaluating the
//! same formula gets the same bits.
//!
//! ## Why 30 digits?
//!
//! The tick ladder bottoms out at `1.0001^-559680 ≈ 5e-25`. With 30
//! fractional digits neighbouring ticks at that end still differ by dozens of
//! units in the last place, so no two ticks collapse onto the same price.
//!
//! ## Integer conversion
//!
//! Conversions back to token amounts are always explicit:
//! [`PrecDec::truncate_int`] rounds toward zero, [`PrecDec::ceil_int`] rounds
//! up. Call sites pick the direction that favors the pool.
//!
//! ## Examples
//!
//! ```
//! use dark_dex::types::PrecDec;
//!
//! let half: PrecDec = "0.5".parse().unwrap();
//! let three = PrecDec::from_int(3);
//! let product = three.try_mul(half).unwrap();
//! assert_eq!(product.to_string(), "1.5");
//! assert_eq!(product.truncate_int().unwrap(), 1);
//! assert_eq!(product.ceil_int().unwrap(), 2);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use primitive_types::{U256, U512};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DexError, DexResult};

/// Number of fractional decimal digits.
pub const PRECISION: u32 = 30;

static SCALE: Lazy<U256> = Lazy::new(|| U256::exp10(PRECISION as usize));
static SCALE_WIDE: Lazy<U512> = Lazy::new(|| U512::from(*SCALE));

/// Unsigned fixed-point decimal with 30 fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PrecDec(U256);

// ============================================================================
// Rounding helpers
// ============================================================================

/// Divide rounding half-to-even.
fn div_round_half_even(num: U512, den: U512) -> U512 {
    let (quotient, remainder) = num.div_mod(den);
    let rest = den - remainder;
    match remainder.cmp(&rest) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + U512::one(),
        Ordering::Equal => {
            if quotient.low_u64() & 1 == 1 {
                quotient + U512::one()
            } else {
                quotient
            }
        }
    }
}

fn narrow(value: U512) -> DexResult<U256> {
    U256::try_from(value).map_err(|_| DexError::Overflow)
}

/// `floor(a * b / c)` without intermediate overflow.
///
/// # Example
///
/// ```
/// use dark_dex::types::prec_dec::mul_div_floor;
///
/// assert_eq!(mul_div_floor(10, 7, 3).unwrap(), 23);
/// assert_eq!(mul_div_floor(u128::MAX, 2, 4).unwrap(), u128::MAX / 2);
/// ```
pub fn mul_div_floor(a: u128, b: u128, c: u128) -> DexResult<u128> {
    if c == 0 {
        return Err(DexError::DivisionByZero);
    }
    let product = U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or(DexError::Overflow)?;
    let quotient = product / U256::from(c);
    u128::try_from(quotient).map_err(|_| DexError::Overflow)
}

// ============================================================================
// Construction and inspection
// ============================================================================

impl PrecDec {
    /// Zero.
    pub fn zero() -> Self {
        PrecDec(U256::zero())
    }

    /// One.
    pub fn one() -> Self {
        PrecDec(*SCALE)
    }

    /// Build from a whole token amount.
    pub fn from_int(value: u128) -> Self {
        // u128::MAX * 10^30 < 2^256
        PrecDec(U256::from(value) * *SCALE)
    }

    /// Build from the raw scaled representation.
    pub fn from_raw(raw: U256) -> Self {
        PrecDec(raw)
    }

    /// Raw scaled representation (value * 10^30).
    pub fn raw(&self) -> U256 {
        self.0
    }

    /// `numerator / denominator` rounded half-to-even.
    pub fn from_ratio(numerator: u128, denominator: u128) -> DexResult<Self> {
        PrecDec::from_int(numerator).try_quo_int(denominator)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.0.is_zero()
    }

    // ========================================================================
    // Arithmetic
    // ========================================================================

    pub fn try_add(self, rhs: PrecDec) -> DexResult<PrecDec> {
        self.0
            .checked_add(rhs.0)
            .map(PrecDec)
            .ok_or(DexError::Overflow)
    }

    /// Subtraction; going below zero is an overflow.
    pub fn try_sub(self, rhs: PrecDec) -> DexResult<PrecDec> {
        self.0
            .checked_sub(rhs.0)
            .map(PrecDec)
            .ok_or(DexError::Overflow)
    }

    /// Subtraction clamped at zero.
    pub fn saturating_sub(self, rhs: PrecDec) -> PrecDec {
        if self.0 > rhs.0 {
            PrecDec(self.0 - rhs.0)
        } else {
            PrecDec::zero()
        }
    }

    /// Multiply, rounding half-to-even.
    pub fn try_mul(self, rhs: PrecDec) -> DexResult<PrecDec> {
        let wide = self.0.full_mul(rhs.0);
        narrow(div_round_half_even(wide, *SCALE_WIDE)).map(PrecDec)
    }

    /// Multiply by a whole amount. Exact.
    pub fn try_mul_int(self, rhs: u128) -> DexResult<PrecDec> {
        self.0
            .checked_mul(U256::from(rhs))
            .map(PrecDec)
            .ok_or(DexError::Overflow)
    }

    /// Divide, rounding half-to-even.
    pub fn try_quo(self, rhs: PrecDec) -> DexResult<PrecDec> {
        if rhs.is_zero() {
            return Err(DexError::DivisionByZero);
        }
        let wide = U512::from(self.0)
            .checked_mul(*SCALE_WIDE)
            .ok_or(DexError::Overflow)?;
        narrow(div_round_half_even(wide, U512::from(rhs.0))).map(PrecDec)
    }

    /// Divide by a whole amount, rounding half-to-even.
    pub fn try_quo_int(self, rhs: u128) -> DexResult<PrecDec> {
        if rhs == 0 {
            return Err(DexError::DivisionByZero);
        }
        let quotient = div_round_half_even(U512::from(self.0), U512::from(U256::from(rhs)));
        narrow(quotient).map(PrecDec)
    }

    /// Raise to an integer power by repeated squaring.
    ///
    /// Each intermediate product is rounded, matching [`PrecDec::try_mul`].
    pub fn try_pow(self, mut exponent: u64) -> DexResult<PrecDec> {
        let mut base = self;
        let mut acc = PrecDec::one();
        while exponent > 0 {
            if exponent & 1 == 1 {
                acc = acc.try_mul(base)?;
            }
            exponent >>= 1;
            if exponent > 0 {
                base = base.try_mul(base)?;
            }
        }
        Ok(acc)
    }

    // ========================================================================
    // Integer conversion
    // ========================================================================

    /// Integer part, rounding toward zero.
    pub fn truncate_int(&self) -> DexResult<u128> {
        let whole = self.0 / *SCALE;
        u128::try_from(whole).map_err(|_| DexError::Overflow)
    }

    /// Smallest integer not below the value.
    pub fn ceil_int(&self) -> DexResult<u128> {
        let (whole, fraction) = self.0.div_mod(*SCALE);
        let whole = u128::try_from(whole).map_err(|_| DexError::Overflow)?;
        if fraction.is_zero() {
            Ok(whole)
        } else {
            whole.checked_add(1).ok_or(DexError::Overflow)
        }
    }

    /// `floor(self * amount)`, computed exactly.
    pub fn mul_int_floor(&self, amount: u128) -> DexResult<u128> {
        let product = U512::from(self.0) * U512::from(U256::from(amount));
        let whole = narrow(product / *SCALE_WIDE)?;
        u128::try_from(whole).map_err(|_| DexError::Overflow)
    }

    /// `ceil(self * amount)`, computed exactly.
    pub fn mul_int_ceil(&self, amount: u128) -> DexResult<u128> {
        let product = U512::from(self.0) * U512::from(U256::from(amount));
        let (whole, rest) = product.div_mod(*SCALE_WIDE);
        let whole = narrow(whole)?;
        let whole = u128::try_from(whole).map_err(|_| DexError::Overflow)?;
        if rest.is_zero() {
            Ok(whole)
        } else {
            whole.checked_add(1).ok_or(DexError::Overflow)
        }
    }

    /// `floor(amount / divisor)`, computed exactly.
    pub fn int_div_floor(amount: u128, divisor: PrecDec) -> DexResult<u128> {
        if divisor.is_zero() {
            return Err(DexError::DivisionByZero);
        }
        let scaled = U512::from(U256::from(amount)) * *SCALE_WIDE;
        let whole = narrow(scaled / U512::from(divisor.0))?;
        u128::try_from(whole).map_err(|_| DexError::Overflow)
    }

    /// `floor(self * other)` as an integer, computed exactly.
    pub fn mul_floor_int(&self, other: PrecDec) -> DexResult<u128> {
        let product = self.0.full_mul(other.0);
        let whole = product / (*SCALE_WIDE * *SCALE_WIDE);
        u128::try_from(narrow(whole)?).map_err(|_| DexError::Overflow)
    }

    /// `floor(self * multiplier / divisor)` as an integer, computed exactly.
    pub fn mul_int_div_floor(&self, multiplier: u128, divisor: PrecDec) -> DexResult<u128> {
        if divisor.is_zero() {
            return Err(DexError::DivisionByZero);
        }
        let product = U512::from(self.0) * U512::from(U256::from(multiplier));
        let whole = product / U512::from(divisor.0);
        u128::try_from(narrow(whole)?).map_err(|_| DexError::Overflow)
    }

    /// Value rounded up to the next whole number, kept as a decimal.
    pub fn ceil(&self) -> DexResult<PrecDec> {
        Ok(PrecDec::from_int(self.ceil_int()?))
    }

    /// True when the value has no fractional part.
    pub fn is_integer(&self) -> bool {
        (self.0 % *SCALE).is_zero()
    }

    // ========================================================================
    // Decimal interop
    // ========================================================================

    /// Convert from a `rust_decimal::Decimal`.
    ///
    /// Negative values are rejected; `Decimal` never carries more than 28
    /// fractional digits so the conversion is exact.
    pub fn from_decimal(d: Decimal) -> DexResult<PrecDec> {
        if d.is_sign_negative() && !d.is_zero() {
            return Err(DexError::PriceOutsideRange(d.to_string()));
        }
        let mantissa = d.mantissa().unsigned_abs();
        let scale = d.scale();
        let raw = U256::from(mantissa)
            .checked_mul(U256::exp10((PRECISION - scale) as usize))
            .ok_or(DexError::Overflow)?;
        Ok(PrecDec(raw))
    }

    /// Lossy conversion to `Decimal` for display and logging.
    ///
    /// Digits beyond what `Decimal` can hold are rounded away; returns `None`
    /// when the integer part does not fit.
    pub fn to_decimal(&self) -> Option<Decimal> {
        let s = self.to_string();
        Decimal::from_str(&s)
            .ok()
            .or_else(|| Decimal::from_str_exact(&s).ok())
            .or_else(|| {
                let (int_part, frac_part) = s.split_once('.')?;
                let keep = 28usize.saturating_sub(int_part.len()).min(frac_part.len());
                Decimal::from_str(&format!("{}.{}", int_part, &frac_part[..keep])).ok()
            })
    }

    /// Full-width string with all 30 fractional digits.
    pub fn to_fixed_string(&self) -> String {
        let (whole, fraction) = self.0.div_mod(*SCALE);
        format!(
            "{}.{:0>width$}",
            whole,
            fraction.to_string(),
            width = PRECISION as usize
        )
    }
}

// ============================================================================
// Parsing and formatting
// ============================================================================

fn parse_plain(s: &str) -> Option<PrecDec> {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if frac_part.len() > PRECISION as usize {
        return None;
    }
    let int_value = if int_part.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(int_part).ok()?
    };
    let frac_value = if frac_part.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(frac_part).ok()? * U256::exp10(PRECISION as usize - frac_part.len())
    };
    int_value
        .checked_mul(*SCALE)?
        .checked_add(frac_value)
        .map(PrecDec)
}

impl FromStr for PrecDec {
    type Err = DexError;

    /// Parse plain decimal notation with up to 30 fractional digits, or
    /// anything `rust_decimal` understands (including scientific notation).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(value) = parse_plain(trimmed) {
            return Ok(value);
        }
        let decimal = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| DexError::PriceOutsideRange(s.to_string()))?;
        PrecDec::from_decimal(decimal)
    }
}

impl fmt::Display for PrecDec {
    /// Shortest exact representation (trailing zeros trimmed).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = self.to_fixed_string();
        let trimmed = full.trim_end_matches('0').trim_end_matches('.');
        write!(f, "{}", trimmed)
    }
}

impl Serialize for PrecDec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PrecDec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_plain(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid PrecDec {:?}", s)))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> PrecDec {
        s.parse().unwrap()
    }

    #[test]
    fn test_one_and_zero() {
        assert_eq!(PrecDec::one().to_string(), "1");
        assert_eq!(PrecDec::zero().to_string(), "0");
        assert!(PrecDec::zero().is_zero());
        assert!(PrecDec::one().is_positive());
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(dec("1.5").to_string(), "1.5");
        assert_eq!(dec("0.000000000000000000000000000001").raw(), U256::one());
        assert_eq!(dec(".25").to_string(), "0.25");
        assert_eq!(dec("42").truncate_int().unwrap(), 42);
    }

    #[test]
    fn test_parse_scientific() {
        assert_eq!(dec("1e-3").to_string(), "0.001");
        assert_eq!(dec("2.5E2").to_string(), "250");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("abc".parse::<PrecDec>().is_err());
        assert!("".parse::<PrecDec>().is_err());
        assert!("-1".parse::<PrecDec>().is_err());
    }

    #[test]
    fn test_mul_rounds_half_even() {
        let tiny = PrecDec::from_raw(U256::one()); // 1e-30
        let half = dec("0.5");
        // 0.5e-30 rounds to even (0)
        assert_eq!(tiny.try_mul(half).unwrap(), PrecDec::zero());
        // 1.5e-30 rounds to 2e-30
        let three = PrecDec::from_raw(U256::from(3u8));
        assert_eq!(three.try_mul(half).unwrap().raw(), U256::from(2u8));
    }

    #[test]
    fn test_quo() {
        let third = PrecDec::one().try_quo(PrecDec::from_int(3)).unwrap();
        assert_eq!(third.to_string(), "0.333333333333333333333333333333");
        let two_thirds = PrecDec::from_int(2).try_quo_int(3).unwrap();
        assert_eq!(two_thirds.to_string(), "0.666666666666666666666666666667");
        assert_eq!(PrecDec::one().try_quo(PrecDec::zero()), Err(DexError::DivisionByZero));
    }

    #[test]
    fn test_truncate_and_ceil() {
        let v = dec("7.000000000000000000000000000001");
        assert_eq!(v.truncate_int().unwrap(), 7);
        assert_eq!(v.ceil_int().unwrap(), 8);
        assert_eq!(PrecDec::from_int(7).ceil_int().unwrap(), 7);
        assert!(PrecDec::from_int(7).is_integer());
        assert!(!v.is_integer());
    }

    #[test]
    fn test_sub_underflow() {
        assert_eq!(PrecDec::zero().try_sub(PrecDec::one()), Err(DexError::Overflow));
        assert_eq!(PrecDec::zero().saturating_sub(PrecDec::one()), PrecDec::zero());
    }

    #[test]
    fn test_pow() {
        let base = dec("1.0001");
        assert_eq!(base.try_pow(0).unwrap(), PrecDec::one());
        assert_eq!(base.try_pow(2).unwrap().to_string(), "1.00020001");
        assert_eq!(dec("2").try_pow(10).unwrap(), PrecDec::from_int(1024));
    }

    #[test]
    fn test_mul_int_exact() {
        let price = dec("1.25");
        assert_eq!(price.try_mul_int(4).unwrap(), PrecDec::from_int(5));
    }

    #[test]
    fn test_decimal_roundtrip() {
        let d = Decimal::from_str("123.456").unwrap();
        let p = PrecDec::from_decimal(d).unwrap();
        assert_eq!(p.to_string(), "123.456");
        assert_eq!(p.to_decimal().unwrap(), d);
    }

    #[test]
    fn test_serde_as_string() {
        let v = dec("0.005");
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"0.005\"");
        let back: PrecDec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_mul_div_floor() {
        assert_eq!(mul_div_floor(100, 3, 7).unwrap(), 42);
        assert_eq!(mul_div_floor(1, 1, 0), Err(DexError::DivisionByZero));
    }

    #[test]
    fn test_exact_integer_rounding() {
        let price = dec("1.0001");
        assert_eq!(price.mul_int_floor(10).unwrap(), 10);
        assert_eq!(price.mul_int_ceil(10).unwrap(), 11);
        assert_eq!(PrecDec::from_int(2).mul_int_ceil(10).unwrap(), 20);
        assert_eq!(PrecDec::int_div_floor(10, price).unwrap(), 9);
        assert_eq!(PrecDec::int_div_floor(10, PrecDec::from_int(2)).unwrap(), 5);
        assert_eq!(PrecDec::int_div_floor(1, PrecDec::zero()), Err(DexError::DivisionByZero));
    }

    #[test]
    fn test_mul_div_helpers() {
        let value = dec("7.5");
        assert_eq!(value.mul_floor_int(dec("2.1")).unwrap(), 15);
        assert_eq!(value.mul_int_div_floor(3, PrecDec::from_int(2)).unwrap(), 11);
        assert_eq!(value.mul_int_div_floor(3, PrecDec::zero()), Err(DexError::DivisionByZero));
    }

    #[test]
    fn test_ordering() {
        assert!(dec("0.1") < dec("0.2"));
        assert!(dec("10") > dec("9.999999999"));
    }
}
