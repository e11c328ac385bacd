//! Tick and price conversion.
//!
//! ## Overview
//!
//! Every tradable price sits on a geometric ladder indexed by an integer tick:
//!
//! ```text
//! price(tick) = 1.0001^(-tick)
//! ```
//!
//! A higher tick means a lower price. Ticks are bounded by [`MAX_TICK`] in
//! both directions so the smallest price still has enough significant digits
//! in a [`PrecDec`] to stay distinct from its neighbours.
//!
//! ## Determinism
//!
//! Powers are built by squaring from a fixed table of `1.0001^(2^k)`, each
//! product rounded half-to-even. The table is computed once and the same
//! sequence of multiplications is used for every tick, so every node derives
//! the same price bits.
//!
//! ## Examples
//!
//! ```
//! use dark_dex::types::price::{calc_price, calc_tick_index_from_price};
//!
//! let p = calc_price(-1).unwrap();
//! assert_eq!(p.to_string(), "1.0001");
//! assert_eq!(calc_tick_index_from_price(p).unwrap(), -1);
//! ```

use once_cell::sync::Lazy;
use primitive_types::U512;

use crate::error::{DexError, DexResult};
use crate::types::prec_dec::PrecDec;

/// Largest absolute tick index.
pub const MAX_TICK: i64 = 559_680;

/// Number of table entries; 2^20 > MAX_TICK.
const POW_TABLE_LEN: usize = 20;

/// `1.0001^(2^k)` for k in 0..20.
///
/// The largest entry, `1.0001^(2^19)`, is about 5.9e22. A failed build
/// surfaces through every price lookup.
static POW_TABLE: Lazy<DexResult<Vec<PrecDec>>> = Lazy::new(build_pow_table);

/// Smallest representable price, `price(MAX_TICK)`.
pub static MIN_PRICE: Lazy<DexResult<PrecDec>> = Lazy::new(|| calc_price(MAX_TICK));

/// Largest representable price, `price(-MAX_TICK)`.
pub static MAX_PRICE: Lazy<DexResult<PrecDec>> = Lazy::new(|| calc_price(-MAX_TICK));

fn build_pow_table() -> DexResult<Vec<PrecDec>> {
    // 1.0001 = 10001 / 10000, exact in 30 digits
    let mut current = PrecDec::from_ratio(10_001, 10_000)?;
    let mut table = Vec::with_capacity(POW_TABLE_LEN);
    table.push(current);
    while table.len() < POW_TABLE_LEN {
        current = current.try_mul(current)?;
        table.push(current);
    }
    Ok(table)
}

/// `1.0001^n` for `0 <= n <= MAX_TICK`.
fn base_pow(n: u64) -> DexResult<PrecDec> {
    let table = POW_TABLE.as_ref().map_err(Clone::clone)?;
    let mut acc = PrecDec::one();
    for (bit, factor) in table.iter().enumerate() {
        if n & (1 << bit) != 0 {
            acc = acc.try_mul(*factor)?;
        }
    }
    Ok(acc)
}

// ============================================================================
// Conversion Functions
// ============================================================================

/// Price at a tick: `1.0001^(-tick)`.
///
/// # Arguments
///
/// * `tick` - Tick index in `[-MAX_TICK, MAX_TICK]`
///
/// # Returns
///
/// * `Ok(PrecDec)` - The price, strictly decreasing in `tick`
/// * `Err(TickOutsideRange)` - If `|tick| > MAX_TICK`
///
/// # Example
///
/// ```
/// use dark_dex::types::price::calc_price;
/// use dark_dex::types::PrecDec;
///
/// assert_eq!(calc_price(0).unwrap(), PrecDec::one());
/// assert!(calc_price(10).unwrap() < calc_price(9).unwrap());
/// assert!(calc_price(559_681).is_err());
/// ```
pub fn calc_price(tick: i64) -> DexResult<PrecDec> {
    if is_tick_out_of_range(tick) {
        return Err(DexError::TickOutsideRange(tick));
    }
    let magnitude = base_pow(tick.unsigned_abs())?;
    if tick > 0 {
        PrecDec::one().try_quo(magnitude)
    } else {
        Ok(magnitude)
    }
}

/// Nearest tick for a price.
///
/// Finds the bracketing ticks on the ladder and picks the one closer in log
/// space. An exact ladder price maps back to its own tick.
///
/// # Returns
///
/// * `Ok(i64)` - The tick
/// * `Err(PriceOutsideRange)` - If the price is outside `[MIN_PRICE, MAX_PRICE]`
pub fn calc_tick_index_from_price(price: PrecDec) -> DexResult<i64> {
    if is_price_out_of_range(price) {
        return Err(DexError::PriceOutsideRange(price.to_string()));
    }

    // Largest tick whose price is still >= `price`.
    let mut lo = -MAX_TICK;
    let mut hi = MAX_TICK;
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if calc_price(mid)? >= price {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    let upper_price = calc_price(lo)?;
    if upper_price == price || lo == MAX_TICK {
        return Ok(lo);
    }

    // price in (price(lo + 1), price(lo)); compare p^2 with the geometric midpoint.
    let lower_price = calc_price(lo + 1)?;
    let p_sq = price.raw().full_mul(price.raw());
    let mid_sq = upper_price.raw().full_mul(lower_price.raw());
    if p_sq >= mid_sq {
        Ok(lo)
    } else {
        Ok(lo + 1)
    }
}

/// Exact rational comparison used by callers that need `a/b` versus `c/d`.
pub(crate) fn cross_ge(a: PrecDec, b: PrecDec, c: PrecDec, d: PrecDec) -> bool {
    let lhs: U512 = a.raw().full_mul(d.raw());
    let rhs: U512 = c.raw().full_mul(b.raw());
    lhs >= rhs
}

// ============================================================================
// Range Checks
// ============================================================================

pub fn is_tick_out_of_range(tick: i64) -> bool {
    tick.unsigned_abs() > MAX_TICK as u64
}

pub fn is_price_out_of_range(price: PrecDec) -> bool {
    match (MIN_PRICE.as_ref(), MAX_PRICE.as_ref()) {
        (Ok(min), Ok(max)) => price < *min || price > *max,
        _ => true,
    }
}

/// Check that a pool at `tick` with `fee` keeps both sides on the ladder.
///
/// # Errors
///
/// `TickOutsideRange` when `fee >= MAX_TICK` or `|tick| + fee > MAX_TICK`.
pub fn validate_tick_fee(tick: i64, fee: u64) -> DexResult<()> {
    let max = MAX_TICK as u64;
    if fee >= max || tick.unsigned_abs() > max - fee {
        return Err(DexError::TickOutsideRange(tick));
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_at_zero_is_one() {
        assert_eq!(calc_price(0).unwrap(), PrecDec::one());
    }

    #[test]
    fn test_price_small_ticks() {
        assert_eq!(calc_price(-1).unwrap().to_string(), "1.0001");
        assert_eq!(calc_price(-2).unwrap().to_string(), "1.00020001");
        let p1 = calc_price(1).unwrap();
        // 1 / 1.0001
        assert_eq!(p1.to_string(), "0.9999000099990000999900009999");
    }

    #[test]
    fn test_price_strictly_decreasing_near_bounds() {
        for t in (MAX_TICK - 50)..MAX_TICK {
            assert!(calc_price(t).unwrap() > calc_price(t + 1).unwrap(), "tick {}", t);
            assert!(calc_price(-t - 1).unwrap() > calc_price(-t).unwrap(), "tick {}", -t);
        }
    }

    #[test]
    fn test_pow_table_is_repeated_squares() {
        let table = POW_TABLE.as_ref().unwrap();
        assert_eq!(table.len(), POW_TABLE_LEN);
        assert_eq!(table[0].to_string(), "1.0001");
        for pair in table.windows(2) {
            assert_eq!(pair[0].try_mul(pair[0]).unwrap(), pair[1]);
        }
        // every tick uses at most the bits covered by the table
        assert!((MAX_TICK as u64) < (1 << POW_TABLE_LEN));
        assert!(MIN_PRICE.as_ref().unwrap().is_positive());
        assert!(MAX_PRICE.as_ref().unwrap() > &PrecDec::one());
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(calc_price(MAX_TICK + 1), Err(DexError::TickOutsideRange(MAX_TICK + 1)));
        assert_eq!(calc_price(-MAX_TICK - 1), Err(DexError::TickOutsideRange(-MAX_TICK - 1)));
        assert!(calc_price(MAX_TICK).is_ok());
    }

    #[test]
    fn test_round_trip_samples() {
        for t in [-MAX_TICK, -300_000, -1000, -1, 0, 1, 7, 1000, 300_000, MAX_TICK] {
            let p = calc_price(t).unwrap();
            assert_eq!(calc_tick_index_from_price(p).unwrap(), t);
        }
    }

    #[test]
    fn test_tick_from_price_rounds_to_nearest() {
        // 1.00004 is below the geometric midpoint of 1 and 1.0001
        let p: PrecDec = "1.00004".parse().unwrap();
        assert_eq!(calc_tick_index_from_price(p).unwrap(), 0);
        let p: PrecDec = "1.00006".parse().unwrap();
        assert_eq!(calc_tick_index_from_price(p).unwrap(), -1);
    }

    #[test]
    fn test_price_out_of_range() {
        assert!(calc_tick_index_from_price(PrecDec::zero()).is_err());
        let huge = (*MAX_PRICE).clone().unwrap().try_mul_int(2).unwrap();
        assert!(matches!(
            calc_tick_index_from_price(huge),
            Err(DexError::PriceOutsideRange(_))
        ));
    }

    #[test]
    fn test_validate_tick_fee() {
        assert!(validate_tick_fee(0, 1).is_ok());
        assert!(validate_tick_fee(MAX_TICK - 5, 5).is_ok());
        assert!(validate_tick_fee(MAX_TICK - 5, 6).is_err());
        assert!(validate_tick_fee(0, MAX_TICK as u64).is_err());
    }

    #[test]
    fn test_cross_ge() {
        let one = PrecDec::one();
        let two = PrecDec::from_int(2);
        assert!(cross_ge(two, one, one, one));
        assert!(!cross_ge(one, two, one, one));
    }
}
