//! Integer fixed-point helpers.
//!
//! Every division truncates toward zero. Rounding down is the single
//! tie-break used across matching and settlement: a vault never pays out
//! more than it holds, at the cost of leaving dust behind.

use crate::{
    Amount, DuelbookError, Result,
    constants::{PERCENT_DENOMINATOR, PRECISION_SCALE},
};

const LOW_WORD: u128 = (1 << 64) - 1;

/// `floor(a * b / d)` over a 256-bit intermediate product.
///
/// # Errors
/// `ArithmeticOverflow` if `d` is zero or the quotient does not fit in an
/// [`Amount`]. The product alone never overflows.
pub fn mul_div(a: Amount, b: Amount, d: Amount, context: &'static str) -> Result<Amount> {
    if d == 0 {
        return Err(DuelbookError::ArithmeticOverflow { context });
    }
    let (high, low) = widening_mul(a, b);
    if high == 0 {
        return Ok(low / d);
    }
    if high >= d {
        return Err(DuelbookError::ArithmeticOverflow { context });
    }
    Ok(div_wide(high, low, d))
}

/// `a * b` as `(high, low)` 128-bit words.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    let (a_lo, a_hi) = (a & LOW_WORD, a >> 64);
    let (b_lo, b_hi) = (b & LOW_WORD, b >> 64);
    let lo_lo = a_lo * b_lo;
    let lo_hi = a_lo * b_hi;
    let hi_lo = a_hi * b_lo;
    let hi_hi = a_hi * b_hi;

    let mid = (lo_lo >> 64) + (lo_hi & LOW_WORD) + (hi_lo & LOW_WORD);
    let low = (lo_lo & LOW_WORD) | (mid << 64);
    let high = hi_hi + (lo_hi >> 64) + (hi_lo >> 64) + (mid >> 64);
    (high, low)
}

/// Shift-subtract division of `(high, low)` by `d`. Requires `high < d`, so
/// the quotient fits in 128 bits.
fn div_wide(high: u128, low: u128, d: u128) -> u128 {
    let mut rem = high;
    let mut quotient: u128 = 0;
    for bit in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((low >> bit) & 1);
        quotient <<= 1;
        // `carry` set means the shifted remainder is at least 2^128 > d.
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            quotient |= 1;
        }
    }
    quotient
}

/// `part / whole` as a fraction scaled by [`PRECISION_SCALE`], rounded down.
pub fn scaled_proportion(part: Amount, whole: Amount) -> Result<Amount> {
    mul_div(part, PRECISION_SCALE, whole, "scaled_proportion")
}

/// Apply a scaled proportion to `pool`, rounded down.
pub fn apply_proportion(proportion: Amount, pool: Amount) -> Result<Amount> {
    mul_div(proportion, pool, PRECISION_SCALE, "apply_proportion")
}

/// `amount * pct / 100`, rounded down.
pub fn percent_of(amount: Amount, pct: u8) -> Result<Amount> {
    mul_div(amount, Amount::from(pct), PERCENT_DENOMINATOR, "percent_of")
}
