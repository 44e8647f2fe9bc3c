//! No-hit probability curve.
//!
//! Values are unsigned 64.64 fixed point held in `u128`. `FIXED_ONE` means a
//! hit is impossible, `0` means a hit is certain. Every elapsed second
//! multiplies the no-hit probability by the per-second rate, so the chance of
//! a diagnosis keeps growing until the next roll resets the base time.

use anchor_lang::prelude::*;

use crate::{constants::FIXED_ONE, errors::MahinError};

/// Truncating 64.64 multiply for operands in `[0, FIXED_ONE]`.
pub fn mul_fixed(a: u128, b: u128) -> u128 {
    debug_assert!(a <= FIXED_ONE && b <= FIXED_ONE);
    if a == FIXED_ONE {
        return b;
    }
    if b == FIXED_ONE {
        return a;
    }
    // both < 2^64, product fits in u128
    (a * b) >> 64
}

/// `base ^ exp` by square-and-multiply.
pub fn pow_fixed(base: u128, mut exp: u64) -> u128 {
    let mut result = FIXED_ONE;
    let mut b = base.min(FIXED_ONE);
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_fixed(result, b);
        }
        exp >>= 1;
        if exp > 0 {
            b = mul_fixed(b, b);
        }
    }
    result
}

pub fn validate_per_second_probability(per_second: u128) -> Result<()> {
    require!(per_second <= FIXED_ONE, MahinError::InvalidProbability);
    Ok(())
}

/// No-hit probability of a roll evaluated at `eval_time` when the curve started at
/// `base_time`. Evaluations before the base time clamp to zero elapsed seconds.
pub fn probability_at(per_second: u128, base_time: i64, eval_time: i64) -> u128 {
    let elapsed = eval_time.saturating_sub(base_time).max(0) as u64;
    pow_fixed(per_second, elapsed)
}

/// Chance of a hit as a float, for off-chain display only.
pub fn hit_chance(probability: u128) -> f64 {
    1.0 - (probability.min(FIXED_ONE) as f64 / FIXED_ONE as f64)
}
