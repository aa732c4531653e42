//! Constant product invariant (x * y = k) on major units
//!
//! Exact integer arithmetic only. Reserves are u64 major units, so their
//! product always fits the u128 invariant; checked operations guard the rest.

use crate::decimals::to_major;
use crate::error::AmmError;
use serde::{Deserialize, Serialize};

/// Rounding applied to the post-swap output reserve `k / new_reserve_in`
///
/// On a 50/50 pool (`k = 2500`) a swap of 10 in pays out 8 and leaves
/// `k = 2520` under `PoolFavoring`, and pays out 9 leaving `k = 2460` under
/// `Truncate`. `Truncate` is the literal `new_out = k / new_in` formula and
/// reproduces that 9 / 2460 reference scenario; only `PoolFavoring` keeps the
/// invariant from decreasing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapRounding {
    /// Round the remaining output reserve up, so `new_in * new_out >= k`
    #[default]
    PoolFavoring,
    /// Truncate the remaining output reserve, so `new_in * new_out <= k`
    Truncate,
}

/// Result of pricing a swap against the current reserves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    pub new_reserve_in: u64,
    pub new_reserve_out: u64,
    pub amount_out: u64,
}

/// `to_major(a) * to_major(b)` for a pair of minor-unit reserves
pub fn compute(
    reserve_a_minor: u64,
    decimal_a: u8,
    reserve_b_minor: u64,
    decimal_b: u8,
) -> Result<u128, AmmError> {
    let a = to_major(reserve_a_minor, decimal_a)?;
    let b = to_major(reserve_b_minor, decimal_b)?;
    product(a, b)
}

/// Product of two major-unit reserves
pub fn product(reserve_a_major: u64, reserve_b_major: u64) -> Result<u128, AmmError> {
    u128::from(reserve_a_major)
        .checked_mul(u128::from(reserve_b_major))
        .ok_or(AmmError::Overflow)
}

/// Price a swap of `amount_in` major units against the current reserves
///
/// `new_in = reserve_in + amount_in`, `new_out = k / new_in` (rounded per
/// `rounding`), `amount_out = reserve_out - new_out`.
///
/// # Errors
/// - `InvalidAmount` when `amount_in` is zero or the output is not positive
/// - `ReserveWouldEmpty` when the output reserve would reach zero
/// - `Overflow` when the input reserve no longer fits a u64
pub fn quote_swap(
    invariant_k: u128,
    reserve_in: u64,
    reserve_out: u64,
    amount_in: u64,
    rounding: SwapRounding,
) -> Result<SwapQuote, AmmError> {
    if amount_in == 0 {
        return Err(AmmError::InvalidAmount);
    }

    let new_reserve_in = reserve_in
        .checked_add(amount_in)
        .ok_or(AmmError::Overflow)?;
    let divisor = u128::from(new_reserve_in);

    let new_reserve_out = match rounding {
        SwapRounding::PoolFavoring => invariant_k.div_ceil(divisor),
        SwapRounding::Truncate => invariant_k / divisor,
    };

    if new_reserve_out == 0 {
        return Err(AmmError::ReserveWouldEmpty);
    }

    // new_out > reserve_out happens when k exceeds the live reserve product
    let amount_out = u128::from(reserve_out)
        .checked_sub(new_reserve_out)
        .filter(|out| *out > 0)
        .ok_or(AmmError::InvalidAmount)?;

    Ok(SwapQuote {
        new_reserve_in,
        new_reserve_out: u64::try_from(new_reserve_out).map_err(|_| AmmError::Overflow)?,
        amount_out: u64::try_from(amount_out).map_err(|_| AmmError::Overflow)?,
    })
}

/// Whether a post-swap invariant stays within the rounding policy
///
/// Pool-favoring rounding never lowers `k`. Truncation may lower it, but by
/// less than the new input reserve (one unit of output reserve).
pub fn verify(k_before: u128, k_after: u128, new_reserve_in: u64, rounding: SwapRounding) -> bool {
    match rounding {
        SwapRounding::PoolFavoring => k_after >= k_before,
        SwapRounding::Truncate => k_after.saturating_add(u128::from(new_reserve_in)) > k_before,
    }
}
