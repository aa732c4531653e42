//! Minor/major unit conversion
//!
//! Ledger balances are integers in minor units (`10^decimals` minor units per
//! major unit). The invariant is computed on major units. `to_major` truncates
//! toward zero so any fractional remainder stays with the pool.

use crate::error::AmmError;

/// Largest exponent whose scale fits in a u64 (`10^19 < 2^64 < 10^20`)
pub const MAX_DECIMALS: u8 = 19;

/// `10^decimals`, failing with `Overflow` past [`MAX_DECIMALS`]
pub fn scale(decimals: u8) -> Result<u64, AmmError> {
    10u64
        .checked_pow(u32::from(decimals))
        .ok_or(AmmError::Overflow)
}

/// Minor units → major units, truncating
pub fn to_major(amount_minor: u64, decimals: u8) -> Result<u64, AmmError> {
    Ok(amount_minor / scale(decimals)?)
}

/// Major units → minor units
pub fn to_minor(amount_major: u64, decimals: u8) -> Result<u64, AmmError> {
    amount_major
        .checked_mul(scale(decimals)?)
        .ok_or(AmmError::Overflow)
}
