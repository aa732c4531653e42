//! Pool record
//!
//! One record per deployed pool. It is created empty by the provisioning step,
//! filled once by `initialize`, and afterwards only `invariant_k` changes.

use crate::error::AmmError;
use crate::types::{AccountId, Identity, MintId};
use serde::{Deserialize, Serialize};

/// Controller state derived from `is_initialized`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    Uninitialized,
    Active,
}

/// Persisted pool record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub authority_key: Identity,
    pub mint_a: MintId,
    pub mint_b: MintId,
    pub reserve_account_a: AccountId,
    pub reserve_account_b: AccountId,
    pub decimal_a: u8,
    pub decimal_b: u8,
    pub invariant_k: u128,
    pub is_initialized: bool,
}

/// One side of the pair as seen by a swap or a top-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveSide {
    pub mint: MintId,
    pub reserve_account: AccountId,
    pub decimals: u8,
}

impl Pool {
    pub fn status(&self) -> PoolStatus {
        if self.is_initialized {
            PoolStatus::Active
        } else {
            PoolStatus::Uninitialized
        }
    }

    pub fn ensure_active(&self) -> Result<(), AmmError> {
        match self.status() {
            PoolStatus::Active => Ok(()),
            PoolStatus::Uninitialized => Err(AmmError::NotInitialized),
        }
    }

    /// Side A (`true`) or side B (`false`)
    pub fn side(&self, is_a: bool) -> ReserveSide {
        if is_a {
            ReserveSide {
                mint: self.mint_a,
                reserve_account: self.reserve_account_a,
                decimals: self.decimal_a,
            }
        } else {
            ReserveSide {
                mint: self.mint_b,
                reserve_account: self.reserve_account_b,
                decimals: self.decimal_b,
            }
        }
    }

    /// Encode the record for durable storage
    pub fn snapshot(&self) -> Result<Vec<u8>, AmmError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a record written by [`Pool::snapshot`]
    ///
    /// An active record must name two distinct mints and carry a positive
    /// invariant; anything else was not produced by a successful initialize.
    pub fn restore(bytes: &[u8]) -> Result<Self, AmmError> {
        let pool: Pool = bincode::deserialize(bytes)?;

        if pool.is_initialized {
            if pool.mint_a == pool.mint_b {
                return Err(AmmError::Snapshot("active pool with identical mints".into()));
            }
            if pool.invariant_k == 0 {
                return Err(AmmError::Snapshot("active pool with zero invariant".into()));
            }
        }

        Ok(pool)
    }
}
