//! Error taxonomy for pool operations
//!
//! Every variant aborts the operation with the pool record untouched. Ledger
//! failures keep their own kind inside [`AmmError::LedgerFailure`].

use crate::ledger::LedgerError;
use crate::types::PoolId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmmError {
    #[error("Pool is already initialized")]
    AlreadyInitialized,

    #[error("Pool is not initialized")]
    NotInitialized,

    #[error("Caller is not the pool authority")]
    Unauthorized,

    #[error("Amount must be positive and produce a positive output")]
    InvalidAmount,

    #[error("Operation would drain a pool reserve")]
    ReserveWouldEmpty,

    #[error("Ledger failure: {0}")]
    LedgerFailure(#[from] LedgerError),

    #[error("Arithmetic overflow in invariant or unit conversion")]
    Overflow,

    #[error("Account does not hold the expected mint")]
    MintMismatch,

    #[error("Pool mints must be different")]
    IdenticalMints,

    #[error("Decimal exponent {decimals} exceeds maximum {max}")]
    InvalidDecimals { decimals: u8, max: u8 },

    #[error("Reserve account is not owned by the pool vault")]
    InvalidReserveOwner,

    #[error("Rollback failed after {cause}: {rollback}")]
    RollbackFailed {
        cause: Box<AmmError>,
        rollback: LedgerError,
    },

    #[error("Pool snapshot error: {0}")]
    Snapshot(String),

    #[error("Unknown pool {0}")]
    UnknownPool(PoolId),

    #[error("Pool {0} is already registered")]
    PoolAlreadyRegistered(PoolId),

    #[error("Pool operation task was interrupted: {0}")]
    Interrupted(String),
}

impl From<bincode::Error> for AmmError {
    fn from(err: bincode::Error) -> Self {
        AmmError::Snapshot(err.to_string())
    }
}
