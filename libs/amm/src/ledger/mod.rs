//! Ledger collaborator contract
//!
//! The ledger owns balances and executes transfers; the pool only decides how
//! much to move. Every mutating call names the identity that authorizes it.

mod memory;

pub use memory::InMemoryLedger;

use crate::types::{AccountId, Identity, MintId};
use async_trait::async_trait;
use thiserror::Error;

/// Failures surfaced by a ledger implementation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Account {0} not found")]
    AccountNotFound(AccountId),

    #[error("Insufficient balance in {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        account: AccountId,
        available: u64,
        requested: u64,
    },

    #[error("{identity} is not authorized to debit {account}")]
    Unauthorized {
        account: AccountId,
        identity: Identity,
    },

    #[error("Transfer between accounts of different mints: {from} -> {to}")]
    MintMismatch { from: AccountId, to: AccountId },

    #[error("Balance overflow crediting {0}")]
    BalanceOverflow(AccountId),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Balance reads and transfers between named accounts
///
/// Implementations may be remote; a returned `Ok` means the mutation is
/// durable.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Balance in minor units
    async fn read_balance(&self, account: &AccountId) -> Result<u64, LedgerError>;

    /// Mint held by the account
    async fn mint_of(&self, account: &AccountId) -> Result<MintId, LedgerError>;

    /// Identity allowed to debit the account
    async fn owner_of(&self, account: &AccountId) -> Result<Identity, LedgerError>;

    /// Move `amount_minor` from `from` to `to`, authorized by `authority`
    async fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount_minor: u64,
        authority: &Identity,
    ) -> Result<(), LedgerError>;
}
