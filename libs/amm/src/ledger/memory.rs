//! In-process ledger for tests and local simulation

use super::{Ledger, LedgerError};
use crate::types::{AccountId, Identity, MintId};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
struct LedgerAccount {
    owner: Identity,
    mint: MintId,
    balance: u64,
}

/// Ledger holding every account in memory
///
/// Transfers are applied under a single write lock, so each one is atomic.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: RwLock<HashMap<AccountId, LedgerAccount>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) an account with an opening balance
    pub fn open_account(&self, account: AccountId, owner: Identity, mint: MintId, balance: u64) {
        self.accounts.write().insert(
            account,
            LedgerAccount {
                owner,
                mint,
                balance,
            },
        );
    }

    /// Current balance, `None` for unknown accounts
    pub fn balance(&self, account: &AccountId) -> Option<u64> {
        self.accounts.read().get(account).map(|a| a.balance)
    }

    fn with_account<T>(
        &self,
        account: &AccountId,
        f: impl FnOnce(&LedgerAccount) -> T,
    ) -> Result<T, LedgerError> {
        self.accounts
            .read()
            .get(account)
            .map(f)
            .ok_or(LedgerError::AccountNotFound(*account))
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn read_balance(&self, account: &AccountId) -> Result<u64, LedgerError> {
        self.with_account(account, |a| a.balance)
    }

    async fn mint_of(&self, account: &AccountId) -> Result<MintId, LedgerError> {
        self.with_account(account, |a| a.mint)
    }

    async fn owner_of(&self, account: &AccountId) -> Result<Identity, LedgerError> {
        self.with_account(account, |a| a.owner)
    }

    async fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount_minor: u64,
        authority: &Identity,
    ) -> Result<(), LedgerError> {
        let mut accounts = self.accounts.write();

        let source = accounts
            .get(from)
            .ok_or(LedgerError::AccountNotFound(*from))?;
        let destination = accounts.get(to).ok_or(LedgerError::AccountNotFound(*to))?;

        if source.owner != *authority {
            return Err(LedgerError::Unauthorized {
                account: *from,
                identity: *authority,
            });
        }
        if source.mint != destination.mint {
            return Err(LedgerError::MintMismatch {
                from: *from,
                to: *to,
            });
        }
        if source.balance < amount_minor {
            return Err(LedgerError::InsufficientBalance {
                account: *from,
                available: source.balance,
                requested: amount_minor,
            });
        }
        if from == to {
            return Ok(());
        }

        let credited = destination
            .balance
            .checked_add(amount_minor)
            .ok_or(LedgerError::BalanceOverflow(*to))?;

        // Both checks passed; apply debit and credit under the same lock
        if let Some(source) = accounts.get_mut(from) {
            source.balance -= amount_minor;
        }
        if let Some(destination) = accounts.get_mut(to) {
            destination.balance = credited;
        }

        debug!(%from, %to, amount_minor, "ledger transfer applied");
        Ok(())
    }
}
