//! Ledger transfers grouped into one all-or-nothing step
//!
//! Completed legs are recorded. If a later step fails, the legs are reversed
//! newest first before the error reaches the caller, so the pool record and
//! the ledger both stay as they were.

use crate::error::AmmError;
use crate::ledger::Ledger;
use crate::types::{AccountId, Identity};
use tracing::{error, warn};

/// A single ledger transfer and the identity that can reverse it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferLeg {
    pub from: AccountId,
    pub to: AccountId,
    pub amount_minor: u64,
    /// Signs the forward transfer (owner of `from`)
    pub authority: Identity,
    /// Signs the compensating transfer (owner of `to`)
    pub refund_authority: Identity,
}

pub struct UnitOfWork<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
    completed: Vec<TransferLeg>,
    settled: bool,
}

impl<'a, L: Ledger + ?Sized> UnitOfWork<'a, L> {
    pub fn begin(ledger: &'a L) -> Self {
        Self {
            ledger,
            completed: Vec::new(),
            settled: false,
        }
    }

    /// Execute one leg; it is only recorded once the ledger confirmed it
    pub async fn transfer(&mut self, leg: TransferLeg) -> Result<(), AmmError> {
        self.ledger
            .transfer(&leg.from, &leg.to, leg.amount_minor, &leg.authority)
            .await?;
        self.completed.push(leg);
        Ok(())
    }

    pub async fn read_balance(&self, account: &AccountId) -> Result<u64, AmmError> {
        Ok(self.ledger.read_balance(account).await?)
    }

    pub fn completed(&self) -> &[TransferLeg] {
        &self.completed
    }

    /// Keep every completed leg
    pub fn commit(mut self) -> usize {
        self.settled = true;
        self.completed.len()
    }

    /// Reverse every completed leg and hand back `cause`
    ///
    /// A failing compensation stops the rollback and is reported as
    /// `RollbackFailed` together with the original cause.
    pub async fn rollback(mut self, cause: AmmError) -> AmmError {
        self.settled = true;

        while let Some(leg) = self.completed.pop() {
            warn!(
                from = %leg.to,
                to = %leg.from,
                amount_minor = leg.amount_minor,
                "reversing ledger transfer after failure: {}",
                cause
            );
            if let Err(rollback) = self
                .ledger
                .transfer(&leg.to, &leg.from, leg.amount_minor, &leg.refund_authority)
                .await
            {
                error!(
                    "rollback failed with {} legs outstanding: {}",
                    self.completed.len() + 1,
                    rollback
                );
                return AmmError::RollbackFailed {
                    cause: Box::new(cause),
                    rollback,
                };
            }
        }

        cause
    }
}

impl<L: Ledger + ?Sized> Drop for UnitOfWork<'_, L> {
    fn drop(&mut self) {
        if !self.settled && !self.completed.is_empty() {
            error!(
                "unit of work dropped with {} unsettled ledger transfers",
                self.completed.len()
            );
        }
    }
}
