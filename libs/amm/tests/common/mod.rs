//! Shared fixtures: a 50.00 A / 50.000 B pool with one trader and one authority

#![allow(dead_code)]

use async_trait::async_trait;
use kpool_amm::{
    to_major, AccountId, Caller, Identity, InMemoryLedger, InitializeParams, Ledger, LedgerError,
    MintId, Pool,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Semaphore;

pub const VAULT: Identity = Identity::new([0xaa; 32]);
pub const AUTHORITY: Identity = Identity::new([0xbb; 32]);
pub const TRADER: Identity = Identity::new([0xcc; 32]);

pub const MINT_A: MintId = MintId::new([0x01; 32]);
pub const MINT_B: MintId = MintId::new([0x02; 32]);

pub const RESERVE_A: AccountId = AccountId::new([0x10; 32]);
pub const RESERVE_B: AccountId = AccountId::new([0x11; 32]);
pub const AUTHORITY_A: AccountId = AccountId::new([0x20; 32]);
pub const AUTHORITY_B: AccountId = AccountId::new([0x21; 32]);
pub const TRADER_A: AccountId = AccountId::new([0x30; 32]);
pub const TRADER_B: AccountId = AccountId::new([0x31; 32]);

pub const DECIMAL_A: u8 = 2;
pub const DECIMAL_B: u8 = 3;

/// Opening balances: reserves 50/50 major, authority and trader 1000 major each
pub fn open_scenario_accounts(ledger: &InMemoryLedger) {
    ledger.open_account(RESERVE_A, VAULT, MINT_A, 50 * 100);
    ledger.open_account(RESERVE_B, VAULT, MINT_B, 50 * 1_000);
    ledger.open_account(AUTHORITY_A, AUTHORITY, MINT_A, 1_000 * 100);
    ledger.open_account(AUTHORITY_B, AUTHORITY, MINT_B, 1_000 * 1_000);
    ledger.open_account(TRADER_A, TRADER, MINT_A, 1_000 * 100);
    ledger.open_account(TRADER_B, TRADER, MINT_B, 1_000 * 1_000);
}

pub fn init_params() -> InitializeParams {
    InitializeParams {
        mint_a: MINT_A,
        mint_b: MINT_B,
        reserve_account_a: RESERVE_A,
        reserve_account_b: RESERVE_B,
        decimal_a: DECIMAL_A,
        decimal_b: DECIMAL_B,
        authority_key: AUTHORITY,
    }
}

pub fn trader() -> Caller {
    Caller::new(TRADER, TRADER_A, TRADER_B)
}

pub fn authority() -> Caller {
    Caller::new(AUTHORITY, AUTHORITY_A, AUTHORITY_B)
}

/// Balances of every scenario account, in a fixed order
pub fn balances(ledger: &InMemoryLedger) -> Vec<Option<u64>> {
    [RESERVE_A, RESERVE_B, AUTHORITY_A, AUTHORITY_B, TRADER_A, TRADER_B]
        .iter()
        .map(|account| ledger.balance(account))
        .collect()
}

/// Live major-unit reserves of a pool
pub fn reserve_majors(ledger: &InMemoryLedger, pool: &Pool) -> (u64, u64) {
    let a = ledger.balance(&pool.reserve_account_a).unwrap_or(0);
    let b = ledger.balance(&pool.reserve_account_b).unwrap_or(0);
    (
        to_major(a, pool.decimal_a).unwrap(),
        to_major(b, pool.decimal_b).unwrap(),
    )
}

/// In-memory ledger with injectable failures
#[derive(Default)]
pub struct FlakyLedger {
    pub inner: InMemoryLedger,
    failing_sources: Mutex<HashSet<AccountId>>,
    fail_reads_after_transfer: AtomicBool,
    transfers_seen: AtomicUsize,
}

impl FlakyLedger {
    /// Every transfer debiting `account` fails with `Unavailable`
    pub fn fail_transfers_from(&self, account: AccountId) {
        self.failing_sources.lock().insert(account);
    }

    /// Balance reads fail once a transfer has gone through
    pub fn fail_reads_after_transfer(&self) {
        self.transfers_seen.store(0, Ordering::SeqCst);
        self.fail_reads_after_transfer.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Ledger for FlakyLedger {
    async fn read_balance(&self, account: &AccountId) -> Result<u64, LedgerError> {
        if self.fail_reads_after_transfer.load(Ordering::SeqCst)
            && self.transfers_seen.load(Ordering::SeqCst) > 0
        {
            return Err(LedgerError::Unavailable("injected read failure".into()));
        }
        self.inner.read_balance(account).await
    }

    async fn mint_of(&self, account: &AccountId) -> Result<MintId, LedgerError> {
        self.inner.mint_of(account).await
    }

    async fn owner_of(&self, account: &AccountId) -> Result<Identity, LedgerError> {
        self.inner.owner_of(account).await
    }

    async fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount_minor: u64,
        authority: &Identity,
    ) -> Result<(), LedgerError> {
        if self.failing_sources.lock().contains(from) {
            return Err(LedgerError::Unavailable("injected transfer failure".into()));
        }
        self.inner.transfer(from, to, amount_minor, authority).await?;
        self.transfers_seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory ledger whose transfers out of one account wait for `release`
pub struct StallingLedger {
    pub inner: InMemoryLedger,
    stalled: AccountId,
    gate: Semaphore,
    fail_on_release: AtomicBool,
}

impl StallingLedger {
    pub fn new(stalled: AccountId) -> Self {
        Self {
            inner: InMemoryLedger::new(),
            stalled,
            gate: Semaphore::new(0),
            fail_on_release: AtomicBool::new(false),
        }
    }

    /// Let waiting transfers continue; with `fail` they report `Unavailable`
    pub fn release(&self, fail: bool) {
        self.fail_on_release.store(fail, Ordering::SeqCst);
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl Ledger for StallingLedger {
    async fn read_balance(&self, account: &AccountId) -> Result<u64, LedgerError> {
        self.inner.read_balance(account).await
    }

    async fn mint_of(&self, account: &AccountId) -> Result<MintId, LedgerError> {
        self.inner.mint_of(account).await
    }

    async fn owner_of(&self, account: &AccountId) -> Result<Identity, LedgerError> {
        self.inner.owner_of(account).await
    }

    async fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount_minor: u64,
        authority: &Identity,
    ) -> Result<(), LedgerError> {
        if *from == self.stalled {
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|err| LedgerError::Unavailable(err.to_string()))?;
            if self.fail_on_release.load(Ordering::SeqCst) {
                return Err(LedgerError::Unavailable("injected late failure".into()));
            }
        }
        self.inner.transfer(from, to, amount_minor, authority).await
    }
}
