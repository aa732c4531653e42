//! Concurrent operations: serialized per pool, independent across pools

mod common;

use common::{AUTHORITY, MINT_A, MINT_B, VAULT};
use futures::future::join_all;
use kpool_amm::{
    to_major, AccountId, Caller, EngineOptions, Identity, InMemoryLedger, InitializeParams,
    PoolId, PoolRegistry,
};
use std::sync::Arc;

const TRADERS: u8 = 16;
const RESERVE_MAJOR: u64 = 1_000_000;

fn trader(index: u8) -> Caller {
    Caller::new(
        Identity::new([0x50 + index; 32]),
        AccountId::new([0x80 + index; 32]),
        AccountId::new([0xa0 + index; 32]),
    )
}

fn reserves(pool_tag: u8) -> (AccountId, AccountId) {
    (
        AccountId::new([pool_tag; 32]),
        AccountId::new([pool_tag + 1; 32]),
    )
}

fn params(pool_tag: u8) -> InitializeParams {
    let (reserve_a, reserve_b) = reserves(pool_tag);
    InitializeParams {
        mint_a: MINT_A,
        mint_b: MINT_B,
        reserve_account_a: reserve_a,
        reserve_account_b: reserve_b,
        decimal_a: 0,
        decimal_b: 2,
        authority_key: AUTHORITY,
    }
}

fn open_accounts(ledger: &InMemoryLedger, pool_tags: &[u8]) {
    for tag in pool_tags {
        let (reserve_a, reserve_b) = reserves(*tag);
        ledger.open_account(reserve_a, VAULT, MINT_A, RESERVE_MAJOR);
        ledger.open_account(reserve_b, VAULT, MINT_B, RESERVE_MAJOR * 100);
    }
    for i in 0..TRADERS {
        let caller = trader(i);
        ledger.open_account(caller.account_a, caller.identity, MINT_A, 100_000);
        ledger.open_account(caller.account_b, caller.identity, MINT_B, 100_000 * 100);
    }
}

fn total(ledger: &InMemoryLedger, accounts: impl IntoIterator<Item = AccountId>) -> u64 {
    accounts
        .into_iter()
        .map(|account| ledger.balance(&account).unwrap())
        .sum()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_swaps_keep_invariant_consistent() {
    let ledger = Arc::new(InMemoryLedger::new());
    open_accounts(&ledger, &[0x10]);
    let registry = Arc::new(PoolRegistry::new(ledger.clone(), EngineOptions::default()));
    let id = PoolId::new([1; 32]);
    registry.provision(id, VAULT);
    let initial = registry.initialize(&id, params(0x10)).await.unwrap();

    let accounts_a: Vec<AccountId> = (0..TRADERS)
        .map(|i| trader(i).account_a)
        .chain([reserves(0x10).0])
        .collect();
    let supply_a = total(&ledger, accounts_a.clone());

    let handles = (0..TRADERS).map(|i| {
        let registry = registry.clone();
        tokio::spawn(async move {
            let caller = trader(i);
            for round in 0..8u64 {
                let source_is_a = (u64::from(i) + round) % 2 == 0;
                registry
                    .swap(&id, &caller, 500 + round * 10, source_is_a)
                    .await?;
            }
            Ok::<_, kpool_amm::AmmError>(())
        })
    });

    for result in join_all(handles).await {
        result.unwrap().unwrap();
    }

    let pool = registry.get(&id).unwrap().pool().await;
    let major_a = to_major(ledger.balance(&pool.reserve_account_a).unwrap(), pool.decimal_a).unwrap();
    let major_b = to_major(ledger.balance(&pool.reserve_account_b).unwrap(), pool.decimal_b).unwrap();
    assert_eq!(pool.invariant_k, u128::from(major_a) * u128::from(major_b));
    assert!(pool.invariant_k >= initial.invariant_k);
    assert_eq!(total(&ledger, accounts_a), supply_a);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pools_are_independent() {
    let ledger = Arc::new(InMemoryLedger::new());
    open_accounts(&ledger, &[0x10, 0x20]);
    let registry = Arc::new(PoolRegistry::new(ledger.clone(), EngineOptions::default()));
    let first = PoolId::new([1; 32]);
    let second = PoolId::new([2; 32]);
    registry.provision(first, VAULT);
    registry.provision(second, VAULT);
    registry.initialize(&first, params(0x10)).await.unwrap();
    registry.initialize(&second, params(0x20)).await.unwrap();

    let handles = (0..TRADERS).map(|i| {
        let registry = registry.clone();
        let id = if i % 2 == 0 { first } else { second };
        tokio::spawn(async move { registry.swap(&id, &trader(i), 1_000, true).await })
    });
    for result in join_all(handles).await {
        result.unwrap().unwrap();
    }

    // Each pool saw exactly its own eight swaps of 1000 A
    for (id, tag) in [(first, 0x10), (second, 0x20)] {
        let pool = registry.get(&id).unwrap().pool().await;
        let (reserve_a, reserve_b) = reserves(tag);
        assert_eq!(ledger.balance(&reserve_a), Some(RESERVE_MAJOR + 8_000));
        let major_b = to_major(ledger.balance(&reserve_b).unwrap(), 2).unwrap();
        assert_eq!(pool.invariant_k, u128::from(RESERVE_MAJOR + 8_000) * u128::from(major_b));
        assert!(pool.invariant_k >= u128::from(RESERVE_MAJOR) * u128::from(RESERVE_MAJOR));
    }
}
