//! Pool registry
//!
//! Routes operations to per-pool controllers. Each controller serializes its
//! own pool; pools never share a lock, so operations on distinct pools run
//! concurrently. Map shard guards are released before any await.

use crate::controller::{
    EngineOptions, InitializeParams, LiquidityReceipt, PoolController, SwapReceipt,
};
use crate::error::AmmError;
use crate::ledger::Ledger;
use crate::pool::Pool;
use crate::types::{Caller, Identity, PoolId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, warn};

pub struct PoolRegistry<L: Ledger> {
    ledger: Arc<L>,
    options: EngineOptions,
    pools: DashMap<PoolId, Arc<PoolController<L>>>,
}

impl<L: Ledger + 'static> PoolRegistry<L> {
    pub fn new(ledger: Arc<L>, options: EngineOptions) -> Self {
        Self {
            ledger,
            options,
            pools: DashMap::new(),
        }
    }

    /// Register an empty pool; returns the existing controller if `id` is taken
    ///
    /// An existing controller keeps its original vault.
    pub fn provision(&self, id: PoolId, vault: Identity) -> Arc<PoolController<L>> {
        match self.pools.entry(id) {
            Entry::Occupied(entry) => {
                let existing = entry.get().clone();
                if *existing.vault() != vault {
                    warn!(
                        pool = %id,
                        vault = %existing.vault(),
                        requested_vault = %vault,
                        "pool already provisioned with a different vault"
                    );
                }
                existing
            }
            Entry::Vacant(entry) => {
                info!(pool = %id, vault = %vault, "pool provisioned");
                entry
                    .insert(Arc::new(PoolController::new(
                        id,
                        vault,
                        self.ledger.clone(),
                        self.options,
                    )))
                    .clone()
            }
        }
    }

    /// Register a pool from a snapshot
    ///
    /// Fails with `PoolAlreadyRegistered` when `id` is live: a second
    /// controller would guard the same reserves with a second lock.
    pub fn restore(
        &self,
        id: PoolId,
        vault: Identity,
        snapshot: &[u8],
    ) -> Result<Arc<PoolController<L>>, AmmError> {
        let pool = Pool::restore(snapshot)?;
        match self.pools.entry(id) {
            Entry::Occupied(_) => Err(AmmError::PoolAlreadyRegistered(id)),
            Entry::Vacant(entry) => {
                let controller = entry
                    .insert(Arc::new(PoolController::from_pool(
                        id,
                        vault,
                        self.ledger.clone(),
                        self.options,
                        pool,
                    )))
                    .clone();
                info!(pool = %id, "pool restored from snapshot");
                Ok(controller)
            }
        }
    }

    pub fn get(&self, id: &PoolId) -> Result<Arc<PoolController<L>>, AmmError> {
        self.pools
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or(AmmError::UnknownPool(*id))
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub async fn snapshot(&self, id: &PoolId) -> Result<Vec<u8>, AmmError> {
        self.get(id)?.pool().await.snapshot()
    }

    pub async fn initialize(&self, id: &PoolId, params: InitializeParams) -> Result<Pool, AmmError> {
        self.get(id)?.initialize(params).await
    }

    pub async fn swap(
        &self,
        id: &PoolId,
        caller: &Caller,
        amount_in_major: u64,
        source_is_a: bool,
    ) -> Result<SwapReceipt, AmmError> {
        self.get(id)?.swap(caller, amount_in_major, source_is_a).await
    }

    pub async fn add_liquidity(
        &self,
        id: &PoolId,
        caller: &Caller,
        amount_major: u64,
        target_is_a: bool,
    ) -> Result<LiquidityReceipt, AmmError> {
        self.get(id)?
            .add_liquidity(caller, amount_major, target_is_a)
            .await
    }
}
