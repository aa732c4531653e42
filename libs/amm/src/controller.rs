//! Pool controller: the `Uninitialized → Active` state machine
//!
//! Each operation holds the pool lock for its whole duration, including the
//! ledger awaits, so readers never see reserves from one operation next to the
//! invariant of another. Work happens on a copy of the record; the copy is
//! written back only after every ledger step of the operation succeeded.

use crate::decimals::{to_major, to_minor, MAX_DECIMALS};
use crate::error::AmmError;
use crate::invariant::{self, SwapRounding};
use crate::ledger::Ledger;
use crate::pool::{Pool, ReserveSide};
use crate::types::{AccountId, Caller, Identity, MintId, PoolId};
use crate::unit_of_work::{TransferLeg, UnitOfWork};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Engine-wide knobs applied to every pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Largest decimal exponent accepted at initialization (capped at 19)
    pub max_decimals: u8,
    /// Defaults to `PoolFavoring`; set `Truncate` to match the literal
    /// truncating formula (out 9, `k = 2460` on the 50/50 reference pool)
    pub swap_rounding: SwapRounding,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_decimals: MAX_DECIMALS,
            swap_rounding: SwapRounding::PoolFavoring,
        }
    }
}

/// Arguments fixed by `initialize`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeParams {
    pub mint_a: MintId,
    pub mint_b: MintId,
    pub reserve_account_a: AccountId,
    pub reserve_account_b: AccountId,
    pub decimal_a: u8,
    pub decimal_b: u8,
    pub authority_key: Identity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapReceipt {
    pub amount_in_major: u64,
    pub amount_out_major: u64,
    pub invariant_before: u128,
    pub invariant_after: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityReceipt {
    pub amount_major: u64,
    pub invariant_before: u128,
    pub invariant_after: u128,
}

/// Controller for a single pool
///
/// `vault` is the identity owning both reserve accounts. It signs payouts from
/// the reserves; refunds into caller accounts are signed by the callers.
///
/// Mutating operations run on their own tokio task. Dropping the future
/// returned by `swap` or `add_liquidity` (a timeout, an aborted request) does
/// not stop the operation between two ledger steps: it still settles or rolls
/// back, and the pool lock is held until it has.
pub struct PoolController<L: Ledger> {
    core: Arc<PoolCore<L>>,
}

struct PoolCore<L: Ledger> {
    id: PoolId,
    vault: Identity,
    ledger: Arc<L>,
    options: EngineOptions,
    state: Mutex<Pool>,
}

impl<L: Ledger + 'static> PoolController<L> {
    /// Controller for a freshly provisioned, uninitialized pool
    pub fn new(id: PoolId, vault: Identity, ledger: Arc<L>, options: EngineOptions) -> Self {
        Self::from_pool(id, vault, ledger, options, Pool::default())
    }

    /// Controller resuming a persisted pool record
    pub fn from_pool(
        id: PoolId,
        vault: Identity,
        ledger: Arc<L>,
        options: EngineOptions,
        pool: Pool,
    ) -> Self {
        Self {
            core: Arc::new(PoolCore {
                id,
                vault,
                ledger,
                options,
                state: Mutex::new(pool),
            }),
        }
    }

    pub fn id(&self) -> PoolId {
        self.core.id
    }

    pub fn vault(&self) -> &Identity {
        &self.core.vault
    }

    pub fn options(&self) -> &EngineOptions {
        &self.core.options
    }

    /// Copy of the current record
    pub async fn pool(&self) -> Pool {
        self.core.state.lock().await.clone()
    }

    /// Activate the pool and seed `invariant_k` from the current reserves
    ///
    /// Reads balances only; nothing moves on the ledger.
    pub async fn initialize(&self, params: InitializeParams) -> Result<Pool, AmmError> {
        self.core.initialize(params).await
    }

    /// Swap `amount_in_major` of the source asset for the opposite asset
    pub async fn swap(
        &self,
        caller: &Caller,
        amount_in_major: u64,
        source_is_a: bool,
    ) -> Result<SwapReceipt, AmmError> {
        let core = self.core.clone();
        let caller = *caller;
        detach(async move { core.swap(&caller, amount_in_major, source_is_a).await }).await
    }

    /// One-sided reserve top-up by the pool authority
    ///
    /// The invariant is recomputed from the new reserves.
    pub async fn add_liquidity(
        &self,
        caller: &Caller,
        amount_major: u64,
        target_is_a: bool,
    ) -> Result<LiquidityReceipt, AmmError> {
        let core = self.core.clone();
        let caller = *caller;
        detach(async move { core.add_liquidity(&caller, amount_major, target_is_a).await }).await
    }
}

/// Run a ledger-mutating operation to completion on its own task
async fn detach<T, F>(operation: F) -> Result<T, AmmError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, AmmError>> + Send + 'static,
{
    match tokio::spawn(operation).await {
        Ok(result) => result,
        Err(join) if join.is_panic() => std::panic::resume_unwind(join.into_panic()),
        Err(join) => Err(AmmError::Interrupted(join.to_string())),
    }
}

impl<L: Ledger> PoolCore<L> {
    async fn initialize(&self, params: InitializeParams) -> Result<Pool, AmmError> {
        let mut state = self.state.lock().await;

        if state.is_initialized {
            return Err(AmmError::AlreadyInitialized);
        }
        if params.mint_a == params.mint_b {
            return Err(AmmError::IdenticalMints);
        }

        let max = self.options.max_decimals.min(MAX_DECIMALS);
        for decimals in [params.decimal_a, params.decimal_b] {
            if decimals > max {
                return Err(AmmError::InvalidDecimals { decimals, max });
            }
        }

        self.check_reserve_account(&params.reserve_account_a, &params.mint_a)
            .await?;
        self.check_reserve_account(&params.reserve_account_b, &params.mint_b)
            .await?;

        let balance_a = self.ledger.read_balance(&params.reserve_account_a).await?;
        let balance_b = self.ledger.read_balance(&params.reserve_account_b).await?;
        let major_a = to_major(balance_a, params.decimal_a)?;
        let major_b = to_major(balance_b, params.decimal_b)?;
        if major_a == 0 || major_b == 0 {
            return Err(AmmError::ReserveWouldEmpty);
        }

        let pool = Pool {
            authority_key: params.authority_key,
            mint_a: params.mint_a,
            mint_b: params.mint_b,
            reserve_account_a: params.reserve_account_a,
            reserve_account_b: params.reserve_account_b,
            decimal_a: params.decimal_a,
            decimal_b: params.decimal_b,
            invariant_k: invariant::product(major_a, major_b)?,
            is_initialized: true,
        };

        info!(
            pool = %self.id,
            mint_a = %pool.mint_a,
            mint_b = %pool.mint_b,
            reserve_a = major_a,
            reserve_b = major_b,
            invariant_k = %pool.invariant_k,
            "pool initialized"
        );

        *state = pool.clone();
        Ok(pool)
    }

    async fn swap(
        &self,
        caller: &Caller,
        amount_in_major: u64,
        source_is_a: bool,
    ) -> Result<SwapReceipt, AmmError> {
        let mut state = self.state.lock().await;
        let mut pool = state.clone();

        pool.ensure_active()?;
        if amount_in_major == 0 {
            return Err(AmmError::InvalidAmount);
        }

        let source = pool.side(source_is_a);
        let destination = pool.side(!source_is_a);
        let caller_source = *caller.account(source_is_a);
        let caller_destination = *caller.account(!source_is_a);

        self.check_mint(&caller_source, &source.mint).await?;
        self.check_mint(&caller_destination, &destination.mint)
            .await?;

        let reserve_in = self.reserve_major(&source).await?;
        let reserve_out = self.reserve_major(&destination).await?;

        // Everything below is priced before the first ledger mutation
        let quote = invariant::quote_swap(
            pool.invariant_k,
            reserve_in,
            reserve_out,
            amount_in_major,
            self.options.swap_rounding,
        )?;
        let amount_in_minor = to_minor(amount_in_major, source.decimals)?;
        let amount_out_minor = to_minor(quote.amount_out, destination.decimals)?;

        debug!(
            pool = %self.id,
            source_is_a,
            amount_in_major,
            amount_out_major = quote.amount_out,
            new_reserve_in = quote.new_reserve_in,
            new_reserve_out = quote.new_reserve_out,
            "swap quoted"
        );

        let mut uow = UnitOfWork::begin(self.ledger.as_ref());
        let legs = [
            TransferLeg {
                from: caller_source,
                to: source.reserve_account,
                amount_minor: amount_in_minor,
                authority: caller.identity,
                refund_authority: self.vault,
            },
            TransferLeg {
                from: destination.reserve_account,
                to: caller_destination,
                amount_minor: amount_out_minor,
                authority: self.vault,
                refund_authority: caller.identity,
            },
        ];
        let settled = self.settle(&mut uow, &legs, &pool).await;
        let invariant_after = match settled {
            Ok(k) => k,
            Err(err) => return Err(uow.rollback(err).await),
        };
        uow.commit();

        let invariant_before = pool.invariant_k;
        if !invariant::verify(
            invariant_before,
            invariant_after,
            quote.new_reserve_in,
            self.options.swap_rounding,
        ) {
            warn!(
                pool = %self.id,
                invariant_before = %invariant_before,
                invariant_after = %invariant_after,
                "invariant moved outside the rounding policy; reserves changed outside the pool"
            );
        }

        pool.invariant_k = invariant_after;
        *state = pool;

        info!(
            pool = %self.id,
            amount_in_major,
            amount_out_major = quote.amount_out,
            invariant_k = %invariant_after,
            "swap settled"
        );

        Ok(SwapReceipt {
            amount_in_major,
            amount_out_major: quote.amount_out,
            invariant_before,
            invariant_after,
        })
    }

    async fn add_liquidity(
        &self,
        caller: &Caller,
        amount_major: u64,
        target_is_a: bool,
    ) -> Result<LiquidityReceipt, AmmError> {
        let mut state = self.state.lock().await;
        let mut pool = state.clone();

        pool.ensure_active()?;
        if caller.identity != pool.authority_key {
            return Err(AmmError::Unauthorized);
        }
        if amount_major == 0 {
            return Err(AmmError::InvalidAmount);
        }

        let target = pool.side(target_is_a);
        let funding_account = *caller.account(target_is_a);
        self.check_mint(&funding_account, &target.mint).await?;
        let amount_minor = to_minor(amount_major, target.decimals)?;

        let mut uow = UnitOfWork::begin(self.ledger.as_ref());
        let legs = [TransferLeg {
            from: funding_account,
            to: target.reserve_account,
            amount_minor,
            authority: caller.identity,
            refund_authority: self.vault,
        }];
        let settled = self.settle(&mut uow, &legs, &pool).await;
        let invariant_after = match settled {
            Ok(k) => k,
            Err(err) => return Err(uow.rollback(err).await),
        };
        uow.commit();

        let invariant_before = pool.invariant_k;
        pool.invariant_k = invariant_after;
        *state = pool;

        info!(
            pool = %self.id,
            target_is_a,
            amount_major,
            invariant_before = %invariant_before,
            invariant_k = %invariant_after,
            "liquidity added"
        );

        Ok(LiquidityReceipt {
            amount_major,
            invariant_before,
            invariant_after,
        })
    }

    /// Run the legs in order, then recompute `k` from post-transfer balances
    async fn settle(
        &self,
        uow: &mut UnitOfWork<'_, L>,
        legs: &[TransferLeg],
        pool: &Pool,
    ) -> Result<u128, AmmError> {
        for leg in legs {
            uow.transfer(*leg).await?;
        }

        let balance_a = uow.read_balance(&pool.reserve_account_a).await?;
        let balance_b = uow.read_balance(&pool.reserve_account_b).await?;
        invariant::compute(balance_a, pool.decimal_a, balance_b, pool.decimal_b)
    }

    async fn reserve_major(&self, side: &ReserveSide) -> Result<u64, AmmError> {
        let balance = self.ledger.read_balance(&side.reserve_account).await?;
        to_major(balance, side.decimals)
    }

    async fn check_mint(&self, account: &AccountId, mint: &MintId) -> Result<(), AmmError> {
        if self.ledger.mint_of(account).await? != *mint {
            return Err(AmmError::MintMismatch);
        }
        Ok(())
    }

    async fn check_reserve_account(&self, account: &AccountId, mint: &MintId) -> Result<(), AmmError> {
        self.check_mint(account, mint).await?;
        if self.ledger.owner_of(account).await? != self.vault {
            return Err(AmmError::InvalidReserveOwner);
        }
        Ok(())
    }
}
