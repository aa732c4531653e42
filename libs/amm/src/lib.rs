//! # KPool AMM Core - Constant Product Pool Engine
//!
//! ## Purpose
//!
//! State machine for a two-asset constant product pool (`x * y = k`): pool
//! initialization, swaps, and one-sided liquidity top-ups by the pool authority.
//! The engine decides how much moves and whether an operation is legal; the
//! balance mutation itself is delegated to a [`Ledger`] collaborator.
//!
//! ## Integration Points
//!
//! - **Input Sources**: swap and top-up requests from callers, pool records restored from snapshots
//! - **Ledger Boundary**: `read_balance`, `mint_of`, `owner_of`, `transfer` with an explicit authorizing identity
//! - **Persistence**: bincode snapshots of the [`Pool`] record
//! - **Configuration**: [`EngineOptions`], usually built by `kpool-config`
//!
//! ## Architecture Role
//!
//! ```text
//! Caller → [PoolRegistry] → [PoolController] → [UnitOfWork] → Ledger
//!                                 ↓                  ↓
//!                          Invariant Engine    rollback on failure
//!                                 ↓
//!                          Decimal Normalizer
//! ```
//!
//! ## Precision
//!
//! - **Integer only**: balances are u64 minor units, the invariant is a u128
//!   product of major units; no floating point anywhere
//! - **Truncation**: minor → major conversion truncates toward zero, leaving
//!   fractional value with the pool
//! - **Checked arithmetic**: every conversion and product reports `Overflow`
//!   instead of wrapping
//!
//! ## Atomicity
//!
//! Operations on one pool are serialized by the controller's lock. The pool
//! record is written back only after every ledger transfer of the operation
//! succeeded; a failure part-way reverses completed transfers first.

pub mod controller;
pub mod decimals;
pub mod error;
pub mod invariant;
pub mod ledger;
pub mod pool;
pub mod registry;
pub mod types;
pub mod unit_of_work;

pub use controller::{EngineOptions, InitializeParams, LiquidityReceipt, PoolController, SwapReceipt};
pub use decimals::{to_major, to_minor, MAX_DECIMALS};
pub use error::AmmError;
pub use invariant::{SwapQuote, SwapRounding};
pub use ledger::{InMemoryLedger, Ledger, LedgerError};
pub use pool::{Pool, PoolStatus};
pub use registry::PoolRegistry;
pub use types::{AccountId, Caller, Identity, MintId, PoolId};
