//! Identifier types shared by the pool, the ledger contract and callers
//!
//! Every identifier is a 32-byte key. They are kept as distinct newtypes so an
//! account can never be passed where a mint or a signer is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generate a 32-byte key newtype with hex display and byte accessors
macro_rules! define_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name([u8; 32]);

        impl $name {
            /// All-zero key, used by uninitialized pools
            pub const ZERO: Self = Self([0u8; 32]);

            pub const fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({}…)", stringify!($name), &hex::encode(self.0)[..8])
            }
        }
    };
}

define_key! {
    /// Signing identity: pool authority, pool vault or swap caller
    Identity
}

define_key! {
    /// Ledger account holding a balance of exactly one mint
    AccountId
}

define_key! {
    /// Asset type identifier
    MintId
}

define_key! {
    /// Registry key for a deployed pool
    PoolId
}

/// Caller of a pool operation together with its holding accounts
///
/// `account_a` holds the pool's mint A and `account_b` its mint B. Add-liquidity
/// only touches the account on the targeted side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub identity: Identity,
    pub account_a: AccountId,
    pub account_b: AccountId,
}

impl Caller {
    pub fn new(identity: Identity, account_a: AccountId, account_b: AccountId) -> Self {
        Self {
            identity,
            account_a,
            account_b,
        }
    }

    /// Holding account for side A (`true`) or side B (`false`)
    pub fn account(&self, side_is_a: bool) -> &AccountId {
        if side_is_a {
            &self.account_a
        } else {
            &self.account_b
        }
    }
}
