//! Type-safe identifiers for the auction simulation.
//!
//! Bids are keyed by a [`BidId`] wrapping a [`Uuid`]. The simulation builds
//! bid ids from its injected random source via
//! [`BidId::from_random_bytes`] so a seeded run produces the same ids every
//! time. Wallets are identified by a [`WalletId`] display string, which is
//! what the simulated wallet connect hands out.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Create an identifier from 16 caller-supplied random bytes.
            ///
            /// The bytes are stamped as a version 4 UUID, so the result is
            /// fully determined by the random source that produced them.
            pub const fn from_random_bytes(bytes: [u8; 16]) -> Self {
                Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a bid recorded in the ledger.
    BidId
}

/// Display identity of a simulated wallet (e.g. `k3f9...x0a2`).
///
/// This is not a credential. Two connects may produce the same identity;
/// nothing downstream relies on wallets being unique.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WalletId(String);

impl WalletId {
    /// Wrap a display string as a wallet identity.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Return the display string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identity is empty (an empty identity is never "connected").
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Display for WalletId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
