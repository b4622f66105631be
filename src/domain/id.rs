//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Create a new `", stringify!($name), "` from a string.")]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[doc = concat!("Get the `", stringify!($name), "` as a string slice.")]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

string_id!(
    /// Ledger snapshot identifier. Unique per observed transfer.
    TransferId
);

string_id!(
    /// Ledger asset identifier (e.g. the asset UUID of BTC on the ledger).
    AssetId
);

string_id!(
    /// Ledger user identifier of a transfer's counterparty.
    UserId
);

string_id!(
    /// Correlation key carried in memos. Links the legs of one logical order
    /// and doubles as the order ID.
    TraceId
);

string_id!(
    /// Identifier of a transaction submitted to the ledger (e.g. a refund).
    TxId
);
