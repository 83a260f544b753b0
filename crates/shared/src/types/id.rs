//! Typed IDs for type-safe entity references.
//!
//! Every table keys its rows with an auto-incremented integer. Wrapping them
//! prevents accidentally passing a `ProductId` where a `ContactId` is expected.

use serde::{Deserialize, Serialize};

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl $name {
            /// Wraps a raw database key.
            #[must_use]
            pub const fn new(raw: i32) -> Self {
                Self(raw)
            }

            /// Returns the raw database key.
            #[must_use]
            pub const fn into_inner(self) -> i32 {
                self.0
            }
        }

        impl From<i32> for $name {
            fn from(raw: i32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

typed_id!(ContactId, "Unique identifier for a contact (customer, supplier, workshop).");
typed_id!(ProductId, "Unique identifier for a product.");
typed_id!(CategoryId, "Unique identifier for a product category.");
typed_id!(TransactionId, "Unique identifier for a buy/sell transaction.");
typed_id!(TransactionItemId, "Unique identifier for a transaction line item.");
typed_id!(PaymentId, "Unique identifier for a payment.");
typed_id!(SettlementId, "Unique identifier for a physical settlement.");
typed_id!(LedgerEntryId, "Unique identifier for an inventory or contact weight ledger row.");
