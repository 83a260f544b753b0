//! `SeaORM` active enums, stored as short strings so the schema stays portable.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tala_core::ledger::{MovementType as CoreMovementType, WeightEventType as CoreWeightEventType};
use tala_core::trade::{
    BaseCategory as CoreBaseCategory, DeliveryStatus as CoreDeliveryStatus,
    PaymentDirection as CorePaymentDirection, SettlementDirection as CoreSettlementDirection,
    TransactionType as CoreTransactionType,
};

/// Stores a core enum one-to-one and converts in both directions.
macro_rules! mirror_enum {
    ($name:ident, $core:ident, { $($variant:ident => $value:tt),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
        #[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
        #[serde(rename_all = "snake_case")]
        #[allow(missing_docs)]
        pub enum $name {
            $(
                #[sea_orm(string_value = $value)]
                $variant,
            )+
        }

        impl From<$core> for $name {
            fn from(value: $core) -> Self {
                match value {
                    $($core::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$name> for $core {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(TransactionType, CoreTransactionType, {
    Buy => "buy",
    Sell => "sell",
});

mirror_enum!(DeliveryStatus, CoreDeliveryStatus, {
    PendingReceipt => "pending_receipt",
    PendingDelivery => "pending_delivery",
    Completed => "completed",
    Cancelled => "cancelled",
});

mirror_enum!(BaseCategory, CoreBaseCategory, {
    Melted => "melted",
    Manufactured => "manufactured",
    Coin => "coin",
    GoldBullion => "gold_bullion",
    Jewelry => "jewelry",
});

mirror_enum!(PaymentDirection, CorePaymentDirection, {
    Inflow => "inflow",
    Outflow => "outflow",
});

mirror_enum!(SettlementDirection, CoreSettlementDirection, {
    Inflow => "inflow",
    Outflow => "outflow",
});

mirror_enum!(MovementType, CoreMovementType, {
    Buy => "buy",
    Sell => "sell",
    SettlementInflow => "settlement_inflow",
    SettlementOutflow => "settlement_outflow",
    Adjustment => "adjustment",
});

mirror_enum!(WeightEventType, CoreWeightEventType, {
    Buy => "buy",
    Sell => "sell",
    SettlementInflow => "settlement_inflow",
    SettlementOutflow => "settlement_outflow",
});

/// Contact role. Has no domain counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    /// Retail customer.
    #[sea_orm(string_value = "customer")]
    Customer,
    /// Wholesale supplier.
    #[sea_orm(string_value = "supplier")]
    Supplier,
    /// Manufacturing workshop.
    #[sea_orm(string_value = "workshop")]
    Workshop,
    /// Anything else.
    #[sea_orm(string_value = "other")]
    Other,
}
