//! Trades, physical settlements and payments.
//!
//! - `types` - inputs, statuses and the per-category item variants
//! - `validation` - input rules checked before any write
//! - `effects` - the ledger writes a completed trade or settlement produces

pub mod effects;
pub mod types;
pub mod validation;

pub use effects::{
    CaratDelta, ContactWeightDelta, InventoryDelta, LineEffect, MovementValuation,
    merge_carat_deltas, plan_settlement_effects, plan_transaction_effects,
};
pub use types::{
    BaseCategory, CreatePaymentInput, CreateSettlementInput, CreateTransactionInput,
    DeliveryStatus, ItemCharges, ItemDetails, PaymentDirection, PreparedItem,
    PreparedSettlementItem, ProductProfile, SettlementDirection, SettlementItemInput,
    TransactionItemInput, TransactionTotals, TransactionType,
};
pub use validation::{prepare_items, prepare_settlement_items, validate_payment};
