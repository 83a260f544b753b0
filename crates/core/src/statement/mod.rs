//! Unified contact statement.
//!
//! Transaction items, payments and settlement items are classified into one
//! row shape, merged chronologically and folded into running balances.

pub mod classify;
pub mod types;

pub use classify::{
    apply_entry, classify_item, classify_payment, classify_settlement_item, fold_running,
    merge_entries,
};
pub use types::{
    ItemStatementRow, PaymentStatementRow, SettlementStatementRow, Statement, StatementBalance,
    StatementEntry, StatementLine, StatementSource,
};
