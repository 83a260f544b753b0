//! Core ledger logic for Tala.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Every rule about how a gold trade moves stock, contact balances and money
//! lives here; `tala-db` only persists what these functions decide.
//!
//! # Modules
//!
//! - `carat` - Normalization of scale weights to the 750 reference purity
//! - `ledger` - Running balances, costing and the error taxonomy
//! - `trade` - Transactions, items, settlements, payments and their ledger effects
//! - `rial` - Contact currency balances and debtor/creditor partitioning
//! - `statement` - Unified per-contact statement classification and folding
//! - `inventory` - Per-carat stock summaries and reconciliation
//! - `settings` - Unit-of-work scoped settings cache

pub mod carat;
pub mod inventory;
pub mod ledger;
pub mod rial;
pub mod settings;
pub mod statement;
pub mod trade;
