//! Append-only ledger logic.
//!
//! This module implements the pieces shared by the inventory ledger and the
//! contact weight ledger:
//! - Running balances and chain verification
//! - Row kinds
//! - Weighted-average costing
//! - Error types for ledger operations

pub mod balance;
pub mod costing;
pub mod entry;
pub mod error;

pub use balance::{ChainLink, ChainViolation, RunningBalance, StockLevel, find_chain_violations};
pub use costing::{MovementValue, average_cost_per_gram, value_at_average, value_inflow};
pub use entry::{MovementType, WeightEventType};
pub use error::LedgerError;
