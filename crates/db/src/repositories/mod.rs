//! Repositories over the ledger tables.
//!
//! Every write runs in one database transaction. Writes that append ledger
//! rows lock their parent contact and product rows first and are retried when
//! a concurrent append claims the same entry version.

pub mod carat_inventory;
pub mod contact;
pub mod contact_weight_ledger;
pub mod inventory_ledger;
pub mod payment;
pub mod product;
pub mod rial_balance;
pub mod settings;
pub mod settlement;
pub mod statement;
pub mod transaction;

mod unit_of_work;

pub use carat_inventory::CaratInventoryRepository;
pub use contact::{ContactRepository, CreateContactInput};
pub use contact_weight_ledger::{
    CategoryWeightBalance, ContactWeightLedgerRepository, RecordWeightEntryInput,
};
pub use inventory_ledger::{InventoryAdjustmentInput, InventoryLedgerRepository, RecordMovementInput};
pub use payment::PaymentRepository;
pub use product::{CreateCategoryInput, CreateProductInput, ProductRepository};
pub use rial_balance::RialBalanceRepository;
pub use settings::SettingsRepository;
pub use settlement::{SettlementRepository, SettlementWithItems};
pub use statement::StatementRepository;
pub use transaction::{TransactionFilter, TransactionRepository, TransactionWithItems};
