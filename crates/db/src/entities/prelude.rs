//! Entity re-exports.

pub use super::carat_inventory::Entity as CaratInventory;
pub use super::contact_weight_ledger::Entity as ContactWeightLedger;
pub use super::contacts::Entity as Contacts;
pub use super::inventory_ledger::Entity as InventoryLedger;
pub use super::payments::Entity as Payments;
pub use super::physical_settlement_items::Entity as PhysicalSettlementItems;
pub use super::physical_settlements::Entity as PhysicalSettlements;
pub use super::product_categories::Entity as ProductCategories;
pub use super::products::Entity as Products;
pub use super::settings::Entity as Settings;
pub use super::transaction_items::Entity as TransactionItems;
pub use super::transactions::Entity as Transactions;
