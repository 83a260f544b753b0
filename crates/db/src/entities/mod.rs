//! `SeaORM` entity definitions.

pub mod prelude;

pub mod carat_inventory;
pub mod contact_weight_ledger;
pub mod contacts;
pub mod inventory_ledger;
pub mod payments;
pub mod physical_settlement_items;
pub mod physical_settlements;
pub mod product_categories;
pub mod products;
pub mod sea_orm_active_enums;
pub mod settings;
pub mod transaction_items;
pub mod transactions;
