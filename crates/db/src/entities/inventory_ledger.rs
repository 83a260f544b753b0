//! `SeaORM` Entity for inventory_ledger table.
//!
//! Append-only per product. `entry_version` is unique per product; the
//! `balance_*_after_movement` columns hold the running totals in
//! `(movement_date, id)` order.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::MovementType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_ledger")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_id: i32,
    pub transaction_id: Option<i32>,
    pub transaction_item_id: Option<i32>,
    pub settlement_id: Option<i32>,
    pub movement_date: Date,
    pub movement_type: MovementType,
    pub entry_version: i64,
    pub change_quantity: i32,
    pub change_weight_grams: Decimal,
    pub balance_quantity_after_movement: i32,
    pub balance_weight_grams_after_movement: Decimal,
    pub carat: Option<i32>,
    pub price_per_unit_at_movement: Option<Decimal>,
    pub total_value_in: Option<Decimal>,
    pub total_value_out: Option<Decimal>,
    pub balance_total_value_after_movement: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id"
    )]
    Products,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
