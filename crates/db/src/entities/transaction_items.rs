//! `SeaORM` Entity for transaction_items table.
//!
//! Category-specific attributes live in `details` as a tagged JSON object.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub transaction_id: i32,
    pub product_id: i32,
    pub quantity: Option<i32>,
    pub weight_grams: Option<Decimal>,
    pub carat: Option<i32>,
    pub unit_price_rials: Decimal,
    pub total_value_rials: Decimal,
    pub wage_rials: Decimal,
    pub profit_rials: Decimal,
    pub fee_rials: Decimal,
    pub general_tax_rials: Decimal,
    pub vat_rials: Decimal,
    pub line_total_rials: Decimal,
    pub details: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_delete = "Cascade"
    )]
    Transactions,
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id"
    )]
    Products,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
