//! `SeaORM` Entity for contact_weight_ledger table.
//!
//! Weights are 750-reference grams; positive balances mean the contact owes
//! gold to the business.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::WeightEventType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "contact_weight_ledger")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub contact_id: i32,
    pub product_category_id: i32,
    pub event_date: Date,
    pub event_type: WeightEventType,
    pub entry_version: i64,
    pub change_weight_grams: Decimal,
    pub balance_after_grams: Decimal,
    pub related_transaction_id: Option<i32>,
    pub related_settlement_id: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contacts::Entity",
        from = "Column::ContactId",
        to = "super::contacts::Column::Id"
    )]
    Contacts,
    #[sea_orm(
        belongs_to = "super::product_categories::Entity",
        from = "Column::ProductCategoryId",
        to = "super::product_categories::Column::Id"
    )]
    ProductCategories,
}

impl Related<super::contacts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contacts.def()
    }
}

impl Related<super::product_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
