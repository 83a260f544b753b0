//! `SeaORM` Entity for contacts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ContactType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "contacts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub contact_type: ContactType,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::physical_settlements::Entity")]
    PhysicalSettlements,
    #[sea_orm(has_many = "super::contact_weight_ledger::Entity")]
    ContactWeightLedger,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::physical_settlements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PhysicalSettlements.def()
    }
}

impl Related<super::contact_weight_ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContactWeightLedger.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
