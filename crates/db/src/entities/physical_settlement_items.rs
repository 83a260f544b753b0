//! `SeaORM` Entity for physical_settlement_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "physical_settlement_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub settlement_id: i32,
    pub product_id: i32,
    pub weight_scale: Decimal,
    pub carat: i32,
    pub weight_750: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::physical_settlements::Entity",
        from = "Column::SettlementId",
        to = "super::physical_settlements::Column::Id",
        on_delete = "Cascade"
    )]
    PhysicalSettlements,
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id"
    )]
    Products,
}

impl Related<super::physical_settlements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PhysicalSettlements.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
