//! Bill items.
//!
//! An item is either shared (split across the whole group roster) or
//! personal, in which case its owner set lives in `item_owners`.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bill_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub bill_id: String,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub amount: Decimal,
    pub quantity: i32,
    pub is_shared: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bills::Entity",
        from = "Column::BillId",
        to = "super::bills::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Bills,
    #[sea_orm(has_many = "super::item_owners::Entity")]
    ItemOwners,
}

impl Related<super::bills::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bills.def()
    }
}

impl Related<super::item_owners::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemOwners.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
