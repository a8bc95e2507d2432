//! Owner set of a personal bill item.
//!
//! Owners split the item's line total at equal ratio; `share_ratio` is
//! reserved for future custom splits and always written as 1.00 today.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "item_owners")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub share_ratio: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bill_items::Entity",
        from = "Column::ItemId",
        to = "super::bill_items::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    BillItems,
}

impl Related<super::bill_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
