//! Join table linking a settlement to the bills it covers.
//!
//! Links are created with the settlement and deleted with it; a bill can be
//! covered by more than one (pending) settlement draft.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "settlement_bills")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub settlement_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub bill_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::settlements::Entity",
        from = "Column::SettlementId",
        to = "super::settlements::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Settlements,
    #[sea_orm(
        belongs_to = "super::bills::Entity",
        from = "Column::BillId",
        to = "super::bills::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Bills,
}

impl Related<super::settlements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Settlements.def()
    }
}

impl Related<super::bills::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bills.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
