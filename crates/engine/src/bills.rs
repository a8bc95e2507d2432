//! Bills and their lifecycle.
//!
//! A bill belongs to exactly one group, is paid by one member and carries an
//! ordered collection of items. Lifecycle: `pending → finalized → settled`.
//! Only `pending` bills may be edited or deleted; `settled` is reached solely
//! through a confirmed settlement.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Pending,
    Finalized,
    Settled,
}

impl BillStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Finalized => "finalized",
            Self::Settled => "settled",
        }
    }
}

impl TryFrom<&str> for BillStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "finalized" => Ok(Self::Finalized),
            "settled" => Ok(Self::Settled),
            other => Err(EngineError::Validation(format!(
                "invalid bill status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub title: String,
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total_amount: Decimal,
    pub paid_by: String,
    pub bill_date: DateTimeUtc,
    pub status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
    #[sea_orm(has_many = "super::bill_items::Entity")]
    BillItems,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::bill_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
