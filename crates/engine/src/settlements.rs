//! Settlements.
//!
//! A settlement is a persisted, confirmable record of one debt-minimization
//! run over a set of bills. It transitions `pending → confirmed` exactly
//! once; confirmation cascades every linked bill to `settled`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Pending,
    Confirmed,
}

impl SettlementStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
        }
    }
}

impl TryFrom<&str> for SettlementStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            other => Err(EngineError::Validation(format!(
                "invalid settlement status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_by: String,
    pub status: String,
    pub settled_at: Option<DateTimeUtc>,
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
    #[sea_orm(has_many = "super::settlement_bills::Entity")]
    SettlementBills,
    #[sea_orm(has_many = "super::settlement_transactions::Entity")]
    SettlementTransactions,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::settlement_bills::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SettlementBills.def()
    }
}

impl Related<super::settlement_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SettlementTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
