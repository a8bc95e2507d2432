use sea_orm::{DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, prelude::*};

use crate::{EngineError, ResultEngine, bills, groups, memberships, users};

use super::Engine;

/// Role a user holds inside a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl TryFrom<&str> for MemberRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(EngineError::Validation(format!(
                "invalid member role: {other}"
            ))),
        }
    }
}

impl Engine {
    pub(super) async fn membership_role(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<Option<MemberRole>> {
        let row = memberships::Entity::find_by_id((group_id.to_string(), user_id.to_string()))
            .one(db)
            .await?;
        row.as_ref()
            .map(|m| MemberRole::try_from(m.role.as_str()))
            .transpose()
    }

    pub(super) async fn require_group_exists(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
    ) -> ResultEngine<groups::Model> {
        groups::Entity::find_by_id(group_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("group not found".to_string()))
    }

    pub(super) async fn require_member(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<MemberRole> {
        self.membership_role(db, group_id, user_id)
            .await?
            .ok_or_else(|| {
                EngineError::Unauthorized("user is not a member of this group".to_string())
            })
    }

    pub(super) async fn require_admin(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        match self.require_member(db, group_id, user_id).await? {
            MemberRole::Admin => Ok(()),
            MemberRole::Member => Err(EngineError::Unauthorized(
                "user is not an admin of this group".to_string(),
            )),
        }
    }

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<()> {
        let exists = users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .is_some();
        if !exists {
            return Err(EngineError::NotFound("user not found".to_string()));
        }
        Ok(())
    }

    /// The bill's payer or a group admin may edit a bill.
    pub(super) async fn require_bill_editor(
        &self,
        db: &DatabaseTransaction,
        bill: &bills::Model,
        user_id: &str,
    ) -> ResultEngine<()> {
        if bill.paid_by == user_id {
            return Ok(());
        }
        match self.require_member(db, &bill.group_id, user_id).await? {
            MemberRole::Admin => Ok(()),
            MemberRole::Member => Err(EngineError::Unauthorized(
                "only the payer or an admin may edit this bill".to_string(),
            )),
        }
    }

    /// Every member of the group with their display name, id ascending.
    pub(super) async fn roster(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
    ) -> ResultEngine<Vec<(String, String)>> {
        let rows = memberships::Entity::find()
            .filter(memberships::Column::GroupId.eq(group_id.to_string()))
            .order_by_asc(memberships::Column::UserId)
            .find_also_related(users::Entity)
            .all(db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(membership, user)| {
                let name = user.map(|u| u.name).unwrap_or_default();
                (membership.user_id, name)
            })
            .collect())
    }

    pub(super) async fn count_admins_tx(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
    ) -> ResultEngine<u64> {
        memberships::Entity::find()
            .filter(memberships::Column::GroupId.eq(group_id.to_string()))
            .filter(memberships::Column::Role.eq(MemberRole::Admin.as_str()))
            .count(db)
            .await
            .map_err(Into::into)
    }
}
