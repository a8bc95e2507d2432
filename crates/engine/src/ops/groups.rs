//! Group and membership operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::{EngineError, ResultEngine, groups, memberships, users};

use super::{
    Engine, MemberRole, new_id, normalize_optional_text, normalize_required_text, with_tx,
};

/// A group member with the display name resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupMember {
    pub user_id: String,
    pub user_name: String,
    pub role: MemberRole,
}

impl Engine {
    /// Create a group. The creator becomes its first admin in the same
    /// transaction.
    pub async fn create_group(
        &self,
        name: &str,
        description: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<groups::Model> {
        let name = normalize_required_text(name, "group name")?;
        let description = normalize_optional_text(description);

        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, user_id).await?;

            let now = Utc::now();
            let group = groups::ActiveModel {
                id: Set(new_id()),
                name: Set(name),
                description: Set(description),
                created_by: Set(user_id.to_string()),
                created_at: Set(now),
            }
            .insert(&db_tx)
            .await?;

            memberships::ActiveModel {
                group_id: Set(group.id.clone()),
                user_id: Set(user_id.to_string()),
                role: Set(MemberRole::Admin.as_str().to_string()),
                joined_at: Set(now),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(group_id = %group.id, created_by = %user_id, "group created");
            Ok(group)
        })
    }

    /// Fetch a group. Members only.
    pub async fn get_group(&self, group_id: &str, user_id: &str) -> ResultEngine<groups::Model> {
        with_tx!(self, |db_tx| {
            let group = self.require_group_exists(&db_tx, group_id).await?;
            self.require_member(&db_tx, group_id, user_id).await?;
            Ok(group)
        })
    }

    /// Add a user to the group as a plain member. Admins only.
    pub async fn add_member(
        &self,
        group_id: &str,
        user_id: &str,
        new_member_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_group_exists(&db_tx, group_id).await?;
            self.require_admin(&db_tx, group_id, user_id).await?;
            self.require_user_exists(&db_tx, new_member_id).await?;

            if self
                .membership_role(&db_tx, group_id, new_member_id)
                .await?
                .is_some()
            {
                return Err(EngineError::Validation(
                    "user is already a member of this group".to_string(),
                ));
            }

            memberships::ActiveModel {
                group_id: Set(group_id.to_string()),
                user_id: Set(new_member_id.to_string()),
                role: Set(MemberRole::Member.as_str().to_string()),
                joined_at: Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(%group_id, member_id = %new_member_id, "member added");
            Ok(())
        })
    }

    /// Remove a member. Admins only; the last admin may not remove itself.
    pub async fn remove_member(
        &self,
        group_id: &str,
        user_id: &str,
        target_user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_group_exists(&db_tx, group_id).await?;
            self.require_admin(&db_tx, group_id, user_id).await?;

            if target_user_id == user_id && self.count_admins_tx(&db_tx, group_id).await? <= 1 {
                return Err(EngineError::StateConflict(
                    "cannot remove the last admin from group".to_string(),
                ));
            }

            let result = memberships::Entity::delete_by_id((
                group_id.to_string(),
                target_user_id.to_string(),
            ))
            .exec(&db_tx)
            .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::NotFound(
                    "member not found in group".to_string(),
                ));
            }

            tracing::info!(%group_id, member_id = %target_user_id, "member removed");
            Ok(())
        })
    }

    /// Change a member's role. Admins only; the last admin may not demote
    /// itself.
    pub async fn update_member_role(
        &self,
        group_id: &str,
        user_id: &str,
        target_user_id: &str,
        role: MemberRole,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_group_exists(&db_tx, group_id).await?;
            self.require_admin(&db_tx, group_id, user_id).await?;

            if role == MemberRole::Member
                && target_user_id == user_id
                && self.count_admins_tx(&db_tx, group_id).await? <= 1
            {
                return Err(EngineError::StateConflict(
                    "cannot demote the last admin".to_string(),
                ));
            }

            let result = memberships::Entity::update_many()
                .col_expr(
                    memberships::Column::Role,
                    sea_orm::sea_query::Expr::value(role.as_str()),
                )
                .filter(memberships::Column::GroupId.eq(group_id.to_string()))
                .filter(memberships::Column::UserId.eq(target_user_id.to_string()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::NotFound(
                    "member not found in group".to_string(),
                ));
            }

            Ok(())
        })
    }

    /// All members of the group with resolved names, user id ascending.
    /// Members only.
    pub async fn list_members(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<GroupMember>> {
        with_tx!(self, |db_tx| {
            self.require_group_exists(&db_tx, group_id).await?;
            self.require_member(&db_tx, group_id, user_id).await?;

            let rows = memberships::Entity::find()
                .filter(memberships::Column::GroupId.eq(group_id.to_string()))
                .order_by_asc(memberships::Column::UserId)
                .find_also_related(users::Entity)
                .all(&db_tx)
                .await?;

            rows.into_iter()
                .map(|(membership, user)| {
                    Ok(GroupMember {
                        user_id: membership.user_id,
                        user_name: user.map(|u| u.name).unwrap_or_default(),
                        role: MemberRole::try_from(membership.role.as_str())?,
                    })
                })
                .collect()
        })
    }

    pub async fn is_member(&self, group_id: &str, user_id: &str) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            Ok(self
                .membership_role(&db_tx, group_id, user_id)
                .await?
                .is_some())
        })
    }

    pub async fn is_admin(&self, group_id: &str, user_id: &str) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            Ok(self.membership_role(&db_tx, group_id, user_id).await? == Some(MemberRole::Admin))
        })
    }

    pub async fn count_admins(&self, group_id: &str) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| { self.count_admins_tx(&db_tx, group_id).await })
    }
}
