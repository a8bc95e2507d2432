//! Bill operations: creation with items, item editing while pending, and the
//! `pending → finalized` transition that makes a bill eligible for
//! settlement.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Expr,
};

use crate::{
    EngineError, ResultEngine, bill_items, bills,
    bills::BillStatus,
    commands::{BillItemInput, CreateBillCmd, UpdateBillCmd},
    item_owners, money,
};

use super::{Engine, new_id, normalize_optional_text, normalize_required_text, with_tx};

/// A bill item with its owner set resolved, owner ids ascending.
#[derive(Clone, Debug, PartialEq)]
pub struct BillItemDetail {
    pub id: String,
    pub name: String,
    pub amount: Decimal,
    pub quantity: i32,
    pub is_shared: bool,
    pub owner_ids: Vec<String>,
}

/// A bill with its items loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct BillDetail {
    pub bill: bills::Model,
    pub items: Vec<BillItemDetail>,
}

/// Optional filters for bill listing.
#[derive(Clone, Copy, Debug, Default)]
pub struct BillListFilter {
    pub status: Option<BillStatus>,
}

impl BillListFilter {
    #[must_use]
    pub fn status(mut self, status: BillStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Validate one item input and return its line total.
fn validate_item(item: &BillItemInput) -> ResultEngine<Decimal> {
    normalize_required_text(&item.name, "item name")?;
    money::validate_amount(item.amount, "item amount")?;
    if item.quantity < 1 {
        return Err(EngineError::Validation(
            "item quantity must be at least 1".to_string(),
        ));
    }
    if item.is_shared {
        if !item.owner_ids.is_empty() {
            return Err(EngineError::Validation(
                "shared items must not name owners".to_string(),
            ));
        }
    } else {
        if item.owner_ids.is_empty() {
            return Err(EngineError::Validation(
                "personal items must name at least one owner".to_string(),
            ));
        }
        let mut seen = item.owner_ids.clone();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() != item.owner_ids.len() {
            return Err(EngineError::Validation(
                "duplicate item owner".to_string(),
            ));
        }
    }
    Ok(money::line_total(item.amount, item.quantity))
}

impl Engine {
    pub(super) async fn require_bill(
        &self,
        db: &DatabaseTransaction,
        bill_id: &str,
    ) -> ResultEngine<bills::Model> {
        bills::Entity::find_by_id(bill_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("bill not found".to_string()))
    }

    async fn require_pending_bill_editor(
        &self,
        db: &DatabaseTransaction,
        bill_id: &str,
        user_id: &str,
    ) -> ResultEngine<bills::Model> {
        let bill = self.require_bill(db, bill_id).await?;
        self.require_member(db, &bill.group_id, user_id).await?;
        if bill.status != BillStatus::Pending.as_str() {
            return Err(EngineError::StateConflict(
                "cannot edit a finalized or settled bill".to_string(),
            ));
        }
        self.require_bill_editor(db, &bill, user_id).await?;
        Ok(bill)
    }

    /// Check every listed owner belongs to the group, then insert the owner
    /// rows for an item.
    async fn insert_item_owners(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        item_id: &str,
        owner_ids: &[String],
    ) -> ResultEngine<()> {
        for owner_id in owner_ids {
            if self.membership_role(db, group_id, owner_id).await?.is_none() {
                return Err(EngineError::Validation(format!(
                    "item owner {owner_id} is not a member of this group"
                )));
            }
            item_owners::ActiveModel {
                item_id: Set(item_id.to_string()),
                user_id: Set(owner_id.clone()),
                share_ratio: Set(Decimal::ONE),
            }
            .insert(db)
            .await?;
        }
        Ok(())
    }

    pub(super) async fn load_bill_items(
        &self,
        db: &DatabaseTransaction,
        bill_id: &str,
    ) -> ResultEngine<Vec<BillItemDetail>> {
        let rows = bill_items::Entity::find()
            .filter(bill_items::Column::BillId.eq(bill_id.to_string()))
            .order_by_asc(bill_items::Column::Id)
            .all(db)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let mut owner_ids: Vec<String> = item_owners::Entity::find()
                .filter(item_owners::Column::ItemId.eq(row.id.clone()))
                .all(db)
                .await?
                .into_iter()
                .map(|o| o.user_id)
                .collect();
            owner_ids.sort_unstable();
            items.push(BillItemDetail {
                id: row.id,
                name: row.name,
                amount: row.amount,
                quantity: row.quantity,
                is_shared: row.is_shared,
                owner_ids,
            });
        }
        Ok(items)
    }

    /// Create a bill with its items in one transaction. The named total must
    /// match the sum of item line totals within the dust tolerance.
    pub async fn create_bill(&self, cmd: CreateBillCmd) -> ResultEngine<BillDetail> {
        let CreateBillCmd {
            group_id,
            title,
            description,
            total_amount,
            paid_by,
            bill_date,
            items,
            user_id,
        } = cmd;
        let title = normalize_required_text(&title, "bill title")?;
        let description = normalize_optional_text(description.as_deref());
        money::validate_amount(total_amount, "total amount")?;

        with_tx!(self, |db_tx| {
            self.require_group_exists(&db_tx, &group_id).await?;
            self.require_member(&db_tx, &group_id, &user_id).await?;
            if paid_by != user_id {
                self.require_member(&db_tx, &group_id, &paid_by).await?;
            }

            let mut items_total = Decimal::ZERO;
            for item in &items {
                items_total += validate_item(item)?;
            }
            if !money::equal_within_tolerance(total_amount, items_total) {
                return Err(EngineError::Validation(format!(
                    "total amount ({total_amount}) does not match sum of items ({items_total})"
                )));
            }

            let bill = bills::ActiveModel {
                id: Set(new_id()),
                group_id: Set(group_id.clone()),
                title: Set(title),
                description: Set(description),
                total_amount: Set(total_amount),
                paid_by: Set(paid_by),
                bill_date: Set(bill_date),
                status: Set(BillStatus::Pending.as_str().to_string()),
                created_at: Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            for item in &items {
                let row = bill_items::ActiveModel {
                    id: Set(new_id()),
                    bill_id: Set(bill.id.clone()),
                    name: Set(item.name.trim().to_string()),
                    amount: Set(item.amount),
                    quantity: Set(item.quantity),
                    is_shared: Set(item.is_shared),
                }
                .insert(&db_tx)
                .await?;
                if !item.is_shared {
                    self.insert_item_owners(&db_tx, &group_id, &row.id, &item.owner_ids)
                        .await?;
                }
            }

            let items = self.load_bill_items(&db_tx, &bill.id).await?;
            tracing::info!(bill_id = %bill.id, %group_id, "bill created");
            Ok(BillDetail { bill, items })
        })
    }

    /// Fetch a bill with its items. Group members only.
    pub async fn get_bill(&self, bill_id: &str, user_id: &str) -> ResultEngine<BillDetail> {
        with_tx!(self, |db_tx| {
            let bill = self.require_bill(&db_tx, bill_id).await?;
            self.require_member(&db_tx, &bill.group_id, user_id).await?;
            let items = self.load_bill_items(&db_tx, bill_id).await?;
            Ok(BillDetail { bill, items })
        })
    }

    /// List a group's bills, most recent bill date first. Group members only.
    pub async fn list_group_bills(
        &self,
        group_id: &str,
        user_id: &str,
        filter: BillListFilter,
    ) -> ResultEngine<Vec<bills::Model>> {
        with_tx!(self, |db_tx| {
            self.require_group_exists(&db_tx, group_id).await?;
            self.require_member(&db_tx, group_id, user_id).await?;

            let mut query = bills::Entity::find()
                .filter(bills::Column::GroupId.eq(group_id.to_string()));
            if let Some(status) = filter.status {
                query = query.filter(bills::Column::Status.eq(status.as_str()));
            }
            query
                .order_by_desc(bills::Column::BillDate)
                .all(&db_tx)
                .await
                .map_err(Into::into)
        })
    }

    /// Update a pending bill's header fields. Payer or group admin only.
    pub async fn update_bill(&self, cmd: UpdateBillCmd) -> ResultEngine<bills::Model> {
        let UpdateBillCmd {
            bill_id,
            user_id,
            title,
            description,
            total_amount,
            bill_date,
        } = cmd;

        with_tx!(self, |db_tx| {
            let bill = self
                .require_pending_bill_editor(&db_tx, &bill_id, &user_id)
                .await?;

            let mut active = bill.into_active_model();
            if let Some(title) = title {
                active.title = Set(normalize_required_text(&title, "bill title")?);
            }
            if let Some(description) = description {
                active.description = Set(normalize_optional_text(Some(&description)));
            }
            if let Some(total_amount) = total_amount {
                money::validate_amount(total_amount, "total amount")?;
                active.total_amount = Set(total_amount);
            }
            if let Some(bill_date) = bill_date {
                active.bill_date = Set(bill_date);
            }

            active.update(&db_tx).await.map_err(Into::into)
        })
    }

    /// Delete a pending bill with its items and owner rows. Payer or group
    /// admin only.
    pub async fn delete_bill(&self, bill_id: &str, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let bill = self
                .require_pending_bill_editor(&db_tx, bill_id, user_id)
                .await?;

            let item_ids: Vec<String> = bill_items::Entity::find()
                .filter(bill_items::Column::BillId.eq(bill_id.to_string()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|item| item.id)
                .collect();
            if !item_ids.is_empty() {
                item_owners::Entity::delete_many()
                    .filter(item_owners::Column::ItemId.is_in(item_ids))
                    .exec(&db_tx)
                    .await?;
            }
            bill_items::Entity::delete_many()
                .filter(bill_items::Column::BillId.eq(bill_id.to_string()))
                .exec(&db_tx)
                .await?;
            bills::Entity::delete_by_id(bill.id.clone()).exec(&db_tx).await?;

            tracing::info!(%bill_id, "bill deleted");
            Ok(())
        })
    }

    /// Add an item to a pending bill, adjusting the bill total by the item's
    /// line total.
    pub async fn add_bill_item(
        &self,
        bill_id: &str,
        user_id: &str,
        item: BillItemInput,
    ) -> ResultEngine<BillItemDetail> {
        let line_total = validate_item(&item)?;

        with_tx!(self, |db_tx| {
            let bill = self
                .require_pending_bill_editor(&db_tx, bill_id, user_id)
                .await?;

            let row = bill_items::ActiveModel {
                id: Set(new_id()),
                bill_id: Set(bill.id.clone()),
                name: Set(item.name.trim().to_string()),
                amount: Set(item.amount),
                quantity: Set(item.quantity),
                is_shared: Set(item.is_shared),
            }
            .insert(&db_tx)
            .await?;
            if !item.is_shared {
                self.insert_item_owners(&db_tx, &bill.group_id, &row.id, &item.owner_ids)
                    .await?;
            }

            let new_total = bill.total_amount + line_total;
            let mut active = bill.into_active_model();
            active.total_amount = Set(new_total);
            active.update(&db_tx).await?;

            let mut owner_ids = item.owner_ids.clone();
            owner_ids.sort_unstable();
            Ok(BillItemDetail {
                id: row.id,
                name: row.name,
                amount: row.amount,
                quantity: row.quantity,
                is_shared: row.is_shared,
                owner_ids,
            })
        })
    }

    /// Replace an item's fields and owner set, adjusting the bill total by
    /// the line-total delta.
    pub async fn update_bill_item(
        &self,
        bill_id: &str,
        item_id: &str,
        user_id: &str,
        item: BillItemInput,
    ) -> ResultEngine<BillItemDetail> {
        let new_line_total = validate_item(&item)?;

        with_tx!(self, |db_tx| {
            let bill = self
                .require_pending_bill_editor(&db_tx, bill_id, user_id)
                .await?;

            let existing = bill_items::Entity::find_by_id(item_id.to_string())
                .filter(bill_items::Column::BillId.eq(bill_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("item not found".to_string()))?;
            let old_line_total = money::line_total(existing.amount, existing.quantity);

            let mut active = existing.into_active_model();
            active.name = Set(item.name.trim().to_string());
            active.amount = Set(item.amount);
            active.quantity = Set(item.quantity);
            active.is_shared = Set(item.is_shared);
            let row = active.update(&db_tx).await?;

            item_owners::Entity::delete_many()
                .filter(item_owners::Column::ItemId.eq(item_id.to_string()))
                .exec(&db_tx)
                .await?;
            if !item.is_shared {
                self.insert_item_owners(&db_tx, &bill.group_id, item_id, &item.owner_ids)
                    .await?;
            }

            let new_total = bill.total_amount + new_line_total - old_line_total;
            let mut bill_active = bill.into_active_model();
            bill_active.total_amount = Set(new_total);
            bill_active.update(&db_tx).await?;

            let mut owner_ids = item.owner_ids.clone();
            owner_ids.sort_unstable();
            Ok(BillItemDetail {
                id: row.id,
                name: row.name,
                amount: row.amount,
                quantity: row.quantity,
                is_shared: row.is_shared,
                owner_ids,
            })
        })
    }

    /// Remove an item from a pending bill, adjusting the bill total down by
    /// the item's line total.
    pub async fn delete_bill_item(
        &self,
        bill_id: &str,
        item_id: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let bill = self
                .require_pending_bill_editor(&db_tx, bill_id, user_id)
                .await?;

            let existing = bill_items::Entity::find_by_id(item_id.to_string())
                .filter(bill_items::Column::BillId.eq(bill_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("item not found".to_string()))?;
            let line_total = money::line_total(existing.amount, existing.quantity);

            item_owners::Entity::delete_many()
                .filter(item_owners::Column::ItemId.eq(item_id.to_string()))
                .exec(&db_tx)
                .await?;
            bill_items::Entity::delete_by_id(item_id.to_string())
                .exec(&db_tx)
                .await?;

            let new_total = bill.total_amount - line_total;
            let mut active = bill.into_active_model();
            active.total_amount = Set(new_total);
            active.update(&db_tx).await?;

            Ok(())
        })
    }

    /// Move a bill `pending → finalized`, making it eligible for settlement.
    /// Requires at least one item; payer or group admin only.
    pub async fn finalize_bill(&self, bill_id: &str, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let bill = self.require_bill(&db_tx, bill_id).await?;
            self.require_member(&db_tx, &bill.group_id, user_id).await?;
            self.require_bill_editor(&db_tx, &bill, user_id).await?;

            let item_count = bill_items::Entity::find()
                .filter(bill_items::Column::BillId.eq(bill_id.to_string()))
                .count(&db_tx)
                .await?;
            if item_count == 0 {
                return Err(EngineError::Validation(
                    "cannot finalize a bill without items".to_string(),
                ));
            }

            // Conditional update closes the race with a concurrent finalize
            // or settlement confirm.
            let result = bills::Entity::update_many()
                .col_expr(
                    bills::Column::Status,
                    Expr::value(BillStatus::Finalized.as_str()),
                )
                .filter(bills::Column::Id.eq(bill_id.to_string()))
                .filter(bills::Column::Status.eq(BillStatus::Pending.as_str()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::StateConflict(
                    "bill is not pending".to_string(),
                ));
            }

            tracing::info!(%bill_id, "bill finalized");
            Ok(())
        })
    }
}
