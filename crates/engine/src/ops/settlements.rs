//! Settlement lifecycle: preview calculation, persistence, and the one-shot
//! `pending → confirmed` transition that settles the covered bills.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait, sea_query::Expr,
};

use crate::{
    EngineError, ResultEngine,
    balance::{self, BillView},
    bills,
    bills::BillStatus,
    commands::{CalculateSettlementCmd, CreateSettlementCmd},
    minimize,
    settlement_bills, settlement_transactions,
    settlement_transactions::TransferStatus,
    settlements,
    settlements::SettlementStatus,
    split::ItemView,
};

use super::{Engine, new_id, with_tx};

/// One member's position in a settlement calculation. `balance` is
/// `paid - owes`; positive means the member should receive money.
#[derive(Clone, Debug, PartialEq)]
pub struct MemberBalance {
    pub user_id: String,
    pub user_name: String,
    pub paid: Decimal,
    pub owes: Decimal,
    pub balance: Decimal,
}

/// A proposed transfer with both parties' names resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct SettlementTransfer {
    pub from_user_id: String,
    pub from_user_name: String,
    pub to_user_id: String,
    pub to_user_name: String,
    pub amount: Decimal,
}

/// The complete output of one settlement calculation. Balances are sorted by
/// member id; transfers are in minimizer emission order.
#[derive(Clone, Debug, PartialEq)]
pub struct SettlementResult {
    pub group_id: String,
    pub bill_count: usize,
    pub total_amount: Decimal,
    pub balances: Vec<MemberBalance>,
    pub transactions: Vec<SettlementTransfer>,
}

/// A persisted settlement with its bill links and transaction rows.
#[derive(Clone, Debug, PartialEq)]
pub struct SettlementDetail {
    pub settlement: settlements::Model,
    pub bill_ids: Vec<String>,
    pub transactions: Vec<settlement_transactions::Model>,
}

impl Engine {
    /// Load the named bills, check they all belong to the group and none is
    /// already settled, and run the split/aggregate/minimize pipeline over
    /// them.
    async fn calculate_in_tx(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        bill_ids: &[String],
        user_id: &str,
    ) -> ResultEngine<SettlementResult> {
        if bill_ids.is_empty() {
            return Err(EngineError::Validation(
                "at least one bill id is required".to_string(),
            ));
        }

        self.require_group_exists(db, group_id).await?;
        self.require_member(db, group_id, user_id).await?;

        let unique_ids: BTreeSet<&String> = bill_ids.iter().collect();
        let bill_models = bills::Entity::find()
            .filter(bills::Column::Id.is_in(bill_ids.iter().cloned()))
            .filter(bills::Column::GroupId.eq(group_id.to_string()))
            .all(db)
            .await?;
        if bill_models.len() != unique_ids.len() {
            return Err(EngineError::NotFound(
                "some bills were not found or do not belong to this group".to_string(),
            ));
        }
        // A bill settles at most once; a second settlement over it would
        // charge every member again.
        if let Some(settled) = bill_models
            .iter()
            .find(|bill| bill.status == BillStatus::Settled.as_str())
        {
            return Err(EngineError::StateConflict(format!(
                "bill {} is already settled",
                settled.id
            )));
        }

        let roster = self.roster(db, group_id).await?;
        let roster_ids: Vec<String> = roster.iter().map(|(id, _)| id.clone()).collect();
        let names: BTreeMap<&String, &String> =
            roster.iter().map(|(id, name)| (id, name)).collect();

        let mut total_amount = Decimal::ZERO;
        let mut bill_views = Vec::with_capacity(bill_models.len());
        for bill in &bill_models {
            total_amount += bill.total_amount;
            let items = self
                .load_bill_items(db, &bill.id)
                .await?
                .into_iter()
                .map(|item| ItemView {
                    amount: item.amount,
                    quantity: item.quantity,
                    is_shared: item.is_shared,
                    owner_ids: item.owner_ids,
                })
                .collect();
            bill_views.push(BillView {
                paid_by: bill.paid_by.clone(),
                total_amount: bill.total_amount,
                items,
            });
        }

        let balances = balance::aggregate_balances(&bill_views, &roster_ids)?;
        let transfers = minimize::minimize_transfers(&balances);

        let resolve_name = |id: &String| names.get(id).map_or_else(String::new, |n| (*n).clone());

        let member_balances = balances
            .iter()
            .map(|(id, b)| MemberBalance {
                user_id: id.clone(),
                user_name: resolve_name(id),
                paid: b.paid,
                owes: b.owes,
                balance: b.net,
            })
            .collect();
        let transactions = transfers
            .into_iter()
            .map(|t| SettlementTransfer {
                from_user_name: resolve_name(&t.from),
                from_user_id: t.from,
                to_user_name: resolve_name(&t.to),
                to_user_id: t.to,
                amount: t.amount,
            })
            .collect();

        let result = SettlementResult {
            group_id: group_id.to_string(),
            bill_count: bill_models.len(),
            total_amount,
            balances: member_balances,
            transactions,
        };
        tracing::debug!(
            %group_id,
            bill_count = result.bill_count,
            total_amount = %result.total_amount,
            transfer_count = result.transactions.len(),
            "settlement calculated"
        );
        Ok(result)
    }

    /// Preview how the named bills would settle, without persisting anything.
    /// Group members only.
    pub async fn calculate_settlement(
        &self,
        cmd: CalculateSettlementCmd,
    ) -> ResultEngine<SettlementResult> {
        let CalculateSettlementCmd {
            group_id,
            bill_ids,
            user_id,
        } = cmd;
        with_tx!(self, |db_tx| {
            self.calculate_in_tx(&db_tx, &group_id, &bill_ids, &user_id)
                .await
        })
    }

    /// Run the calculation and persist it: a `pending` settlement, one link
    /// row per bill and one `pending` transaction row per transfer, all in
    /// one database transaction. Bill statuses are untouched until the
    /// settlement is confirmed.
    pub async fn create_settlement(
        &self,
        cmd: CreateSettlementCmd,
    ) -> ResultEngine<SettlementDetail> {
        let CreateSettlementCmd {
            group_id,
            bill_ids,
            user_id,
        } = cmd;

        with_tx!(self, |db_tx| {
            let result = self
                .calculate_in_tx(&db_tx, &group_id, &bill_ids, &user_id)
                .await?;

            let settlement = settlements::ActiveModel {
                id: Set(new_id()),
                group_id: Set(group_id.clone()),
                title: Set(format!("Settlement for {} bills", result.bill_count)),
                description: Set(Some(format!("Total amount: {}", result.total_amount))),
                created_by: Set(user_id.clone()),
                status: Set(SettlementStatus::Pending.as_str().to_string()),
                settled_at: Set(None),
                created_at: Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            let unique_ids: BTreeSet<String> = bill_ids.into_iter().collect();
            let mut linked_ids = Vec::with_capacity(unique_ids.len());
            for bill_id in unique_ids {
                settlement_bills::ActiveModel {
                    settlement_id: Set(settlement.id.clone()),
                    bill_id: Set(bill_id.clone()),
                }
                .insert(&db_tx)
                .await?;
                linked_ids.push(bill_id);
            }

            let mut transactions = Vec::with_capacity(result.transactions.len());
            for transfer in &result.transactions {
                let row = settlement_transactions::ActiveModel {
                    id: Set(new_id()),
                    settlement_id: Set(settlement.id.clone()),
                    from_user: Set(transfer.from_user_id.clone()),
                    to_user: Set(transfer.to_user_id.clone()),
                    amount: Set(transfer.amount),
                    status: Set(TransferStatus::Pending.as_str().to_string()),
                    paid_at: Set(None),
                }
                .insert(&db_tx)
                .await?;
                transactions.push(row);
            }

            tracing::info!(
                settlement_id = %settlement.id,
                %group_id,
                bill_count = result.bill_count,
                "settlement created"
            );
            Ok(SettlementDetail {
                settlement,
                bill_ids: linked_ids,
                transactions,
            })
        })
    }

    /// Confirm a pending settlement exactly once. Creator or group admin
    /// only. The `pending → confirmed` check-and-set is a single conditional
    /// update; every linked bill moves to `settled` in the same transaction.
    pub async fn confirm_settlement(
        &self,
        settlement_id: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let settlement = settlements::Entity::find_by_id(settlement_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("settlement not found".to_string()))?;

            if settlement.created_by != user_id {
                match self
                    .membership_role(&db_tx, &settlement.group_id, user_id)
                    .await?
                {
                    Some(super::MemberRole::Admin) => {}
                    _ => {
                        return Err(EngineError::Unauthorized(
                            "only the settlement creator or a group admin may confirm"
                                .to_string(),
                        ));
                    }
                }
            }

            let result = settlements::Entity::update_many()
                .col_expr(
                    settlements::Column::Status,
                    Expr::value(SettlementStatus::Confirmed.as_str()),
                )
                .col_expr(settlements::Column::SettledAt, Expr::value(Some(Utc::now())))
                .filter(settlements::Column::Id.eq(settlement_id.to_string()))
                .filter(settlements::Column::Status.eq(SettlementStatus::Pending.as_str()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::StateConflict(
                    "settlement is not pending".to_string(),
                ));
            }

            let bill_ids: Vec<String> = settlement_bills::Entity::find()
                .filter(settlement_bills::Column::SettlementId.eq(settlement_id.to_string()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|link| link.bill_id)
                .collect();
            if !bill_ids.is_empty() {
                bills::Entity::update_many()
                    .col_expr(
                        bills::Column::Status,
                        Expr::value(BillStatus::Settled.as_str()),
                    )
                    .filter(bills::Column::Id.is_in(bill_ids))
                    .exec(&db_tx)
                    .await?;
            }

            tracing::info!(%settlement_id, confirmed_by = %user_id, "settlement confirmed");
            Ok(())
        })
    }

    /// Fetch a settlement with its bill links and transaction rows. Group
    /// members only.
    pub async fn get_settlement(
        &self,
        settlement_id: &str,
        user_id: &str,
    ) -> ResultEngine<SettlementDetail> {
        with_tx!(self, |db_tx| {
            let settlement = settlements::Entity::find_by_id(settlement_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("settlement not found".to_string()))?;
            self.require_member(&db_tx, &settlement.group_id, user_id)
                .await?;

            let mut bill_ids: Vec<String> = settlement_bills::Entity::find()
                .filter(settlement_bills::Column::SettlementId.eq(settlement_id.to_string()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|link| link.bill_id)
                .collect();
            bill_ids.sort_unstable();

            let transactions = settlement_transactions::Entity::find()
                .filter(
                    settlement_transactions::Column::SettlementId.eq(settlement_id.to_string()),
                )
                .order_by_asc(settlement_transactions::Column::Id)
                .all(&db_tx)
                .await?;

            Ok(SettlementDetail {
                settlement,
                bill_ids,
                transactions,
            })
        })
    }

    /// List a group's settlements, most recent first. Group members only.
    pub async fn list_group_settlements(
        &self,
        group_id: &str,
        user_id: &str,
        status: Option<SettlementStatus>,
    ) -> ResultEngine<Vec<settlements::Model>> {
        with_tx!(self, |db_tx| {
            self.require_group_exists(&db_tx, group_id).await?;
            self.require_member(&db_tx, group_id, user_id).await?;

            let mut query = settlements::Entity::find()
                .filter(settlements::Column::GroupId.eq(group_id.to_string()));
            if let Some(status) = status {
                query = query.filter(settlements::Column::Status.eq(status.as_str()));
            }
            query
                .order_by_desc(settlements::Column::CreatedAt)
                .all(&db_tx)
                .await
                .map_err(Into::into)
        })
    }
}
