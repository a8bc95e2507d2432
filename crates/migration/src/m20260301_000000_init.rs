//! Initial schema migration - creates all tables from scratch.
//!
//! Complete schema for the settlement engine:
//!
//! - `users`: member identities
//! - `groups`: expense-sharing groups
//! - `group_members`: group rosters with roles
//! - `bills`: shared expenses with a lifecycle status
//! - `bill_items`: the line items of a bill
//! - `item_owners`: owner sets of personal items
//! - `settlements`: persisted debt-minimization runs
//! - `settlement_bills`: bills covered by a settlement
//! - `settlement_transactions`: the transfers a settlement proposes

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Groups {
    Table,
    Id,
    Name,
    Description,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum GroupMembers {
    Table,
    GroupId,
    UserId,
    Role,
    JoinedAt,
}

#[derive(Iden)]
enum Bills {
    Table,
    Id,
    GroupId,
    Title,
    Description,
    TotalAmount,
    PaidBy,
    BillDate,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum BillItems {
    Table,
    Id,
    BillId,
    Name,
    Amount,
    Quantity,
    IsShared,
}

#[derive(Iden)]
enum ItemOwners {
    Table,
    ItemId,
    UserId,
    ShareRatio,
}

#[derive(Iden)]
enum Settlements {
    Table,
    Id,
    GroupId,
    Title,
    Description,
    CreatedBy,
    Status,
    SettledAt,
    CreatedAt,
}

#[derive(Iden)]
enum SettlementBills {
    Table,
    SettlementId,
    BillId,
}

#[derive(Iden)]
enum SettlementTransactions {
    Table,
    Id,
    SettlementId,
    FromUser,
    ToUser,
    Amount,
    Status,
    PaidAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Groups
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Groups::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Groups::Name).string().not_null())
                    .col(ColumnDef::new(Groups::Description).string())
                    .col(ColumnDef::new(Groups::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Groups::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-groups-created_by")
                            .from(Groups::Table, Groups::CreatedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Group Members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(GroupMembers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GroupMembers::GroupId).string().not_null())
                    .col(ColumnDef::new(GroupMembers::UserId).string().not_null())
                    .col(ColumnDef::new(GroupMembers::Role).string().not_null())
                    .col(ColumnDef::new(GroupMembers::JoinedAt).timestamp().not_null())
                    .primary_key(
                        Index::create()
                            .col(GroupMembers::GroupId)
                            .col(GroupMembers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_members-group_id")
                            .from(GroupMembers::Table, GroupMembers::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_members-user_id")
                            .from(GroupMembers::Table, GroupMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-group_members-user_id")
                    .table(GroupMembers::Table)
                    .col(GroupMembers::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Bills
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Bills::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bills::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Bills::GroupId).string().not_null())
                    .col(ColumnDef::new(Bills::Title).string().not_null())
                    .col(ColumnDef::new(Bills::Description).string())
                    .col(
                        ColumnDef::new(Bills::TotalAmount)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bills::PaidBy).string().not_null())
                    .col(ColumnDef::new(Bills::BillDate).timestamp().not_null())
                    .col(ColumnDef::new(Bills::Status).string().not_null())
                    .col(ColumnDef::new(Bills::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bills-group_id")
                            .from(Bills::Table, Bills::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bills-paid_by")
                            .from(Bills::Table, Bills::PaidBy)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bills-group_id-bill_date")
                    .table(Bills::Table)
                    .col(Bills::GroupId)
                    .col(Bills::BillDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bills-group_id-status")
                    .table(Bills::Table)
                    .col(Bills::GroupId)
                    .col(Bills::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Bill Items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BillItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BillItems::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BillItems::BillId).string().not_null())
                    .col(ColumnDef::new(BillItems::Name).string().not_null())
                    .col(
                        ColumnDef::new(BillItems::Amount)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BillItems::Quantity).integer().not_null())
                    .col(ColumnDef::new(BillItems::IsShared).boolean().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bill_items-bill_id")
                            .from(BillItems::Table, BillItems::BillId)
                            .to(Bills::Table, Bills::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bill_items-bill_id")
                    .table(BillItems::Table)
                    .col(BillItems::BillId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Item Owners
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ItemOwners::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ItemOwners::ItemId).string().not_null())
                    .col(ColumnDef::new(ItemOwners::UserId).string().not_null())
                    .col(
                        ColumnDef::new(ItemOwners::ShareRatio)
                            .decimal_len(5, 2)
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ItemOwners::ItemId)
                            .col(ItemOwners::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-item_owners-item_id")
                            .from(ItemOwners::Table, ItemOwners::ItemId)
                            .to(BillItems::Table, BillItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-item_owners-user_id")
                            .from(ItemOwners::Table, ItemOwners::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Settlements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Settlements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Settlements::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Settlements::GroupId).string().not_null())
                    .col(ColumnDef::new(Settlements::Title).string().not_null())
                    .col(ColumnDef::new(Settlements::Description).string())
                    .col(ColumnDef::new(Settlements::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Settlements::Status).string().not_null())
                    .col(ColumnDef::new(Settlements::SettledAt).timestamp())
                    .col(ColumnDef::new(Settlements::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlements-group_id")
                            .from(Settlements::Table, Settlements::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlements-created_by")
                            .from(Settlements::Table, Settlements::CreatedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-settlements-group_id-created_at")
                    .table(Settlements::Table)
                    .col(Settlements::GroupId)
                    .col(Settlements::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Settlement Bills
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SettlementBills::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SettlementBills::SettlementId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SettlementBills::BillId).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(SettlementBills::SettlementId)
                            .col(SettlementBills::BillId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlement_bills-settlement_id")
                            .from(SettlementBills::Table, SettlementBills::SettlementId)
                            .to(Settlements::Table, Settlements::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlement_bills-bill_id")
                            .from(SettlementBills::Table, SettlementBills::BillId)
                            .to(Bills::Table, Bills::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Settlement Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SettlementTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SettlementTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SettlementTransactions::SettlementId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SettlementTransactions::FromUser)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SettlementTransactions::ToUser)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SettlementTransactions::Amount)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SettlementTransactions::Status)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SettlementTransactions::PaidAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlement_transactions-settlement_id")
                            .from(
                                SettlementTransactions::Table,
                                SettlementTransactions::SettlementId,
                            )
                            .to(Settlements::Table, Settlements::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlement_transactions-from_user")
                            .from(
                                SettlementTransactions::Table,
                                SettlementTransactions::FromUser,
                            )
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlement_transactions-to_user")
                            .from(
                                SettlementTransactions::Table,
                                SettlementTransactions::ToUser,
                            )
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-settlement_transactions-settlement_id")
                    .table(SettlementTransactions::Table)
                    .col(SettlementTransactions::SettlementId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(SettlementTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SettlementBills::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Settlements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ItemOwners::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BillItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bills::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
