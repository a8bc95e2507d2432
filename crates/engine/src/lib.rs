//! Core settlement engine: shared-expense bills, per-member balance
//! aggregation, debt-minimizing transfer generation and the settlement
//! lifecycle, all executed against an injected [`sea_orm::DatabaseConnection`].

pub use commands::{
    BillItemInput, CalculateSettlementCmd, CreateBillCmd, CreateSettlementCmd, UpdateBillCmd,
};
pub use error::EngineError;
pub use ops::{
    BillDetail, BillItemDetail, BillListFilter, Engine, EngineBuilder, GroupMember, MemberBalance,
    MemberRole, SettlementDetail, SettlementResult, SettlementTransfer,
};

pub mod balance;
pub mod bill_items;
pub mod bills;
mod commands;
mod error;
pub mod groups;
pub mod item_owners;
pub mod memberships;
pub mod minimize;
pub mod money;
mod ops;
pub mod settlement_bills;
pub mod settlement_transactions;
pub mod settlements;
pub mod split;
pub mod users;

pub type ResultEngine<T> = Result<T, EngineError>;
