use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod group {
    use super::*;

    /// Role of a user in a group.
    ///
    /// The server treats roles as:
    /// - `admin`: can manage members, confirm settlements and edit any bill.
    /// - `member`: can create bills and settlements.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MemberRole {
        Admin,
        Member,
    }

    impl MemberRole {
        /// Returns the canonical role string used by the engine/database.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Admin => "admin",
                Self::Member => "member",
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: String,
        pub name: String,
        pub description: Option<String>,
        pub created_by: String,
        pub created_at: DateTime<Utc>,
    }

    /// Request body for adding/updating a member.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberUpsert {
        pub user_id: String,
        pub role: MemberRole,
    }

    /// A member with their role.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub user_id: String,
        pub user_name: String,
        pub role: MemberRole,
    }

    /// Response body for listing members.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
    }
}

pub mod bill {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BillStatus {
        Pending,
        Finalized,
        Settled,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BillItemNew {
        pub name: String,
        /// Unit price as an exact decimal string, e.g. `"12.50"`.
        pub amount: Decimal,
        /// Defaults to 1 when absent.
        pub quantity: Option<i32>,
        pub is_shared: bool,
        /// Required (non-empty) when `is_shared` is false.
        pub owner_ids: Option<Vec<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BillNew {
        pub group_id: String,
        pub title: String,
        pub description: Option<String>,
        pub total_amount: Decimal,
        pub bill_date: Option<DateTime<Utc>>,
        pub items: Vec<BillItemNew>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BillItemView {
        pub id: String,
        pub name: String,
        pub amount: Decimal,
        pub quantity: i32,
        pub is_shared: bool,
        pub owner_ids: Vec<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BillView {
        pub id: String,
        pub group_id: String,
        pub title: String,
        pub description: Option<String>,
        pub total_amount: Decimal,
        pub paid_by: String,
        pub bill_date: DateTime<Utc>,
        pub status: BillStatus,
        pub items: Vec<BillItemView>,
    }
}

pub mod settlement {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SettlementStatus {
        Pending,
        Confirmed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementCalculate {
        pub group_id: String,
        pub bill_ids: Vec<String>,
    }

    /// One member's position in a settlement calculation.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserBalance {
        pub user_id: String,
        pub user_name: String,
        /// Exact decimal string, e.g. `"30.00"`.
        pub paid: Decimal,
        pub owes: Decimal,
        /// `paid - owes`; positive means the user should receive money.
        pub balance: Decimal,
    }

    /// A proposed transfer from one member to another.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Transaction {
        pub from_user_id: String,
        pub from_user_name: String,
        pub to_user_id: String,
        pub to_user_name: String,
        pub amount: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementResult {
        pub group_id: String,
        pub bill_count: usize,
        pub total_amount: Decimal,
        pub balances: Vec<UserBalance>,
        pub transactions: Vec<Transaction>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementView {
        pub id: String,
        pub group_id: String,
        pub title: String,
        pub description: Option<String>,
        pub created_by: String,
        pub status: SettlementStatus,
        pub settled_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub bill_ids: Vec<String>,
        pub transactions: Vec<Transaction>,
    }
}
