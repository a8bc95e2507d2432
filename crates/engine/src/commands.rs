//! Command structs for engine operations.
//!
//! These types group parameters for write operations (bill and settlement
//! creation/update), keeping call sites readable and avoiding long argument
//! lists.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// One line item of a bill being created or added.
#[derive(Clone, Debug)]
pub struct BillItemInput {
    pub name: String,
    pub amount: Decimal,
    pub quantity: i32,
    pub is_shared: bool,
    pub owner_ids: Vec<String>,
}

impl BillItemInput {
    /// An item whose cost is split across the whole group roster.
    #[must_use]
    pub fn shared(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            name: name.into(),
            amount,
            quantity: 1,
            is_shared: true,
            owner_ids: Vec::new(),
        }
    }

    /// An item charged only to its listed owners.
    #[must_use]
    pub fn personal(
        name: impl Into<String>,
        amount: Decimal,
        owner_ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            amount,
            quantity: 1,
            is_shared: false,
            owner_ids: owner_ids.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn quantity(mut self, quantity: i32) -> Self {
        self.quantity = quantity;
        self
    }
}

/// Create a bill with its items in one shot.
#[derive(Clone, Debug)]
pub struct CreateBillCmd {
    pub group_id: String,
    pub title: String,
    pub description: Option<String>,
    pub total_amount: Decimal,
    pub paid_by: String,
    pub bill_date: DateTime<Utc>,
    pub items: Vec<BillItemInput>,
    pub user_id: String,
}

impl CreateBillCmd {
    #[must_use]
    pub fn new(
        group_id: impl Into<String>,
        user_id: impl Into<String>,
        title: impl Into<String>,
        total_amount: Decimal,
        bill_date: DateTime<Utc>,
    ) -> Self {
        let user_id = user_id.into();
        Self {
            group_id: group_id.into(),
            title: title.into(),
            description: None,
            total_amount,
            paid_by: user_id.clone(),
            bill_date,
            items: Vec::new(),
            user_id,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Record a different member than the caller as the payer.
    #[must_use]
    pub fn paid_by(mut self, paid_by: impl Into<String>) -> Self {
        self.paid_by = paid_by.into();
        self
    }

    #[must_use]
    pub fn item(mut self, item: BillItemInput) -> Self {
        self.items.push(item);
        self
    }

    #[must_use]
    pub fn items(mut self, items: impl IntoIterator<Item = BillItemInput>) -> Self {
        self.items.extend(items);
        self
    }
}

/// Update a pending bill's header fields. Unset fields are left unchanged.
#[derive(Clone, Debug)]
pub struct UpdateBillCmd {
    pub bill_id: String,
    pub user_id: String,

    pub title: Option<String>,
    pub description: Option<String>,
    pub total_amount: Option<Decimal>,
    pub bill_date: Option<DateTime<Utc>>,
}

impl UpdateBillCmd {
    #[must_use]
    pub fn new(bill_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            bill_id: bill_id.into(),
            user_id: user_id.into(),
            title: None,
            description: None,
            total_amount: None,
            bill_date: None,
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn total_amount(mut self, total_amount: Decimal) -> Self {
        self.total_amount = Some(total_amount);
        self
    }

    #[must_use]
    pub fn bill_date(mut self, bill_date: DateTime<Utc>) -> Self {
        self.bill_date = Some(bill_date);
        self
    }
}

/// Compute a settlement preview over a set of bills.
#[derive(Clone, Debug)]
pub struct CalculateSettlementCmd {
    pub group_id: String,
    pub bill_ids: Vec<String>,
    pub user_id: String,
}

impl CalculateSettlementCmd {
    #[must_use]
    pub fn new(
        group_id: impl Into<String>,
        user_id: impl Into<String>,
        bill_ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            bill_ids: bill_ids.into_iter().map(Into::into).collect(),
            user_id: user_id.into(),
        }
    }
}

/// Persist a previously computed settlement result.
#[derive(Clone, Debug)]
pub struct CreateSettlementCmd {
    pub group_id: String,
    pub bill_ids: Vec<String>,
    pub user_id: String,
}

impl CreateSettlementCmd {
    #[must_use]
    pub fn new(
        group_id: impl Into<String>,
        user_id: impl Into<String>,
        bill_ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            bill_ids: bill_ids.into_iter().map(Into::into).collect(),
            user_id: user_id.into(),
        }
    }
}
