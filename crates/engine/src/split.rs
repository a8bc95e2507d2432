//! Per-bill split resolution.
//!
//! Given one bill's items, computes how much of the bill is shared by the
//! whole roster and how much is owed personally by named owners. The
//! resolver is pure: it does not authorize the caller and touches no storage.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::{EngineError, ResultEngine, money};

/// One bill item as seen by the settlement math.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemView {
    pub amount: Decimal,
    pub quantity: i32,
    pub is_shared: bool,
    /// Owner member ids; meaningful only when `is_shared` is false.
    pub owner_ids: Vec<String>,
}

impl ItemView {
    #[must_use]
    pub fn shared(amount: Decimal, quantity: i32) -> Self {
        Self {
            amount,
            quantity,
            is_shared: true,
            owner_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn personal(amount: Decimal, quantity: i32, owner_ids: Vec<String>) -> Self {
        Self {
            amount,
            quantity,
            is_shared: false,
            owner_ids,
        }
    }
}

/// Per-bill contribution split.
///
/// `shared_total` is divided across the full group roster by the aggregator;
/// `personal_totals` already carries each named owner's exact share.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BillContributions {
    pub shared_total: Decimal,
    pub personal_totals: BTreeMap<String, Decimal>,
}

/// Resolves one bill's items into shared and personal contributions.
///
/// Shared items accumulate into `shared_total`. A personal item with N ≥ 1
/// owners adds `line_total / N` to each owner. A personal item with zero
/// owners contributes to nobody's owed total: the cost stays with the payer
/// (documented behavior; the write path rejects such items on entry, this
/// keeps the math total for rows that predate that check).
pub fn resolve_contributions(items: &[ItemView]) -> ResultEngine<BillContributions> {
    let mut out = BillContributions::default();

    for item in items {
        if item.quantity < 0 {
            return Err(EngineError::Validation(
                "item quantity must not be negative".to_string(),
            ));
        }
        if item.amount.is_sign_negative() {
            return Err(EngineError::Validation(
                "item amount must not be negative".to_string(),
            ));
        }

        let line_total = money::line_total(item.amount, item.quantity);
        if item.is_shared {
            out.shared_total += line_total;
            continue;
        }

        if item.owner_ids.is_empty() {
            continue;
        }

        let share = money::split_even(line_total, item.owner_ids.len())?;
        for owner_id in &item.owner_ids {
            *out.personal_totals.entry(owner_id.clone()).or_default() += share;
        }
    }

    Ok(out)
}
