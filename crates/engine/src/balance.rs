//! Balance aggregation across a set of bills.
//!
//! Folds per-bill paid/owed contributions into one net balance per group
//! member. Shared costs divide across the *full current roster*, not just
//! the members a bill happens to touch, so a member with no activity still
//! appears with a zero balance. Aggregation is associative and commutative
//! under exact decimal arithmetic, so the result is independent of bill and
//! item iteration order.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::{
    EngineError, ResultEngine, money,
    split::{ItemView, resolve_contributions},
};

/// One bill as seen by the aggregator.
#[derive(Clone, Debug, PartialEq)]
pub struct BillView {
    pub paid_by: String,
    pub total_amount: Decimal,
    pub items: Vec<ItemView>,
}

/// Derived per-member quantities; never persisted standalone.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Balance {
    /// Sum of totals of bills this member paid.
    pub paid: Decimal,
    /// This member's share across all processed bills.
    pub owes: Decimal,
    /// `paid − owes`; positive means the member is a net creditor.
    pub net: Decimal,
}

/// Computes one [`Balance`] per roster member over `bills`.
///
/// Every member of `member_ids` appears in the output, active or not. A
/// payer outside the roster still counts toward the bill total but earns no
/// `paid` credit (the bill is supposed to be gated to group members before
/// it gets here).
pub fn aggregate_balances(
    bills: &[BillView],
    member_ids: &[String],
) -> ResultEngine<BTreeMap<String, Balance>> {
    if member_ids.is_empty() {
        return Err(EngineError::Validation(
            "group roster must not be empty".to_string(),
        ));
    }

    let mut balances: BTreeMap<String, Balance> = member_ids
        .iter()
        .map(|id| (id.clone(), Balance::default()))
        .collect();

    for bill in bills {
        if let Some(balance) = balances.get_mut(&bill.paid_by) {
            balance.paid += bill.total_amount;
        }

        let split = resolve_contributions(&bill.items)?;

        if split.shared_total > Decimal::ZERO {
            let share = money::split_even(split.shared_total, balances.len())?;
            for balance in balances.values_mut() {
                balance.owes += share;
            }
        }

        for (owner_id, amount) in split.personal_totals {
            if let Some(balance) = balances.get_mut(&owner_id) {
                balance.owes += amount;
            }
        }
    }

    for balance in balances.values_mut() {
        balance.net = balance.paid - balance.owes;
    }

    Ok(balances)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn roster(ids: &[&str]) -> Vec<String> {
        ids.iter().map(ToString::to_string).collect()
    }

    fn shared_bill(paid_by: &str, amount: &str) -> BillView {
        BillView {
            paid_by: paid_by.to_string(),
            total_amount: dec(amount),
            items: vec![ItemView::shared(dec(amount), 1)],
        }
    }

    #[test]
    fn shared_bill_splits_across_full_roster() {
        let balances =
            aggregate_balances(&[shared_bill("a", "30.00")], &roster(&["a", "b", "c"])).unwrap();

        assert_eq!(balances["a"].paid, dec("30.00"));
        for id in ["a", "b", "c"] {
            assert_eq!(balances[id].owes, dec("10.00"));
        }
        assert_eq!(balances["a"].net, dec("20.00"));
        assert_eq!(balances["b"].net, dec("-10.00"));
        assert_eq!(balances["c"].net, dec("-10.00"));
    }

    #[test]
    fn personal_bill_charges_only_owners() {
        let bill = BillView {
            paid_by: "b".to_string(),
            total_amount: dec("20.00"),
            items: vec![ItemView::personal(dec("20.00"), 1, roster(&["c"]))],
        };
        let balances = aggregate_balances(&[bill], &roster(&["a", "b", "c"])).unwrap();

        assert_eq!(balances["b"].paid, dec("20.00"));
        assert_eq!(balances["a"].owes, Decimal::ZERO);
        assert_eq!(balances["b"].owes, Decimal::ZERO);
        assert_eq!(balances["c"].owes, dec("20.00"));
        assert_eq!(balances["c"].net, dec("-20.00"));
    }

    #[test]
    fn inactive_member_appears_with_zero_balance() {
        let balances = aggregate_balances(&[], &roster(&["a", "b"])).unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances["b"], Balance::default());
    }

    #[test]
    fn zero_sum_over_shared_bills() {
        let bills = [
            shared_bill("a", "30.00"),
            shared_bill("b", "12.34"),
            shared_bill("c", "0.99"),
        ];
        let balances = aggregate_balances(&bills, &roster(&["a", "b", "c"])).unwrap();

        let paid: Decimal = balances.values().map(|b| b.paid).sum();
        let owes: Decimal = balances.values().map(|b| b.owes).sum();
        assert!(money::equal_within_tolerance(paid, owes));

        let net: Decimal = balances.values().map(|b| b.net).sum();
        assert!(money::is_negligible(net));
    }

    #[test]
    fn zero_owner_item_leaves_payer_surplus() {
        // The dropped cost stays with the payer: paid counts, owes does not.
        let bill = BillView {
            paid_by: "a".to_string(),
            total_amount: dec("10.00"),
            items: vec![ItemView::personal(dec("10.00"), 1, Vec::new())],
        };
        let balances = aggregate_balances(&[bill], &roster(&["a", "b"])).unwrap();
        assert_eq!(balances["a"].paid, dec("10.00"));
        assert_eq!(balances["a"].owes, Decimal::ZERO);
        assert_eq!(balances["a"].net, dec("10.00"));
        assert_eq!(balances["b"].net, Decimal::ZERO);
    }

    #[test]
    fn bill_order_does_not_matter() {
        let bills = [
            shared_bill("a", "30.00"),
            BillView {
                paid_by: "b".to_string(),
                total_amount: dec("20.00"),
                items: vec![ItemView::personal(dec("20.00"), 1, roster(&["c"]))],
            },
        ];
        let members = roster(&["a", "b", "c"]);
        let fwd = aggregate_balances(&bills, &members).unwrap();
        let rev: Vec<BillView> = bills.iter().rev().cloned().collect();
        assert_eq!(fwd, aggregate_balances(&rev, &members).unwrap());
    }
}
