//! Debt-minimization transfer construction.
//!
//! Turns net balances into a small set of point-to-point transfers that zero
//! every balance. The strategy is a greedy two-pointer match over creditors
//! and debtors sorted by magnitude; each round retires at least one party,
//! so it settles in at most `#debtors + #creditors - 1` rounds. True minimum
//! transfer count is an NP-hard matching problem and out of scope.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::{balance::Balance, money};

/// A directed transfer from a debtor to a creditor, `amount > 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
}

struct Party {
    member_id: String,
    remaining: Decimal,
}

/// Sort descending by remaining amount, ties by member id ascending, so the
/// output is deterministic regardless of input map flavor.
fn sorted_parties(mut parties: Vec<Party>) -> Vec<Party> {
    parties.sort_by(|a, b| {
        b.remaining
            .cmp(&a.remaining)
            .then_with(|| a.member_id.cmp(&b.member_id))
    });
    parties
}

/// Produces transfers settling all debts in `balances`.
///
/// Residual amounts at or below the dust tolerance are treated as already
/// settled and never emitted as transfers.
#[must_use]
pub fn minimize_transfers(balances: &BTreeMap<String, Balance>) -> Vec<Transfer> {
    let mut creditors = Vec::new();
    let mut debtors = Vec::new();
    for (member_id, balance) in balances {
        if money::is_negligible(balance.net) {
            continue;
        }
        let party = Party {
            member_id: member_id.clone(),
            remaining: balance.net.abs(),
        };
        if balance.net > Decimal::ZERO {
            creditors.push(party);
        } else {
            debtors.push(party);
        }
    }

    let mut creditors = sorted_parties(creditors);
    let mut debtors = sorted_parties(debtors);

    let mut transfers = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < debtors.len() && j < creditors.len() {
        let amount = debtors[i].remaining.min(creditors[j].remaining);

        if amount > money::TOLERANCE {
            transfers.push(Transfer {
                from: debtors[i].member_id.clone(),
                to: creditors[j].member_id.clone(),
                amount,
            });
        }

        debtors[i].remaining -= amount;
        creditors[j].remaining -= amount;

        if debtors[i].remaining <= money::TOLERANCE {
            i += 1;
        }
        if creditors[j].remaining <= money::TOLERANCE {
            j += 1;
        }
    }

    transfers
}
