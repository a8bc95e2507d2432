//! Monetary helpers over exact decimal amounts.
//!
//! Every monetary value in the engine is a [`rust_decimal::Decimal`] so that
//! balances never drift the way binary floating point does. Amounts entering
//! the system carry at most 2 fractional digits (the currency's minor unit);
//! per-member shares produced by [`split_even`] may carry more precision
//! internally, and any residue inherent to dividing cents is absorbed by the
//! dust [`TOLERANCE`] instead of being redistributed.
use rust_decimal::Decimal;

use crate::{EngineError, ResultEngine};

/// Dust tolerance: 0.01 currency units.
///
/// Two amounts are considered equal when their absolute difference is within
/// this tolerance, and residual balances/transfers at or below it are treated
/// as zero.
pub const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Returns `true` if `amount` is zero for settlement purposes.
#[must_use]
pub fn is_negligible(amount: Decimal) -> bool {
    amount.abs() <= TOLERANCE
}

/// Tolerance-aware equality.
#[must_use]
pub fn equal_within_tolerance(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= TOLERANCE
}

/// Splits `total` evenly across `parts` parties using exact decimal division.
///
/// The quotient may carry more than 2 fractional digits; callers compare
/// derived sums through the dust tolerance rather than rounding here.
pub fn split_even(total: Decimal, parts: usize) -> ResultEngine<Decimal> {
    if parts == 0 {
        return Err(EngineError::Validation(
            "cannot split an amount across zero parties".to_string(),
        ));
    }
    Ok(total / Decimal::from(parts))
}

/// `amount × quantity` for one bill line.
#[must_use]
pub fn line_total(amount: Decimal, quantity: i32) -> Decimal {
    amount * Decimal::from(quantity)
}

/// Validates an amount entering the system: strictly positive, at most 2
/// fractional digits. Zero is rejected here; the math layer only requires
/// non-negative values when re-reading stored rows.
pub fn validate_amount(value: Decimal, label: &str) -> ResultEngine<()> {
    if value <= Decimal::ZERO {
        return Err(EngineError::Validation(format!(
            "{label} must be positive"
        )));
    }
    if value.normalize().scale() > 2 {
        return Err(EngineError::Validation(format!(
            "{label} must have at most 2 decimal places"
        )));
    }
    Ok(())
}
