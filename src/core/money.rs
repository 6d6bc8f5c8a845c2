//! Rounding rules shared by every monetary boundary.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use tracing::warn;

use crate::error::{EngineError, Result};

/// Largest amount accepted for a single expense or a monthly budget, one
/// trillion. Keeps sums of many records far from the `Decimal` range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Rounds to whole cents, halves away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a percentage to one decimal place, halves away from zero.
pub fn round_percent(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Validates an amount entering the system and rounds it to cents.
///
/// `label` names the amount in the error message.
pub fn checked_amount(amount: Decimal, label: &str) -> Result<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(EngineError::validation(format!(
            "{label} must not be negative: {amount}"
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(EngineError::validation(format!(
            "{label} must not exceed {MAX_AMOUNT}: {amount}"
        )));
    }
    Ok(round_cents(amount.abs()))
}

/// Parses a user supplied amount. Rejects anything that is not a
/// non-negative decimal number up to [`MAX_AMOUNT`].
pub fn parse_amount(input: &str) -> Result<Decimal> {
    let amount = Decimal::from_str(input.trim())
        .map_err(|_| EngineError::validation(format!("'{input}' is not a valid amount")))?;
    checked_amount(amount, "Amount")
}

/// Adds `amount` to a running total. Totals that leave the `Decimal` range
/// stay at [`Decimal::MAX`].
pub fn add_to_total(total: Decimal, amount: Decimal) -> Decimal {
    total.checked_add(amount).unwrap_or_else(|| {
        warn!(%total, %amount, "Spending total overflowed, holding at maximum");
        Decimal::MAX
    })
}
