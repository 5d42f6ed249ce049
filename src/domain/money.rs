//! Fixed-point amount helpers.
//!
//! Amounts are `rust_decimal::Decimal` end to end. Rounding to cents is always
//! half-away-from-zero so `2.675` becomes `2.68`, never `2.67`.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::error::{ArchiveError, Result};

/// Round to two decimal places and force a scale of exactly 2 (`90` -> `90.00`)
pub fn round_cents(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Split a rounded amount into its integer and two-digit decimal parts
pub fn cents_parts(amount: Decimal) -> (String, String) {
    let text = round_cents(amount).to_string();
    match text.split_once('.') {
        Some((whole, frac)) => (whole.to_string(), frac.to_string()),
        None => (text, "00".to_string()),
    }
}

/// Parse a user-supplied amount, accepting either `.` or `,` as decimal separator
pub fn parse_amount(input: &str) -> Result<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ArchiveError::InvalidAmountInput(input.to_string()));
    }
    Decimal::from_str(&trimmed.replace(',', "."))
        .map_err(|_| ArchiveError::InvalidAmountInput(input.to_string()))
}

/// Render an amount for display, e.g. `125.50 €`
pub fn format_amount(amount: Decimal, currency_symbol: &str) -> String {
    format!("{} {}", round_cents(amount), currency_symbol)
}
