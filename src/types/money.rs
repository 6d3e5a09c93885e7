//! Monetary helpers for the ledger
//!
//! Every stored or returned amount carries exactly two decimal places. Values
//! are rounded half away from zero at the point of assignment, never only at
//! display time.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places carried by every monetary value
pub const MONEY_SCALE: u32 = 2;

/// Round a value to two decimal places and fix its scale to exactly two
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_ledger_engine::types::money::round_money;
///
/// assert_eq!(round_money(Decimal::new(10005, 3)).to_string(), "10.01");
/// assert_eq!(round_money(Decimal::new(7, 0)).to_string(), "7.00");
/// ```
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Zero with a two decimal scale
pub fn zero() -> Decimal {
    round_money(Decimal::ZERO)
}

/// Round a transaction amount and require it to be strictly positive
///
/// Returns `None` when the amount rounds to zero or is negative.
pub fn positive_amount(amount: Decimal) -> Option<Decimal> {
    let rounded = round_money(amount);
    (rounded > Decimal::ZERO).then_some(rounded)
}
