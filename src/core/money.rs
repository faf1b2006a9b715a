//! Amount normalization and currency formatting.
//!
//! Amounts are typed as integer minor units: the user types digits only and the
//! last two are the cents, so "2500" means 25,00. This avoids any ambiguity
//! between `.` and `,` as the decimal separator. Display follows the pt-BR
//! convention: `.` groups thousands and `,` separates cents.

use crate::errors::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};

/// Keeps only the ASCII digits of `raw`, so pasted symbols and separators are ignored.
#[must_use]
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Converts typed minor-unit text into cents.
///
/// Every non-digit is stripped first; nothing left means 0.
///
/// # Errors
/// Returns [`Error::InvalidAmountInput`] when the digits do not fit in an `i64`.
pub fn parse_minor_units_cents(raw: &str) -> Result<i64> {
    let digits = digits_only(raw);
    if digits.is_empty() {
        return Ok(0);
    }
    digits.parse::<i64>().map_err(|_| Error::InvalidAmountInput {
        input: raw.to_string(),
    })
}

/// Converts typed minor-unit text into a currency value: `digits_only(raw) / 100`.
///
/// # Errors
/// Returns [`Error::InvalidAmountInput`] when the digits do not fit in an `i64`.
pub fn parse_minor_units(raw: &str) -> Result<Decimal> {
    parse_minor_units_cents(raw).map(|cents| Decimal::new(cents, 2))
}

/// Renders a stored minor-unit string as "1.234,56".
///
/// Unset input and any value equal to zero (including a bare `"0"`) render as
/// the empty string, the "no amount entered yet" placeholder state. Input that
/// cannot be read as an amount is treated as unset as well.
#[must_use]
pub fn format_for_display(stored_minor_units: &str) -> String {
    match parse_minor_units_cents(stored_minor_units) {
        Ok(cents) if cents != 0 => format_decimal(Decimal::new(cents, 2)),
        _ => String::new(),
    }
}

/// Formats a value with exactly two fraction digits, `.` thousands groups and `,` decimals.
#[must_use]
pub fn format_decimal(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    let cents = rounded.mantissa();
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();

    let integer = (cents / 100).to_string();
    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped},{:02}", cents % 100)
}

/// Formats a value as currency, e.g. "R$ 1.234,56" or "-R$ 3,00".
#[must_use]
pub fn format_currency(amount: Decimal, symbol: &str) -> String {
    if amount.is_sign_negative() && !amount.is_zero() {
        format!("-{symbol} {}", format_decimal(amount.abs()))
    } else {
        format!("{symbol} {}", format_decimal(amount))
    }
}

/// Formats an unsigned amount with an explicit direction, e.g. "+ R$ 10,00".
#[must_use]
pub fn format_signed_currency(amount: Decimal, is_income: bool, symbol: &str) -> String {
    let sign = if is_income { '+' } else { '-' };
    format!("{sign} {}", format_currency(amount.abs(), symbol))
}

/// Converts a currency value into cents for storage.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] when the value is negative, has more than
/// two fraction digits or does not fit in an `i64`.
pub fn to_cents(amount: Decimal) -> Result<i64> {
    let normalized = amount.normalize();
    if normalized.is_sign_negative() && !normalized.is_zero() {
        return Err(Error::InvalidAmount { amount });
    }
    if normalized.scale() > 2 {
        return Err(Error::InvalidAmount { amount });
    }
    let mut scaled = normalized;
    scaled.rescale(2);
    i64::try_from(scaled.mantissa()).map_err(|_| Error::InvalidAmount { amount })
}
