//! Raw cell text → signed decimal amount.
//!
//! Reconciliation amounts are currency, so everything downstream works on
//! exact decimals. Binary floating point is never used here — rounding drift
//! in the difference computation would defeat the whole exercise.

use rust_decimal::Decimal;

use crate::error::ValueFailure;

/// Currency symbols stripped before parsing.
const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// Intended precision of reconciliation amounts, in fractional digits.
const AMOUNT_SCALE: u32 = 2;

/// Convert one raw cell string into a signed decimal amount.
///
/// Handles currency symbols, thousands separators, interior whitespace, and
/// accounting-style negatives (`(500.00)` → `-500.00`). Fails rather than
/// defaulting: a blank or non-numeric cell never becomes zero.
pub fn normalize(raw: &str) -> Result<Decimal, ValueFailure> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValueFailure::EmptyCell);
    }

    let mut cleaned: String = trimmed
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && !c.is_whitespace())
        .collect();

    // Accounting negative: value wholly wrapped in parentheses.
    if let Some(inner) = cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        cleaned = format!("-{inner}");
    }

    cleaned
        .parse::<Decimal>()
        .map(|amount| amount.round_dp(AMOUNT_SCALE))
        .map_err(|_| ValueFailure::NotNumeric(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn plain_numbers() {
        assert_eq!(normalize("5000.00").unwrap(), dec("5000.00"));
        assert_eq!(normalize("5000").unwrap(), dec("5000"));
        assert_eq!(normalize("-42.50").unwrap(), dec("-42.50"));
        assert_eq!(normalize("  3500.50  ").unwrap(), dec("3500.50"));
    }

    #[test]
    fn currency_and_separators() {
        assert_eq!(normalize("$5,000.00").unwrap(), dec("5000.00"));
        assert_eq!(normalize("€2500.00").unwrap(), dec("2500.00"));
        assert_eq!(normalize("£ 1,250").unwrap(), dec("1250"));
        assert_eq!(normalize("¥9,999,999.99").unwrap(), dec("9999999.99"));
    }

    #[test]
    fn accounting_negatives() {
        assert_eq!(normalize("(500.00)").unwrap(), dec("-500.00"));
        assert_eq!(normalize("($2,000.00)").unwrap(), dec("-2000.00"));
    }

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(normalize("10.005").unwrap(), dec("10.00"));
        assert_eq!(normalize("10.015").unwrap(), dec("10.02"));
        assert_eq!(normalize("4800.4999").unwrap(), dec("4800.50"));
    }

    #[test]
    fn malformed_tokens_fail() {
        assert_eq!(normalize("").unwrap_err(), ValueFailure::EmptyCell);
        assert_eq!(normalize("   ").unwrap_err(), ValueFailure::EmptyCell);
        assert_eq!(normalize("abc").unwrap_err(), ValueFailure::NotNumeric("abc".into()));
        assert_eq!(normalize("$-").unwrap_err(), ValueFailure::NotNumeric("$-".into()));
        assert_eq!(normalize("()").unwrap_err(), ValueFailure::NotNumeric("()".into()));
        assert_eq!(normalize("(abc)").unwrap_err(), ValueFailure::NotNumeric("(abc)".into()));
    }
}
