//! Parsing of free-text expense messages like `Lunch 2.95`.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Everything up to the last run of whitespace is the description, the final token is the amount.
static EXPENSE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s+([\d,.]+)$").expect("expense regex"));

/// A single expense entered by the user. Only `parse` creates these, so the description is always
/// trimmed and non-empty and the amount is always positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expense {
    description: String,
    amount: Decimal,
}

impl Expense {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

impl Display for Expense {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.description, self.amount)
    }
}

/// Parses an expense from a message in the format `<description> <amount>`, e.g. `Lunch 2.95`.
///
/// A comma is accepted as the decimal separator (`Groceries 15,50`). Returns `None` when the
/// message does not have that shape or the amount is not a positive number. Not matching is the
/// normal outcome for chatter, so there is no error type here.
pub fn parse(message: &str) -> Option<Expense> {
    let message = message.trim();
    if message.is_empty() {
        return None;
    }

    let captures = EXPENSE_PATTERN.captures(message)?;
    let description = captures.get(1)?.as_str().trim();
    let amount = captures.get(2)?.as_str().replace(',', ".");

    let amount = Decimal::from_str(&amount).ok()?;
    if amount <= Decimal::ZERO {
        return None;
    }

    Some(Expense {
        description: description.to_string(),
        amount,
    })
}

/// Formats an amount with two decimals and a decimal comma, e.g. `2,95`. Halves round away from
/// zero, so `0.005` is `0,01`.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}").replace('.', ",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(description: &str, amount: Decimal) -> Expense {
        Expense {
            description: description.to_string(),
            amount,
        }
    }

    #[test]
    fn test_parse_simple() {
        assert_eq!(
            parse("Lunch 2.95"),
            Some(expense("Lunch", Decimal::new(295, 2)))
        );
    }

    #[test]
    fn test_parse_multi_word_description() {
        assert_eq!(
            parse("Gym membership 31.99"),
            Some(expense("Gym membership", Decimal::new(3199, 2)))
        );
    }

    #[test]
    fn test_parse_decimal_comma() {
        let parsed = parse("Groceries 15,50").unwrap();
        assert_eq!(parsed.description(), "Groceries");
        assert_eq!(parsed.amount(), Decimal::new(155, 1));
    }

    #[test]
    fn test_parse_whole_number() {
        assert_eq!(parse("Rent 700"), Some(expense("Rent", Decimal::from(700))));
    }

    #[test]
    fn test_parse_whitespace_tolerance() {
        assert_eq!(
            parse("  Lunch   2.95  "),
            Some(expense("Lunch", Decimal::new(295, 2)))
        );
        assert_eq!(
            parse("Coffee\t \t4"),
            Some(expense("Coffee", Decimal::from(4)))
        );
    }

    #[test]
    fn test_parse_numeric_description() {
        assert_eq!(
            parse("2024 budget 50"),
            Some(expense("2024 budget", Decimal::from(50)))
        );
        // Only the last token is the amount.
        assert_eq!(
            parse("Bus 1 2"),
            Some(expense("Bus 1", Decimal::from(2)))
        );
    }

    #[test]
    fn test_parse_rejects() {
        for message in [
            "",
            "   ",
            "Lunch",
            "Lunch abc",
            "Lunch -2.95",
            "Lunch 0",
            "Lunch 0.00",
            "Lunch 1.2.3",
            "Lunch 2.95€",
            "2.95",
            "Lunch\nbreak 5",
        ] {
            assert_eq!(parse(message), None, "'{message}' should not parse");
        }
    }

    #[test]
    fn test_parse_is_repeatable() {
        let message = "Taxi home 18,40";
        assert_eq!(parse(message), parse(message));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::new(295, 2)), "2,95");
        assert_eq!(format_amount(Decimal::from(3)), "3,00");
        assert_eq!(format_amount(Decimal::new(155, 1)), "15,50");
        assert_eq!(format_amount(Decimal::ZERO), "0,00");
        assert_eq!(format_amount(Decimal::new(5, 3)), "0,01");
        assert_eq!(format_amount(Decimal::new(15, 3)), "0,02");
        assert_eq!(format_amount(Decimal::new(2994, 3)), "2,99");
    }

    #[test]
    fn test_parse_out_of_decimal_range() {
        // Outside the range and precision of a Decimal.
        assert_eq!(parse("Rent 100000000000000000000000000000"), None);
        assert_eq!(parse("Dust 0.00000000000000000000000000000001"), None);
    }
}
