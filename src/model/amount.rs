//! Amount type for handling monetary values read from, or written to, ledger cells.
//!
//! Ledger cells hold amounts as text. A cell may be empty, may hold a plain number, or may hold a
//! number that the spreadsheet formatted with a `₹` sign and thousands separators. Reading is
//! lenient: anything that is not a number counts as zero.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

/// The currency symbol used when presenting amounts.
pub const RUPEE: char = '₹';

/// Represents a rupee amount.
///
/// `Display` writes the plain, normalized number with no currency symbol and no trailing zeros,
/// which is the form that is written to the `total` column: e.g. `-500` or `12.5`.
///
/// # Examples
///
/// Lenient parsing of cell text:
/// ```
/// # use sheet_ledger::model::Amount;
/// assert_eq!(Amount::lenient("₹1,250.50").to_string(), "1250.5");
/// assert_eq!(Amount::lenient("").to_string(), "0");
/// assert_eq!(Amount::lenient("n/a").to_string(), "0");
/// ```
///
/// Display for people:
/// ```
/// # use sheet_ledger::model::Amount;
/// assert_eq!(Amount::lenient("-60000").rupees(), "-₹60,000.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
}

impl Amount {
    pub const ZERO: Amount = Amount::new(Decimal::ZERO);

    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Parses cell text, treating empty or non-numeric text as zero.
    pub fn lenient(s: &str) -> Self {
        Amount::from_str(s).unwrap_or_default()
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value().is_zero()
    }

    /// Returns true if the amount is greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.value().is_sign_positive()
    }

    /// Returns true if the amount is less than zero.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.value().is_sign_negative()
    }

    /// Formats the amount for people, e.g. `₹1,234.50` or `-₹60,000.00`.
    pub fn rupees(&self) -> String {
        let (sign, num) = if self.is_negative() {
            ("-", self.value().abs())
        } else {
            ("", self.value())
        };
        format!(
            "{sign}{RUPEE}{}",
            format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
        )
    }

    /// Rounds to `dp` decimal places, with midpoints rounded away from zero.
    pub fn round_dp(&self, dp: u32) -> Self {
        Self::new(
            self.value
                .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Strict parse. Empty text is zero; a `₹` sign (after an optional minus) and commas are
    /// accepted; anything else that is not a decimal number is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        let without_symbol = if let Some(after_minus) = trimmed.strip_prefix('-') {
            match after_minus.trim_start().strip_prefix(RUPEE) {
                Some(after_symbol) => format!("-{}", after_symbol.trim_start()),
                None => trimmed.to_string(),
            }
        } else if let Some(after_symbol) = trimmed.strip_prefix(RUPEE) {
            after_symbol.trim_start().to_string()
        } else {
            trimmed.to_string()
        };

        let without_commas = without_symbol.replace(',', "");
        let value = Decimal::from_str(&without_commas).map_err(AmountError)?;
        Ok(Amount::new(value))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value.normalize())
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount::new(self.value + rhs.value)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount::new(self.value - rhs.value)
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        Amount::new(-self.value)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        let amount = Amount::from_str("500").unwrap();
        assert_eq!(amount.value(), dec("500"));
    }

    #[test]
    fn test_parse_with_rupee_sign() {
        let amount = Amount::from_str("₹ 50.25").unwrap();
        assert_eq!(amount.value(), dec("50.25"));
    }

    #[test]
    fn test_parse_negative_with_rupee_sign() {
        let amount = Amount::from_str("-₹50.00").unwrap();
        assert_eq!(amount.value(), dec("-50.00"));
    }

    #[test]
    fn test_parse_with_commas() {
        let amount = Amount::from_str("₹1,23,456.78").unwrap();
        assert_eq!(amount.value(), dec("123456.78"));
    }

    #[test]
    fn test_parse_empty_string() {
        let amount = Amount::from_str("   ").unwrap();
        assert_eq!(amount.value(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(Amount::from_str("ten").is_err());
        assert!(Amount::from_str("12abc").is_err());
    }

    #[test]
    fn test_lenient_treats_garbage_as_zero() {
        assert!(Amount::lenient("ten").is_zero());
        assert!(Amount::lenient("").is_zero());
        assert_eq!(Amount::lenient(" 42 ").value(), dec("42"));
    }

    #[test]
    fn test_display_is_normalized() {
        assert_eq!(Amount::new(dec("-500.00")).to_string(), "-500");
        assert_eq!(Amount::new(dec("12.50")).to_string(), "12.5");
        assert_eq!(Amount::ZERO.to_string(), "0");
    }

    #[test]
    fn test_rupees() {
        assert_eq!(Amount::new(dec("1234.5")).rupees(), "₹1,234.50");
        assert_eq!(Amount::new(dec("-60000")).rupees(), "-₹60,000.00");
        assert_eq!(Amount::ZERO.rupees(), "₹0.00");
    }

    #[test]
    fn test_arithmetic() {
        let credit = Amount::lenient("50000");
        let debit = Amount::lenient("");
        assert_eq!((credit - debit).to_string(), "50000");
        assert_eq!((debit - Amount::lenient("500")).to_string(), "-500");
        let total: Amount = ["1", "2.5", "x"].iter().map(|s| Amount::lenient(s)).sum();
        assert_eq!(total.to_string(), "3.5");
    }

    #[test]
    fn test_sign_predicates() {
        assert!(Amount::lenient("5").is_positive());
        assert!(Amount::lenient("-5").is_negative());
        assert!(!Amount::ZERO.is_positive());
        assert!(!Amount::ZERO.is_negative());
    }

    #[test]
    fn test_round_dp() {
        assert_eq!(Amount::lenient("33.35").round_dp(1).to_string(), "33.4");
        assert_eq!(Amount::lenient("-33.35").round_dp(1).to_string(), "-33.4");
    }

    #[test]
    fn test_serde() {
        let amount: Amount = serde_json::from_str("\"₹1,000\"").unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"1000\"");
    }
}
