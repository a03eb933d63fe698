//! Lossless monetary amount type backed by rust_decimal.
//!
//! Commission math must not drift: order values, rates, and computed amounts
//! are parsed from canonical decimal strings and formatted back without
//! exponent notation. Serializes to JSON strings.

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed-point monetary amount (also used for rates and thresholds).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Money(#[serde(with = "rust_decimal::serde::str")] RustDecimal);

impl Money {
    /// Create a Money from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Money(value)
    }

    /// Parse a Money from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Money)
    }

    /// Format as a canonical string (no exponent, no trailing zeros).
    pub fn to_canonical_string(&self) -> String {
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Money(RustDecimal::ZERO)
    }

    /// Returns true if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns the value 100 (percentage divisor).
    pub fn hundred() -> Self {
        Money(RustDecimal::ONE_HUNDRED)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Money {
    fn from(value: RustDecimal) -> Self {
        Money(value)
    }
}

impl From<Money> for RustDecimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Money {
    type Output = Money;

    fn mul(self, rhs: Money) -> Money {
        Money(self.0 * rhs.0)
    }
}

impl std::ops::Div for Money {
    type Output = Money;

    fn div(self, rhs: Money) -> Money {
        Money(self.0 / rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_parse_roundtrip() {
        let test_cases = vec!["199.99", "0.01", "12500", "2.5", "0", "999999.999"];

        for s in test_cases {
            let money = Money::from_str_canonical(s).expect("parse failed");
            let formatted = money.to_canonical_string();
            let reparsed = Money::from_str_canonical(&formatted).expect("reparse failed");
            assert_eq!(money, reparsed, "roundtrip failed for {}", s);
        }
    }

    #[test]
    fn test_money_canonical_no_exponent() {
        let money = Money::from_str_canonical("1200").expect("parse failed");
        let formatted = money.to_canonical_string();
        assert!(
            !formatted.contains('e'),
            "formatted string should not contain exponent"
        );
        assert_eq!(formatted, "1200");
    }

    #[test]
    fn test_money_canonical_strips_trailing_zeros() {
        let money = Money::from_str_canonical("10.00").unwrap();
        assert_eq!(money.to_canonical_string(), "10");
        let money = Money::from_str_canonical("19.90").unwrap();
        assert_eq!(money.to_canonical_string(), "19.9");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_str_canonical("19.99").unwrap();
        let b = Money::from_str_canonical("0.01").unwrap();

        let sum = a + b;
        assert_eq!(sum.to_canonical_string(), "20");

        let diff = a - b;
        assert_eq!(diff.to_canonical_string(), "19.98");
    }

    #[test]
    fn test_money_percentage_math_is_exact() {
        // 200 * 5 / 100 must be exactly 10, no float drift
        let order = Money::from_str_canonical("200").unwrap();
        let rate = Money::from_str_canonical("5").unwrap();
        let result = order * rate / Money::hundred();
        assert_eq!(result.to_canonical_string(), "10");

        // fractional rate
        let rate = Money::from_str_canonical("2.5").unwrap();
        let result = order * rate / Money::hundred();
        assert_eq!(result.to_canonical_string(), "5");
    }

    #[test]
    fn test_money_json_serializes_as_string() {
        let money = Money::from_str_canonical("49.95").unwrap();
        let json = serde_json::to_value(money).unwrap();
        assert!(json.is_string());
        assert_eq!(json, "49.95");
    }

    #[test]
    fn test_money_display() {
        let money = Money::from_str_canonical("99.99").unwrap();
        assert_eq!(money.to_string(), "99.99");
    }

    #[test]
    fn test_money_ordering() {
        let used = Money::from_str_canonical("19.99").unwrap();
        let required = Money::from_str_canonical("20").unwrap();
        assert!(used < required);
        assert!(used + Money::from_str_canonical("0.01").unwrap() >= required);
    }

    #[test]
    fn test_money_predicates() {
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_positive());
        assert!(Money::from_str_canonical("0.01").unwrap().is_positive());
        assert!(!Money::from_str_canonical("-5").unwrap().is_positive());
    }
}
