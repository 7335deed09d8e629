//! Value objects for the order domain.

use serde::{Deserialize, Serialize};

/// Money amount represented in cents to avoid floating point drift.
///
/// On the wire a price is a decimal number (`9.99`), which is what the
/// catalog returns and what API clients expect. Conversion only accepts
/// amounts that are exact in whole cents, non-negative and finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Money {
    cents: i64,
}

/// Error returned when a decimal cannot be represented as [`Money`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid price {0}: must be a finite, non-negative amount in whole cents")]
pub struct InvalidMoney(pub f64);

/// Largest cent count every `f64` still represents exactly (2^53).
const MAX_EXACT_CENTS: i64 = 1 << 53;

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a Money amount from a decimal value.
    ///
    /// The value must round-trip through whole cents: `9.99` is accepted,
    /// `9.999` is refused rather than rounded. Amounts beyond 2^53 cents are
    /// refused as well.
    pub fn from_decimal(amount: f64) -> Result<Self, InvalidMoney> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(InvalidMoney(amount));
        }

        let scaled = (amount * 100.0).round();
        if scaled > MAX_EXACT_CENTS as f64 {
            return Err(InvalidMoney(amount));
        }

        let cents = scaled as i64;
        if cents as f64 / 100.0 != amount {
            return Err(InvalidMoney(amount));
        }
        Ok(Self { cents })
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the amount as a decimal value.
    pub fn as_decimal(&self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<f64> for Money {
    type Error = InvalidMoney;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Money> for f64 {
    fn from(money: Money) -> Self {
        money.as_decimal()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents.abs() % 100)
    }
}

/// Version number of a persisted order, used for optimistic concurrency control.
///
/// A freshly inserted order is at version 0 and every successful update
/// moves it forward by exactly one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version assigned on insert.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_decimal_whole_cents() {
        assert_eq!(Money::from_decimal(9.99).unwrap().cents(), 999);
        assert_eq!(Money::from_decimal(10.0).unwrap().cents(), 1000);
        assert_eq!(Money::from_decimal(0.1).unwrap().cents(), 10);
        assert_eq!(Money::from_decimal(0.0).unwrap(), Money::zero());
    }

    #[test]
    fn test_money_refuses_sub_cent_amounts() {
        assert_eq!(Money::from_decimal(9.999), Err(InvalidMoney(9.999)));
        assert!(Money::from_decimal(0.005).is_err());
        assert!(Money::from_decimal(12.345).is_err());
    }

    #[test]
    fn test_money_refuses_amounts_beyond_exact_range() {
        assert_eq!(Money::from_decimal(1e300), Err(InvalidMoney(1e300)));
        assert!(Money::from_decimal(i64::MAX as f64).is_err());
        assert!(Money::from_decimal(1e14).is_err());
        assert_eq!(
            Money::from_decimal(1_000_000.25).unwrap().cents(),
            100_000_025
        );
    }

    #[test]
    fn test_money_rejects_negative_and_non_finite() {
        assert!(Money::from_decimal(-0.01).is_err());
        assert!(Money::from_decimal(f64::NAN).is_err());
        assert!(Money::from_decimal(f64::INFINITY).is_err());
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(999).to_string(), "9.99");
        assert_eq!(Money::from_cents(1005).to_string(), "10.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_money_wire_format_is_decimal() {
        let money = Money::from_cents(1099);
        assert_eq!(serde_json::to_string(&money).unwrap(), "10.99");

        let parsed: Money = serde_json::from_str("9.9").unwrap();
        assert_eq!(parsed.cents(), 990);

        assert!(serde_json::from_str::<Money>("-1.0").is_err());
        assert!(serde_json::from_str::<Money>("9.999").is_err());
        assert!(serde_json::from_str::<Money>("1e300").is_err());
    }

    #[test]
    fn test_version_ordering() {
        let v0 = Version::initial();
        assert_eq!(v0.as_i64(), 0);
        assert_eq!(v0.next(), Version::new(1));
        assert!(v0 < v0.next());
    }
}
