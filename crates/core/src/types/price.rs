//! Type-safe price representation using decimal arithmetic.
//!
//! The backend sends prices as JSON numbers in Brazilian reais. They are kept
//! as [`Decimal`] so cart totals never pick up binary floating point noise.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency symbol used for every rendered amount.
pub const CURRENCY_SYMBOL: &str = "R$";

/// A monetary amount.
///
/// Deserializes from either a JSON number (`19.9`) or a string (`"19.90"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero reais.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Format for display, e.g. `R$ 19.90`.
    #[must_use]
    pub fn display(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CURRENCY_SYMBOL} {:.2}", self.0.round_dp(2))
    }
}

impl std::str::FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().replace(',', ".");
        Decimal::from_str_exact(&trimmed).map(Self)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_number_and_string() {
        let from_number: Price = serde_json::from_str("19.9").unwrap();
        let from_string: Price = serde_json::from_str("\"19.90\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number, Price::from_cents(1990));
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Price::from_cents(1990).to_string(), "R$ 19.90");
        assert_eq!(Price::from_cents(5).to_string(), "R$ 0.05");
        assert_eq!(Price::ZERO.display(), "R$ 0.00");
    }

    #[test]
    fn test_times_and_sum_are_exact() {
        let total: Price = [Price::from_cents(10).times(3), Price::from_cents(20)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(50));
    }

    #[test]
    fn test_from_str_accepts_comma_decimal() {
        assert_eq!("12,50".parse::<Price>().unwrap(), Price::from_cents(1250));
        assert!("twelve".parse::<Price>().is_err());
    }
}
