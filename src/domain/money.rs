//! Lossless money amounts backed by rust_decimal.
//!
//! Amounts are stored in SQLite as canonical strings (no exponent, no trailing
//! zeros) and serialized to JSON as numbers.

use rust_decimal::prelude::RoundingStrategy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

/// Number of decimal places charges are rounded to.
pub const CURRENCY_SCALE: u32 = 2;

/// A monetary amount.
///
/// Arithmetic is exact; rounding only happens through [`Money::round_currency`],
/// which callers apply when a charge is derived by division (e.g. hourly rate / 60).
/// The operators saturate at the representable range instead of panicking; use
/// the `checked_*` methods where an out-of-range amount must be refused.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Money(value)
    }

    /// Whole currency units.
    pub fn from_units(units: i64) -> Self {
        Money(Decimal::from(units))
    }

    /// Parse an amount from its stored/textual form.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn parse(s: &str) -> Result<Self, rust_decimal::Error> {
        Decimal::from_str(s.trim()).map(Money)
    }

    /// Canonical text form used for persistence.
    pub fn to_canonical_string(&self) -> String {
        self.0.normalize().to_string()
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Clamp negative amounts to zero.
    pub fn non_negative(self) -> Self {
        if self.is_negative() {
            Money::ZERO
        } else {
            self
        }
    }

    /// Round half away from zero to [`CURRENCY_SCALE`] places.
    pub fn round_currency(self) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiply by an integer quantity (item counts). `None` on overflow.
    pub fn checked_times(self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Money)
    }

    /// Multiply by an integer quantity, clamping at the representable range.
    pub fn saturating_times(self, quantity: i64) -> Self {
        Money(self.0.saturating_mul(Decimal::from(quantity)))
    }

    pub fn checked_add(self, rhs: Money) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Divide by an integer count. A zero divisor yields zero.
    pub fn per(self, count: i64) -> Self {
        if count == 0 {
            return Money::ZERO;
        }
        Money(self.0 / Decimal::from(count))
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
        Money::parse(s)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + *m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(s: &str) -> Money {
        Money::parse(s).unwrap()
    }

    #[test]
    fn test_canonical_string_drops_trailing_zeros() {
        assert_eq!(m("9500.00").to_canonical_string(), "9500");
        assert_eq!(m("12.50").to_canonical_string(), "12.5");
        assert_eq!(m("0").to_canonical_string(), "0");
    }

    #[test]
    fn test_round_currency_half_away_from_zero() {
        assert_eq!(m("83.335").round_currency(), m("83.34"));
        assert_eq!(m("83.334").round_currency(), m("83.33"));
        assert_eq!(m("-1.005").round_currency(), m("-1.01"));
    }

    #[test]
    fn test_hourly_rate_to_per_minute() {
        let per_minute = m("6000").per(60);
        assert_eq!(per_minute, m("100"));
        assert_eq!(m("5000").per(60).saturating_times(60).round_currency(), m("5000"));
    }

    #[test]
    fn test_per_zero_is_zero() {
        assert_eq!(m("10").per(0), Money::ZERO);
    }

    #[test]
    fn test_non_negative_clamps() {
        assert_eq!(m("-5").non_negative(), Money::ZERO);
        assert_eq!(m("5").non_negative(), m("5"));
    }

    #[test]
    fn test_checked_times_refuses_overflow() {
        assert_eq!(m("2500").checked_times(3), Some(m("7500")));
        let huge = m("10000000000000000000000000");
        assert_eq!(huge.checked_times(9_000_000_000_000_000_000), None);
        assert_eq!(Money::new(Decimal::MAX).checked_add(m("1")), None);
    }

    #[test]
    fn test_operators_saturate() {
        let max = Money::new(Decimal::MAX);
        assert_eq!(max + m("1"), max);
        assert_eq!(-max - m("1"), Money::new(Decimal::MIN));
        assert_eq!(max.saturating_times(2), max);
    }

    #[test]
    fn test_sum() {
        let total: Money = [m("1000"), m("500"), m("0.5")].iter().sum();
        assert_eq!(total, m("1500.5"));
    }

    #[test]
    fn test_json_is_number() {
        let json = serde_json::to_value(m("1500.5")).unwrap();
        assert!(json.is_number());
        assert_eq!(json.to_string(), "1500.5");
    }
}
