//! Session timer and tariff calculation.

use crate::domain::{Money, TimeMs};
use serde::Serialize;

const MS_PER_MINUTE: i64 = 60_000;

/// Elapsed billable time and its charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeCharge {
    pub elapsed_minutes: i64,
    pub time_charge: Money,
}

impl TimeCharge {
    pub fn zero() -> Self {
        TimeCharge {
            elapsed_minutes: 0,
            time_charge: Money::ZERO,
        }
    }
}

/// Compute the time charge for a session running from `start` to `end`.
///
/// Partial minutes are not billed. A non-positive duration (clock skew) bills
/// nothing, and a negative rate is treated as zero, so the result is never negative.
pub fn compute_charge(start: TimeMs, end: TimeMs, rate_per_minute: Money) -> TimeCharge {
    let elapsed_ms = end.millis_since(start);
    if elapsed_ms <= 0 {
        return TimeCharge::zero();
    }

    let elapsed_minutes = elapsed_ms / MS_PER_MINUTE;
    let time_charge = rate_per_minute
        .non_negative()
        .saturating_times(elapsed_minutes)
        .round_currency();

    TimeCharge {
        elapsed_minutes,
        time_charge,
    }
}

/// Per-minute rate resolution for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tariff {
    pub rate_per_minute: Money,
}

impl Tariff {
    /// Derive the per-minute rate from a table's hourly rate, falling back to
    /// the house default when the table has none.
    pub fn resolve(hourly_rate: Option<Money>, default_rate_per_minute: Money) -> Self {
        let rate_per_minute = match hourly_rate {
            Some(hourly) => hourly.per(60),
            None => default_rate_per_minute,
        };
        Tariff { rate_per_minute }
    }

    pub fn charge(&self, start: TimeMs, end: TimeMs) -> TimeCharge {
        compute_charge(start, end, self.rate_per_minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    fn charge(elapsed_ms: i64, rate: i64) -> TimeCharge {
        compute_charge(
            TimeMs::new(T0),
            TimeMs::new(T0 + elapsed_ms),
            Money::from_units(rate),
        )
    }

    #[test]
    fn test_ninety_five_minutes_at_one_hundred() {
        let c = charge(95 * 60_000, 100);
        assert_eq!(c.elapsed_minutes, 95);
        assert_eq!(c.time_charge, Money::from_units(9_500));
    }

    #[test]
    fn test_partial_minute_not_billed() {
        assert_eq!(charge(59_999, 100).elapsed_minutes, 0);
        assert_eq!(charge(59_999, 100).time_charge, Money::ZERO);
        assert_eq!(charge(60_000, 100).elapsed_minutes, 1);
        assert_eq!(charge(119_999, 100).time_charge, Money::from_units(100));
    }

    #[test]
    fn test_zero_and_negative_durations_clamp_to_zero() {
        assert_eq!(charge(0, 100), TimeCharge::zero());
        assert_eq!(charge(-5 * 60_000, 100), TimeCharge::zero());
    }

    #[test]
    fn test_negative_rate_never_charges() {
        assert_eq!(charge(10 * 60_000, -100).time_charge, Money::ZERO);
    }

    #[test]
    fn test_huge_rate_saturates_instead_of_overflowing() {
        let rate = Money::new(rust_decimal::Decimal::MAX);
        let c = compute_charge(TimeMs::new(T0), TimeMs::new(T0 + 10 * 60_000), rate);
        assert_eq!(c.elapsed_minutes, 10);
        assert_eq!(c.time_charge, rate);
    }

    #[test]
    fn test_formula_and_monotonic_over_durations() {
        let rate = 37;
        let mut previous = Money::ZERO;
        for elapsed_ms in (0..=240 * 60_000).step_by(17_777) {
            let c = charge(elapsed_ms, rate);
            assert_eq!(
                c.time_charge,
                Money::from_units((elapsed_ms / 60_000) * rate),
                "elapsed_ms={elapsed_ms}"
            );
            assert!(c.time_charge >= previous);
            previous = c.time_charge;
        }
    }

    #[test]
    fn test_tariff_resolution() {
        let from_table = Tariff::resolve(Some(Money::from_units(6_000)), Money::from_units(1));
        assert_eq!(from_table.rate_per_minute, Money::from_units(100));

        let fallback = Tariff::resolve(None, Money::from_units(80));
        assert_eq!(fallback.rate_per_minute, Money::from_units(80));
    }

    #[test]
    fn test_fractional_rate_rounds_to_currency() {
        let tariff = Tariff::resolve(Some(Money::from_units(5_000)), Money::ZERO);
        let c = tariff.charge(TimeMs::new(T0), TimeMs::new(T0).plus_minutes(95));
        assert_eq!(c.elapsed_minutes, 95);
        assert_eq!(c.time_charge, Money::parse("7916.67").unwrap());
    }
}
