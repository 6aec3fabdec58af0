//! Rental pricing
//!
//! The billing unit is the rounded hour: any fractional hour is charged as a
//! full hour. Incomplete or inverted intervals price at zero so a rental can
//! be previewed while it is still being edited.
//!
//! Stored amounts are `DECIMAL(12, 2)`: at most two decimal places and
//! [`max_amount`] in magnitude.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

const SECONDS_PER_HOUR: i64 = 3600;

/// Decimal places kept for money
pub const MONEY_SCALE: u32 = 2;

/// Largest amount a rate or rental cost column can hold
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, MONEY_SCALE)
}

/// Number of hours billed for an interval, partial hours rounded up
///
/// Returns 0 when either bound is missing or `start > end`.
pub fn billable_hours(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> i64 {
    let (Some(start), Some(end)) = (start, end) else {
        return 0;
    };
    if start > end {
        return 0;
    }

    let seconds = (end - start).num_seconds();
    let whole_hours = seconds / SECONDS_PER_HOUR;
    if seconds % SECONDS_PER_HOUR != 0 {
        whole_hours + 1
    } else {
        whole_hours
    }
}

/// Total charge for renting at `hourly_rate` over `[start, end)`
///
/// Saturates at `Decimal::MAX` instead of overflowing.
pub fn calculate_cost(
    hourly_rate: Decimal,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> Decimal {
    Decimal::from(billable_hours(start, end)).saturating_mul(hourly_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-01-01 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn rate(units: i64) -> Decimal {
        Decimal::from(units)
    }

    #[test]
    fn test_partial_hours_round_up() {
        let start = Some(t0());
        assert_eq!(calculate_cost(rate(10), start, Some(t0() + Duration::minutes(61))), rate(20));
        assert_eq!(calculate_cost(rate(10), start, Some(t0() + Duration::minutes(60))), rate(10));
        assert_eq!(calculate_cost(rate(10), start, Some(t0() + Duration::minutes(1))), rate(10));
        assert_eq!(calculate_cost(rate(10), start, Some(t0() + Duration::minutes(210))), rate(40));
    }

    #[test]
    fn test_sub_minute_remainder_is_still_a_partial_hour() {
        assert_eq!(billable_hours(Some(t0()), Some(t0() + Duration::seconds(3601))), 2);
        assert_eq!(billable_hours(Some(t0()), Some(t0() + Duration::seconds(30))), 1);
    }

    #[test]
    fn test_incomplete_or_inverted_intervals_cost_nothing() {
        let later = Some(t0() + Duration::hours(3));
        assert_eq!(calculate_cost(rate(10), None, later), Decimal::ZERO);
        assert_eq!(calculate_cost(rate(10), Some(t0()), None), Decimal::ZERO);
        assert_eq!(calculate_cost(rate(10), None, None), Decimal::ZERO);
        assert_eq!(calculate_cost(rate(10), later, Some(t0())), Decimal::ZERO);
        assert_eq!(calculate_cost(rate(10), Some(t0()), Some(t0())), Decimal::ZERO);
    }

    #[test]
    fn test_cost_is_monotonic_in_end() {
        let hourly = Decimal::new(1250, 2); // 12.50
        let mut previous = Decimal::ZERO;
        for minutes in (0..=600).step_by(7) {
            let cost = calculate_cost(hourly, Some(t0()), Some(t0() + Duration::minutes(minutes)));
            assert!(cost >= previous, "cost dropped at {} minutes", minutes);
            previous = cost;
        }
    }

    #[test]
    fn test_huge_rates_saturate() {
        let end = Some(t0() + Duration::hours(2));
        assert_eq!(calculate_cost(Decimal::MAX, Some(t0()), end), Decimal::MAX);
        assert_eq!(calculate_cost(Decimal::MAX, Some(t0()), Some(t0())), Decimal::ZERO);

        let years = Some(t0() + Duration::days(365 * 100));
        assert!(calculate_cost(max_amount(), Some(t0()), years) > max_amount());
    }

    #[test]
    fn test_repeated_calls_agree() {
        let end = Some(t0() + Duration::minutes(95));
        let first = calculate_cost(Decimal::new(999, 2), Some(t0()), end);
        let second = calculate_cost(Decimal::new(999, 2), Some(t0()), end);
        assert_eq!(first, second);
        assert_eq!(first, Decimal::new(1998, 2));
    }
}
