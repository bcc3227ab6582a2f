use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Utc};

/// Every job is charged for at least one hour.
pub const MINIMUM_BILLABLE_MINUTES: i64 = 60;
/// Time beyond the first hour is charged in blocks of this size.
pub const BILLING_BLOCK_MINUTES: i64 = 30;
/// Money is stored and charged in whole cents.
pub const PRICE_SCALE: i64 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Billing {
    pub billable_minutes: i32,
    pub total_price: BigDecimal,
}

/// Minutes charged for work between `start` and `end`.
///
/// Real elapsed time is rounded up to whole minutes. Anything up to an hour
/// (including a zero or negative interval) bills as one hour; past that, the
/// overflow is rounded up to the next 30 minute block.
pub fn billable_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let elapsed_ms = (end - start).num_milliseconds();
    if elapsed_ms <= 0 {
        return MINIMUM_BILLABLE_MINUTES;
    }

    let minutes = (elapsed_ms + 59_999) / 60_000;
    if minutes <= MINIMUM_BILLABLE_MINUTES {
        return MINIMUM_BILLABLE_MINUTES;
    }

    let over = minutes - MINIMUM_BILLABLE_MINUTES;
    let blocks = (over + BILLING_BLOCK_MINUTES - 1) / BILLING_BLOCK_MINUTES;
    MINIMUM_BILLABLE_MINUTES + blocks * BILLING_BLOCK_MINUTES
}

/// `visit_fee + hours * rate`, rounded half-up to the cent.
pub fn total_price(billable_minutes: i64, rate_per_hour: &BigDecimal, visit_fee: &BigDecimal) -> BigDecimal {
    let hours = BigDecimal::from(billable_minutes) / BigDecimal::from(60);
    let total = visit_fee + hours * rate_per_hour;
    total.with_scale_round(PRICE_SCALE, RoundingMode::HalfUp)
}

/// True when `amount` needs no more than two decimal places.
pub fn is_whole_cents(amount: &BigDecimal) -> bool {
    amount.with_scale(PRICE_SCALE) == *amount
}

pub fn compute_billing(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    rate_per_hour: &BigDecimal,
    visit_fee: &BigDecimal,
) -> Billing {
    let minutes = billable_minutes(start, end);

    Billing {
        // Bounded by the i64 millisecond range divided down to minutes.
        billable_minutes: i32::try_from(minutes).unwrap_or(i32::MAX),
        total_price: total_price(minutes, rate_per_hour, visit_fee),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::str::FromStr;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn minutes_for(elapsed: Duration) -> i64 {
        billable_minutes(t0(), t0() + elapsed)
    }

    #[test]
    fn non_positive_interval_bills_one_hour() {
        assert_eq!(minutes_for(Duration::zero()), 60);
        assert_eq!(minutes_for(Duration::minutes(-45)), 60);
        assert_eq!(minutes_for(Duration::milliseconds(-1)), 60);
    }

    #[test]
    fn first_hour_is_flat() {
        for m in [1, 17, 59, 60] {
            assert_eq!(minutes_for(Duration::minutes(m)), 60, "{m} minutes");
        }
        assert_eq!(minutes_for(Duration::seconds(5)), 60);
    }

    #[test]
    fn overflow_rounds_up_to_half_hour_blocks() {
        assert_eq!(minutes_for(Duration::minutes(61)), 90);
        assert_eq!(minutes_for(Duration::minutes(75)), 90);
        assert_eq!(minutes_for(Duration::minutes(90)), 90);
        assert_eq!(minutes_for(Duration::minutes(95)), 120);
        assert_eq!(minutes_for(Duration::minutes(120)), 120);
        assert_eq!(minutes_for(Duration::minutes(121)), 150);
    }

    #[test]
    fn partial_minutes_round_up_before_blocking() {
        // 60m 1s is 61 real minutes, which spills into the first block.
        assert_eq!(minutes_for(Duration::seconds(60 * 60 + 1)), 90);
        assert_eq!(minutes_for(Duration::seconds(119 * 60 + 30)), 120);
        assert_eq!(minutes_for(Duration::seconds(120 * 60 + 1)), 150);
    }

    #[test]
    fn price_is_fee_plus_hourly_rate() {
        let billing = compute_billing(t0(), t0() + Duration::minutes(95), &dec("50"), &dec("10"));

        assert_eq!(billing.billable_minutes, 120);
        assert_eq!(billing.total_price, dec("110.00"));
        assert_eq!(billing.total_price.to_string(), "110.00");
    }

    #[test]
    fn price_rounds_half_up_to_the_cent() {
        // 1.5h * 33.333 = 49.9995
        assert_eq!(total_price(90, &dec("33.333"), &dec("0")), dec("50.00"));
        // 1h * 10.005 = 10.005
        assert_eq!(total_price(60, &dec("10.005"), &dec("0")), dec("10.01"));
        // 1h * 10.004 = 10.004
        assert_eq!(total_price(60, &dec("10.004"), &dec("0")), dec("10.00"));
    }

    #[test]
    fn zero_rate_charges_only_the_visit_fee() {
        let billing = compute_billing(t0(), t0() + Duration::minutes(200), &dec("0"), &dec("25.5"));

        assert_eq!(billing.billable_minutes, 210);
        assert_eq!(billing.total_price, dec("25.50"));
    }

    #[test]
    fn sub_cent_amounts_are_detected() {
        assert!(is_whole_cents(&dec("40")));
        assert!(is_whole_cents(&dec("40.10")));
        assert!(is_whole_cents(&dec("33.330")));
        assert!(!is_whole_cents(&dec("33.333")));
        assert!(!is_whole_cents(&dec("0.005")));
    }
}
