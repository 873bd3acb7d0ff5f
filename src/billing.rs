//! Billing calculations over subscription records.
//!
//! Every function here is pure: no I/O, no clock access, no mutation of its
//! inputs. Callers pass an immutable snapshot of the collection plus an
//! explicit `today` where a reference date is needed, which keeps the
//! calculator trivially testable.
//!
//! # Normalization
//!
//! Costs of differing frequencies are compared on a monthly basis:
//! monthly prices pass through, yearly prices divide by 12, and weekly
//! prices multiply by [`WEEKS_PER_MONTH`] — an average-weeks-per-month
//! approximation, deliberately not exact.

use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;

use crate::model::{Frequency, Status, Subscription};

/// Average weeks per month (4.33) used to normalize weekly prices.
///
/// A deliberate approximation: 52 weeks / 12 months ≈ 4.33.
pub const WEEKS_PER_MONTH: Decimal = Decimal::from_parts(433, 0, 0, false, 2);

/// Default look-ahead window for upcoming renewals, in days.
pub const DEFAULT_RENEWAL_WINDOW_DAYS: i64 = 7;

/// A subscription paired with its distance to renewal.
#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingRenewal<'a> {
    /// The renewing subscription.
    pub subscription: &'a Subscription,
    /// Whole days until `next_renewal`; 0 means it renews today.
    pub days_until: i64,
}

/// Projects the next renewal date from a start date and billing frequency.
///
/// Weekly advances by exactly 7 days. Monthly advances by one calendar
/// month and yearly by one calendar year, both with end-of-month clamping:
/// when the start day does not exist in the target month the date lands on
/// the last day of that month (Jan 31 → Feb 28, or Feb 29 in a leap year;
/// Feb 29 → Feb 28 the following year). This is the consistent overflow
/// rule used throughout the crate.
#[must_use]
pub fn project_next_renewal(start_date: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Weekly => start_date + Days::new(7),
        Frequency::Monthly => start_date + Months::new(1),
        Frequency::Yearly => start_date + Months::new(12),
    }
}

/// Normalizes a price at the given frequency to its monthly equivalent.
///
/// The caller applies any status filtering; this function only converts.
#[must_use]
pub fn monthly_equivalent(price: Decimal, frequency: Frequency) -> Decimal {
    match frequency {
        Frequency::Monthly => price,
        Frequency::Yearly => price / Decimal::from(12),
        Frequency::Weekly => price * WEEKS_PER_MONTH,
    }
}

/// Total monthly-equivalent cost of all active subscriptions.
///
/// Non-active records are excluded entirely.
#[must_use]
pub fn total_monthly_cost(subscriptions: &[Subscription]) -> Decimal {
    subscriptions
        .iter()
        .filter(|sub| sub.status == Status::Active)
        .map(|sub| monthly_equivalent(sub.price, sub.frequency))
        .sum()
}

/// Total yearly cost, projected as exactly 12× the monthly total.
///
/// Yearly-billed subscriptions are counted at 12× their monthly
/// equivalent, not at their literal annual price. This keeps the two
/// aggregates consistent with each other by construction.
#[must_use]
pub fn total_yearly_cost(subscriptions: &[Subscription]) -> Decimal {
    total_monthly_cost(subscriptions) * Decimal::from(12)
}

/// Whole days from `today` until `renewal_date`.
///
/// Negative when the renewal date has already passed — renewal dates are
/// frozen at create/edit time and do not auto-advance.
#[must_use]
pub fn days_until_renewal(renewal_date: NaiveDate, today: NaiveDate) -> i64 {
    (renewal_date - today).num_days()
}

/// Active subscriptions renewing within `window_days` of `today`.
///
/// Includes records with `0 ≤ days_until ≤ window_days` (a renewal dated
/// today counts; one dated yesterday does not), sorted ascending by
/// `days_until`. The sort is stable, so ties keep their original
/// collection order.
#[must_use]
pub fn upcoming_renewals(
    subscriptions: &[Subscription],
    today: NaiveDate,
    window_days: i64,
) -> Vec<UpcomingRenewal<'_>> {
    let mut upcoming: Vec<UpcomingRenewal<'_>> = subscriptions
        .iter()
        .filter(|sub| sub.status == Status::Active)
        .map(|sub| UpcomingRenewal {
            subscription: sub,
            days_until: days_until_renewal(sub.next_renewal, today),
        })
        .filter(|entry| entry.days_until >= 0 && entry.days_until <= window_days)
        .collect();
    upcoming.sort_by_key(|entry| entry.days_until);
    upcoming
}

/// Display phrasing for a renewal distance.
///
/// `0` → "Renews today", `1` → "Renews tomorrow", otherwise
/// "Renews in N days".
#[must_use]
pub fn renewal_phrase(days_until: i64) -> String {
    match days_until {
        0 => "Renews today".to_owned(),
        1 => "Renews tomorrow".to_owned(),
        n => format!("Renews in {n} days"),
    }
}
