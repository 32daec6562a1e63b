//! Duration and price calculations.
//!
//! Bookings are billed per day: the span between the start and end dates is
//! rounded up to whole days with a floor of one day, so same-day and
//! overnight bookings both cost one day.

use chrono::NaiveDate;

use crate::types::{Money, Space};

/// Billable days between two dates
///
/// ```
/// use chrono::NaiveDate;
/// use spacebook::pricing::duration_days;
///
/// let d = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
/// assert_eq!(duration_days(d, d), 1);
/// assert_eq!(duration_days(d, d.succ_opt().unwrap()), 1);
/// ```
#[must_use]
pub fn duration_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let days = (end - start).num_days().max(1);
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// Price for a number of days, `None` on overflow
#[must_use]
pub const fn total(price_per_day: Money, days: u32) -> Option<Money> {
    price_per_day.checked_multiply(days)
}

/// `"1 day"` or `"N days"`
#[must_use]
pub fn duration_label(days: u32) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}

/// Live booking summary shown beside the form
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quote {
    /// Billable days
    pub days: u32,
    /// Price of one day in the selected space
    pub price_per_day: Money,
    /// `price_per_day × days`
    pub total: Money,
}

impl Quote {
    /// Quote a date range in a space, `None` if the total overflows
    #[must_use]
    pub fn new(space: &Space, start: NaiveDate, end: NaiveDate) -> Option<Self> {
        let days = duration_days(start, end);
        Some(Self {
            days,
            price_per_day: space.price_per_day,
            total: total(space.price_per_day, days)?,
        })
    }

    /// Duration in words
    #[must_use]
    pub fn duration_label(&self) -> String {
        duration_label(self.days)
    }
}
