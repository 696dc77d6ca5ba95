// 🗓️ Billing Period Calculator - statement windows from a closing day
//
// A payment method "closes on day D of each month". Every expense paid with it
// belongs to exactly one statement window:
//
//   day <  D  -> [1st of this month, D of this month]
//   day >= D  -> [D+1 of this month, D of next month]
//
// D is clamped to the month length wherever it names an END day (closing day
// 31 in February ends on the 28th/29th). The START day D+1 in the second
// branch is NOT clamped: it overflows into the next month instead.
//
// Ends are inclusive and sit on the last nanosecond of their day, so callers
// compare with `<=`.
//
// All arithmetic here walks from the first of a month by whole days, which is
// why none of it can fail for a date that already exists.

use crate::error::{Result, ValidationError};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CLOSING DAY
// ============================================================================

/// Day of month (1-31) on which a statement closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ClosingDay(u32);

impl ClosingDay {
    pub fn new(day: i64) -> Result<Self> {
        if (1..=31).contains(&day) {
            Ok(ClosingDay(day as u32))
        } else {
            Err(ValidationError::InvalidClosingDay(day).into())
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Closing day clamped to the length of the month starting at `first`.
    fn clamped_for(self, first: NaiveDate) -> u32 {
        self.0.min(days_in_month(first.year(), first.month()))
    }
}

impl TryFrom<i64> for ClosingDay {
    type Error = crate::error::LedgerError;

    fn try_from(day: i64) -> Result<Self> {
        ClosingDay::new(day)
    }
}

impl From<ClosingDay> for i64 {
    fn from(day: ClosingDay) -> i64 {
        day.0 as i64
    }
}

impl fmt::Display for ClosingDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// BILLING PERIOD
// ============================================================================

/// Inclusive statement window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl BillingPeriod {
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// True when `other` lies completely inside this window.
    pub fn encloses(&self, other: &BillingPeriod) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

// ============================================================================
// CALENDAR HELPERS
// ============================================================================

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-12) of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

/// 00:00:00.000000000 on `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    NaiveDateTime::new(date, NaiveTime::MIN)
}

/// 23:59:59.999999999 on `date`.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::days(1) - Duration::nanoseconds(1)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

fn first_of_next_month(first: NaiveDate) -> NaiveDate {
    first + Duration::days(days_in_month(first.year(), first.month()) as i64)
}

fn first_of_previous_month(first: NaiveDate) -> NaiveDate {
    first_of_month(first - Duration::days(1))
}

/// Day `day` (1-based) counted from `first`; days past the month end roll over.
fn nth_day(first: NaiveDate, day: u32) -> NaiveDate {
    first + Duration::days(day as i64 - 1)
}

fn first_of(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ValidationError::InvalidPeriod(format!("{:04}-{:02}", year, month)).into())
}

// ============================================================================
// PERIOD CALCULATION
// ============================================================================

/// Statement window that an expense made at `date` falls into.
pub fn period_for_date(date: NaiveDateTime, closing_day: ClosingDay) -> BillingPeriod {
    let day = date.day();
    let first = first_of_month(date.date());

    if day < closing_day.get() {
        let end_day = closing_day.clamped_for(first);
        BillingPeriod {
            start: start_of_day(first),
            end: end_of_day(nth_day(first, end_day)),
        }
    } else {
        // Unclamped: closing day == month length starts on the 1st of next month
        let start = nth_day(first, closing_day.get() + 1);
        let next = first_of_next_month(first);
        let end_day = closing_day.clamped_for(next);
        BillingPeriod {
            start: start_of_day(start),
            end: end_of_day(nth_day(next, end_day)),
        }
    }
}

/// Canonical statement window that closes in (`year`, `month`).
///
/// Starts the day after the previous month's (clamped) closing day and ends on
/// this month's clamped closing day. When the previous month closed on its
/// last day the window starts on the 1st.
pub fn period_for_month(year: i32, month: u32, closing_day: ClosingDay) -> Result<BillingPeriod> {
    let first = first_of(year, month)?;
    let previous = first_of_previous_month(first);
    let previous_close = closing_day.clamped_for(previous);

    Ok(BillingPeriod {
        start: start_of_day(nth_day(previous, previous_close + 1)),
        end: end_of_day(nth_day(first, closing_day.clamped_for(first))),
    })
}

/// Plain calendar month: 1st 00:00 to last day 23:59:59.999999999.
pub fn month_bounds(year: i32, month: u32) -> Result<BillingPeriod> {
    let first = first_of(year, month)?;
    let last = first_of_next_month(first) - Duration::days(1);
    Ok(BillingPeriod {
        start: start_of_day(first),
        end: end_of_day(last),
    })
}

/// Calendar month containing `date`.
pub fn month_containing(date: NaiveDate) -> BillingPeriod {
    let first = first_of_month(date);
    let last = first_of_next_month(first) - Duration::days(1);
    BillingPeriod {
        start: start_of_day(first),
        end: end_of_day(last),
    }
}

/// Calendar month immediately before the one containing `date`.
pub fn previous_month_of(date: NaiveDate) -> BillingPeriod {
    month_containing(first_of_previous_month(first_of_month(date)))
}
