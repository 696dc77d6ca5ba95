// Display and input formats shared by every handler.

use crate::error::{Result, ValidationError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Amounts are shown with two decimals, no currency symbol.
pub fn format_currency(amount: f64) -> String {
    format!("{:.2}", amount)
}

pub fn format_date(instant: NaiveDateTime) -> String {
    instant.format("%Y-%m-%d").to_string()
}

pub fn format_month(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

/// Share in [0, 1] rendered as a percentage with one decimal.
pub fn format_percent(share: f64) -> String {
    format!("{:.1}%", share * 100.0)
}

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y"];

/// Accepts ISO, slash and day-first forms plus RFC 3339.
///
/// `02/01/2024` is read day-first; month-first only wins when day-first is
/// impossible (`01/31/2024`).
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let input = input.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, fmt) {
            return Ok(date);
        }
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Ok(instant.date_naive());
    }
    Err(ValidationError::InvalidDate(input.to_string()).into())
}

/// Accepts `YYYY-MM`, `YYYY/MM`, `MM/YYYY` (single-digit months allowed).
pub fn parse_month(input: &str) -> Result<(i32, u32)> {
    let trimmed = input.trim();
    let invalid = || ValidationError::InvalidPeriod(trimmed.to_string());

    let (first, second) = trimmed
        .split_once('-')
        .or_else(|| trimmed.split_once('/'))
        .ok_or_else(invalid)?;

    let (year, month) = if first.len() == 4 {
        (first, second)
    } else if second.len() == 4 && trimmed.contains('/') {
        (second, first)
    } else {
        return Err(invalid().into());
    };

    if month.is_empty() || month.len() > 2 {
        return Err(invalid().into());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid().into());
    }
    Ok((year, month))
}
