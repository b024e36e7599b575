//! Pure month/date arithmetic for calendar rendering.
//!
//! No store access and no clock: every function here is fully determined by
//! its arguments.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::{BookingError, Result};

/// Number of days in a month, accounting for leap years.
pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let first = first_day(year, month)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| BookingError::Validation(format!("invalid month {year}-{month:02}")))?;
    Ok((next - first).num_days() as u32)
}

/// First and last calendar dates of a month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let first = first_day(year, month)?;
    let last = first + chrono::Duration::days(i64::from(days_in_month(year, month)?) - 1);
    Ok((first, last))
}

/// Weekday-aligned day grid for a month: one `[u32; 7]` row per calendar week,
/// columns starting at `first_weekday`, with `0` marking cells outside the
/// month.
///
/// Deterministic from its arguments; the number of rows varies from 4
/// (February starting on the first column, non-leap) to 6.
pub fn month_grid(year: i32, month: u32, first_weekday: Weekday) -> Result<Vec<[u32; 7]>> {
    let first = first_day(year, month)?;
    let days = days_in_month(year, month)?;

    // Column of day 1, relative to the requested week start.
    let lead = (7 + first.weekday().num_days_from_monday()
        - first_weekday.num_days_from_monday())
        % 7;

    let mut grid = Vec::new();
    let mut row = [0u32; 7];
    let mut col = lead as usize;
    for day in 1..=days {
        row[col] = day;
        col += 1;
        if col == 7 {
            grid.push(row);
            row = [0u32; 7];
            col = 0;
        }
    }
    if col > 0 {
        grid.push(row);
    }
    Ok(grid)
}

fn first_day(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| BookingError::Validation(format!("invalid month {year}-{month:02}")))
}
