//! Calendar arithmetic for the year grid. Offsets are 0-based (Jan 1 = 0).

use chrono::{Datelike, NaiveDate};

use crate::error::{HabitError, Result};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let first = first_of_month(year, month)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let next = first_of_month(next_year, next_month)?;
    Ok(next.signed_duration_since(first).num_days() as u32)
}

pub fn day_of_year(year: i32, month: u32, day: u32) -> Result<usize> {
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(HabitError::InvalidDate { year, month, day })?;
    Ok(date.ordinal0() as usize)
}

pub fn month_start_offset(year: i32, month: u32) -> Result<usize> {
    day_of_year(year, month, 1)
}

/// Inverse of [`day_of_year`].
pub fn date_for_offset(year: i32, offset: usize) -> Result<NaiveDate> {
    u32::try_from(offset)
        .ok()
        .and_then(|offset| NaiveDate::from_yo_opt(year, offset + 1))
        .ok_or(HabitError::out_of_range(
            "day",
            offset,
            days_in_year(year) as usize,
        ))
}

pub fn month_name(month: u32) -> Result<&'static str> {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_NAMES.get(idx as usize).copied())
        .ok_or(HabitError::InvalidDate {
            year: 0,
            month,
            day: 1,
        })
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(HabitError::InvalidDate {
        year,
        month,
        day: 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leap_rules_follow_gregorian_calendar() {
        assert_eq!(days_in_year(2024), 366);
        assert_eq!(days_in_year(2023), 365);
        assert_eq!(days_in_year(1900), 365);
        assert_eq!(days_in_year(2000), 366);
    }

    #[test]
    fn month_lengths_and_offsets() {
        assert_eq!(days_in_month(2024, 2).unwrap(), 29);
        assert_eq!(days_in_month(2023, 2).unwrap(), 28);
        assert_eq!(days_in_month(2023, 12).unwrap(), 31);
        assert_eq!(month_start_offset(2023, 3).unwrap(), 59);
        assert_eq!(month_start_offset(2024, 3).unwrap(), 60);
        assert_eq!(day_of_year(2024, 12, 31).unwrap(), 365);
        assert_eq!(day_of_year(2023, 1, 1).unwrap(), 0);
    }

    #[test]
    fn rejects_invalid_dates() {
        assert_eq!(
            day_of_year(2023, 2, 29),
            Err(HabitError::InvalidDate {
                year: 2023,
                month: 2,
                day: 29
            })
        );
        assert!(days_in_month(2023, 13).is_err());
        assert!(month_start_offset(2023, 0).is_err());
        assert!(month_name(0).is_err());
    }

    #[test]
    fn offsets_map_back_to_dates() {
        assert_eq!(
            date_for_offset(2024, 59).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(date_for_offset(2023, 365).is_err());
        assert_eq!(month_name(10).unwrap(), "October");
    }
}
