use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::date_index::{date_for_offset, days_in_month, month_start_offset};
use crate::error::{HabitError, Result};
use crate::history::HistoryStore;
use crate::registry::HabitRegistry;

/// Habit × day-of-month view over one month of a [`crate::history::YearMatrix`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthSlice {
    pub year: i32,
    pub month: u32,
    pub start_offset: usize,
    pub rows: Vec<Vec<bool>>,
    pub today_index: Option<usize>,
}

impl MonthSlice {
    pub fn days(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_complete(&self, habit: usize, day_in_month: usize) -> bool {
        self.rows
            .get(habit)
            .and_then(|row| row.get(day_in_month))
            .copied()
            .unwrap_or(false)
    }
}

pub fn slice(
    store: &mut HistoryStore,
    registry: &HabitRegistry,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<MonthSlice> {
    let start_offset = month_start_offset(year, month)?;
    let days = days_in_month(year, month)? as usize;
    let matrix = store.ensure_year(year, registry.len());
    let rows = matrix
        .rows()
        .iter()
        .map(|row| row[start_offset..start_offset + days].to_vec())
        .collect();
    Ok(MonthSlice {
        year,
        month,
        start_offset,
        rows,
        today_index: today_index_in_month(year, month, today),
    })
}

/// Flips one cell and returns its new value. Dates after `today` cannot be
/// marked; for those the call does nothing and returns the current value.
pub fn toggle(
    store: &mut HistoryStore,
    slice: &mut MonthSlice,
    habit: usize,
    day_in_month: usize,
    today: NaiveDate,
) -> Result<bool> {
    let days = slice.days();
    let habits = slice.rows.len();
    let row = slice
        .rows
        .get_mut(habit)
        .ok_or(HabitError::out_of_range("habit", habit, habits))?;
    if day_in_month >= days {
        return Err(HabitError::out_of_range("day", day_in_month, days));
    }
    let day_of_year = slice.start_offset + day_in_month;
    let current = store.get(slice.year, habit, day_of_year)?;
    if date_for_offset(slice.year, day_of_year)? > today {
        debug!(year = slice.year, day_of_year, "ignoring toggle of a future date");
        return Ok(current);
    }
    let value = !current;
    store.set(slice.year, habit, day_of_year, value)?;
    row[day_in_month] = value;
    debug!(year = slice.year, habit, day_of_year, value, "toggled cell");
    Ok(value)
}

pub fn today_index_in_month(year: i32, month: u32, today: NaiveDate) -> Option<usize> {
    if today.year() == year && today.month() == month {
        Some(today.day0() as usize)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(habits: usize) -> (HistoryStore, HabitRegistry) {
        let mut registry = HabitRegistry::new();
        for idx in 0..habits {
            registry.add(&format!("Habit {idx}"), "").unwrap();
        }
        (HistoryStore::new(), registry)
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn slice_copies_the_month_range() {
        let (mut store, registry) = setup(2);
        store.ensure_year(2024, 2);
        store.set(2024, 1, 59, true).unwrap();
        let view = slice(&mut store, &registry, 2024, 2, date(2025, 1, 1)).unwrap();
        assert_eq!(view.start_offset, 31);
        assert_eq!(view.days(), 29);
        assert!(view.is_complete(1, 28));
        assert!(!view.is_complete(0, 28));
        assert_eq!(view.today_index, None);
    }

    #[test]
    fn today_index_only_in_current_month() {
        let today = date(2026, 10, 19);
        assert_eq!(today_index_in_month(2026, 10, today), Some(18));
        assert_eq!(today_index_in_month(2026, 9, today), None);
        assert_eq!(today_index_in_month(2025, 10, today), None);
    }

    #[test]
    fn toggle_writes_through_to_the_store() {
        let (mut store, registry) = setup(1);
        let today = date(2024, 3, 10);
        let mut view = slice(&mut store, &registry, 2024, 3, today).unwrap();
        assert!(toggle(&mut store, &mut view, 0, 4, today).unwrap());
        assert!(store.get(2024, 0, 60 + 4).unwrap());
        assert!(view.is_complete(0, 4));
        assert!(!toggle(&mut store, &mut view, 0, 4, today).unwrap());
        assert!(!store.get(2024, 0, 64).unwrap());
    }

    #[test]
    fn future_dates_are_not_toggleable() {
        let (mut store, registry) = setup(1);
        let today = date(2024, 1, 6);
        let mut view = slice(&mut store, &registry, 2024, 1, today).unwrap();
        assert_eq!(view.today_index, Some(5));
        assert!(!toggle(&mut store, &mut view, 0, 6, today).unwrap());
        assert!(!store.get(2024, 0, 6).unwrap());
        assert!(toggle(&mut store, &mut view, 0, 5, today).unwrap());
    }

    #[test]
    fn toggle_rejects_bad_indices() {
        let (mut store, registry) = setup(1);
        let today = date(2024, 12, 31);
        let mut view = slice(&mut store, &registry, 2024, 2, today).unwrap();
        assert!(toggle(&mut store, &mut view, 0, 29, today).is_err());
        assert!(toggle(&mut store, &mut view, 1, 0, today).is_err());
    }
}
