//! Plain data handed to the CSV, PDF and chart exporters.

use chrono::NaiveDate;
use serde::Serialize;

use crate::analytics::{AnalyticsEngine, StatsSnapshot};
use crate::date_index::{date_for_offset, month_name};
use crate::error::Result;
use crate::registry::{Habit, HabitRegistry};

/// One line of the per-day export: every habit's bit plus the day's rate.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExportRow {
    pub date: NaiveDate,
    pub completions: Vec<bool>,
    pub daily_pct: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthlyRate {
    pub month: u32,
    pub name: &'static str,
    pub pct: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct YearReport {
    pub year: i32,
    pub generated_on: NaiveDate,
    pub habits: Vec<Habit>,
    pub filter: Option<usize>,
    pub stats: StatsSnapshot,
    pub daily: Vec<u32>,
    pub monthly: Vec<u32>,
    pub monthly_rates: Vec<MonthlyRate>,
    pub rows: Vec<ExportRow>,
}

/// Rows always carry every habit and the all-habit daily rate, whatever
/// filter the engine was built with.
pub fn export_rows(engine: &AnalyticsEngine<'_>) -> Result<Vec<ExportRow>> {
    let matrix = engine.matrix();
    let habit_count = matrix.rows().len();
    (0..matrix.days())
        .map(|day| {
            let daily_pct = if habit_count == 0 {
                0
            } else {
                (matrix.completed_on(day) * 100 / habit_count) as u32
            };
            Ok(ExportRow {
                date: date_for_offset(matrix.year(), day)?,
                completions: matrix
                    .rows()
                    .iter()
                    .map(|row| row.get(day).copied().unwrap_or(false))
                    .collect(),
                daily_pct,
            })
        })
        .collect()
}

pub fn monthly_rates(engine: &AnalyticsEngine<'_>) -> Result<Vec<MonthlyRate>> {
    engine
        .monthly_series()
        .into_iter()
        .zip(1u32..)
        .map(|(pct, month)| {
            Ok(MonthlyRate {
                month,
                name: month_name(month)?,
                pct,
            })
        })
        .collect()
}

pub fn year_report(
    engine: &AnalyticsEngine<'_>,
    registry: &HabitRegistry,
    generated_on: NaiveDate,
) -> Result<YearReport> {
    Ok(YearReport {
        year: engine.year(),
        generated_on,
        habits: registry.iter().cloned().collect(),
        filter: engine.filter(),
        stats: engine.snapshot(),
        daily: engine.daily_series(),
        monthly: engine.monthly_series(),
        monthly_rates: monthly_rates(engine)?,
        rows: export_rows(engine)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryStore;

    #[test]
    fn export_rows_follow_calendar_dates() {
        let mut registry = HabitRegistry::new();
        registry.add("Workout", "").unwrap();
        registry.add("Reading", "").unwrap();
        let mut store = HistoryStore::new();
        store.ensure_year(2024, 2);
        store.set(2024, 1, 59, true).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let engine = AnalyticsEngine::new(&mut store, &registry, 2024, None, today).unwrap();

        let rows = export_rows(&engine).unwrap();
        assert_eq!(rows.len(), 366);
        let leap_day = &rows[59];
        assert_eq!(leap_day.date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(leap_day.completions, vec![false, true]);
        assert_eq!(leap_day.daily_pct, 50);

        let rates = monthly_rates(&engine).unwrap();
        assert_eq!(rates.len(), 12);
        assert_eq!(rates[1].name, "February");
        assert_eq!(rates[1].pct, 1);
    }

    #[test]
    fn export_rows_ignore_the_habit_filter() {
        let mut registry = HabitRegistry::new();
        registry.add("A", "").unwrap();
        registry.add("B", "").unwrap();
        let mut store = HistoryStore::new();
        store.ensure_year(2024, 2);
        store.set(2024, 1, 0, true).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let engine = AnalyticsEngine::new(&mut store, &registry, 2024, Some(0), today).unwrap();
        let report = year_report(&engine, &registry, today).unwrap();
        assert_eq!(report.daily[0], 0);
        assert_eq!(report.rows[0].completions, vec![false, true]);
        assert_eq!(report.rows[0].daily_pct, 50);
    }

    #[test]
    fn year_report_bundles_stats_and_series() {
        let mut registry = HabitRegistry::new();
        registry.add("Workout", "Morning").unwrap();
        let mut store = HistoryStore::new();
        store.ensure_year(2023, 1);
        store.set(2023, 0, 0, true).unwrap();
        let today = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let engine = AnalyticsEngine::new(&mut store, &registry, 2023, Some(0), today).unwrap();

        let report = year_report(&engine, &registry, today).unwrap();
        assert_eq!(report.year, 2023);
        assert_eq!(report.filter, Some(0));
        assert_eq!(report.stats.today_pct, 100);
        assert_eq!(report.habits[0].time_label, "Morning");
        assert_eq!(report.daily.len(), 365);
        assert_eq!(report.monthly_rates[0].pct, 3);
    }
}
