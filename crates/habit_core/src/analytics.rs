use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::date_index::{days_in_month, month_start_offset};
use crate::error::{HabitError, Result};
use crate::history::{HistoryStore, YearMatrix};
use crate::registry::HabitRegistry;

pub const WEEKLY_WINDOW: usize = 7;
pub const MONTHLY_WINDOW: usize = 30;

/// Figures shown on the dashboard cards. Computed on demand because they
/// depend on the current date and the habit count.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub today_pct: u32,
    pub best_streak_days: u32,
    pub weekly_avg_pct: u32,
    pub monthly_avg_pct: u32,
    pub total_completed_days: u32,
}

/// Statistics over one year of history, either across all habits or for a
/// single habit when `filter` is set. Percentages are floored.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsEngine<'a> {
    matrix: &'a YearMatrix,
    habit_count: usize,
    filter: Option<usize>,
    today_index: Option<usize>,
}

/// Offset of `today` within `year`, or `None` when today lies in another year.
pub fn today_index(year: i32, today: NaiveDate) -> Option<usize> {
    (today.year() == year).then(|| today.ordinal0() as usize)
}

impl<'a> AnalyticsEngine<'a> {
    pub fn new(
        store: &'a mut HistoryStore,
        registry: &HabitRegistry,
        year: i32,
        filter: Option<usize>,
        today: NaiveDate,
    ) -> Result<Self> {
        let habit_count = registry.len();
        if let Some(habit) = filter {
            if habit >= habit_count {
                return Err(HabitError::out_of_range("habit", habit, habit_count));
            }
        }
        let matrix: &'a YearMatrix = store.ensure_year(year, habit_count);
        Ok(Self {
            matrix,
            habit_count,
            filter,
            today_index: today_index(year, today),
        })
    }

    pub fn year(&self) -> i32 {
        self.matrix.year()
    }

    pub fn matrix(&self) -> &'a YearMatrix {
        self.matrix
    }

    pub fn filter(&self) -> Option<usize> {
        self.filter
    }

    pub fn today_index(&self) -> Option<usize> {
        self.today_index
    }

    pub fn today_pct(&self) -> u32 {
        match self.today_index {
            Some(day) if self.habit_count > 0 => percent(self.done_on(day), self.width()),
            _ => 0,
        }
    }

    pub fn best_streak(&self) -> u32 {
        if self.habit_count == 0 {
            return 0;
        }
        let width = self.width();
        let mut best = 0u32;
        let mut current = 0u32;
        for day in 0..self.matrix.days() {
            if self.done_on(day) == width {
                current += 1;
                best = best.max(current);
            } else {
                current = 0;
            }
        }
        best
    }

    /// Mean completion over the trailing `window` days ending today, clipped
    /// at the start of the year.
    pub fn rolling_average(&self, window: usize) -> u32 {
        let Some(today) = self.today_index else {
            return 0;
        };
        if self.habit_count == 0 || window == 0 {
            return 0;
        }
        let start = today.saturating_sub(window - 1);
        let done: usize = (start..=today).map(|day| self.done_on(day)).sum();
        percent(done, self.width() * (today - start + 1))
    }

    pub fn weekly_avg(&self) -> u32 {
        self.rolling_average(WEEKLY_WINDOW)
    }

    pub fn monthly_avg(&self) -> u32 {
        self.rolling_average(MONTHLY_WINDOW)
    }

    /// Sum of completion bits. Counts habit-completions, so two habits done
    /// on the same day add two.
    pub fn total_completed(&self) -> u32 {
        (0..self.matrix.days())
            .map(|day| self.done_on(day))
            .sum::<usize>() as u32
    }

    pub fn daily_series(&self) -> Vec<u32> {
        (0..self.matrix.days())
            .map(|day| {
                if self.habit_count == 0 {
                    0
                } else {
                    percent(self.done_on(day), self.width())
                }
            })
            .collect()
    }

    /// Twelve monthly completion rates, each floored once from the exact
    /// month total.
    pub fn monthly_series(&self) -> Vec<u32> {
        let year = self.matrix.year();
        (1..=12)
            .map(|month| {
                if self.habit_count == 0 {
                    return 0;
                }
                let (Ok(start), Ok(days)) =
                    (month_start_offset(year, month), days_in_month(year, month))
                else {
                    return 0;
                };
                let days = days as usize;
                let done: usize = (start..start + days).map(|day| self.done_on(day)).sum();
                percent(done, self.width() * days)
            })
            .collect()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            today_pct: self.today_pct(),
            best_streak_days: self.best_streak(),
            weekly_avg_pct: self.weekly_avg(),
            monthly_avg_pct: self.monthly_avg(),
            total_completed_days: self.total_completed(),
        }
    }

    fn width(&self) -> usize {
        match self.filter {
            Some(_) => 1,
            None => self.habit_count,
        }
    }

    fn done_on(&self, day: usize) -> usize {
        match self.filter {
            Some(habit) => self
                .matrix
                .row(habit)
                .and_then(|row| row.get(day))
                .map(|bit| usize::from(*bit))
                .unwrap_or(0),
            None => self.matrix.completed_on(day),
        }
    }
}

fn percent(done: usize, possible: usize) -> u32 {
    if possible == 0 {
        return 0;
    }
    (done * 100 / possible) as u32
}
