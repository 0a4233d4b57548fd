use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::date_index::days_in_year;
use crate::error::{HabitError, Result};

/// Completion grid for one calendar year: one row per habit, one bit per day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct YearMatrix {
    year: i32,
    rows: Vec<Vec<bool>>,
}

impl YearMatrix {
    pub fn new(year: i32, habit_count: usize) -> Self {
        let days = days_in_year(year) as usize;
        Self {
            year,
            rows: vec![vec![false; days]; habit_count],
        }
    }

    /// Wraps raw rows without normalising them; [`YearMatrix::repair`] does that.
    pub fn from_rows(year: i32, rows: Vec<Vec<bool>>) -> Self {
        Self { year, rows }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn days(&self) -> usize {
        days_in_year(self.year) as usize
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }

    pub fn row(&self, habit: usize) -> Option<&[bool]> {
        self.rows.get(habit).map(Vec::as_slice)
    }

    /// Number of habits complete on `day`.
    pub fn completed_on(&self, day: usize) -> usize {
        self.rows
            .iter()
            .filter(|row| row.get(day).copied().unwrap_or(false))
            .count()
    }

    /// Forces `habit_count` rows of exactly `days_in_year` bits. Missing rows
    /// and days are zero-filled; extra rows are dropped from the tail and
    /// long rows truncated. Returns whether anything changed.
    pub fn repair(&mut self, habit_count: usize) -> bool {
        let days = self.days();
        let mut changed = false;
        if self.rows.len() != habit_count {
            debug!(
                year = self.year,
                from = self.rows.len(),
                to = habit_count,
                "repairing habit rows"
            );
            self.rows.resize_with(habit_count, || vec![false; days]);
            changed = true;
        }
        for row in &mut self.rows {
            if row.len() != days {
                row.resize(days, false);
                changed = true;
            }
        }
        changed
    }

    fn check(&self, habit: usize, day: usize) -> Result<()> {
        if habit >= self.rows.len() {
            return Err(HabitError::out_of_range("habit", habit, self.rows.len()));
        }
        let len = self.rows[habit].len();
        if day >= len {
            return Err(HabitError::out_of_range("day", day, len));
        }
        Ok(())
    }
}

/// Year-keyed completion history. Years appear lazily on first access and
/// are repaired to the current habit count whenever they are touched, so
/// drifted persisted data is normalised rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStore {
    years: BTreeMap<i32, YearMatrix>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_years(years: BTreeMap<i32, Vec<Vec<bool>>>) -> Self {
        Self {
            years: years
                .into_iter()
                .map(|(year, rows)| (year, YearMatrix::from_rows(year, rows)))
                .collect(),
        }
    }

    pub fn ensure_year(&mut self, year: i32, habit_count: usize) -> &mut YearMatrix {
        let matrix = self.years.entry(year).or_insert_with(|| {
            debug!(year, habit_count, "creating year matrix");
            YearMatrix::new(year, habit_count)
        });
        matrix.repair(habit_count);
        matrix
    }

    pub fn repair_all(&mut self, habit_count: usize) {
        for matrix in self.years.values_mut() {
            matrix.repair(habit_count);
        }
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    pub fn year(&self, year: i32) -> Option<&YearMatrix> {
        self.years.get(&year)
    }

    pub fn get(&self, year: i32, habit: usize, day: usize) -> Result<bool> {
        let matrix = self.matrix(year, day)?;
        matrix.check(habit, day)?;
        Ok(matrix.rows[habit][day])
    }

    pub fn set(&mut self, year: i32, habit: usize, day: usize, value: bool) -> Result<()> {
        let matrix = self
            .years
            .get_mut(&year)
            .ok_or(HabitError::out_of_range("day", day, 0))?;
        matrix.check(habit, day)?;
        matrix.rows[habit][day] = value;
        Ok(())
    }

    /// Drops the habit's row from every year held, not just the active one.
    pub fn remove_habit_row(&mut self, habit: usize) {
        for matrix in self.years.values_mut() {
            if habit < matrix.rows.len() {
                matrix.rows.remove(habit);
            }
        }
    }

    /// Copies the habit's row out of every year held.
    pub fn capture_habit_rows(&self, habit: usize) -> BTreeMap<i32, Vec<bool>> {
        self.years
            .iter()
            .filter_map(|(year, matrix)| matrix.rows.get(habit).map(|row| (*year, row.clone())))
            .collect()
    }

    /// Inverse of [`HistoryStore::remove_habit_row`]. Years missing from
    /// `rows` receive a zero row; supplied rows are fitted to the year length.
    pub fn insert_habit_row(&mut self, habit: usize, mut rows: BTreeMap<i32, Vec<bool>>) {
        for (year, matrix) in self.years.iter_mut() {
            let days = matrix.days();
            let mut row = rows.remove(year).unwrap_or_default();
            row.resize(days, false);
            let position = habit.min(matrix.rows.len());
            matrix.rows.insert(position, row);
        }
        for year in rows.keys() {
            debug!(year, "dropping captured row for a year no longer held");
        }
    }

    fn matrix(&self, year: i32, day: usize) -> Result<&YearMatrix> {
        self.years
            .get(&year)
            .ok_or(HabitError::out_of_range("day", day, 0))
    }
}
