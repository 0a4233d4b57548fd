use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, instrument};

use crate::analytics::{AnalyticsEngine, StatsSnapshot};
use crate::error::Result;
use crate::history::HistoryStore;
use crate::month_window::{self, MonthSlice};
use crate::persist::{placeholder_name, PersistedState};
use crate::registry::{Habit, HabitRegistry, RemovedHabit, DEFAULT_TIME_LABEL};
use crate::report::{self, ExportRow, YearReport};
use crate::undo::UndoableDeletion;

/// The whole habit model for one user session. Every operation leaves the
/// registry and every held year consistent before returning.
#[derive(Debug, Clone, Default)]
pub struct Session {
    registry: HabitRegistry,
    history: HistoryStore,
    undo: UndoableDeletion,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_habits<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut session = Self::new();
        for name in names {
            session.registry.add(name.as_ref(), DEFAULT_TIME_LABEL)?;
        }
        Ok(session)
    }

    /// Builds a session from persisted data without validating it. Short
    /// label lists fall back to "Any Time", blank names get a placeholder,
    /// and matrix drift is repaired when each year is next touched.
    pub fn from_persisted(state: &PersistedState) -> Self {
        let mut registry = HabitRegistry::new();
        for (idx, name) in state.habit_names.iter().enumerate() {
            let label = state
                .habit_times
                .get(idx)
                .map(String::as_str)
                .unwrap_or(DEFAULT_TIME_LABEL);
            let habit = Habit::new(name, label).unwrap_or_else(|_| {
                let fallback = placeholder_name(idx);
                debug!(idx, fallback = %fallback, "blank persisted habit name");
                Habit::placeholder(fallback, label)
            });
            registry.push(habit);
        }
        let history = HistoryStore::from_years(state.history_bits());
        info!(
            habits = registry.len(),
            years = history.years().count(),
            "session loaded"
        );
        Self {
            registry,
            history,
            undo: UndoableDeletion::new(),
        }
    }

    pub fn to_persisted(&self) -> PersistedState {
        let mut repaired = self.history.clone();
        repaired.repair_all(self.registry.len());
        let history = repaired
            .years()
            .filter_map(|year| repaired.year(year))
            .map(|matrix| {
                let rows = matrix
                    .rows()
                    .iter()
                    .map(|row| row.iter().map(|bit| u8::from(*bit)).collect())
                    .collect();
                (matrix.year().to_string(), rows)
            })
            .collect::<BTreeMap<_, _>>();
        PersistedState {
            habit_names: self.registry.names(),
            habit_times: self.registry.time_labels(),
            history,
            theme: None,
        }
    }

    pub fn habits(&self) -> &HabitRegistry {
        &self.registry
    }

    /// The store as held. Years not accessed since loading keep whatever
    /// drift the persisted data had until a slice, toggle or stats call
    /// repairs them; [`Session::to_persisted`] always writes repaired rows.
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn habit_count(&self) -> usize {
        self.registry.len()
    }

    pub fn pending_undo(&self) -> Option<&RemovedHabit> {
        self.undo.pending()
    }

    #[instrument(skip(self))]
    pub fn add_habit(&mut self, name: &str, time_label: &str) -> Result<usize> {
        let index = self.registry.add(name, time_label)?;
        self.history.repair_all(self.registry.len());
        info!(index, "habit added");
        Ok(index)
    }

    #[instrument(skip(self))]
    pub fn edit_habit(&mut self, index: usize, name: &str, time_label: &str) -> Result<()> {
        self.registry.rename(index, name, time_label)?;
        info!(index, "habit edited");
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete_habit(&mut self, index: usize) -> Result<Habit> {
        let removed = self
            .undo
            .capture_and_delete(&mut self.registry, &mut self.history, index)?;
        self.history.repair_all(self.registry.len());
        info!(index, name = %removed.habit.name, "habit deleted");
        Ok(removed.habit)
    }

    #[instrument(skip(self))]
    pub fn undo_delete(&mut self) -> Option<usize> {
        let position = self.undo.restore(&mut self.registry, &mut self.history)?;
        self.history.repair_all(self.registry.len());
        info!(position, "habit restored");
        Some(position)
    }

    pub fn month_slice(&mut self, year: i32, month: u32) -> Result<MonthSlice> {
        self.month_slice_at(year, month, today())
    }

    pub fn month_slice_at(
        &mut self,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<MonthSlice> {
        month_window::slice(&mut self.history, &self.registry, year, month, today)
    }

    pub fn toggle(
        &mut self,
        slice: &mut MonthSlice,
        habit: usize,
        day_in_month: usize,
    ) -> Result<bool> {
        self.toggle_at(slice, habit, day_in_month, today())
    }

    pub fn toggle_at(
        &mut self,
        slice: &mut MonthSlice,
        habit: usize,
        day_in_month: usize,
        today: NaiveDate,
    ) -> Result<bool> {
        self.history.ensure_year(slice.year, self.registry.len());
        month_window::toggle(&mut self.history, slice, habit, day_in_month, today)
    }

    pub fn analytics_at(
        &mut self,
        year: i32,
        filter: Option<usize>,
        today: NaiveDate,
    ) -> Result<AnalyticsEngine<'_>> {
        AnalyticsEngine::new(&mut self.history, &self.registry, year, filter, today)
    }

    pub fn stats(&mut self, year: i32, filter: Option<usize>) -> Result<StatsSnapshot> {
        self.stats_at(year, filter, today())
    }

    pub fn stats_at(
        &mut self,
        year: i32,
        filter: Option<usize>,
        today: NaiveDate,
    ) -> Result<StatsSnapshot> {
        Ok(self.analytics_at(year, filter, today)?.snapshot())
    }

    pub fn export_rows_at(&mut self, year: i32, today: NaiveDate) -> Result<Vec<ExportRow>> {
        let engine = self.analytics_at(year, None, today)?;
        report::export_rows(&engine)
    }

    pub fn year_report_at(
        &mut self,
        year: i32,
        filter: Option<usize>,
        today: NaiveDate,
    ) -> Result<YearReport> {
        let engine = AnalyticsEngine::new(&mut self.history, &self.registry, year, filter, today)?;
        report::year_report(&engine, &self.registry, today)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
