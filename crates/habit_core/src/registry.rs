use serde::{Deserialize, Serialize};

use crate::error::{HabitError, Result};

pub const DEFAULT_TIME_LABEL: &str = "Any Time";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Habit {
    pub name: String,
    pub time_label: String,
}

impl Habit {
    pub fn new(name: &str, time_label: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HabitError::EmptyName);
        }
        Ok(Self {
            name: name.to_string(),
            time_label: normalize_label(time_label),
        })
    }

    /// Stand-in for a habit whose stored name is blank.
    pub(crate) fn placeholder(name: String, time_label: &str) -> Self {
        Self {
            name,
            time_label: normalize_label(time_label),
        }
    }
}

fn normalize_label(time_label: &str) -> String {
    let label = match time_label.trim() {
        "" => DEFAULT_TIME_LABEL,
        label => label,
    };
    label.to_string()
}

/// A habit taken out of the registry together with the position it held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedHabit {
    pub index: usize,
    pub habit: Habit,
}

/// Ordered habit definitions. Position is identity: insertion order is
/// display order, and removal shifts every later habit down by one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitRegistry {
    habits: Vec<Habit>,
}

impl HabitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, time_label: &str) -> Result<usize> {
        let habit = Habit::new(name, time_label)?;
        Ok(self.push(habit))
    }

    pub(crate) fn push(&mut self, habit: Habit) -> usize {
        self.habits.push(habit);
        self.habits.len() - 1
    }

    pub fn rename(&mut self, index: usize, name: &str, time_label: &str) -> Result<()> {
        let len = self.habits.len();
        let slot = self
            .habits
            .get_mut(index)
            .ok_or(HabitError::out_of_range("habit", index, len))?;
        *slot = Habit::new(name, time_label)?;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<RemovedHabit> {
        if index >= self.habits.len() {
            return Err(HabitError::out_of_range("habit", index, self.habits.len()));
        }
        let habit = self.habits.remove(index);
        Ok(RemovedHabit { index, habit })
    }

    /// Re-inserts a removed habit at `min(removed.index, len)` and returns
    /// the position actually used. After intervening structural edits the
    /// position is best-effort.
    pub fn restore(&mut self, removed: RemovedHabit) -> usize {
        let position = removed.index.min(self.habits.len());
        self.habits.insert(position, removed.habit);
        position
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Habit> {
        self.habits
            .get(index)
            .ok_or(HabitError::out_of_range("habit", index, self.habits.len()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Habit> {
        self.habits.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.habits.iter().map(|habit| habit.name.clone()).collect()
    }

    pub fn time_labels(&self) -> Vec<String> {
        self.habits
            .iter()
            .map(|habit| habit.time_label.clone())
            .collect()
    }
}
