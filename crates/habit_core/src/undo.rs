use std::collections::BTreeMap;

use tracing::info;

use crate::error::Result;
use crate::history::HistoryStore;
use crate::registry::{HabitRegistry, RemovedHabit};

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingDeletion {
    removed: RemovedHabit,
    rows: BTreeMap<i32, Vec<bool>>,
}

/// Single-level undo for habit deletion. A second deletion replaces the
/// pending one, which is then lost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoableDeletion {
    pending: Option<PendingDeletion>,
}

impl UndoableDeletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&RemovedHabit> {
        self.pending.as_ref().map(|pending| &pending.removed)
    }

    pub fn capture_and_delete(
        &mut self,
        registry: &mut HabitRegistry,
        store: &mut HistoryStore,
        habit: usize,
    ) -> Result<RemovedHabit> {
        registry.get(habit)?;
        let rows = store.capture_habit_rows(habit);
        let removed = registry.remove(habit)?;
        store.remove_habit_row(habit);
        if let Some(previous) = self.pending.take() {
            info!(name = %previous.removed.habit.name, "discarding earlier pending deletion");
        }
        self.pending = Some(PendingDeletion {
            removed: removed.clone(),
            rows,
        });
        Ok(removed)
    }

    /// Puts the pending habit back and returns where it landed, or `None`
    /// when there is nothing to restore.
    pub fn restore(
        &mut self,
        registry: &mut HabitRegistry,
        store: &mut HistoryStore,
    ) -> Option<usize> {
        let PendingDeletion { removed, rows } = self.pending.take()?;
        let position = registry.restore(removed);
        store.insert_habit_row(position, rows);
        Some(position)
    }
}
