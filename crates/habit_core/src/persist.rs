//! Serialized shape of the habit data file and the upgrade path from the
//! single-year layout. Reading and writing the file is left to the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub habit_names: Vec<String>,
    #[serde(default)]
    pub habit_times: Vec<String>,
    #[serde(default)]
    pub history: BTreeMap<String, Vec<Vec<u8>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

/// Either layout the data file has used. A bare matrix is the single-year
/// format written before multi-year support; it is tried first so an array
/// is never read as a struct in sequence form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StoredState {
    LegacyMatrix(Vec<Vec<u8>>),
    Current(PersistedState),
}

impl StoredState {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Normalises to the year-keyed layout. A legacy matrix becomes the
    /// history of `legacy_year`, with names taken from `default_names` and
    /// padded as "Habit N" when the matrix has more rows.
    pub fn into_current(self, legacy_year: i32, default_names: &[String]) -> PersistedState {
        match self {
            StoredState::Current(state) => state,
            StoredState::LegacyMatrix(matrix) => {
                let count = matrix.len().max(default_names.len());
                let habit_names = (0..count)
                    .map(|idx| {
                        default_names
                            .get(idx)
                            .cloned()
                            .unwrap_or_else(|| placeholder_name(idx))
                    })
                    .collect();
                PersistedState {
                    habit_names,
                    habit_times: Vec::new(),
                    history: BTreeMap::from([(legacy_year.to_string(), matrix)]),
                    theme: None,
                }
            }
        }
    }
}

impl PersistedState {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Year keys parsed to integers and cells read as bits (nonzero is
    /// complete). Keys that are not years are skipped.
    pub(crate) fn history_bits(&self) -> BTreeMap<i32, Vec<Vec<bool>>> {
        let mut years = BTreeMap::new();
        for (key, matrix) in &self.history {
            let Ok(year) = key.trim().parse::<i32>() else {
                warn!(key = %key, "skipping history entry with a non-year key");
                continue;
            };
            let rows = matrix
                .iter()
                .map(|row| row.iter().map(|cell| *cell != 0).collect())
                .collect();
            years.insert(year, rows);
        }
        years
    }
}

pub(crate) fn placeholder_name(idx: usize) -> String {
    format!("Habit {}", idx + 1)
}
