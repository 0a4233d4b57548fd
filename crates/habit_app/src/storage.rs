use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use habit_core::{Session, StoredState};
use tracing::info;

/// Session read from disk plus the UI keys the core does not interpret.
#[derive(Debug, Clone)]
pub struct LoadedState {
    pub session: Session,
    pub theme: Option<String>,
}

/// Loads the data file, accepting both the year-keyed layout and a legacy
/// bare matrix (assigned to `legacy_year`). A missing file yields a fresh
/// session seeded with `default_habits`.
pub fn load(path: &Path, legacy_year: i32, default_habits: &[String]) -> Result<LoadedState> {
    if !path.exists() {
        info!(path = %path.display(), "no data file, starting with default habits");
        return Ok(LoadedState {
            session: Session::with_habits(default_habits)?,
            theme: None,
        });
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("unable to read {}", path.display()))?;
    let stored = StoredState::parse(&raw)
        .with_context(|| format!("unable to parse {}", path.display()))?;
    if matches!(stored, StoredState::LegacyMatrix(_)) {
        info!(legacy_year, "upgrading single-year data file");
    }
    let state = stored.into_current(legacy_year, default_habits);
    Ok(LoadedState {
        session: Session::from_persisted(&state),
        theme: state.theme,
    })
}

pub fn save(path: &Path, session: &Session, theme: Option<&str>) -> Result<()> {
    let mut state = session.to_persisted();
    state.theme = theme.map(str::to_string);
    let json = state.to_json_pretty()?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("unable to create {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("unable to write {}", path.display()))?;
    info!(path = %path.display(), habits = session.habit_count(), "data saved");
    Ok(())
}
