use std::fs;

use chrono::NaiveDate;
use habit_app::app::{AppConfig, Dashboard, Reply};
use habit_app::storage;
use habit_core::StoredState;
use tempfile::tempdir;

fn config(data_file: std::path::PathBuf, year: i32) -> AppConfig {
    AppConfig {
        data_file,
        year,
        legacy_year: 2026,
        default_habits: vec!["Workout".to_string(), "Reading".to_string()],
    }
}

fn text(reply: Reply) -> String {
    match reply {
        Reply::Text(text) => text,
        Reply::Quit => panic!("unexpected quit"),
    }
}

#[test]
fn commands_are_persisted_after_each_change() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("data").join("habits.json");
    let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    let mut dashboard = Dashboard::open(config(path.clone(), 2026), today).expect("open");

    let grid = text(dashboard.handle_line("toggle 1 19", today).expect("toggle"));
    assert!(grid.contains("October 2026"));
    assert!(grid.contains("TODAY 50%"));

    let future = text(dashboard.handle_line("toggle 2 20", today).expect("toggle"));
    assert!(future.contains("Future days cannot be marked yet"));

    dashboard
        .handle_line("add Stretch | Morning", today)
        .expect("add");

    let saved = fs::read_to_string(&path).expect("data file written");
    let StoredState::Current(state) = StoredState::parse(&saved).expect("parse") else {
        panic!("expected year-keyed layout");
    };
    assert_eq!(state.habit_names, vec!["Workout", "Reading", "Stretch"]);
    assert_eq!(state.habit_times[2], "Morning");
    assert_eq!(state.history["2026"].len(), 3);
    assert_eq!(state.history["2026"][0][291], 1);
    assert_eq!(state.history["2026"][1][292], 0);
}

#[test]
fn delete_and_undo_survive_a_reload() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("habits.json");
    let today = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
    let mut dashboard = Dashboard::open(config(path.clone(), 2026), today).expect("open");
    dashboard.handle_line("toggle 2 1", today).expect("toggle");
    dashboard.handle_line("delete 2", today).expect("delete");
    let after_delete = storage::load(&path, 2026, &[]).expect("reload");
    assert_eq!(after_delete.session.habit_count(), 1);

    let grid = text(dashboard.handle_line("undo", today).expect("undo"));
    assert!(grid.contains("2. Reading"));
    let mut reloaded = storage::load(&path, 2026, &[]).expect("reload");
    assert_eq!(reloaded.session.habits().names(), vec!["Workout", "Reading"]);
    let stats = reloaded
        .session
        .stats_at(2026, Some(1), today)
        .expect("stats");
    assert_eq!(stats.total_completed_days, 1);
}

#[test]
fn legacy_matrix_file_is_upgraded_and_theme_kept() {
    let temp = tempdir().expect("tempdir");
    let legacy = temp.path().join("legacy.json");
    fs::write(&legacy, "[[1, 1, 0], [0, 1, 0]]").expect("write legacy");
    let defaults = vec!["Workout".to_string(), "Reading".to_string()];
    let loaded = storage::load(&legacy, 2026, &defaults).expect("load legacy");
    assert_eq!(loaded.session.habits().names(), defaults);
    assert!(loaded.session.history().year(2026).is_some());

    storage::save(&legacy, &loaded.session, Some("dark")).expect("save");
    let themed = storage::load(&legacy, 2026, &defaults).expect("reload");
    assert_eq!(themed.theme.as_deref(), Some("dark"));
    let raw = fs::read_to_string(&legacy).expect("read");
    assert!(raw.contains("\"2026\""));
    assert!(raw.contains("\"theme\": \"dark\""));
}

#[test]
fn missing_file_starts_with_default_habits() {
    let temp = tempdir().expect("tempdir");
    let loaded = storage::load(
        &temp.path().join("absent.json"),
        2026,
        &["Workout".to_string()],
    )
    .expect("load");
    assert_eq!(loaded.session.habits().names(), vec!["Workout"]);
    assert!(loaded.theme.is_none());
}

#[test]
fn unreadable_json_is_reported() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("broken.json");
    fs::write(&path, "{not json").expect("write");
    let err = storage::load(&path, 2026, &[]).expect_err("must fail");
    assert!(err.to_string().contains("unable to parse"));
}

#[test]
fn habit_filter_follows_deletes_and_undo() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("habits.json");
    let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    let mut dashboard = Dashboard::open(config(path, 2026), today).expect("open");
    dashboard.handle_line("add Coding", today).expect("add");
    dashboard.handle_line("toggle 3 19", today).expect("toggle");

    let filtered = text(dashboard.handle_line("stats 3", today).expect("stats"));
    assert!(filtered.contains("Coding: TODAY 100%"));

    let after_delete = text(dashboard.handle_line("delete 1", today).expect("delete"));
    assert!(after_delete.contains("Coding: TODAY 100%"));
    let shown = text(dashboard.handle_line("show", today).expect("show"));
    assert!(shown.contains("2. Coding"));
    dashboard.handle_line("toggle 1 18", today).expect("toggle");

    let restored = text(dashboard.handle_line("undo", today).expect("undo"));
    assert!(restored.contains("1. Workout"));
    assert!(restored.contains("3. Coding"));
    assert!(restored.contains("Coding: TODAY 100%"));

    let cleared = text(dashboard.handle_line("delete 3", today).expect("delete"));
    assert!(cleared.contains("All habits: "));
}

#[test]
fn month_navigation_crosses_year_boundaries() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("habits.json");
    let today = NaiveDate::from_ymd_opt(2026, 12, 10).unwrap();
    let mut dashboard = Dashboard::open(config(path, 2026), today).expect("open");
    assert!(dashboard.session().history().year(2027).is_none());

    let next = text(dashboard.handle_line("next", today).expect("next"));
    assert!(next.starts_with("January 2027"));
    let created = dashboard.session().history().year(2027).expect("2027 created");
    assert_eq!(created.rows().len(), 2);
    assert_eq!(created.days(), 365);

    let back = text(dashboard.handle_line("prev", today).expect("prev"));
    assert!(back.starts_with("December 2026"));

    dashboard.handle_line("month 2026 1", today).expect("month");
    let earlier = text(dashboard.handle_line("prev", today).expect("prev"));
    assert!(earlier.starts_with("December 2025"));
    assert!(dashboard.session().history().year(2025).is_some());
}
