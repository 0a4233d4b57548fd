use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use habit_core::date_index::month_name;
use habit_core::{MonthSlice, Session, StatsSnapshot};
use tracing::{debug, info, warn};

use crate::storage;

const DEFAULT_HABITS: [&str; 5] = ["Workout", "Meditation", "Reading", "Coding", "Sleep 8h"];
const DEFAULT_LEGACY_YEAR: i32 = 2026;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data_file: PathBuf,
    pub year: i32,
    pub legacy_year: i32,
    pub default_habits: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("HABIT_DATA_FILE") {
            if !path.trim().is_empty() {
                config.data_file = PathBuf::from(path);
            }
        }
        if let Ok(year) = std::env::var("HABIT_YEAR") {
            if let Ok(value) = year.trim().parse::<i32>() {
                config.year = value;
            }
        }
        if let Ok(year) = std::env::var("HABIT_LEGACY_YEAR") {
            if let Ok(value) = year.trim().parse::<i32>() {
                config.legacy_year = value;
            }
        }
        if let Ok(list) = std::env::var("HABIT_DEFAULTS") {
            let names: Vec<String> = list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            if !names.is_empty() {
                config.default_habits = names;
            }
        }
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("habit_data.json"),
            year: Local::now().year(),
            legacy_year: DEFAULT_LEGACY_YEAR,
            default_habits: DEFAULT_HABITS.iter().map(|name| name.to_string()).collect(),
        }
    }
}

/// A user action forwarded into the session. Habit numbers and days are
/// 1-based as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Next,
    Prev,
    Month { year: i32, month: u32 },
    Toggle { habit: usize, day: usize },
    Add { name: String, label: String },
    Edit { habit: usize, name: String, label: String },
    Delete { habit: usize },
    Undo,
    Stats { habit: Option<usize> },
    Report,
    Save,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        let command = match verb.to_ascii_lowercase().as_str() {
            "" | "show" => Command::Show,
            "next" => Command::Next,
            "prev" => Command::Prev,
            "month" => {
                let mut parts = rest.split_whitespace();
                let year = parse_number(parts.next(), "year")?;
                let month = parse_number(parts.next(), "month")?;
                Command::Month { year, month }
            }
            "toggle" => {
                let mut parts = rest.split_whitespace();
                let habit = parse_position(parts.next(), "habit")?;
                let day = parse_position(parts.next(), "day")?;
                Command::Toggle { habit, day }
            }
            "add" => {
                let (name, label) = split_label(rest);
                Command::Add { name, label }
            }
            "edit" => {
                let (index, tail) = rest.split_once(' ').unwrap_or((rest, ""));
                let habit = parse_position(Some(index), "habit")?;
                let (name, label) = split_label(tail);
                Command::Edit { habit, name, label }
            }
            "delete" => Command::Delete {
                habit: parse_position(Some(rest), "habit")?,
            },
            "undo" => Command::Undo,
            "stats" => Command::Stats {
                habit: if rest.is_empty() {
                    None
                } else {
                    Some(parse_position(Some(rest), "habit")?)
                },
            },
            "report" => Command::Report,
            "save" => Command::Save,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => bail!("unknown command `{other}` (try `help`)"),
        };
        Ok(command)
    }
}

fn parse_number<T: FromStr>(token: Option<&str>, what: &str) -> Result<T> {
    token
        .ok_or_else(|| anyhow!("missing {what}"))?
        .parse::<T>()
        .map_err(|_| anyhow!("invalid {what}"))
}

/// Converts a displayed 1-based number into an index.
fn parse_position(token: Option<&str>, what: &str) -> Result<usize> {
    let value: usize = parse_number(token, what)?;
    value
        .checked_sub(1)
        .ok_or_else(|| anyhow!("{what} numbers start at 1"))
}

/// `name | label`, label optional.
fn split_label(input: &str) -> (String, String) {
    match input.split_once('|') {
        Some((name, label)) => (name.trim().to_string(), label.trim().to_string()),
        None => (input.trim().to_string(), String::new()),
    }
}

pub enum Reply {
    Text(String),
    Quit,
}

/// Headless stand-in for the dashboard window: owns the session and the
/// visible month, saves after every change.
pub struct Dashboard {
    config: AppConfig,
    session: Session,
    theme: Option<String>,
    year: i32,
    month: u32,
    filter: Option<usize>,
    slice: MonthSlice,
}

impl Dashboard {
    pub fn open(config: AppConfig, today: NaiveDate) -> Result<Self> {
        info!(path = %config.data_file.display(), "opening dashboard");
        let loaded = storage::load(
            &config.data_file,
            config.legacy_year,
            &config.default_habits,
        )?;
        let mut session = loaded.session;
        let year = config.year;
        let month = if year == today.year() { today.month() } else { 1 };
        let slice = session.month_slice_at(year, month, today)?;
        Ok(Self {
            config,
            session,
            theme: loaded.theme,
            year,
            month,
            filter: None,
            slice,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn handle_line(&mut self, line: &str, today: NaiveDate) -> Result<Reply> {
        let command: Command = line.parse()?;
        debug!(?command, "handling command");
        self.execute(command, today)
    }

    pub fn execute(&mut self, command: Command, today: NaiveDate) -> Result<Reply> {
        let mut dirty = false;
        let mut notice: Option<String> = None;
        match command {
            Command::Show => {}
            Command::Next => {
                let (year, month) = if self.month == 12 {
                    (self.year + 1, 1)
                } else {
                    (self.year, self.month + 1)
                };
                self.navigate(year, month, today)?;
            }
            Command::Prev => {
                let (year, month) = if self.month == 1 {
                    (self.year - 1, 12)
                } else {
                    (self.year, self.month - 1)
                };
                self.navigate(year, month, today)?;
            }
            Command::Month { year, month } => self.navigate(year, month, today)?,
            Command::Toggle { habit, day } => {
                let before = self.slice.is_complete(habit, day);
                let value = self.session.toggle_at(&mut self.slice, habit, day, today)?;
                if value == before {
                    notice = Some("Future days cannot be marked yet".to_string());
                } else {
                    dirty = true;
                }
            }
            Command::Add { name, label } => {
                self.session.add_habit(&name, &label)?;
                dirty = true;
            }
            Command::Edit { habit, name, label } => {
                self.session.edit_habit(habit, &name, &label)?;
                dirty = true;
            }
            Command::Delete { habit } => {
                let removed = self.session.delete_habit(habit)?;
                self.filter = match self.filter {
                    Some(current) if current == habit => None,
                    Some(current) if current > habit => Some(current - 1),
                    other => other,
                };
                notice = Some(format!("Deleted {} (`undo` to restore)", removed.name));
                dirty = true;
            }
            Command::Undo => match self.session.undo_delete() {
                Some(position) => {
                    if let Some(current) = self.filter.filter(|current| *current >= position) {
                        self.filter = Some(current + 1);
                    }
                    dirty = true;
                }
                None => notice = Some("Nothing to undo".to_string()),
            },
            Command::Stats { habit } => {
                self.session.stats_at(self.year, habit, today)?;
                self.filter = habit;
            }
            Command::Report => {
                let report = self.session.year_report_at(self.year, self.filter, today)?;
                return Ok(Reply::Text(serde_json::to_string_pretty(&report)?));
            }
            Command::Save => self.save()?,
            Command::Help => return Ok(Reply::Text(help_text())),
            Command::Quit => return Ok(Reply::Quit),
        }
        if dirty {
            self.save()?;
        }
        self.slice = self.session.month_slice_at(self.year, self.month, today)?;
        let mut text = self.render(today)?;
        if let Some(notice) = notice {
            let _ = writeln!(text, "{notice}");
        }
        Ok(Reply::Text(text))
    }

    fn navigate(&mut self, year: i32, month: u32, today: NaiveDate) -> Result<()> {
        self.slice = self.session.month_slice_at(year, month, today)?;
        self.year = year;
        self.month = month;
        Ok(())
    }

    fn save(&self) -> Result<()> {
        storage::save(&self.config.data_file, &self.session, self.theme.as_deref())
            .context("failed to save habit data")
    }

    pub fn render(&mut self, today: NaiveDate) -> Result<String> {
        let stats = self.session.stats_at(self.year, self.filter, today)?;
        let mut out = String::new();
        let _ = writeln!(out, "{} {}", month_name(self.month)?, self.year);
        let habits = self.session.habits();
        let name_width = habits
            .iter()
            .map(|habit| habit.name.chars().count() + 4)
            .max()
            .unwrap_or(0)
            .max(6);

        let mut header = format!("{:<name_width$}", "");
        for day in 0..self.slice.days() {
            let marker = if self.slice.today_index == Some(day) { '>' } else { ' ' };
            let _ = write!(header, "{marker}{:>2}", day + 1);
        }
        let _ = writeln!(out, "{}", header.trim_end());

        let limit = self.slice.today_index.map(|idx| idx + 1);
        let month_is_future = NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|first| first > today)
            .unwrap_or(false);
        for (idx, habit) in habits.iter().enumerate() {
            let mut line = format!("{:<name_width$}", format!("{}. {}", idx + 1, habit.name));
            for day in 0..self.slice.days() {
                let future = month_is_future || limit.is_some_and(|limit| day >= limit);
                let cell = if self.slice.is_complete(idx, day) {
                    '#'
                } else if future {
                    ' '
                } else {
                    '.'
                };
                let _ = write!(line, "  {cell}");
            }
            let _ = writeln!(out, "{}  ({})", line.trim_end(), habit.time_label);
        }
        if habits.is_empty() {
            let _ = writeln!(out, "No habits yet. Use `add <name>`.");
        }
        let scope = match self.filter {
            Some(idx) => habits
                .get(idx)
                .map(|habit| habit.name.clone())
                .unwrap_or_default(),
            None => "All habits".to_string(),
        };
        let _ = writeln!(out, "{scope}: {}", format_cards(&stats));
        if let Some(pending) = self.session.pending_undo() {
            let _ = writeln!(out, "Undo available: {}", pending.habit.name);
        }
        Ok(out)
    }
}

fn format_cards(stats: &StatsSnapshot) -> String {
    format!(
        "TODAY {}% | BEST STREAK {} Days | WEEKLY AVG {}% | MONTHLY AVG {}% | TOTAL {}",
        stats.today_pct,
        stats.best_streak_days,
        stats.weekly_avg_pct,
        stats.monthly_avg_pct,
        stats.total_completed_days
    )
}

fn help_text() -> String {
    [
        "show                      redraw the current month",
        "next | prev               move one month",
        "month <year> <month>      jump to a month",
        "toggle <habit> <day>      mark or clear a day",
        "add <name> [| <time>]     add a habit",
        "edit <n> <name> [| <time>] rename a habit",
        "delete <n>                delete a habit",
        "undo                      restore the last deleted habit",
        "stats [n]                 show stats for all habits or one",
        "report                    print the year report as JSON",
        "save                      write the data file",
        "quit                      exit",
    ]
    .join("\n")
}

pub fn run(config: AppConfig) -> Result<()> {
    let mut dashboard = Dashboard::open(config, Local::now().date_naive())?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    write!(stdout, "{}", dashboard.render(Local::now().date_naive())?)?;
    stdout.flush()?;
    for line in stdin.lock().lines() {
        let line = line.context("failed to read command")?;
        match dashboard.handle_line(&line, Local::now().date_naive()) {
            Ok(Reply::Text(text)) => writeln!(stdout, "{text}")?,
            Ok(Reply::Quit) => break,
            Err(err) => {
                warn!(%err, "command failed");
                writeln!(stdout, "error: {err}")?;
            }
        }
        stdout.flush()?;
    }
    info!("dashboard closed");
    Ok(())
}
