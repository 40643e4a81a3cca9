//! Event log - what the app did, kept in DuckDB
//!
//! `logs.duckdb` in the data directory holds one row per event. Each row
//! carries the event name and its family (auth, session, recipes, command),
//! never emails, tokens or recipe content.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use chrono::Utc;
use duckdb::Connection;
use serde::{Deserialize, Serialize};

use crate::log_migrations::LOG_MIGRATIONS;

const LOG_FILE: &str = "logs.duckdb";

/// Where an event was raised from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    /// One-shot `rb` command
    Cli,
    /// Interactive `rb shell` session
    Shell,
}

impl EntryPoint {
    fn as_str(self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
            EntryPoint::Shell => "shell",
        }
    }
}

/// Group of related events, derived from the event name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFamily {
    /// `signup_*`, `login_*` and `logout`
    Auth,
    /// `session_*`: restore, expiry and persistence of the stored session
    Session,
    /// `recipes_*`: remote document reads and writes
    Recipes,
    /// `command_executed`
    Command,
    Other,
}

impl EventFamily {
    pub const ALL: [EventFamily; 5] = [
        EventFamily::Auth,
        EventFamily::Session,
        EventFamily::Recipes,
        EventFamily::Command,
        EventFamily::Other,
    ];

    pub fn of(event: &str) -> Self {
        match event {
            "logout" => EventFamily::Auth,
            "command_executed" => EventFamily::Command,
            e if e.starts_with("login_") || e.starts_with("signup_") => EventFamily::Auth,
            e if e.starts_with("session_") => EventFamily::Session,
            e if e.starts_with("recipes_") => EventFamily::Recipes,
            _ => EventFamily::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventFamily::Auth => "auth",
            EventFamily::Session => "session",
            EventFamily::Recipes => "recipes",
            EventFamily::Command => "command",
            EventFamily::Other => "other",
        }
    }
}

impl fmt::Display for EventFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventFamily {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        EventFamily::ALL
            .into_iter()
            .find(|family| family.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<_> = EventFamily::ALL.iter().map(|f| f.as_str()).collect();
                format!("unknown event family '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// An event about to be recorded
#[derive(Debug, Clone, Default)]
pub struct LogEvent {
    pub event: String,
    pub command: Option<String>,
    pub view: Option<String>,
    pub error_message: Option<String>,
    /// Machine-readable error code, e.g. the identity provider's
    pub error_code: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            ..Self::default()
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// The view the front end was sent to
    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn family(&self) -> EventFamily {
        EventFamily::of(&self.event)
    }
}

/// A recorded event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub logged_at_ms: i64,
    pub entry_point: String,
    pub app_version: String,
    pub os: String,
    pub family: EventFamily,
    pub event: String,
    pub command: Option<String>,
    pub view: Option<String>,
    pub error_message: Option<String>,
    pub error_code: Option<String>,
}

/// Which entries to read, newest first
#[derive(Debug, Clone, Copy)]
pub struct LogQuery {
    pub family: Option<EventFamily>,
    pub errors_only: bool,
    pub limit: usize,
}

impl LogQuery {
    pub fn recent(limit: usize) -> Self {
        Self {
            family: None,
            errors_only: false,
            limit,
        }
    }

    pub fn errors(limit: usize) -> Self {
        Self {
            errors_only: true,
            ..Self::recent(limit)
        }
    }

    pub fn in_family(mut self, family: EventFamily) -> Self {
        self.family = Some(family);
        self
    }

    fn where_clause(&self) -> String {
        let mut conditions = Vec::new();
        if let Some(family) = self.family {
            // Family names are a closed set of literals
            conditions.push(format!("family = '{}'", family.as_str()));
        }
        if self.errors_only {
            conditions.push("error_message IS NOT NULL".to_string());
        }
        if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        }
    }
}

/// Per-family totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyStats {
    pub family: EventFamily,
    pub events: u64,
    pub errors: u64,
    pub last_logged_at_ms: i64,
}

/// DuckDB-backed event log
pub struct LoggingService {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    entry_point: EntryPoint,
    app_version: String,
}

impl LoggingService {
    /// Open (or create) the event log in `data_dir` and bring its schema up to date
    pub fn new(data_dir: &Path, entry_point: EntryPoint, app_version: impl Into<String>) -> Result<Self> {
        let db_path = data_dir.join(LOG_FILE);
        let mut conn = Connection::open(&db_path)?;
        migrate(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            entry_point,
            app_version: app_version.into(),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Event log lock poisoned: {}", e))
    }

    pub fn log(&self, event: LogEvent) -> Result<()> {
        let family = event.family();
        self.connection()?.execute(
            "INSERT INTO sys_logs (logged_at_ms, entry_point, app_version, os, family, \
             event, command, view, error_message, error_code) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            duckdb::params![
                Utc::now().timestamp_millis(),
                self.entry_point.as_str(),
                &self.app_version,
                std::env::consts::OS,
                family.as_str(),
                &event.event,
                &event.command,
                &event.view,
                &event.error_message,
                &event.error_code,
            ],
        )?;
        Ok(())
    }

    pub fn query(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        let conn = self.connection()?;
        let sql = format!(
            "SELECT id, logged_at_ms, entry_point, app_version, os, family, event, \
             command, view, error_message, error_code \
             FROM sys_logs {} ORDER BY logged_at_ms DESC, id DESC LIMIT ?",
            query.where_clause()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([query.limit as i64], |row| {
            let family: String = row.get(5)?;
            Ok(LogEntry {
                id: row.get(0)?,
                logged_at_ms: row.get(1)?,
                entry_point: row.get(2)?,
                app_version: row.get(3)?,
                os: row.get(4)?,
                family: family.parse().unwrap_or(EventFamily::Other),
                event: row.get(6)?,
                command: row.get(7)?,
                view: row.get(8)?,
                error_message: row.get(9)?,
                error_code: row.get(10)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Totals per family, for families that have at least one entry
    pub fn family_stats(&self) -> Result<Vec<FamilyStats>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT family, COUNT(*), COUNT(error_message), MAX(logged_at_ms) \
             FROM sys_logs GROUP BY family",
        )?;
        let rows = stmt.query_map([], |row| {
            let family: String = row.get(0)?;
            let events: i64 = row.get(1)?;
            let errors: i64 = row.get(2)?;
            Ok(FamilyStats {
                family: family.parse().unwrap_or(EventFamily::Other),
                events: events.max(0) as u64,
                errors: errors.max(0) as u64,
                last_logged_at_ms: row.get(3)?,
            })
        })?;

        let mut stats = Vec::new();
        for row in rows {
            stats.push(row?);
        }
        stats.sort_by_key(|s| EventFamily::ALL.iter().position(|f| *f == s.family));
        Ok(stats)
    }

    /// Delete entries logged before `cutoff_ms`; returns how many went
    pub fn prune(&self, cutoff_ms: i64) -> Result<u64> {
        let deleted = self
            .connection()?
            .execute("DELETE FROM sys_logs WHERE logged_at_ms < ?", [cutoff_ms])?;
        Ok(deleted as u64)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

fn migrate(conn: &mut Connection) -> Result<()> {
    let (_, bootstrap) = LOG_MIGRATIONS
        .first()
        .ok_or_else(|| anyhow!("No log migrations embedded"))?;
    conn.execute_batch(bootstrap)?;

    for (name, sql) in LOG_MIGRATIONS {
        let applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sys_migrations WHERE migration_name = ?",
            [name],
            |row| row.get(0),
        )?;
        if applied {
            continue;
        }

        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.execute("INSERT INTO sys_migrations (migration_name) VALUES (?)", [name])?;
        tx.commit()?;
    }
    Ok(())
}

/// Log through an optional service, ignoring failures
///
/// Logging must never break the operation being logged.
pub fn record(logger: Option<&LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}
