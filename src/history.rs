use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs::AppDirs;
use crate::controller::CompletionSink;
use crate::pattern::BreathingPattern;
use crate::session::SessionResult;

/// One finished or abandoned session as stored in the history database
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub started_at: DateTime<Local>,
    pub pattern: String,
    pub planned_secs: f64,
    pub actual_secs: f64,
    pub completed: bool,
    pub cycles: u64,
}

/// Practice totals across the whole history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryTotals {
    pub sessions: u64,
    pub completed: u64,
    pub practiced_secs: f64,
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("csv export error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Database manager for the session history
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the history database in its default location, creating the
    /// schema if needed
    pub fn new() -> Result<Self, HistoryError> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("breth_history.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HistoryError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                started_at TEXT NOT NULL,
                pattern TEXT NOT NULL,
                planned_secs REAL NOT NULL,
                actual_secs REAL NOT NULL,
                completed BOOLEAN NOT NULL,
                cycles INTEGER NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_started_at ON sessions(started_at)",
            [],
        )?;

        Ok(HistoryDb { conn })
    }

    pub fn record_session(&self, record: &SessionRecord) -> Result<(), HistoryError> {
        self.conn.execute(
            r#"
            INSERT INTO sessions (started_at, pattern, planned_secs, actual_secs, completed, cycles)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.started_at.to_rfc3339(),
                record.pattern,
                record.planned_secs,
                record.actual_secs,
                record.completed,
                record.cycles as i64,
            ],
        )?;

        Ok(())
    }

    /// The most recent sessions, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>, HistoryError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT started_at, pattern, planned_secs, actual_secs, completed, cycles
            FROM sessions
            ORDER BY started_at DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let started_at_str: String = row.get(0)?;
            let started_at = DateTime::parse_from_rfc3339(&started_at_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        "started_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(SessionRecord {
                started_at,
                pattern: row.get(1)?,
                planned_secs: row.get(2)?,
                actual_secs: row.get(3)?,
                completed: row.get(4)?,
                cycles: row.get::<_, i64>(5)? as u64,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn totals(&self) -> Result<HistoryTotals, HistoryError> {
        self.conn
            .query_row(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(completed), 0),
                       COALESCE(SUM(actual_secs), 0.0)
                FROM sessions
                "#,
                [],
                |row| {
                    Ok(HistoryTotals {
                        sessions: row.get::<_, i64>(0)? as u64,
                        completed: row.get::<_, i64>(1)? as u64,
                        practiced_secs: row.get(2)?,
                    })
                },
            )
            .map_err(HistoryError::from)
    }

    /// Write the whole history to a CSV file, newest first. Returns the
    /// number of rows written.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<usize, HistoryError> {
        let records = self.recent(u32::MAX as usize)?;

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "started_at",
            "pattern",
            "planned_secs",
            "actual_secs",
            "completed",
            "cycles",
        ])?;
        for record in &records {
            writer.write_record([
                record.started_at.to_rfc3339(),
                record.pattern.clone(),
                format!("{:.2}", record.planned_secs),
                format!("{:.2}", record.actual_secs),
                record.completed.to_string(),
                record.cycles.to_string(),
            ])?;
        }
        writer.flush()?;

        Ok(records.len())
    }
}

/// Completion sink that writes one history row per session. Database errors
/// stay in here; the controller never sees them.
pub struct SessionLog {
    db: Option<HistoryDb>,
    pattern: String,
    planned_secs: f64,
    started_at: DateTime<Local>,
}

impl SessionLog {
    pub fn new(pattern: &BreathingPattern, planned_secs: f64) -> Self {
        Self {
            db: HistoryDb::new().ok(),
            pattern: pattern.name().to_string(),
            planned_secs,
            started_at: Local::now(),
        }
    }

    #[cfg(test)]
    fn with_db(db: HistoryDb, pattern: &BreathingPattern, planned_secs: f64) -> Self {
        Self {
            db: Some(db),
            pattern: pattern.name().to_string(),
            planned_secs,
            started_at: Local::now(),
        }
    }
}

impl CompletionSink for SessionLog {
    fn on_session_complete(&mut self, result: &SessionResult) {
        if let Some(ref db) = self.db {
            let _ = db.record_session(&SessionRecord {
                started_at: self.started_at,
                pattern: self.pattern.clone(),
                planned_secs: self.planned_secs,
                actual_secs: result.actual_secs,
                completed: result.completed,
                cycles: result.cycles,
            });
        }
    }
}
