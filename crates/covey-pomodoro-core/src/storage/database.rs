//! SQLite-based session storage and statistics.
//!
//! Provides persistent storage for:
//! - Saved Pomodoro work sessions
//! - Tasks and their cumulative time spent
//! - Session statistics (daily and all-time)
//! - Key-value store for application state (e.g. the timer snapshot)

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::error::DatabaseError;
use crate::ports::{SessionStore, TaskTimeStore};
use crate::session::{PomodoroSessionRecord, Stats, Task};

/// SQLite database for sessions and tasks.
pub struct Database {
    conn: Mutex<Connection>,
}

fn ts(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<PomodoroSessionRecord> {
    Ok(PomodoroSessionRecord {
        id: row.get(0)?,
        task_id: row.get(1)?,
        task_title: row.get(2)?,
        start_time: parse_ts(&row.get::<_, String>(3)?)?,
        duration_secs: row.get(4)?,
        completed: row.get(5)?,
    })
}

impl Database {
    /// Open the database at `~/.config/covey-pomodoro/covey-pomodoro.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, DatabaseError> {
        let dir = data_dir().map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Self::open_at(&dir.join("covey-pomodoro.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and throwaway runs).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn().execute_batch(
            "CREATE TABLE IF NOT EXISTS pomodoro_sessions (
                id            TEXT PRIMARY KEY,
                task_id       TEXT,
                task_title    TEXT NOT NULL DEFAULT '',
                start_time    TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                completed     INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id              TEXT PRIMARY KEY,
                title           TEXT NOT NULL DEFAULT '',
                time_spent_secs INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_start_time ON pomodoro_sessions(start_time);
            CREATE INDEX IF NOT EXISTS idx_sessions_task_id ON pomodoro_sessions(task_id);",
        )?;
        Ok(())
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Insert a session record. Returns its id.
    pub fn insert_session(&self, record: &PomodoroSessionRecord) -> Result<String, DatabaseError> {
        self.conn().execute(
            "INSERT INTO pomodoro_sessions (id, task_id, task_title, start_time, duration_secs, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id,
                record.task_id,
                record.task_title,
                ts(&record.start_time),
                record.duration_secs,
                record.completed,
            ],
        )?;
        Ok(record.id.clone())
    }

    /// Saved sessions, newest first, optionally for one task.
    pub fn sessions(&self, task_id: Option<&str>) -> Result<Vec<PomodoroSessionRecord>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, task_id, task_title, start_time, duration_secs, completed
             FROM pomodoro_sessions
             WHERE ?1 IS NULL OR task_id = ?1
             ORDER BY start_time DESC",
        )?;
        let rows = stmt.query_map(params![task_id], row_to_record)?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn stats_all(&self) -> Result<Stats, DatabaseError> {
        let today = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .unwrap_or_else(Utc::now);
        self.stats_since(&today)
    }

    /// Totals over all sessions plus those starting at or after `day_start`.
    pub fn stats_since(&self, day_start: &DateTime<Utc>) -> Result<Stats, DatabaseError> {
        let conn = self.conn();
        let (total_sessions, completed_sessions, total_work_secs) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(completed), 0), COALESCE(SUM(duration_secs), 0)
             FROM pomodoro_sessions",
            [],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?, row.get::<_, u64>(2)?)),
        )?;
        let (today_sessions, today_work_secs) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_secs), 0)
             FROM pomodoro_sessions
             WHERE start_time >= ?1",
            params![ts(day_start)],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;
        Ok(Stats {
            total_sessions,
            completed_sessions,
            total_work_secs,
            today_sessions,
            today_work_secs,
        })
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn create_task(&self, title: &str) -> Result<Task, DatabaseError> {
        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            time_spent_secs: 0,
        };
        self.conn().execute(
            "INSERT INTO tasks (id, title, time_spent_secs) VALUES (?1, ?2, 0)",
            params![task.id, task.title],
        )?;
        Ok(task)
    }

    pub fn task(&self, id: &str) -> Result<Option<Task>, DatabaseError> {
        let task = self
            .conn()
            .query_row(
                "SELECT id, title, time_spent_secs FROM tasks WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Task {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        time_spent_secs: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(task)
    }

    /// Like [`Database::task`], but a missing task is an error.
    pub fn require_task(&self, id: &str) -> Result<Task, DatabaseError> {
        self.task(id)?.ok_or_else(|| DatabaseError::NotFound {
            entity: "task",
            id: id.to_string(),
        })
    }

    pub fn tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, title, time_spent_secs FROM tasks ORDER BY title")?;
        let rows = stmt.query_map([], |row| {
            Ok(Task {
                id: row.get(0)?,
                title: row.get(1)?,
                time_spent_secs: row.get(2)?,
            })
        })?;
        let tasks = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Time spent on a task; unknown tasks have spent none.
    pub fn task_time_spent(&self, task_id: &str) -> Result<u64, DatabaseError> {
        let secs = self
            .conn()
            .query_row(
                "SELECT time_spent_secs FROM tasks WHERE id = ?1",
                params![task_id],
                |row| row.get::<_, u64>(0),
            )
            .optional()?;
        Ok(secs.unwrap_or(0))
    }

    pub fn set_task_time_spent(&self, task_id: &str, secs: u64) -> Result<(), DatabaseError> {
        self.conn().execute(
            "INSERT INTO tasks (id, time_spent_secs) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET time_spent_secs = excluded.time_spent_secs",
            params![task_id, secs],
        )?;
        Ok(())
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn().execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for Database {
    async fn create_session_record(
        &self,
        record: &PomodoroSessionRecord,
    ) -> Result<String, DatabaseError> {
        self.insert_session(record)
    }
}

#[async_trait]
impl TaskTimeStore for Database {
    async fn get_task_time_spent(&self, task_id: &str) -> Result<u64, DatabaseError> {
        self.task_time_spent(task_id)
    }

    async fn set_task_time_spent(&self, task_id: &str, secs: u64) -> Result<(), DatabaseError> {
        Database::set_task_time_spent(self, task_id, secs)
    }
}
