//! SQLite-based persistence.
//!
//! Provides:
//! - a key-value store for the controller snapshot (crash/restart recovery)
//! - the worklog: durable records of logged hours per work unit, each
//!   identified by an opaque reference handed back to the caller

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use crate::error::{CoreError, StorageError};

/// One durable worklog row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Opaque reference for this record.
    pub log_ref: String,
    pub task_ref: u64,
    pub activity_ref: u64,
    pub hours: f64,
    pub comment: Option<String>,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LogSummary {
    pub entries: u64,
    pub total_hours: f64,
}

/// SQLite database for snapshot and worklog storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/stint/stint.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("stint.db");
        let conn = Connection::open(&path).map_err(|source| StorageError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self { conn };
        db.migrate().map_err(StorageError::from)?;
        Ok(db)
    }

    /// Open or create the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &std::path::Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS worklog (
                log_ref      TEXT PRIMARY KEY,
                task_ref     INTEGER NOT NULL,
                activity_ref INTEGER NOT NULL,
                hours        REAL NOT NULL,
                comment      TEXT,
                logged_at    TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_worklog_logged_at ON worklog(logged_at);
            CREATE INDEX IF NOT EXISTS idx_worklog_task_ref ON worklog(task_ref);",
        )
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Record logged hours and return the opaque reference for the record.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_log(
        &self,
        task_ref: u64,
        activity_ref: u64,
        hours: f64,
        comment: Option<&str>,
    ) -> Result<String, StorageError> {
        let log_ref = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO worklog (log_ref, task_ref, activity_ref, hours, comment, logged_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                log_ref,
                task_ref,
                activity_ref,
                hours,
                comment,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(log_ref)
    }

    /// Worklog entries recorded today, newest first.
    pub fn logs_today(&self) -> Result<Vec<LogEntry>, StorageError> {
        let midnight = format!("{}T00:00:00+00:00", Utc::now().format("%Y-%m-%d"));
        let mut stmt = self.conn.prepare(
            "SELECT log_ref, task_ref, activity_ref, hours, comment, logged_at
             FROM worklog
             WHERE logged_at >= ?1
             ORDER BY logged_at DESC",
        )?;
        let rows = stmt.query_map(params![midnight], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (log_ref, task_ref, activity_ref, hours, comment, logged_at) = row?;
            let logged_at = DateTime::parse_from_rfc3339(&logged_at)
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());
            entries.push(LogEntry {
                log_ref,
                task_ref,
                activity_ref,
                hours,
                comment,
                logged_at,
            });
        }
        Ok(entries)
    }

    /// Totals across today's worklog.
    pub fn summary_today(&self) -> Result<LogSummary, StorageError> {
        let midnight = format!("{}T00:00:00+00:00", Utc::now().format("%Y-%m-%d"));
        let mut stmt = self.conn.prepare(
            "SELECT COUNT(*), COALESCE(SUM(hours), 0)
             FROM worklog
             WHERE logged_at >= ?1",
        )?;
        let (entries, total_hours) = stmt.query_row(params![midnight], |row| {
            Ok((row.get::<_, u64>(0)?, row.get::<_, f64>(1)?))
        })?;
        Ok(LogSummary {
            entries,
            total_hours,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store_round_trips() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("snapshot").unwrap().is_none());
        db.kv_set("snapshot", "{}").unwrap();
        assert_eq!(db.kv_get("snapshot").unwrap().unwrap(), "{}");
        db.kv_set("snapshot", "{\"phase\":\"idle\"}").unwrap();
        assert_eq!(db.kv_get("snapshot").unwrap().unwrap(), "{\"phase\":\"idle\"}");
    }

    #[test]
    fn record_log_returns_unique_refs() {
        let db = Database::open_memory().unwrap();
        let a = db.record_log(42, 9, 0.75, Some("review")).unwrap();
        let b = db.record_log(42, 9, 0.25, None).unwrap();
        assert_ne!(a, b);

        let logs = db.logs_today().unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().any(|l| l.log_ref == a));
        assert!(logs.iter().any(|l| l.comment.as_deref() == Some("review")));
    }

    #[test]
    fn reopening_a_file_database_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stint.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.kv_set("snapshot", "persisted").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.kv_get("snapshot").unwrap().unwrap(), "persisted");
    }

    #[test]
    fn summary_totals_hours() {
        let db = Database::open_memory().unwrap();
        db.record_log(1, 1, 0.5, None).unwrap();
        db.record_log(2, 1, 1.25, None).unwrap();
        let summary = db.summary_today().unwrap();
        assert_eq!(summary.entries, 2);
        assert!((summary.total_hours - 1.75).abs() < f64::EPSILON);
    }
}
