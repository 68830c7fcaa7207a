//! SQLite-based session result storage and statistics.
//!
//! Provides persistent storage for:
//! - Completed meditation sessions (one row per grown tree)
//! - Aggregate statistics (minutes, trees per species, mood lift)

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::session::{ResultSink, SessionResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub mode: String,
    pub species: String,
    pub duration_min: u64,
    pub mood_before: u8,
    pub mood_after: u8,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_minutes: u64,
    pub today_sessions: u64,
    pub today_minutes: u64,
    /// Trees grown, keyed by species.
    pub trees: BTreeMap<String, u64>,
    /// Mean of `mood_after - mood_before`; 0 with no sessions.
    pub average_mood_lift: f64,
}

/// SQLite database for session results.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/meditree.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("meditree.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id           INTEGER PRIMARY KEY AUTOINCREMENT,
                    mode         TEXT NOT NULL,
                    species      TEXT NOT NULL,
                    duration_min INTEGER NOT NULL,
                    mood_before  INTEGER NOT NULL,
                    mood_after   INTEGER NOT NULL,
                    completed_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);
                CREATE INDEX IF NOT EXISTS idx_sessions_species ON sessions(species);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Record a finished session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_result(&self, result: &SessionResult) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sessions (mode, species, duration_min, mood_before, mood_after, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                result.mode.as_str(),
                result.species,
                result.duration_minutes,
                result.mood_before.value(),
                result.mood_after.value(),
                result.completed_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent sessions first.
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, mode, species, duration_min, mood_before, mood_after, completed_at
             FROM sessions
             ORDER BY completed_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let completed_at: String = row.get(6)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        6,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
            Ok(SessionRecord {
                id: row.get(0)?,
                mode: row.get(1)?,
                species: row.get(2)?,
                duration_min: row.get(3)?,
                mood_before: row.get(4)?,
                mood_after: row.get(5)?,
                completed_at,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn stats(&self) -> Result<Stats> {
        let mut stats = Stats::default();

        let (count, minutes, lift): (u64, u64, Option<f64>) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_min), 0), AVG(mood_after - mood_before)
             FROM sessions",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        stats.total_sessions = count;
        stats.total_minutes = minutes;
        stats.average_mood_lift = lift.unwrap_or(0.0);

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let (today_count, today_minutes): (u64, u64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_min), 0)
             FROM sessions
             WHERE completed_at >= ?1",
            params![format!("{today}T00:00:00+00:00")],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        stats.today_sessions = today_count;
        stats.today_minutes = today_minutes;

        let mut stmt = self
            .conn
            .prepare("SELECT species, COUNT(*) FROM sessions GROUP BY species")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;
        for row in rows {
            let (species, count) = row?;
            stats.trees.insert(species, count);
        }

        Ok(stats)
    }
}

/// Adapts [`Database`] to the engine's [`ResultSink`].
///
/// The engine does not look at the outcome, so the sink keeps it for the
/// caller to report.
pub struct DatabaseSink<'a> {
    db: &'a Database,
    outcome: Option<Result<i64>>,
}

impl<'a> DatabaseSink<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db, outcome: None }
    }

    /// Row id of the stored result, or the error that prevented storing it.
    /// `None` until something has been submitted.
    pub fn take_outcome(&mut self) -> Option<Result<i64>> {
        self.outcome.take()
    }
}

impl ResultSink for DatabaseSink<'_> {
    fn submit(&mut self, result: &SessionResult) {
        let outcome = self.db.record_result(result);
        if let Err(err) = &outcome {
            tracing::warn!(error = %err, "failed to store session result");
        }
        self.outcome = Some(outcome);
    }
}
