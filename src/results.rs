//! Results persistence. Final metric snapshots land here together with
//! session metadata (mode, corpus, opponent, race outcome) so history
//! survives across runs. Storage is SQLite with a CSV export path.

use crate::app_dirs::AppDirs;
use crate::session::MetricsSnapshot;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::path::{Path, PathBuf};
use time_humanize::{Accuracy, HumanTime, Tense};

/// One persisted attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub timestamp: DateTime<Local>,
    /// "practice", "timed" or "race"
    pub mode: String,
    pub corpus: String,
    pub opponent: Option<String>,
    /// Win/Loss/Draw tag for race records
    pub outcome: Option<String>,
    pub wpm: f64,
    pub cpm: f64,
    pub accuracy: f64,
    pub errors: u64,
    pub elapsed_ms: u64,
}

impl SessionRecord {
    pub fn from_snapshot(
        snapshot: &MetricsSnapshot,
        mode: impl Into<String>,
        corpus: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            mode: mode.into(),
            corpus: corpus.into(),
            opponent: None,
            outcome: None,
            wpm: snapshot.wpm,
            cpm: snapshot.cpm,
            accuracy: snapshot.accuracy,
            errors: snapshot.errors as u64,
            elapsed_ms: snapshot.elapsed_millis,
        }
    }

    pub fn with_race_outcome(
        mut self,
        opponent: impl Into<String>,
        outcome: impl Into<String>,
    ) -> Self {
        self.opponent = Some(opponent.into());
        self.outcome = Some(outcome.into());
        self
    }

    /// One-line summary with a humanized age, for history listings.
    pub fn describe(&self) -> String {
        let age_secs = (Local::now() - self.timestamp).num_seconds().max(0) as u64;
        let ago = HumanTime::from(std::time::Duration::from_secs(age_secs))
            .to_text_en(Accuracy::Rough, Tense::Past);
        let tag = match (&self.outcome, &self.opponent) {
            (Some(outcome), Some(opponent)) => format!(" [{} vs {}]", outcome, opponent),
            (Some(outcome), None) => format!(" [{}]", outcome),
            _ => String::new(),
        };
        format!(
            "{:>6.1} wpm  {:>5.1}% acc  {:>3} errors  {}{}  ({})",
            self.wpm, self.accuracy, self.errors, self.mode, tag, ago
        )
    }
}

/// Database manager for saved results
#[derive(Debug)]
pub struct ResultsDb {
    conn: Connection,
}

impl ResultsDb {
    /// Open the database at the app's state directory, creating the
    /// schema if needed.
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("keyrace_results.db"));
        Self::open(&db_path)
    }

    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(db_path)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                mode TEXT NOT NULL,
                corpus TEXT NOT NULL,
                opponent TEXT,
                outcome TEXT,
                wpm REAL NOT NULL,
                cpm REAL NOT NULL,
                accuracy REAL NOT NULL,
                errors INTEGER NOT NULL,
                elapsed_ms INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_results_timestamp ON results(timestamp)",
            [],
        )?;

        Ok(ResultsDb { conn })
    }

    pub fn record(&self, record: &SessionRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO results
            (timestamp, mode, corpus, opponent, outcome, wpm, cpm, accuracy, errors, elapsed_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.timestamp.to_rfc3339(),
                record.mode,
                record.corpus,
                record.opponent,
                record.outcome,
                record.wpm,
                record.cpm,
                record.accuracy,
                record.errors,
                record.elapsed_ms,
            ],
        )?;

        Ok(())
    }

    /// Most recent results first.
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT timestamp, mode, corpus, opponent, outcome,
                   wpm, cpm, accuracy, errors, elapsed_ms
            FROM results
            ORDER BY timestamp DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            let timestamp: String = row.get(0)?;
            Ok(SessionRecord {
                timestamp: DateTime::parse_from_rfc3339(&timestamp)
                    .map(|dt| dt.with_timezone(&Local))
                    .unwrap_or_else(|_| Local::now()),
                mode: row.get(1)?,
                corpus: row.get(2)?,
                opponent: row.get(3)?,
                outcome: row.get(4)?,
                wpm: row.get(5)?,
                cpm: row.get(6)?,
                accuracy: row.get(7)?,
                errors: row.get(8)?,
                elapsed_ms: row.get(9)?,
            })
        })?;

        rows.collect()
    }

    pub fn count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))
    }

    /// Write the full result log as CSV.
    pub fn export_csv(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let records = self.recent(i64::MAX as usize)?;

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "timestamp", "mode", "corpus", "opponent", "outcome", "wpm", "cpm", "accuracy",
            "errors", "elapsed_ms",
        ])?;

        for r in records {
            writer.write_record([
                r.timestamp.to_rfc3339(),
                r.mode.clone(),
                r.corpus.clone(),
                r.opponent.clone().unwrap_or_default(),
                r.outcome.clone().unwrap_or_default(),
                format!("{:.2}", r.wpm),
                format!("{:.2}", r.cpm),
                format!("{:.2}", r.accuracy),
                r.errors.to_string(),
                r.elapsed_ms.to_string(),
            ])?;
        }

        Ok(writer.flush()?)
    }
}
