//! SQLite result sink.
//!
//! Stores one row per finished or aborted game: an autoincrement id
//! plus invocation id, timestamps,
//! participant names (operator-facing and engine-reported), JSON option
//! snapshots, outcome, winner, the space-joined move list and the PGN text.

use std::path::Path;

use rusqlite::Connection;

use crate::recorder::{MatchResult, ResultSink, SinkError};

impl From<rusqlite::Error> for SinkError {
    fn from(err: rusqlite::Error) -> Self {
        SinkError::Persistence(err.to_string())
    }
}

/// SQLite-backed [`ResultSink`].
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens (or creates) the database at `path` and ensures the schema.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the database cannot be opened or the
    /// schema cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        let conn = Connection::open(path)?;
        let sink = Self { conn };
        sink.ensure_schema()?;
        Ok(sink)
    }

    /// Opens an in-memory database, mainly for tests.
    pub fn open_in_memory() -> Result<Self, SinkError> {
        let conn = Connection::open_in_memory()?;
        let sink = Self { conn };
        sink.ensure_schema()?;
        Ok(sink)
    }

    /// Number of stored results, across all invocations.
    pub fn count(&self) -> Result<i64, SinkError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl ResultSink for SqliteSink {
    fn ensure_schema(&self) -> Result<(), SinkError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                invocation_id TEXT,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                white TEXT NOT NULL,
                black TEXT NOT NULL,
                white_name TEXT,
                black_name TEXT,
                white_params TEXT,
                black_params TEXT,
                outcome TEXT NOT NULL,
                winner TEXT,
                uci_moves TEXT NOT NULL,
                pgn TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn insert(&self, result: &MatchResult) -> Result<(), SinkError> {
        self.conn.execute(
            "INSERT INTO results (
                invocation_id, start_time, end_time,
                white, black, white_name, black_name,
                white_params, black_params,
                outcome, winner, uci_moves, pgn
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            (
                result.invocation_id.as_deref().unwrap_or(""),
                result.started_at.to_rfc3339(),
                result.finished_at.to_rfc3339(),
                &result.white.name,
                &result.black.name,
                &result.white.reported_name,
                &result.black.reported_name,
                result.white.options.to_json(),
                result.black.options.to_json(),
                result.outcome.as_score(),
                result.winner_name(),
                result.moves_joined(),
                &result.record,
            ),
        )?;
        Ok(())
    }
}
