//! Match result assembly and persistence hand-off.
//!
//! The recorder turns a finished (or aborted) game into an immutable
//! [`MatchResult`] tagged with the run's invocation id, and hands it to a
//! [`ResultSink`]. Persistence failures surface to the caller; a match that
//! finished but failed to persist is distinguishable from one that never
//! finished.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::game::GameState;
use crate::oracle::{DrawReason, Verdict};

/// Errors surfaced by a result sink.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The sink could not store the result.
    #[error("failed to persist match result: {0}")]
    Persistence(String),
}

/// How a match ended. Closed set; derived from the oracle verdict unless
/// the game was aborted by an engine fault or cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The first mover won.
    WhiteWins,
    /// The second mover won.
    BlackWins,
    /// Drawn by verdict or ply-cap adjudication.
    Draw,
    /// The game did not finish: engine fault, timeout or cancellation.
    Aborted,
}

impl Outcome {
    /// The conventional score string: `1-0`, `0-1`, `1/2-1/2` or `*`.
    #[must_use]
    pub fn as_score(&self) -> &'static str {
        match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
            Self::Aborted => "*",
        }
    }

    /// Name of the winner, or `None` for draws and aborted games.
    #[must_use]
    pub fn winner<'a>(&self, white: &'a str, black: &'a str) -> Option<&'a str> {
        match self {
            Self::WhiteWins => Some(white),
            Self::BlackWins => Some(black),
            Self::Draw | Self::Aborted => None,
        }
    }
}

impl From<Verdict> for Outcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::WhiteWins => Self::WhiteWins,
            Verdict::BlackWins => Self::BlackWins,
            Verdict::Draw(_) => Self::Draw,
        }
    }
}

impl From<DrawReason> for Outcome {
    fn from(_: DrawReason) -> Self {
        Self::Draw
    }
}

/// A structured, serializable snapshot of an engine's applied UCI options.
///
/// Ordered so the serialized form is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineOptions(pub BTreeMap<String, String>);

impl EngineOptions {
    /// Serializes the snapshot as a JSON object string.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Identity snapshot of one participant, decoupled from its live process
/// handle so results outlive the subprocess.
#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    /// Display name given by the operator.
    pub name: String,
    /// Path to the engine executable.
    pub path: PathBuf,
    /// Identity string reported during the handshake, if any.
    pub reported_name: String,
    /// Options applied to the engine for this run.
    pub options: EngineOptions,
}

/// Immutable record of one completed or aborted game.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Run identifier shared by all results of one invocation.
    pub invocation_id: Option<String>,
    /// When the game started.
    pub started_at: DateTime<Utc>,
    /// When the game ended.
    pub finished_at: DateTime<Utc>,
    /// The first mover.
    pub white: Participant,
    /// The second mover.
    pub black: Participant,
    /// How the game ended.
    pub outcome: Outcome,
    /// Ordered move list in coordinate notation.
    pub moves: Vec<String>,
    /// Portable game record (PGN).
    pub record: String,
}

impl MatchResult {
    /// Display name of the winner, empty for draws and aborted games.
    #[must_use]
    pub fn winner_name(&self) -> &str {
        self.outcome
            .winner(&self.white.name, &self.black.name)
            .unwrap_or("")
    }

    /// The move list as a single space-joined string.
    #[must_use]
    pub fn moves_joined(&self) -> String {
        self.moves.join(" ")
    }
}

/// Destination for match results. Implementations own schema and commit.
pub trait ResultSink {
    /// Creates the backing schema if it does not exist yet.
    fn ensure_schema(&self) -> Result<(), SinkError>;

    /// Stores one result.
    fn insert(&self, result: &MatchResult) -> Result<(), SinkError>;
}

/// Builds [`MatchResult`]s and hands them to a sink.
///
/// Carries the invocation context: every record produced during one process
/// execution is tagged with the same id for later aggregation.
#[derive(Debug, Clone, Default)]
pub struct ResultRecorder {
    invocation_id: Option<String>,
}

impl ResultRecorder {
    /// Creates a recorder tagging results with `invocation_id`.
    #[must_use]
    pub fn new(invocation_id: Option<String>) -> Self {
        Self { invocation_id }
    }

    /// Assembles the result record for one game.
    pub fn record<S>(
        &self,
        white: Participant,
        black: Participant,
        state: &GameState<S>,
        outcome: Outcome,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        record: String,
    ) -> MatchResult {
        MatchResult {
            invocation_id: self.invocation_id.clone(),
            started_at,
            finished_at,
            white,
            black,
            outcome,
            moves: state.moves().to_vec(),
            record,
        }
    }

    /// Hands a result to the sink.
    ///
    /// # Errors
    ///
    /// Surfaces the sink's [`SinkError`] unchanged; no retry is attempted
    /// here - the caller decides whether the match is worth replaying.
    pub fn persist(&self, sink: &dyn ResultSink, result: &MatchResult) -> Result<(), SinkError> {
        sink.insert(result)
    }
}
