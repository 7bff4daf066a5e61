//! Drives one game end-to-end between two engine clients.
//!
//! The scheduler loop is strictly sequential: one outstanding move request
//! at a time, the mover picked by the turn controller, every returned move
//! legality-checked against the rules oracle before it is applied. Engine
//! faults abort the current game, never the run.

use chrono::Utc;
use thiserror::Error;

use crate::cancel::CancelToken;
use crate::game::GameState;
use crate::limit::MoveLimit;
use crate::oracle::{OracleError, RulesOracle};
use crate::recorder::{MatchResult, Outcome, ResultRecorder};
use crate::turn;
use crate::uci_client::{UciClient, UciError};

/// Default cap on plies per game; runaway games are adjudicated as draws.
const DEFAULT_PLY_CAP: usize = 512;

/// Errors that end a game before its natural verdict.
#[derive(Error, Debug)]
pub enum GameError {
    /// Protocol-level engine failure (timeout, exit, bad response).
    #[error("engine failure: {0}")]
    Uci(#[from] UciError),
    /// The engine returned a move that is illegal in the current position.
    #[error("illegal move from engine: {0}")]
    IllegalMove(String),
    /// An opening-book move was illegal when replayed in sequence.
    #[error("illegal opening move at ply {ply}: {uci}")]
    InvalidOpening {
        /// Zero-based index of the offending book move.
        ply: usize,
        /// The offending move token.
        uci: String,
    },
    /// The rules oracle rejected a move it had reported legal.
    #[error(transparent)]
    Oracle(#[from] OracleError),
    /// The run was cancelled mid-game.
    #[error("run cancelled")]
    Cancelled,
}

/// One seat at the board: a display name and the engine playing it.
pub struct Seat<'a> {
    /// Operator-facing name of this participant.
    pub name: String,
    /// The live protocol client.
    pub client: &'a mut UciClient,
}

impl<'a> Seat<'a> {
    /// Pairs a display name with a client.
    pub fn new(name: impl Into<String>, client: &'a mut UciClient) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }
}

/// Outcome of one scheduled game.
///
/// An aborted game still carries a full [`MatchResult`] (outcome
/// [`Aborted`](Outcome::Aborted), partial move list) plus the error that
/// stopped it, so the caller can both persist the record and react to the
/// fault.
pub struct GameReport {
    /// The assembled result record.
    pub result: MatchResult,
    /// The error that aborted the game, if it did not finish naturally.
    pub abort: Option<GameError>,
}

/// Schedules single games between two seats over a rules oracle.
pub struct MatchScheduler<O> {
    oracle: O,
    limit: MoveLimit,
    recorder: ResultRecorder,
    cancel: CancelToken,
    ply_cap: usize,
}

impl<O: RulesOracle> MatchScheduler<O> {
    /// Creates a scheduler.
    pub fn new(
        oracle: O,
        limit: MoveLimit,
        recorder: ResultRecorder,
        cancel: CancelToken,
    ) -> Self {
        Self {
            oracle,
            limit,
            recorder,
            cancel,
            ply_cap: DEFAULT_PLY_CAP,
        }
    }

    /// Overrides the per-game ply cap.
    #[must_use]
    pub fn with_ply_cap(mut self, ply_cap: usize) -> Self {
        self.ply_cap = ply_cap;
        self
    }

    /// Plays one game from `opening` to termination.
    ///
    /// The caller decides who sits white for each game; passing the seats
    /// in swapped order is the color-permutation step. `GameState` is
    /// always constructed fresh here, never reused.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidOpening`] if the book prefix does not
    /// replay legally - bad book data is a caller problem, not a game
    /// result. Engine faults during play do not error: they come back as
    /// an aborted [`GameReport`].
    pub fn play_game<'a>(
        &self,
        mut white: Seat<'a>,
        mut black: Seat<'a>,
        opening: &[String],
    ) -> Result<GameReport, GameError> {
        let started_at = Utc::now();
        let white_part = white.client.snapshot(&white.name);
        let black_part = black.client.snapshot(&black.name);

        let mut state = GameState::from_opening(&self.oracle, opening)?;
        let mut abort: Option<GameError> = None;

        let outcome = loop {
            if self.cancel.is_cancelled() {
                abort = Some(GameError::Cancelled);
                break Outcome::Aborted;
            }
            if let Some(verdict) = self.oracle.verdict(state.position()) {
                break Outcome::from(verdict);
            }
            if state.ply_count() >= self.ply_cap {
                tracing::warn!(plies = state.ply_count(), "ply cap hit, adjudicating draw");
                break Outcome::Draw;
            }

            let mover = if turn::mover_index(state.ply_count()) == 0 {
                &mut white
            } else {
                &mut black
            };

            let uci = match Self::request_move(mover, state.moves(), &self.limit) {
                Ok(uci) => uci,
                Err(err) => {
                    tracing::warn!(seat = %mover.name, error = %err, "aborting game");
                    abort = Some(err.into());
                    break Outcome::Aborted;
                }
            };

            // Engines are not trusted to emit only legal moves.
            if !self.oracle.is_legal(state.position(), &uci) {
                tracing::warn!(seat = %mover.name, uci = %uci, "illegal move");
                abort = Some(GameError::IllegalMove(uci));
                break Outcome::Aborted;
            }
            if let Err(err) = state.apply(&self.oracle, &uci) {
                abort = Some(err.into());
                break Outcome::Aborted;
            }
        };

        let finished_at = Utc::now();
        let record = self.oracle.portable_record(
            &white_part.name,
            &black_part.name,
            state.moves(),
            outcome,
        );
        let result = self.recorder.record(
            white_part,
            black_part,
            &state,
            outcome,
            started_at,
            finished_at,
            record,
        );
        Ok(GameReport { result, abort })
    }

    /// One full move exchange: resend the position, then request a move.
    fn request_move(
        seat: &mut Seat<'_>,
        moves: &[String],
        limit: &MoveLimit,
    ) -> Result<String, UciError> {
        seat.client.set_position(moves)?;
        seat.client.go(limit)
    }

    /// The recorder this scheduler stamps results with.
    pub fn recorder(&self) -> &ResultRecorder {
        &self.recorder
    }
}
