//! The rules-oracle seam.
//!
//! The harness never implements chess rules itself. Legality checking,
//! move application and terminal-state detection are delegated to an
//! implementation of [`RulesOracle`] supplied by the embedding crate.
//! Moves cross this seam as UCI coordinate strings, the same form they
//! travel over the engine protocol.

use thiserror::Error;

use crate::pgn;
use crate::recorder::Outcome;

/// Errors reported by a rules oracle while applying a move.
#[derive(Error, Debug)]
pub enum OracleError {
    /// The token is not a move in coordinate notation.
    #[error("unparsable move token: {0}")]
    BadMoveToken(String),
    /// The move parsed but is not legal in the current position.
    #[error("move rejected by rules: {0}")]
    Rejected(String),
}

/// Why a drawn game is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    /// The side to move has no legal move and is not in check.
    Stalemate,
    /// Neither side retains mating material.
    InsufficientMaterial,
    /// A claimable draw: threefold repetition or the fifty-move rule.
    Claimed,
}

/// Terminal verdict of a finished game, as reported by the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The first mover delivered mate (or the opponent resigned).
    WhiteWins,
    /// The second mover delivered mate (or the opponent resigned).
    BlackWins,
    /// Drawn, with the reason.
    Draw(DrawReason),
}

/// External rules collaborator: legality, application, termination.
///
/// `State` is whatever position representation the implementation keeps;
/// the harness treats it as opaque and stores it inside
/// [`GameState`](crate::game::GameState).
pub trait RulesOracle {
    /// The oracle's position representation.
    type State;

    /// The standard starting position.
    fn start_state(&self) -> Self::State;

    /// `Some(verdict)` once the game is over, `None` while in progress.
    fn verdict(&self, state: &Self::State) -> Option<Verdict>;

    /// Whether `uci` denotes a legal move in `state`.
    fn is_legal(&self, state: &Self::State, uci: &str) -> bool;

    /// Applies `uci` to `state`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if the token does not parse or the move is
    /// illegal. Callers are expected to check [`is_legal`](Self::is_legal)
    /// first; this is the oracle's own backstop.
    fn apply(&self, state: &mut Self::State, uci: &str) -> Result<(), OracleError>;

    /// Renders a portable textual record of the finished game.
    ///
    /// The default writes standard PGN with the move list in coordinate
    /// notation; oracles with richer notation support may override it.
    fn portable_record(
        &self,
        white: &str,
        black: &str,
        moves: &[String],
        outcome: Outcome,
    ) -> String {
        pgn::render(white, black, moves, outcome)
    }
}
