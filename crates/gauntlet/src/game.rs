//! Per-game position and move history.

use crate::oracle::{OracleError, RulesOracle};
use crate::scheduler::GameError;

/// The authoritative position plus the full ordered move history of one game.
///
/// Created fresh at game start (optionally by replaying an opening prefix),
/// mutated only by [`apply`](Self::apply) after the oracle has accepted the
/// move, and discarded once the result is recorded. Never reused between
/// games.
#[derive(Debug)]
pub struct GameState<S> {
    position: S,
    moves: Vec<String>,
}

impl<S> GameState<S> {
    /// Wraps a starting position with an empty history.
    pub fn new(position: S) -> Self {
        Self {
            position,
            moves: Vec::new(),
        }
    }

    /// Builds a game by replaying `opening` from the start position.
    ///
    /// Every opening move is legality-checked in sequence; book data is
    /// not assumed valid.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidOpening`] naming the first offending
    /// ply, without applying it.
    pub fn from_opening<O>(oracle: &O, opening: &[String]) -> Result<Self, GameError>
    where
        O: RulesOracle<State = S>,
    {
        let mut state = Self::new(oracle.start_state());
        for (ply, uci) in opening.iter().enumerate() {
            if !oracle.is_legal(&state.position, uci) {
                return Err(GameError::InvalidOpening {
                    ply,
                    uci: uci.clone(),
                });
            }
            state.apply(oracle, uci)?;
        }
        Ok(state)
    }

    /// Applies one move through the oracle and appends it to the history.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if the oracle rejects the move; the history
    /// is left untouched in that case.
    pub fn apply<O>(&mut self, oracle: &O, uci: &str) -> Result<(), OracleError>
    where
        O: RulesOracle<State = S>,
    {
        oracle.apply(&mut self.position, uci)?;
        self.moves.push(uci.to_string());
        Ok(())
    }

    /// The current position.
    pub fn position(&self) -> &S {
        &self.position
    }

    /// The ordered move history in coordinate notation.
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    /// Number of moves played so far.
    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }
}
