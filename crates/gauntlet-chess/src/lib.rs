//! Chess rules oracle for the gauntlet harness.
//!
//! Implements [`RulesOracle`] on top of the `chess` crate, which plays the
//! role the harness treats as an external collaborator: legal-move
//! checking, move application and terminal-state detection. The harness
//! itself never interprets a position.

use std::str::FromStr;

use chess::{Board, ChessMove, Game, GameResult, Piece};

use gauntlet::oracle::{DrawReason, OracleError, RulesOracle, Verdict};

/// Rules oracle backed by [`chess::Game`].
///
/// Draw claims mirror the behavior of playing with `claim_draw` semantics:
/// any position where a threefold-repetition or fifty-move claim is
/// available counts as drawn immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChessOracle;

impl ChessOracle {
    /// Creates the oracle.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RulesOracle for ChessOracle {
    type State = Game;

    fn start_state(&self) -> Game {
        Game::new()
    }

    fn verdict(&self, state: &Game) -> Option<Verdict> {
        if let Some(result) = state.result() {
            return Some(match result {
                GameResult::WhiteCheckmates | GameResult::BlackResigns => Verdict::WhiteWins,
                GameResult::BlackCheckmates | GameResult::WhiteResigns => Verdict::BlackWins,
                GameResult::Stalemate => Verdict::Draw(DrawReason::Stalemate),
                GameResult::DrawAccepted | GameResult::DrawDeclared => {
                    Verdict::Draw(DrawReason::Claimed)
                }
            });
        }
        if insufficient_material(&state.current_position()) {
            return Some(Verdict::Draw(DrawReason::InsufficientMaterial));
        }
        if state.can_declare_draw() {
            return Some(Verdict::Draw(DrawReason::Claimed));
        }
        None
    }

    fn is_legal(&self, state: &Game, uci: &str) -> bool {
        match ChessMove::from_str(uci) {
            Ok(mv) => state.current_position().legal(mv),
            Err(_) => false,
        }
    }

    fn apply(&self, state: &mut Game, uci: &str) -> Result<(), OracleError> {
        let mv = ChessMove::from_str(uci)
            .map_err(|_| OracleError::BadMoveToken(uci.to_string()))?;
        if state.make_move(mv) {
            Ok(())
        } else {
            Err(OracleError::Rejected(uci.to_string()))
        }
    }
}

/// K vs K, K+B vs K and K+N vs K cannot be won by either side.
///
/// Deliberately conservative: four-piece dead positions (same-colored
/// bishops) are left to the fifty-move claim.
fn insufficient_material(board: &Board) -> bool {
    let occupied = *board.combined();
    if occupied.popcnt() > 3 {
        return false;
    }
    let heavy =
        *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    heavy.popcnt() == 0
}
