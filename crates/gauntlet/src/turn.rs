//! Turn alternation logic.
//!
//! Which of the two participants moves next is a pure function of the
//! number of moves already played. Permuting who sits first happens once
//! per game in the caller, never here.

/// Index into an ordered participant pair of the side to move.
///
/// Returns `0` (the first mover) for even move counts and `1` for odd ones.
#[must_use]
pub fn mover_index(moves_played: usize) -> usize {
    moves_played % 2
}
