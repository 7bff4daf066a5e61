//! PGN (Portable Game Notation) rendering for finished games.
//!
//! Produces a standard seven-tag PGN text with the move list in coordinate
//! notation. SAN conversion is left to oracles that can do it.

use chrono::Utc;

use crate::recorder::Outcome;

/// Maximum line width of the rendered movetext section.
const LINE_WIDTH: usize = 80;

/// Renders a finished game as PGN text.
///
/// Headers carry the event, site, date, both player names and the result;
/// the movetext numbers every full move and ends with the score string.
/// Aborted games render with the `*` result marker.
#[must_use]
pub fn render(white: &str, black: &str, moves: &[String], outcome: Outcome) -> String {
    let score = outcome.as_score();

    let mut out = String::new();
    out.push_str("[Event \"Gauntlet match\"]\n");
    out.push_str("[Site \"local\"]\n");
    out.push_str(&format!("[Date \"{}\"]\n", Utc::now().format("%Y.%m.%d")));
    out.push_str(&format!("[White \"{}\"]\n", white));
    out.push_str(&format!("[Black \"{}\"]\n", black));
    out.push_str(&format!("[Result \"{}\"]\n", score));
    out.push('\n');

    let mut tokens: Vec<String> = Vec::with_capacity(moves.len() + moves.len() / 2 + 1);
    for (i, uci) in moves.iter().enumerate() {
        if i % 2 == 0 {
            tokens.push(format!("{}.", i / 2 + 1));
        }
        tokens.push(uci.clone());
    }
    tokens.push(score.to_string());

    // Wrap at token boundaries.
    let mut line_len = 0;
    for token in &tokens {
        if line_len > 0 && line_len + 1 + token.len() > LINE_WIDTH {
            out.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        out.push_str(token);
        line_len += token.len();
    }
    out.push('\n');

    out
}
