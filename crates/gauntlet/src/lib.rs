//! Gauntlet - an automated match harness for UCI chess engines.
//!
//! This crate drives repeated games between two engine subprocesses speaking
//! the UCI line protocol, validates every engine move against an external
//! rules oracle, and records each finished game durably.
//!
//! # Modules
//!
//! - [`uci_client`] - UCI protocol client owning one engine subprocess
//! - [`limit`] - per-move thinking time / search depth bounds
//! - [`turn`] - strict-alternation turn controller
//! - [`oracle`] - the rules-oracle seam (legality, move application, verdicts)
//! - [`game`] - per-game position and move history
//! - [`scheduler`] - drives one game from opening to termination
//! - [`recorder`] - assembles and persists match results
//! - [`storage`] - SQLite result sink
//! - [`openings`] - opening move-prefix sets
//! - [`pgn`] - portable game record rendering
//! - [`cancel`] - run-level cancellation token

pub mod cancel;
pub mod game;
pub mod limit;
pub mod openings;
pub mod oracle;
pub mod pgn;
pub mod recorder;
pub mod scheduler;
pub mod storage;
pub mod turn;
pub mod uci_client;
