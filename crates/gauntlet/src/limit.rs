//! Per-move resource limits for engine move requests.
//!
//! A [`MoveLimit`] bounds a single `go` request by either a fixed thinking
//! time or a fixed search depth, never both. The sum type makes the
//! "at most one bound" rule unrepresentable to violate.

use std::time::Duration;
use thiserror::Error;

/// Errors produced when constructing an invalid move limit.
#[derive(Error, Debug)]
pub enum LimitError {
    /// A zero thinking time would let the engine answer instantly or never.
    #[error("thinking time must be greater than zero")]
    ZeroTime,
    /// A zero search depth is not a search at all.
    #[error("search depth must be greater than zero")]
    ZeroDepth,
}

/// An immutable bound on one move request.
///
/// Carries exactly one of a fixed thinking time or a fixed search depth.
/// Construct with [`MoveLimit::move_time`] or [`MoveLimit::depth`]; both
/// reject zero bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveLimit {
    /// Fixed wall-clock thinking time per move.
    MoveTime(Duration),
    /// Fixed search depth in plies.
    Depth(u32),
}

impl MoveLimit {
    /// Creates a thinking-time limit.
    ///
    /// # Errors
    ///
    /// Returns [`LimitError::ZeroTime`] for a zero duration.
    pub fn move_time(time: Duration) -> Result<Self, LimitError> {
        if time.is_zero() {
            return Err(LimitError::ZeroTime);
        }
        Ok(Self::MoveTime(time))
    }

    /// Creates a search-depth limit.
    ///
    /// # Errors
    ///
    /// Returns [`LimitError::ZeroDepth`] for depth zero.
    pub fn depth(depth: u32) -> Result<Self, LimitError> {
        if depth == 0 {
            return Err(LimitError::ZeroDepth);
        }
        Ok(Self::Depth(depth))
    }

    /// Renders the UCI `go` command encoding this limit.
    #[must_use]
    pub fn go_command(&self) -> String {
        match self {
            Self::MoveTime(time) => format!("go movetime {}", time.as_millis()),
            Self::Depth(depth) => format!("go depth {}", depth),
        }
    }

    /// The wall-clock bound this limit implies, if any.
    ///
    /// Depth limits carry no time bound of their own; the protocol client
    /// applies its configured response window instead.
    #[must_use]
    pub fn time_bound(&self) -> Option<Duration> {
        match self {
            Self::MoveTime(time) => Some(*time),
            Self::Depth(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_time_rejected() {
        match MoveLimit::move_time(Duration::ZERO) {
            Err(LimitError::ZeroTime) => {}
            other => panic!("expected ZeroTime error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_depth_rejected() {
        match MoveLimit::depth(0) {
            Err(LimitError::ZeroDepth) => {}
            other => panic!("expected ZeroDepth error, got {:?}", other),
        }
    }

    #[test]
    fn test_go_command_movetime() {
        let limit = MoveLimit::move_time(Duration::from_millis(500)).unwrap();
        assert_eq!(limit.go_command(), "go movetime 500");
    }

    #[test]
    fn test_go_command_depth() {
        let limit = MoveLimit::depth(7).unwrap();
        assert_eq!(limit.go_command(), "go depth 7");
    }

    #[test]
    fn test_time_bound() {
        let timed = MoveLimit::move_time(Duration::from_millis(100)).unwrap();
        assert_eq!(timed.time_bound(), Some(Duration::from_millis(100)));

        let depth = MoveLimit::depth(5).unwrap();
        assert_eq!(depth.time_bound(), None);
    }
}
