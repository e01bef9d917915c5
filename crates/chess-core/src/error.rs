//! Core error types

use thiserror::Error;

/// Failures reported by the move history tracker.
///
/// Every variant leaves the tracker exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Invalid PGN format: {0}")]
    MalformedNotation(String),

    #[error("Move index {index} out of range (history has {len} moves)")]
    OutOfRange { index: isize, len: usize },
}
