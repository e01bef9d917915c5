//! Game review core.
//!
//! Move history navigation over a pluggable position engine, position
//! summaries, PGN reading/writing and chess.com game list helpers.

pub mod candidate;
pub mod engine;
pub mod error;
pub mod game_data;
pub mod game_list;
pub mod history;
pub mod pgn;
pub mod summary;

pub use candidate::{Coord, MoveCandidate, PieceKind};
pub use engine::{BoardSnapshot, Move, PositionEngine, ShakmatyEngine, Side};
pub use error::CoreError;
pub use history::MoveHistory;
pub use summary::{summarize, AnalysisReport};
