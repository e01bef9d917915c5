//! Move history tracker.
//!
//! Owns the moves played in a review session and a cursor into them. The
//! board at the cursor is never kept around: it is rebuilt by replaying the
//! history from the initial position whenever someone asks for it.

use serde::Serialize;
use tracing::debug;

use crate::candidate::MoveCandidate;
use crate::engine::{BoardSnapshot, Move, PositionEngine, ShakmatyEngine, Side};
use crate::error::CoreError;
use crate::pgn::{GameTags, STANDARD_START_FEN};

/// A move as listed in the viewer, e.g. "1. e4" or "1... e5".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberedMove {
    pub index: usize,
    pub label: String,
    pub san: String,
}

pub struct MoveHistory<E: PositionEngine = ShakmatyEngine> {
    engine: E,
    initial: E::State,
    /// Present when the game did not start from the standard position.
    initial_fen: Option<String>,
    moves: Vec<Move>,
    /// -1 is the initial position, otherwise an index into `moves`.
    cursor: isize,
    tags: GameTags,
}

impl Default for MoveHistory<ShakmatyEngine> {
    fn default() -> Self {
        Self::new(ShakmatyEngine)
    }
}

impl<E: PositionEngine> MoveHistory<E> {
    pub fn new(engine: E) -> Self {
        let initial = engine.new_game();
        Self {
            engine,
            initial,
            initial_fen: None,
            moves: Vec::new(),
            cursor: -1,
            tags: GameTags::default(),
        }
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn cursor(&self) -> isize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn metadata(&self) -> &GameTags {
        &self.tags
    }

    pub fn initial_fen(&self) -> Option<&str> {
        self.initial_fen.as_deref()
    }

    fn last_index(&self) -> isize {
        self.moves.len() as isize - 1
    }

    /// Replay moves `0..=index` and return the resulting state with the
    /// number of times its position occurred along the way.
    fn replay(&self, index: isize) -> Result<(E::State, usize), CoreError> {
        let mut state = self.initial.clone();
        let mut keys = vec![self.engine.position_key(&state)];

        for mv in self.moves.iter().take((index + 1).max(0) as usize) {
            let (next, _) = self
                .engine
                .apply_move(&state, &MoveCandidate::san(mv.san.as_str()))?;
            state = next;
            keys.push(self.engine.position_key(&state));
        }

        let current = keys.last().cloned().unwrap_or_default();
        let repetitions = keys.iter().filter(|k| **k == current).count();
        Ok((state, repetitions))
    }

    /// Board at the cursor.
    pub fn snapshot(&self) -> Result<BoardSnapshot, CoreError> {
        let (state, repetitions) = self.replay(self.cursor)?;
        Ok(self.engine.snapshot(&state, repetitions))
    }

    /// Play `candidate` at the cursor.
    ///
    /// Moves after the cursor are discarded before the new move is appended.
    pub fn apply_move(&mut self, candidate: &MoveCandidate) -> Result<Move, CoreError> {
        let (state, _) = self.replay(self.cursor)?;
        let (_, mv) = self.engine.apply_move(&state, candidate).map_err(|e| {
            debug!(candidate = %candidate, error = %e, "Rejected move");
            match e {
                CoreError::InvalidMove(_) => e,
                other => CoreError::InvalidMove(other.to_string()),
            }
        })?;

        let keep = (self.cursor + 1) as usize;
        if keep < self.moves.len() {
            debug!(dropped = self.moves.len() - keep, "Truncating history after cursor");
        }
        self.moves.truncate(keep);
        self.moves.push(mv.clone());
        self.cursor = self.last_index();
        // The game is no longer the one the Result tag described.
        self.tags.set("Result", "*");

        Ok(mv)
    }

    /// Replace the whole history with the game in `text`.
    pub fn load_from_notation(&mut self, text: &str) -> Result<(), CoreError> {
        let loaded = self.engine.load_transcript(text).map_err(|e| {
            debug!(error = %e, "Rejected PGN");
            match e {
                CoreError::MalformedNotation(_) => e,
                other => CoreError::MalformedNotation(other.to_string()),
            }
        })?;

        debug!(moves = loaded.moves.len(), "Loaded PGN");
        self.initial = loaded.initial;
        self.initial_fen = loaded
            .initial_fen
            .filter(|fen| fen.trim() != STANDARD_START_FEN);
        self.moves = loaded.moves;
        self.cursor = self.last_index();
        self.tags = loaded.tags;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.initial = self.engine.new_game();
        self.initial_fen = None;
        self.moves.clear();
        self.cursor = -1;
        self.tags = GameTags::default();
    }

    /// Move the cursor to `index`, -1 being the initial position.
    pub fn seek(&mut self, index: isize) -> Result<BoardSnapshot, CoreError> {
        if index < -1 || index > self.last_index() {
            return Err(CoreError::OutOfRange {
                index,
                len: self.moves.len(),
            });
        }
        let (state, repetitions) = self.replay(index)?;
        self.cursor = index;
        Ok(self.engine.snapshot(&state, repetitions))
    }

    fn seek_clamped(&mut self, index: isize) -> Result<BoardSnapshot, CoreError> {
        self.seek(index.clamp(-1, self.last_index()))
    }

    pub fn step_back(&mut self) -> Result<BoardSnapshot, CoreError> {
        self.seek_clamped(self.cursor - 1)
    }

    pub fn step_forward(&mut self) -> Result<BoardSnapshot, CoreError> {
        self.seek_clamped(self.cursor + 1)
    }

    pub fn seek_start(&mut self) -> Result<BoardSnapshot, CoreError> {
        self.seek(-1)
    }

    pub fn seek_end(&mut self) -> Result<BoardSnapshot, CoreError> {
        self.seek(self.last_index())
    }

    /// Export the full history (not just up to the cursor) as PGN.
    pub fn export_notation(&self) -> Result<String, CoreError> {
        let mut tags = self.tags.clone();
        match &self.initial_fen {
            Some(fen) => {
                tags.set("SetUp", "1");
                tags.set("FEN", fen.as_str());
            }
            None => {
                tags.remove("SetUp");
                tags.remove("FEN");
            }
        }

        let (final_state, repetitions) = self.replay(self.last_index())?;
        if let Some(result) = self.engine.snapshot(&final_state, repetitions).result_token() {
            tags.set("Result", result);
        }

        Ok(self.engine.to_transcript(&tags, &self.initial, &self.moves))
    }

    pub fn numbered_moves(&self) -> Vec<NumberedMove> {
        let start_black = self.engine.turn_of(&self.initial) == Side::Black;
        let first_number = u64::from(self.engine.full_move_number(&self.initial));

        self.moves
            .iter()
            .enumerate()
            .map(|(index, mv)| {
                let ply = index + usize::from(start_black);
                let number = first_number + (ply / 2) as u64;
                let label = if ply % 2 == 0 {
                    format!("{number}. {}", mv.san)
                } else {
                    format!("{number}... {}", mv.san)
                };
                NumberedMove {
                    index,
                    label,
                    san: mv.san.clone(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play_all(history: &mut MoveHistory, sans: &[&str]) {
        for san in sans {
            history.apply_move(&MoveCandidate::san(*san)).unwrap();
        }
    }

    #[test]
    fn test_new_history_is_at_start() {
        let history = MoveHistory::default();
        assert!(history.is_empty());
        assert_eq!(history.cursor(), -1);
        let snap = history.snapshot().unwrap();
        assert_eq!(snap.fen, STANDARD_START_FEN);
    }

    #[test]
    fn test_apply_advances_cursor() {
        let mut history = MoveHistory::default();
        play_all(&mut history, &["e4", "e5", "Nf3"]);
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);
        assert_eq!(history.snapshot().unwrap().side_to_move, Side::Black);
    }

    #[test]
    fn test_invalid_move_leaves_state() {
        let mut history = MoveHistory::default();
        play_all(&mut history, &["e4"]);
        let before = history.snapshot().unwrap();

        let err = history
            .apply_move(&MoveCandidate::from_uci("e7e3").unwrap())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidMove(_)));
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 0);
        assert_eq!(history.snapshot().unwrap(), before);
    }

    #[test]
    fn test_seek_out_of_range() {
        let mut history = MoveHistory::default();
        play_all(&mut history, &["d4", "d5"]);
        assert_eq!(
            history.seek(2).unwrap_err(),
            CoreError::OutOfRange { index: 2, len: 2 }
        );
        assert!(history.seek(-2).is_err());
        assert_eq!(history.cursor(), 1);
    }

    #[test]
    fn test_seek_start_gives_initial_position() {
        let mut history = MoveHistory::default();
        play_all(&mut history, &["d4", "d5"]);
        let snap = history.seek(-1).unwrap();
        assert_eq!(snap.fen, STANDARD_START_FEN);
        assert_eq!(history.cursor(), -1);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_stepping_is_clamped() {
        let mut history = MoveHistory::default();
        history.step_back().unwrap();
        history.step_forward().unwrap();
        assert_eq!(history.cursor(), -1);

        play_all(&mut history, &["c4", "e5"]);
        history.step_forward().unwrap();
        assert_eq!(history.cursor(), 1);
        history.step_back().unwrap();
        history.step_back().unwrap();
        history.step_back().unwrap();
        assert_eq!(history.cursor(), -1);
        history.seek_end().unwrap();
        assert_eq!(history.cursor(), 1);
    }

    #[test]
    fn test_apply_after_seek_truncates() {
        let mut history = MoveHistory::default();
        play_all(&mut history, &["e4", "e5", "Nf3", "Nc6"]);
        history.seek(1).unwrap();
        history.apply_move(&MoveCandidate::san("Bc4")).unwrap();

        let sans: Vec<&str> = history.moves().iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Bc4"]);
        assert_eq!(history.cursor(), 2);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut history = MoveHistory::default();
        history
            .load_from_notation("[White \"a\"]\n\n1. e4 e5 *")
            .unwrap();
        history.reset();
        assert!(history.is_empty());
        assert_eq!(history.cursor(), -1);
        assert_eq!(history.metadata(), &GameTags::default());
    }

    #[test]
    fn test_malformed_pgn_leaves_state() {
        let mut history = MoveHistory::default();
        play_all(&mut history, &["e4"]);

        let err = history.load_from_notation("1. e4 e5 2. Ke3 *").unwrap_err();
        assert!(matches!(err, CoreError::MalformedNotation(_)));
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn test_threefold_repetition_counted() {
        let mut history = MoveHistory::default();
        play_all(
            &mut history,
            &["Nf3", "Nf6", "Ng1", "Ng8", "Nf3", "Nf6", "Ng1", "Ng8"],
        );
        let snap = history.snapshot().unwrap();
        assert_eq!(snap.repetitions, 3);
        assert!(snap.is_draw_by_rule());

        let earlier = history.seek(3).unwrap();
        assert_eq!(earlier.repetitions, 2);
    }

    #[test]
    fn test_numbered_moves_labels() {
        let mut history = MoveHistory::default();
        play_all(&mut history, &["e4", "e5", "Nf3"]);
        let labels: Vec<String> = history.numbered_moves().into_iter().map(|m| m.label).collect();
        assert_eq!(labels, vec!["1. e4", "1... e5", "2. Nf3"]);
    }

    #[test]
    fn test_export_from_fen_start() {
        let mut history = MoveHistory::default();
        history
            .load_from_notation(
                "[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/8/R3K3 b Q - 0 30\"]\n\n30... Kd7 31. Ra7+ *",
            )
            .unwrap();
        let labels: Vec<String> = history.numbered_moves().into_iter().map(|m| m.label).collect();
        assert_eq!(labels, vec!["30... Kd7", "31. Ra7+"]);

        let pgn = history.export_notation().unwrap();
        assert!(pgn.contains("[FEN \"4k3/8/8/8/8/8/8/R3K3 b Q - 0 30\"]"));
        assert!(pgn.contains("30... Kd7 31. Ra7+ *"));
    }
}
