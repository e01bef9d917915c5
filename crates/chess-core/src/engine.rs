//! Position engine seam.
//!
//! The rules of chess live behind [`PositionEngine`]; the tracker and the
//! summarizer only ever talk to this trait. [`ShakmatyEngine`] is the
//! implementation used everywhere outside of tests.

use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::{San, SanPlus};
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, File, Move as ChessMove, Position, Rank, Role, Square};

use crate::candidate::{Coord, MoveCandidate, PieceKind};
use crate::error::CoreError;
use crate::pgn::{self, GameTags};

/// Plies without a capture or pawn move after which the game is drawn.
const FIFTY_MOVE_PLIES: u32 = 100;

/// A played ply. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    /// SAN including the check/mate suffix, e.g. "Qh4#".
    pub san: String,
    /// UCI form, e.g. "d8h4", for square highlighting.
    pub uci: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn name(self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Board state at a point in the move history.
///
/// Derived by replay and never stored by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    pub fen: String,
    pub side_to_move: Side,
    pub full_move_number: u32,
    pub halfmove_clock: u32,
    /// Times this position (placement, side, castling, ep) occurred in the replayed line.
    pub repetitions: usize,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
    pub insufficient_material: bool,
}

impl BoardSnapshot {
    /// Piece placement field of the FEN.
    pub fn piece_layout(&self) -> &str {
        self.fen.split(' ').next().unwrap_or_default()
    }

    /// Plies played since the start of the game.
    pub fn ply(&self) -> u64 {
        let black = u64::from(self.side_to_move == Side::Black);
        u64::from(self.full_move_number.saturating_sub(1)) * 2 + black
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= FIFTY_MOVE_PLIES
    }

    pub fn is_threefold_repetition(&self) -> bool {
        self.repetitions >= 3
    }

    /// Drawn by rule: insufficient material, fifty moves, or threefold repetition.
    pub fn is_draw_by_rule(&self) -> bool {
        self.insufficient_material || self.is_fifty_move_draw() || self.is_threefold_repetition()
    }

    /// PGN result token for a finished position, `None` while play continues.
    pub fn result_token(&self) -> Option<&'static str> {
        if self.is_checkmate {
            Some(match self.side_to_move {
                Side::White => "0-1",
                Side::Black => "1-0",
            })
        } else if self.is_draw_by_rule() || self.is_stalemate {
            Some("1/2-1/2")
        } else {
            None
        }
    }
}

/// A transcript decoded and validated against the rules.
#[derive(Debug, Clone)]
pub struct LoadedGame<S> {
    pub tags: GameTags,
    pub initial: S,
    /// Set when the game starts from a `[FEN]` tag.
    pub initial_fen: Option<String>,
    pub moves: Vec<Move>,
}

/// Rules collaborator: legal-move application, encodings, terminal states.
pub trait PositionEngine {
    type State: Clone;

    fn new_game(&self) -> Self::State;

    fn from_fen(&self, fen: &str) -> Result<Self::State, CoreError>;

    /// Validate `candidate` against `state` and return the position after it.
    fn apply_move(
        &self,
        state: &Self::State,
        candidate: &MoveCandidate,
    ) -> Result<(Self::State, Move), CoreError>;

    fn fen(&self, state: &Self::State) -> String;

    fn turn_of(&self, state: &Self::State) -> Side;

    fn is_check(&self, state: &Self::State) -> bool;

    fn is_checkmate(&self, state: &Self::State) -> bool;

    fn is_stalemate(&self, state: &Self::State) -> bool;

    fn is_insufficient_material(&self, state: &Self::State) -> bool;

    fn halfmove_clock(&self, state: &Self::State) -> u32;

    fn full_move_number(&self, state: &Self::State) -> u32;

    fn piece_layout(&self, state: &Self::State) -> String {
        self.fen(state).split(' ').next().unwrap_or_default().to_string()
    }

    /// Draw by rule that can be told from a single position.
    /// Repetition needs the line and is counted by the caller.
    fn is_draw(&self, state: &Self::State) -> bool {
        self.is_insufficient_material(state) || self.halfmove_clock(state) >= FIFTY_MOVE_PLIES
    }

    /// Key identifying a position for repetition counting (no move counters).
    fn position_key(&self, state: &Self::State) -> String {
        self.fen(state).split_whitespace().take(4).collect::<Vec<_>>().join(" ")
    }

    fn snapshot(&self, state: &Self::State, repetitions: usize) -> BoardSnapshot {
        BoardSnapshot {
            fen: self.fen(state),
            side_to_move: self.turn_of(state),
            full_move_number: self.full_move_number(state),
            halfmove_clock: self.halfmove_clock(state),
            repetitions,
            is_check: self.is_check(state),
            is_checkmate: self.is_checkmate(state),
            is_stalemate: self.is_stalemate(state),
            insufficient_material: self.is_insufficient_material(state),
        }
    }

    /// Decode a PGN transcript and check every main-line move.
    fn load_transcript(&self, text: &str) -> Result<LoadedGame<Self::State>, CoreError> {
        let transcript = pgn::read_pgn(text)?;

        let initial_fen = transcript.tags.get("FEN").map(str::to_string);
        let initial = match &initial_fen {
            Some(fen) => self
                .from_fen(fen)
                .map_err(|e| CoreError::MalformedNotation(format!("bad FEN tag: {e}")))?,
            None => self.new_game(),
        };

        let mut state = initial.clone();
        let mut moves = Vec::with_capacity(transcript.sans.len());
        for (ply, san) in transcript.sans.iter().enumerate() {
            let (next, mv) = self
                .apply_move(&state, &MoveCandidate::san(san.as_str()))
                .map_err(|_| {
                    CoreError::MalformedNotation(format!("illegal move '{san}' at ply {}", ply + 1))
                })?;
            state = next;
            moves.push(mv);
        }

        Ok(LoadedGame {
            tags: transcript.tags,
            initial,
            initial_fen,
            moves,
        })
    }

    /// Serialize a move list into PGN, starting from `initial`.
    fn to_transcript(&self, tags: &GameTags, initial: &Self::State, moves: &[Move]) -> String {
        let sans: Vec<&str> = moves.iter().map(|m| m.san.as_str()).collect();
        pgn::write_pgn(
            tags,
            u64::from(self.full_move_number(initial)),
            self.turn_of(initial),
            &sans,
        )
    }
}

/// [`PositionEngine`] backed by shakmaty.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyEngine;

fn to_square(c: Coord) -> Square {
    Square::from_coords(File::new(u32::from(c.file())), Rank::new(u32::from(c.rank())))
}

fn to_role(p: PieceKind) -> Role {
    match p {
        PieceKind::Queen => Role::Queen,
        PieceKind::Rook => Role::Rook,
        PieceKind::Bishop => Role::Bishop,
        PieceKind::Knight => Role::Knight,
    }
}

/// Where the king lands when castling (g- or c-file).
fn castle_destination(mv: &ChessMove) -> Option<Square> {
    match mv {
        ChessMove::Castle { king, rook } => {
            let file = if rook.file() > king.file() { File::G } else { File::C };
            Some(Square::from_coords(file, king.rank()))
        }
        _ => None,
    }
}

fn side_of(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}

impl ShakmatyEngine {
    fn resolve(&self, pos: &Chess, candidate: &MoveCandidate) -> Result<ChessMove, CoreError> {
        match candidate {
            MoveCandidate::San { san } => {
                let parsed: SanPlus = san
                    .trim()
                    .parse()
                    .map_err(|e| CoreError::InvalidMove(format!("'{san}': {e}")))?;
                parsed
                    .san
                    .to_move(pos)
                    .map_err(|e| CoreError::InvalidMove(format!("'{san}': {e}")))
            }
            MoveCandidate::Squares { from, to, promotion } => {
                let from_sq = to_square(*from);
                let to_sq = to_square(*to);
                let wanted = promotion.map(to_role);

                pos.legal_moves()
                    .into_iter()
                    .filter(|m| m.from() == Some(from_sq))
                    .filter(|m| m.to() == to_sq || castle_destination(m) == Some(to_sq))
                    .find(|m| match (m.promotion(), wanted) {
                        (None, _) => true,
                        (Some(role), None) => role == Role::Queen,
                        (Some(role), Some(want)) => role == want,
                    })
                    .ok_or_else(|| CoreError::InvalidMove(format!("{candidate} is not legal here")))
            }
        }
    }
}

impl PositionEngine for ShakmatyEngine {
    type State = Chess;

    fn new_game(&self) -> Chess {
        Chess::default()
    }

    fn from_fen(&self, fen: &str) -> Result<Chess, CoreError> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| CoreError::MalformedNotation(format!("'{fen}': {e}")))?;
        parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| CoreError::MalformedNotation(format!("'{fen}': {e}")))
    }

    fn apply_move(&self, state: &Chess, candidate: &MoveCandidate) -> Result<(Chess, Move), CoreError> {
        let mv = self.resolve(state, candidate)?;

        let san = San::from_move(state, mv.clone()).to_string();
        let uci = mv.to_uci(CastlingMode::Standard).to_string();

        let mut next = state.clone();
        next.play_unchecked(mv);

        let suffix = if next.is_checkmate() {
            "#"
        } else if next.is_check() {
            "+"
        } else {
            ""
        };

        Ok((next, Move { san: format!("{san}{suffix}"), uci }))
    }

    fn fen(&self, state: &Chess) -> String {
        Fen::from_position(state, EnPassantMode::Legal).to_string()
    }

    fn turn_of(&self, state: &Chess) -> Side {
        side_of(state.turn())
    }

    fn is_check(&self, state: &Chess) -> bool {
        state.is_check()
    }

    fn is_checkmate(&self, state: &Chess) -> bool {
        state.is_checkmate()
    }

    fn is_stalemate(&self, state: &Chess) -> bool {
        state.is_stalemate()
    }

    fn is_insufficient_material(&self, state: &Chess) -> bool {
        state.is_insufficient_material()
    }

    fn halfmove_clock(&self, state: &Chess) -> u32 {
        state.halfmoves()
    }

    fn full_move_number(&self, state: &Chess) -> u32 {
        state.fullmoves().get()
    }
}
