//! Position summary shown next to the board.

use std::fmt;

use serde::Serialize;

use crate::engine::{BoardSnapshot, Side};

/// Why a position is drawn by rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PositionStatus {
    Checkmate,
    Draw { reason: DrawReason },
    Stalemate,
    Check,
    Ongoing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub white_material: u32,
    pub black_material: u32,
    /// Positive when White is ahead.
    pub material_balance: i32,
    pub status: PositionStatus,
    pub side_to_move: Side,
    pub move_number: u64,
    pub text: String,
}

fn piece_value(c: char) -> u32 {
    match c.to_ascii_lowercase() {
        'p' => 1,
        'n' | 'b' => 3,
        'r' => 5,
        'q' => 9,
        _ => 0,
    }
}

/// Material per side from a FEN piece placement field.
pub fn material(piece_layout: &str) -> (u32, u32) {
    piece_layout
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .fold((0, 0), |(white, black), c| {
            if c.is_ascii_uppercase() {
                (white + piece_value(c), black)
            } else {
                (white, black + piece_value(c))
            }
        })
}

fn status_of(snapshot: &BoardSnapshot) -> PositionStatus {
    if snapshot.is_checkmate {
        PositionStatus::Checkmate
    } else if snapshot.insufficient_material {
        PositionStatus::Draw { reason: DrawReason::InsufficientMaterial }
    } else if snapshot.is_fifty_move_draw() {
        PositionStatus::Draw { reason: DrawReason::FiftyMoveRule }
    } else if snapshot.is_threefold_repetition() {
        PositionStatus::Draw { reason: DrawReason::ThreefoldRepetition }
    } else if snapshot.is_stalemate {
        PositionStatus::Stalemate
    } else if snapshot.is_check {
        PositionStatus::Check
    } else {
        PositionStatus::Ongoing
    }
}

/// Summarize a position: material, status, side to move, move number.
pub fn summarize(snapshot: &BoardSnapshot) -> AnalysisReport {
    let (white_material, black_material) = material(snapshot.piece_layout());
    let material_balance = white_material as i32 - black_material as i32;
    let status = status_of(snapshot);
    let side_to_move = snapshot.side_to_move;
    let move_number = snapshot.ply() / 2 + 1;

    let mut text = String::new();
    match material_balance {
        0 => text.push_str("Material is equal.\n"),
        d if d > 0 => text.push_str(&format!("White is ahead in material by {d} points.\n")),
        d => text.push_str(&format!("Black is ahead in material by {} points.\n", -d)),
    }
    match status {
        PositionStatus::Checkmate => text.push_str("Checkmate! Game over.\n"),
        PositionStatus::Draw { .. } => text.push_str("The game is a draw.\n"),
        PositionStatus::Stalemate => text.push_str("Stalemate! The game is a draw.\n"),
        PositionStatus::Check => text.push_str(&format!("{side_to_move} is in check.\n")),
        PositionStatus::Ongoing => {}
    }
    text.push_str(&format!("It's {side_to_move}'s turn to move.\n"));
    text.push_str(&format!("Move number: {move_number}\n"));

    AnalysisReport {
        white_material,
        black_material,
        material_balance,
        status,
        side_to_move,
        move_number,
        text,
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{PositionEngine, ShakmatyEngine};

    fn snapshot_of(fen: &str) -> BoardSnapshot {
        let engine = ShakmatyEngine;
        let pos = engine.from_fen(fen).unwrap();
        engine.snapshot(&pos, 1)
    }

    #[test]
    fn test_start_position() {
        let report = summarize(&snapshot_of(crate::pgn::STANDARD_START_FEN));
        assert_eq!(report.white_material, 39);
        assert_eq!(report.material_balance, 0);
        assert_eq!(report.status, PositionStatus::Ongoing);
        assert_eq!(
            report.text,
            "Material is equal.\nIt's White's turn to move.\nMove number: 1\n"
        );
    }

    #[test]
    fn test_material_advantage_lines() {
        // White is up a rook.
        let report = summarize(&snapshot_of("4k3/8/8/8/8/8/8/R3K3 w Q - 0 1"));
        assert_eq!(report.material_balance, 5);
        assert!(report.text.starts_with("White is ahead in material by 5 points.\n"));

        let report = summarize(&snapshot_of("q3k3/8/8/8/8/8/8/4K3 w - - 0 1"));
        assert_eq!(report.material_balance, -9);
        assert!(report.text.starts_with("Black is ahead in material by 9 points.\n"));
    }

    #[test]
    fn test_check_line_names_side_to_move() {
        let report = summarize(&snapshot_of("4k3/8/8/8/8/8/8/4K2r w - - 0 1"));
        assert_eq!(report.status, PositionStatus::Check);
        assert!(report.text.contains("White is in check.\n"));
    }

    #[test]
    fn test_stalemate() {
        let report = summarize(&snapshot_of("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1"));
        assert_eq!(report.status, PositionStatus::Stalemate);
        assert!(report.text.contains("Stalemate! The game is a draw.\n"));
    }

    #[test]
    fn test_insufficient_material_beats_stalemate() {
        // K+B v K, and Black is also stalemated.
        let report = summarize(&snapshot_of("k7/2K5/1B6/8/8/8/8/8 b - - 0 1"));
        assert_eq!(
            report.status,
            PositionStatus::Draw { reason: DrawReason::InsufficientMaterial }
        );
        assert!(report.text.contains("The game is a draw.\n"));
    }

    #[test]
    fn test_fifty_move_rule() {
        let report = summarize(&snapshot_of("4k3/8/8/8/8/8/8/R3K3 w - - 100 80"));
        assert_eq!(
            report.status,
            PositionStatus::Draw { reason: DrawReason::FiftyMoveRule }
        );
    }

    #[test]
    fn test_move_number_with_huge_counter() {
        let report = summarize(&snapshot_of("4k3/8/8/8/8/8/4P3/4K3 b - - 0 4294967295"));
        assert_eq!(report.move_number, 4_294_967_295);
        assert!(report.text.ends_with("Move number: 4294967295\n"));
    }

    #[test]
    fn test_move_number_from_plies() {
        let report = summarize(&snapshot_of("4k3/8/8/8/8/8/8/R3K3 b - - 3 30"));
        assert_eq!(report.move_number, 30);
        assert_eq!(report.side_to_move, Side::Black);
    }
}
