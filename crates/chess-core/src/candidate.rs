//! Move candidates as submitted by the board viewer.
//!
//! A candidate is validated here (square names, promotion role) before the
//! position engine ever sees it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A board square, `file` 0..=7 for a..h and `rank` 0..=7 for 1..8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coord {
    file: u8,
    rank: u8,
}

impl Coord {
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then_some(Self { file, rank })
    }

    pub fn file(self) -> u8 {
        self.file
    }

    pub fn rank(self) -> u8 {
        self.rank
    }
}

impl FromStr for Coord {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        if bytes.len() != 2 {
            return Err(CoreError::InvalidMove(format!("'{s}' is not a square")));
        }
        let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Coord::new(file, rank).ok_or_else(|| CoreError::InvalidMove(format!("'{s}' is not a square")))
    }
}

impl TryFrom<String> for Coord {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Coord> for String {
    fn from(c: Coord) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank + 1)
    }
}

/// Pieces a pawn may promote to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PieceKind {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl PieceKind {
    pub fn to_char(self) -> char {
        match self {
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
        }
    }
}

impl FromStr for PieceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "q" | "queen" => Ok(PieceKind::Queen),
            "r" | "rook" => Ok(PieceKind::Rook),
            "b" | "bishop" => Ok(PieceKind::Bishop),
            "n" | "knight" => Ok(PieceKind::Knight),
            _ => Err(CoreError::InvalidMove(format!("cannot promote to '{s}'"))),
        }
    }
}

impl TryFrom<String> for PieceKind {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PieceKind> for String {
    fn from(p: PieceKind) -> Self {
        p.to_char().to_string()
    }
}

/// A move the user wants to play.
///
/// Either a drag from one square to another or a SAN string. The promotion
/// is optional: a pawn reaching the last rank without one becomes a queen,
/// and it is ignored on moves that do not promote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoveCandidate {
    Squares {
        from: Coord,
        to: Coord,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        promotion: Option<PieceKind>,
    },
    San {
        san: String,
    },
}

impl MoveCandidate {
    pub fn squares(from: Coord, to: Coord) -> Self {
        MoveCandidate::Squares { from, to, promotion: None }
    }

    pub fn san(san: impl Into<String>) -> Self {
        MoveCandidate::San { san: san.into() }
    }

    /// Parse "e2e4" / "e7e8q" style input.
    pub fn from_uci(uci: &str) -> Result<Self, CoreError> {
        let uci = uci.trim();
        if !(4..=5).contains(&uci.len()) || !uci.is_ascii() {
            return Err(CoreError::InvalidMove(format!("'{uci}' is not a move")));
        }
        let from = uci[0..2].parse()?;
        let to = uci[2..4].parse()?;
        let promotion = match uci.get(4..) {
            Some(p) if !p.is_empty() => Some(p.parse()?),
            _ => None,
        };
        Ok(MoveCandidate::Squares { from, to, promotion })
    }
}

impl fmt::Display for MoveCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveCandidate::Squares { from, to, promotion } => {
                write!(f, "{from}{to}")?;
                if let Some(p) = promotion {
                    write!(f, "{}", p.to_char())?;
                }
                Ok(())
            }
            MoveCandidate::San { san } => f.write_str(san),
        }
    }
}
