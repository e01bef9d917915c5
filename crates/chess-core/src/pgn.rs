//! PGN reading and writing.
//!
//! Reading goes through pgn-reader and keeps the main line only; comments,
//! NAGs and variations are dropped. Writing produces export format with the
//! Seven Tag Roster first.

use std::ops::ControlFlow;

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use serde::{Deserialize, Serialize};

use crate::engine::Side;
use crate::error::CoreError;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const SEVEN_TAG_ROSTER: [(&str, &str); 7] = [
    ("Event", "?"),
    ("Site", "?"),
    ("Date", "????.??.??"),
    ("Round", "?"),
    ("White", "?"),
    ("Black", "?"),
    ("Result", "*"),
];

const MAX_LINE_LEN: usize = 79;

/// Ordered PGN tag pairs. The Seven Tag Roster is always present and first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTags(Vec<(String, String)>);

impl Default for GameTags {
    fn default() -> Self {
        Self(
            SEVEN_TAG_ROSTER
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl GameTags {
    /// Build from tags in file order, filling in any missing roster tags.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut tags = Self::default();
        for (name, value) in pairs {
            tags.set(&name, value);
        }
        tags
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.0.push((name.to_string(), value)),
        }
    }

    /// Remove a tag. Roster tags are reset to their default instead.
    pub fn remove(&mut self, name: &str) {
        if let Some((_, default)) = SEVEN_TAG_ROSTER.iter().find(|(k, _)| *k == name) {
            self.set(name, *default);
        } else {
            self.0.retain(|(k, _)| k != name);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn result(&self) -> &str {
        self.get("Result").unwrap_or("*")
    }
}

/// One game as read from PGN text, not yet checked against the rules.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub tags: GameTags,
    pub sans: Vec<String>,
}

/// Movetext collected for the game being read.
struct MainLine {
    tags: Vec<(String, String)>,
    sans: Vec<String>,
}

struct TranscriptCollector;

impl Visitor for TranscriptCollector {
    type Tags = Vec<(String, String)>;
    type Movetext = MainLine;
    type Output = Transcript;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(Vec::new())
    }

    fn tag(&mut self, tags: &mut Self::Tags, name: &[u8], value: RawTag<'_>) -> ControlFlow<Self::Output> {
        tags.push((
            String::from_utf8_lossy(name).into_owned(),
            value.decode_utf8_lossy().into_owned(),
        ));
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(MainLine {
            tags,
            sans: Vec::new(),
        })
    }

    fn san(&mut self, movetext: &mut Self::Movetext, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        movetext.sans.push(san_plus.san.to_string());
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, _movetext: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true)) // main line only
    }

    fn end_game(&mut self, movetext: Self::Movetext) -> Self::Output {
        Transcript {
            tags: GameTags::from_pairs(movetext.tags),
            sans: movetext.sans,
        }
    }
}

/// What a pass over the raw text found outside the parser's view.
#[derive(Debug, Default)]
struct MovetextScan {
    has_tags: bool,
    has_result: bool,
}

const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

fn is_movetext_token(token: &str) -> bool {
    if RESULT_TOKENS.contains(&token) {
        return true;
    }
    if let Some(nag) = token.strip_prefix('$') {
        return !nag.is_empty() && nag.bytes().all(|b| b.is_ascii_digit());
    }

    // "12.", "12...", and "12.e4" all carry a move number.
    let digits = token.bytes().take_while(u8::is_ascii_digit).count();
    let after_number = &token[digits..];
    let san = if digits > 0 && after_number.starts_with('.') {
        after_number.trim_start_matches('.')
    } else {
        token
    };

    let san = san.trim_end_matches(['!', '?']);
    san.is_empty() || matches!(san, "0-0" | "0-0-0") || san.parse::<SanPlus>().is_ok()
}

fn check_token(token: &mut String, scan: &mut MovetextScan) -> Result<(), CoreError> {
    if token.is_empty() {
        return Ok(());
    }
    if !is_movetext_token(token) {
        return Err(CoreError::MalformedNotation(format!("unexpected token '{token}'")));
    }
    scan.has_result |= RESULT_TOKENS.contains(&token.as_str());
    token.clear();
    Ok(())
}

/// Check every movetext token, since the parser silently skips what it
/// cannot read. Tag pairs, comments, escape lines and variation brackets are
/// stepped over.
fn scan_movetext(text: &str) -> Result<MovetextScan, CoreError> {
    let mut scan = MovetextScan::default();
    let mut token = String::new();
    let mut chars = text.chars();
    let mut line_start = true;
    while let Some(c) = chars.next() {
        match c {
            '[' | '%' if line_start && token.is_empty() => {
                scan.has_tags |= c == '[';
                chars.by_ref().find(|&c| c == '\n');
                line_start = true;
                continue;
            }
            '{' => {
                check_token(&mut token, &mut scan)?;
                if chars.by_ref().find(|&c| c == '}').is_none() {
                    return Err(CoreError::MalformedNotation("unterminated comment".into()));
                }
            }
            ';' => {
                check_token(&mut token, &mut scan)?;
                chars.by_ref().find(|&c| c == '\n');
                line_start = true;
                continue;
            }
            '(' | ')' => check_token(&mut token, &mut scan)?,
            c if c.is_whitespace() => check_token(&mut token, &mut scan)?,
            c => token.push(c),
        }
        line_start = c == '\n' || (line_start && c.is_whitespace());
    }
    check_token(&mut token, &mut scan)?;
    Ok(scan)
}

/// Read the first game of a PGN text.
///
/// Text with neither tags, moves nor a result token is rejected, as is any
/// token that is not movetext and a `SetUp` header announcing a position
/// without a `FEN` tag.
pub fn read_pgn(text: &str) -> Result<Transcript, CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::MalformedNotation("empty PGN".into()));
    }
    let scan = scan_movetext(text)?;

    let mut reader = Reader::new(text.as_bytes());
    let game = reader
        .read_game(&mut TranscriptCollector)
        .map_err(|e| CoreError::MalformedNotation(e.to_string()))?
        .ok_or_else(|| CoreError::MalformedNotation("no game found".into()))?;

    if game.sans.is_empty() && !scan.has_tags && !scan.has_result {
        return Err(CoreError::MalformedNotation("no tags or moves found".into()));
    }

    if game.tags.get("SetUp") == Some("1") && game.tags.get("FEN").is_none() {
        return Err(CoreError::MalformedNotation("SetUp without FEN".into()));
    }

    Ok(game)
}

fn escape_tag_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Write a game in PGN export format.
///
/// `first_move_number` and `first_side` describe the position the moves
/// start from, so games loaded from a FEN are numbered correctly.
pub fn write_pgn(tags: &GameTags, first_move_number: u64, first_side: Side, sans: &[&str]) -> String {
    let mut out = String::new();
    for (name, value) in tags.iter() {
        out.push_str(&format!("[{} \"{}\"]\n", name, escape_tag_value(value)));
    }
    out.push('\n');

    let mut tokens: Vec<String> = Vec::with_capacity(sans.len() * 3 / 2 + 1);
    let mut number = first_move_number;
    let mut side = first_side;
    for (i, san) in sans.iter().enumerate() {
        match side {
            Side::White => tokens.push(format!("{number}.")),
            Side::Black if i == 0 => tokens.push(format!("{number}...")),
            Side::Black => {}
        }
        tokens.push(san.to_string());
        if side == Side::Black {
            number += 1;
        }
        side = side.opposite();
    }
    tokens.push(tags.result().to_string());

    let mut line_len = 0;
    for token in tokens {
        if line_len > 0 && line_len + 1 + token.len() > MAX_LINE_LEN {
            out.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        line_len += token.len();
        out.push_str(&token);
    }
    out.push('\n');
    out
}
