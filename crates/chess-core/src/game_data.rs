//! Game records as served by the chess.com monthly archive endpoint.

use serde::{Deserialize, Serialize};

/// Per-player result code. Codes this crate does not know map to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultCode {
    Win,
    Checkmated,
    Agreed,
    Repetition,
    Timeout,
    Resigned,
    Stalemate,
    Lose,
    Insufficient,
    #[serde(rename = "50move")]
    FiftyMove,
    Abandoned,
    Kingofthehill,
    Threecheck,
    Timevsinsufficient,
    Bughousepartnerlose,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeClass {
    Bullet,
    Blitz,
    Rapid,
    Daily,
    #[serde(other)]
    Unknown,
}

impl TimeClass {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeClass::Bullet => "bullet",
            TimeClass::Blitz => "blitz",
            TimeClass::Rapid => "rapid",
            TimeClass::Daily => "daily",
            TimeClass::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerMetadata {
    pub username: String,
    pub rating: i32,
    pub result: ResultCode,
    #[serde(rename = "@id", default)]
    pub profile_url: String,
    #[serde(default)]
    pub uuid: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Accuracies {
    pub white: f64,
    pub black: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChessComGame {
    pub url: String,
    #[serde(default)]
    pub pgn: String,
    #[serde(default)]
    pub time_control: String,
    pub end_time: i64,
    #[serde(default)]
    pub rated: bool,
    #[serde(default)]
    pub tcn: Option<String>,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub initial_setup: Option<String>,
    #[serde(default)]
    pub fen: Option<String>,
    pub time_class: TimeClass,
    #[serde(default = "default_rules")]
    pub rules: String,
    pub white: PlayerMetadata,
    pub black: PlayerMetadata,
    /// Opening page URL, e.g. ".../openings/Sicilian-Defense-Najdorf-Variation".
    #[serde(default)]
    pub eco: Option<String>,
    #[serde(default)]
    pub accuracies: Option<Accuracies>,
}

fn default_rules() -> String {
    "chess".to_string()
}

/// Body of `GET /pub/player/{username}/games/{YYYY}/{MM}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonthlyArchive {
    #[serde(default)]
    pub games: Vec<ChessComGame>,
}

impl ChessComGame {
    /// The player record for `username` (case-insensitive), if they played.
    pub fn side_of(&self, username: &str) -> Option<&PlayerMetadata> {
        if self.white.username.eq_ignore_ascii_case(username) {
            Some(&self.white)
        } else if self.black.username.eq_ignore_ascii_case(username) {
            Some(&self.black)
        } else {
            None
        }
    }

    pub fn is_standard_chess(&self) -> bool {
        self.rules == "chess"
    }
}
