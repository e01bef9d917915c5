//! Game list rows: opening names, time controls, outcomes, search.

use std::cmp::Reverse;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::game_data::{Accuracies, ChessComGame, PlayerMetadata, ResultCode};

const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

/// Game list tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeTab {
    #[default]
    All,
    Wins,
    Losses,
    Draws,
}

impl OutcomeTab {
    pub fn accepts(self, outcome: Outcome) -> bool {
        match self {
            OutcomeTab::All => true,
            OutcomeTab::Wins => outcome == Outcome::Win,
            OutcomeTab::Losses => outcome == Outcome::Loss,
            OutcomeTab::Draws => outcome == Outcome::Draw,
        }
    }
}

pub fn player_outcome(result: ResultCode) -> Outcome {
    match result {
        ResultCode::Win => Outcome::Win,
        ResultCode::Checkmated
        | ResultCode::Resigned
        | ResultCode::Timeout
        | ResultCode::Abandoned
        | ResultCode::Lose
        | ResultCode::Kingofthehill
        | ResultCode::Threecheck
        | ResultCode::Bughousepartnerlose => Outcome::Loss,
        _ => Outcome::Draw,
    }
}

/// Opening name from the chess.com opening URL.
pub fn opening_name(eco_url: Option<&str>) -> String {
    eco_url
        .map(|url| url.trim_end_matches('/'))
        .and_then(|url| url.rsplit('/').next())
        .filter(|slug| !slug.is_empty())
        .map(|slug| slug.replace('-', " "))
        .unwrap_or_else(|| "Unknown opening".to_string())
}

fn format_seconds(secs: u64) -> String {
    if secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        format!("{secs} sec")
    }
}

/// "600+5" -> "10 min + 5 sec", "1/259200" -> "3 days per move".
pub fn format_time_control(time_control: &str) -> String {
    let tc = time_control.trim();
    if tc.is_empty() || tc == "-" {
        return "Unknown".to_string();
    }

    if let Some(per_move) = tc.strip_prefix("1/") {
        return match per_move.parse::<u64>() {
            Ok(secs) if secs >= SECONDS_PER_DAY && secs % SECONDS_PER_DAY == 0 => {
                let days = secs / SECONDS_PER_DAY;
                let unit = if days == 1 { "day" } else { "days" };
                format!("{days} {unit} per move")
            }
            Ok(secs) => format!("{} per move", format_seconds(secs)),
            Err(_) => tc.to_string(),
        };
    }

    let mut parts = tc.splitn(2, '+');
    let base = parts.next().and_then(|b| b.parse::<u64>().ok());
    let increment = parts.next().and_then(|i| i.parse::<u64>().ok());
    match (base, increment) {
        (Some(base), Some(inc)) if inc > 0 => format!("{} + {inc} sec", format_seconds(base)),
        (Some(base), _) => format_seconds(base),
        (None, _) => tc.to_string(),
    }
}

/// UTC date of a unix timestamp, "YYYY-MM-DD".
pub fn format_end_date(end_time: i64) -> String {
    DateTime::from_timestamp(end_time, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerRow {
    pub username: String,
    pub rating: i32,
    pub outcome: Outcome,
}

impl From<&PlayerMetadata> for PlayerRow {
    fn from(p: &PlayerMetadata) -> Self {
        Self {
            username: p.username.clone(),
            rating: p.rating,
            outcome: player_outcome(p.result),
        }
    }
}

/// One row of the game list.
#[derive(Debug, Clone, Serialize)]
pub struct GameRow {
    pub uuid: String,
    pub url: String,
    pub time_class: String,
    pub time_control: String,
    pub end_time: i64,
    pub end_date: String,
    pub opening: String,
    pub rated: bool,
    /// Variant name, "chess" for standard games.
    pub rules: String,
    pub standard_chess: bool,
    pub white: PlayerRow,
    pub black: PlayerRow,
    pub accuracies: Option<Accuracies>,
}

impl GameRow {
    pub fn from_record(game: &ChessComGame) -> Self {
        Self {
            uuid: game.uuid.clone(),
            url: game.url.clone(),
            time_class: game.time_class.as_str().to_string(),
            time_control: format_time_control(&game.time_control),
            end_time: game.end_time,
            end_date: format_end_date(game.end_time),
            opening: opening_name(game.eco.as_deref()),
            rated: game.rated,
            rules: game.rules.clone(),
            standard_chess: game.is_standard_chess(),
            white: PlayerRow::from(&game.white),
            black: PlayerRow::from(&game.black),
            accuracies: game.accuracies,
        }
    }
}

fn matches_query(game: &ChessComGame, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    [
        game.white.username.to_lowercase(),
        game.black.username.to_lowercase(),
        opening_name(game.eco.as_deref()).to_lowercase(),
        game.time_class.as_str().to_string(),
    ]
    .iter()
    .any(|field| field.contains(query))
}

/// Filter games by a free-text query and by `username`'s outcome.
///
/// Games `username` did not play only show under `OutcomeTab::All`.
pub fn filter_games<'a>(
    games: &'a [ChessComGame],
    query: &str,
    tab: OutcomeTab,
    username: &str,
) -> Vec<&'a ChessComGame> {
    let query = query.trim().to_lowercase();
    games
        .iter()
        .filter(|g| matches_query(g, &query))
        .filter(|g| match g.side_of(username) {
            Some(player) => tab.accepts(player_outcome(player.result)),
            None => tab == OutcomeTab::All,
        })
        .collect()
}

/// Most recently finished first. Games that ended together come out in
/// reverse provider order.
pub fn newest_first(mut games: Vec<ChessComGame>) -> Vec<ChessComGame> {
    games.reverse();
    games.sort_by_key(|g| Reverse(g.end_time));
    games
}

pub fn find_game<'a>(games: &'a [ChessComGame], uuid: &str) -> Option<&'a ChessComGame> {
    games.iter().find(|g| g.uuid == uuid)
}
