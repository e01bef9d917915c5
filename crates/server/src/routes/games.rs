use std::sync::{Arc, LazyLock};

use axum::{extract::Path, extract::Query, Extension, Json};
use chess_core::game_data::ChessComGame;
use chess_core::game_list::{filter_games, find_game, newest_first, GameRow, OutcomeTab};
use chess_core::MoveHistory;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::clients::chess_com::GameProvider;
use crate::error::AppError;
use crate::sessions::{SessionStore, SessionView};

static USERNAME_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{3,25}$").ok());

#[derive(Deserialize)]
pub struct GameListQuery {
    pub q: Option<String>,
    #[serde(default)]
    pub tab: OutcomeTab,
}

fn validate_archive(username: &str, month: u32) -> Result<(), AppError> {
    let valid_name = USERNAME_RE
        .as_ref()
        .is_some_and(|re| re.is_match(username));
    if !valid_name {
        return Err(AppError::BadRequest(format!("Invalid chess.com username: {username}")));
    }
    if !(1..=12).contains(&month) {
        return Err(AppError::BadRequest(format!("Invalid month: {month}")));
    }
    Ok(())
}

async fn month_games<P: GameProvider>(
    provider: &P,
    username: &str,
    year: i32,
    month: u32,
) -> Result<Vec<ChessComGame>, AppError> {
    validate_archive(username, month)?;
    let games = provider.fetch_month(username, year, month).await?;
    Ok(newest_first(games))
}

async fn one_game<P: GameProvider>(
    provider: &P,
    username: &str,
    year: i32,
    month: u32,
    uuid: &str,
) -> Result<ChessComGame, AppError> {
    let games = month_games(provider, username, year, month).await?;
    find_game(&games, uuid)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Game not found".into()))
}

/// GET /api/players/{username}/games/{year}/{month}
pub async fn list_games<P: GameProvider + Send + Sync + 'static>(
    Extension(provider): Extension<Arc<P>>,
    Path((username, year, month)): Path<(String, i32, u32)>,
    Query(q): Query<GameListQuery>,
) -> Result<Json<JsonValue>, AppError> {
    let games = month_games(provider.as_ref(), &username, year, month).await?;
    let query = q.q.unwrap_or_default();
    let rows: Vec<GameRow> = filter_games(&games, &query, q.tab, &username)
        .into_iter()
        .map(GameRow::from_record)
        .collect();

    Ok(Json(serde_json::json!({
        "username": username,
        "year": year,
        "month": month,
        "total": games.len(),
        "games": rows,
    })))
}

/// GET /api/players/{username}/games/{year}/{month}/{uuid}
pub async fn get_game<P: GameProvider + Send + Sync + 'static>(
    Extension(provider): Extension<Arc<P>>,
    Path((username, year, month, uuid)): Path<(String, i32, u32, String)>,
) -> Result<Json<ChessComGame>, AppError> {
    let game = one_game(provider.as_ref(), &username, year, month, &uuid).await?;
    Ok(Json(game))
}

/// POST /api/players/{username}/games/{year}/{month}/{uuid}/session
pub async fn open_game_session<P: GameProvider + Send + Sync + 'static>(
    Extension(provider): Extension<Arc<P>>,
    Extension(store): Extension<Arc<SessionStore>>,
    Path((username, year, month, uuid)): Path<(String, i32, u32, String)>,
) -> Result<Json<SessionView>, AppError> {
    let game = one_game(provider.as_ref(), &username, year, month, &uuid).await?;
    let mut history = MoveHistory::default();
    history.load_from_notation(&game.pgn)?;
    let view = store.create(history, Some(game.url))?;
    Ok(Json(view))
}
