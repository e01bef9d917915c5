use std::sync::Arc;

use axum::{extract::Path, Extension, Json};
use chess_core::{MoveCandidate, MoveHistory};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::sessions::{SessionStore, SessionView};

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub pgn: Option<String>,
}

#[derive(Deserialize)]
pub struct SeekRequest {
    pub index: isize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepDirection {
    Back,
    Forward,
    Start,
    End,
}

#[derive(Deserialize)]
pub struct StepRequest {
    pub direction: StepDirection,
}

#[derive(Deserialize)]
pub struct PgnRequest {
    pub pgn: String,
}

/// POST /api/sessions
pub async fn create_session(
    Extension(store): Extension<Arc<SessionStore>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<SessionView>, AppError> {
    let mut history = MoveHistory::default();
    if let Some(pgn) = req.pgn.as_deref().filter(|p| !p.trim().is_empty()) {
        history.load_from_notation(pgn)?;
    }
    Ok(Json(store.create(history, None)?))
}

/// GET /api/sessions/{id}
pub async fn get_session(
    Extension(store): Extension<Arc<SessionStore>>,
    Path(id): Path<u64>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(store.view(id)?))
}

/// POST /api/sessions/{id}/moves
pub async fn apply_move(
    Extension(store): Extension<Arc<SessionStore>>,
    Path(id): Path<u64>,
    Json(candidate): Json<MoveCandidate>,
) -> Result<Json<SessionView>, AppError> {
    let view = store.update(id, |history| history.apply_move(&candidate).map(|_| ()))?;
    Ok(Json(view))
}

/// POST /api/sessions/{id}/seek
pub async fn seek(
    Extension(store): Extension<Arc<SessionStore>>,
    Path(id): Path<u64>,
    Json(req): Json<SeekRequest>,
) -> Result<Json<SessionView>, AppError> {
    let view = store.update(id, |history| history.seek(req.index).map(|_| ()))?;
    Ok(Json(view))
}

/// POST /api/sessions/{id}/step
pub async fn step(
    Extension(store): Extension<Arc<SessionStore>>,
    Path(id): Path<u64>,
    Json(req): Json<StepRequest>,
) -> Result<Json<SessionView>, AppError> {
    let view = store.update(id, |history| {
        match req.direction {
            StepDirection::Back => history.step_back(),
            StepDirection::Forward => history.step_forward(),
            StepDirection::Start => history.seek_start(),
            StepDirection::End => history.seek_end(),
        }
        .map(|_| ())
    })?;
    Ok(Json(view))
}

/// POST /api/sessions/{id}/reset
pub async fn reset(
    Extension(store): Extension<Arc<SessionStore>>,
    Path(id): Path<u64>,
) -> Result<Json<SessionView>, AppError> {
    let view = store.update(id, |history| {
        history.reset();
        Ok(())
    })?;
    Ok(Json(view))
}

/// PUT /api/sessions/{id}/pgn
pub async fn load_pgn(
    Extension(store): Extension<Arc<SessionStore>>,
    Path(id): Path<u64>,
    Json(req): Json<PgnRequest>,
) -> Result<Json<SessionView>, AppError> {
    let view = store.update(id, |history| history.load_from_notation(&req.pgn))?;
    Ok(Json(view))
}

/// GET /api/sessions/{id}/pgn
pub async fn export_pgn(
    Extension(store): Extension<Arc<SessionStore>>,
    Path(id): Path<u64>,
) -> Result<Json<JsonValue>, AppError> {
    let pgn = store.read(id, |history| history.export_notation())?;
    Ok(Json(serde_json::json!({ "id": id, "pgn": pgn })))
}

/// DELETE /api/sessions/{id}
pub async fn delete_session(
    Extension(store): Extension<Arc<SessionStore>>,
    Path(id): Path<u64>,
) -> Result<Json<JsonValue>, AppError> {
    store.remove(id)?;
    tracing::info!("Closed review session {}", id);
    Ok(Json(serde_json::json!({ "deleted": id })))
}
