pub mod clients;
pub mod config;
pub mod error;
pub mod routes;
pub mod sessions;

use std::sync::Arc;

use axum::{routing::{get, post}, Extension, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::clients::chess_com::GameProvider;
use crate::sessions::SessionStore;

/// Build the HTTP router over a game provider and a session registry.
pub fn app<P>(provider: Arc<P>, store: Arc<SessionStore>) -> Router
where
    P: GameProvider + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        // Game list (chess.com monthly archives)
        .route(
            "/api/players/{username}/games/{year}/{month}",
            get(routes::games::list_games::<P>),
        )
        .route(
            "/api/players/{username}/games/{year}/{month}/{uuid}",
            get(routes::games::get_game::<P>),
        )
        .route(
            "/api/players/{username}/games/{year}/{month}/{uuid}/session",
            post(routes::games::open_game_session::<P>),
        )
        // Review sessions
        .route("/api/sessions", post(routes::sessions::create_session))
        .route(
            "/api/sessions/{id}",
            get(routes::sessions::get_session).delete(routes::sessions::delete_session),
        )
        .route("/api/sessions/{id}/moves", post(routes::sessions::apply_move))
        .route("/api/sessions/{id}/seek", post(routes::sessions::seek))
        .route("/api/sessions/{id}/step", post(routes::sessions::step))
        .route("/api/sessions/{id}/reset", post(routes::sessions::reset))
        .route(
            "/api/sessions/{id}/pgn",
            get(routes::sessions::export_pgn).put(routes::sessions::load_pgn),
        )
        // Shared state
        .layer(Extension(provider))
        .layer(Extension(store))
        .layer(CompressionLayer::new())
        .layer(cors)
}
