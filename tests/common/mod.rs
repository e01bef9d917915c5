use std::sync::Arc;

use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
use reqwest::Client;
use serde_json::{json, Value};
use server::clients::chess_com::ChessComClient;
use server::sessions::SessionStore;

/// A running app plus the mock archive it fetches from.
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
}

impl TestApp {
    /// Build a URL for an API endpoint.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Monthly archive served for `alice` in 2024/03.
pub fn sample_archive() -> Value {
    json!({
        "games": [
            {
                "url": "https://www.chess.com/game/live/101",
                "pgn": "[Event \"Live Chess\"]\n[White \"alice\"]\n[Black \"bob\"]\n[Result \"0-1\"]\n\n1. f3 e5 2. g4 Qh4# 0-1\n",
                "time_control": "600",
                "end_time": 1709300000,
                "rated": true,
                "uuid": "fools-mate",
                "time_class": "rapid",
                "rules": "chess",
                "white": {"username": "alice", "rating": 1200, "result": "checkmated", "@id": "https://api.chess.com/pub/player/alice"},
                "black": {"username": "bob", "rating": 1250, "result": "win", "@id": "https://api.chess.com/pub/player/bob"},
                "eco": "https://www.chess.com/openings/Barnes-Opening"
            },
            {
                "url": "https://www.chess.com/game/live/102",
                "pgn": "[Event \"Live Chess\"]\n[White \"carol\"]\n[Black \"alice\"]\n[Result \"1/2-1/2\"]\n\n1. e4 e5 2. Nf3 Nc6 1/2-1/2\n",
                "time_control": "180+2",
                "end_time": 1709400000,
                "rated": true,
                "uuid": "quick-draw",
                "time_class": "blitz",
                "white": {"username": "carol", "rating": 1300, "result": "agreed"},
                "black": {"username": "alice", "rating": 1210, "result": "agreed"},
                "eco": "https://www.chess.com/openings/Kings-Knight-Opening-Normal-Variation",
                "accuracies": {"white": 88.1, "black": 90.4}
            }
        ]
    })
}

async fn archive(Path((username, year, month)): Path<(String, i32, String)>) -> Result<Json<Value>, StatusCode> {
    match (username.as_str(), year, month.as_str()) {
        ("alice", 2024, "03") => Ok(Json(sample_archive())),
        ("broken", _, _) => Err(StatusCode::INTERNAL_SERVER_ERROR),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test server error");
    });
    format!("http://{addr}")
}

/// Start a mock chess.com archive and the app wired to it.
pub async fn spawn_app() -> TestApp {
    let mock = Router::new().route("/pub/player/{username}/games/{year}/{month}", get(archive));
    let mock_url = serve(mock).await;

    let provider = ChessComClient::new(&format!("{mock_url}/pub"), 5, 60).expect("Failed to build client");
    let store = SessionStore::new(3600, 100);
    let base_url = serve(server::app(Arc::new(provider), Arc::new(store))).await;

    TestApp {
        base_url,
        client: Client::new(),
    }
}
