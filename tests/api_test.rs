//! Integration tests for the HTTP service.
//!
//! Each test starts the app on an ephemeral port, backed by a local mock of
//! the chess.com monthly archive endpoint.

mod common;

use serde_json::{json, Value};

async fn post_json(app: &common::TestApp, path: &str, body: Value) -> reqwest::Response {
    app.client
        .post(app.url(path))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request")
}

async fn get(app: &common::TestApp, path: &str) -> reqwest::Response {
    app.client
        .get(app.url(path))
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
async fn health() {
    let app = common::spawn_app().await;
    let resp = get(&app, "/health").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn game_list_rows_and_filters() {
    let app = common::spawn_app().await;

    let body: Value = get(&app, "/api/players/alice/games/2024/3").await.json().await.unwrap();
    let games = body["games"].as_array().unwrap();
    assert_eq!(games.len(), 2);
    // Newest first.
    assert_eq!(games[0]["uuid"], "quick-draw");
    assert_eq!(games[0]["time_control"], "3 min + 2 sec");
    assert_eq!(games[0]["opening"], "Kings Knight Opening Normal Variation");
    assert_eq!(games[1]["opening"], "Barnes Opening");

    let body: Value = get(&app, "/api/players/alice/games/2024/3?tab=losses")
        .await
        .json()
        .await
        .unwrap();
    let games = body["games"].as_array().unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0]["uuid"], "fools-mate");

    let body: Value = get(&app, "/api/players/alice/games/2024/3?q=carol")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["games"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn game_list_edge_cases() {
    let app = common::spawn_app().await;

    // Unknown month is an empty list, not an error.
    let resp = get(&app, "/api/players/alice/games/2023/1").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["games"].as_array().unwrap().is_empty());

    let resp = get(&app, "/api/players/alice/games/2024/13").await;
    assert_eq!(resp.status(), 400);

    let resp = get(&app, "/api/players/a!/games/2024/3").await;
    assert_eq!(resp.status(), 400);

    let resp = get(&app, "/api/players/broken/games/2024/3").await;
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Could not fetch games from chess.com");
}

#[tokio::test]
async fn review_a_chess_com_game() {
    let app = common::spawn_app().await;

    let resp = get(&app, "/api/players/alice/games/2024/3/fools-mate").await;
    assert_eq!(resp.status(), 200);
    let record: Value = resp.json().await.unwrap();
    assert_eq!(record["black"]["result"], "win");

    let resp = post_json(&app, "/api/players/alice/games/2024/3/fools-mate/session", json!({})).await;
    assert_eq!(resp.status(), 200);
    let view: Value = resp.json().await.unwrap();
    assert_eq!(view["cursor"], 3);
    assert_eq!(view["analysis"]["status"]["kind"], "checkmate");
    assert_eq!(view["source_url"], "https://www.chess.com/game/live/101");

    let resp = get(&app, "/api/players/alice/games/2024/3/missing").await;
    assert_eq!(resp.status(), 404);
}

/// Play, branch, navigate and export through one session.
#[tokio::test]
async fn session_flow() {
    let app = common::spawn_app().await;

    let view: Value = post_json(&app, "/api/sessions", json!({})).await.json().await.unwrap();
    let id = view["id"].as_u64().unwrap();
    assert_eq!(view["cursor"], -1);

    for san in ["e4", "e5", "Nf3"] {
        let resp = post_json(&app, &format!("/api/sessions/{id}/moves"), json!({ "san": san })).await;
        assert_eq!(resp.status(), 200);
    }

    let resp = post_json(&app, &format!("/api/sessions/{id}/moves"), json!({ "from": "a7", "to": "a2" })).await;
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().starts_with("Invalid move"));

    let view: Value = get(&app, &format!("/api/sessions/{id}")).await.json().await.unwrap();
    assert_eq!(
        view["analysis"]["text"],
        "Material is equal.\nIt's Black's turn to move.\nMove number: 2\n"
    );

    let resp = post_json(&app, &format!("/api/sessions/{id}/seek"), json!({ "index": 7 })).await;
    assert_eq!(resp.status(), 400);

    let view: Value = post_json(&app, &format!("/api/sessions/{id}/seek"), json!({ "index": 0 }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["can_step_back"], true);
    assert_eq!(view["can_step_forward"], true);

    let view: Value = post_json(&app, &format!("/api/sessions/{id}/moves"), json!({ "from": "c7", "to": "c5" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["moves"].as_array().unwrap().len(), 2);
    assert_eq!(view["moves"][1]["label"], "1... c5");

    let body: Value = get(&app, &format!("/api/sessions/{id}/pgn")).await.json().await.unwrap();
    assert!(body["pgn"].as_str().unwrap().ends_with("1. e4 c5 *\n"));

    let view: Value = post_json(&app, &format!("/api/sessions/{id}/step"), json!({ "direction": "start" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["cursor"], -1);

    let resp = app
        .client
        .delete(app.url(&format!("/api/sessions/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(get(&app, &format!("/api/sessions/{id}")).await.status(), 404);
}

/// The transcript of a fresh session opens a new, equally empty session.
#[tokio::test]
async fn empty_session_pgn_reopens() {
    let app = common::spawn_app().await;
    let view: Value = post_json(&app, "/api/sessions", json!({})).await.json().await.unwrap();
    let id = view["id"].as_u64().unwrap();

    let body: Value = get(&app, &format!("/api/sessions/{id}/pgn")).await.json().await.unwrap();
    let resp = post_json(&app, "/api/sessions", json!({ "pgn": body["pgn"] })).await;
    assert_eq!(resp.status(), 200);
    let view: Value = resp.json().await.unwrap();
    assert_eq!(view["cursor"], -1);
    assert!(view["moves"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn load_pgn_into_session() {
    let app = common::spawn_app().await;
    let view: Value = post_json(&app, "/api/sessions", json!({ "pgn": "1. d4 d5 *" }))
        .await
        .json()
        .await
        .unwrap();
    let id = view["id"].as_u64().unwrap();
    assert_eq!(view["moves"].as_array().unwrap().len(), 2);

    let resp = app
        .client
        .put(app.url(&format!("/api/sessions/{id}/pgn")))
        .json(&json!({ "pgn": "[FEN \"8/8/8/8/8/8/8/8 w - - 0 1\"]\n\n*" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);

    let view: Value = get(&app, &format!("/api/sessions/{id}")).await.json().await.unwrap();
    assert_eq!(view["moves"].as_array().unwrap().len(), 2);

    let view: Value = post_json(&app, &format!("/api/sessions/{id}/reset"), json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert!(view["moves"].as_array().unwrap().is_empty());
}
