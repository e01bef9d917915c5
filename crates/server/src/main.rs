use std::sync::Arc;

use anyhow::Context;
use server::clients::chess_com::ChessComClient;
use server::config;
use server::sessions::SessionStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();

    let provider = ChessComClient::new(
        &config.chess_com_base_url,
        config.chess_com_timeout_secs,
        config.archive_cache_secs,
    )
    .context("Failed to build chess.com client")?;
    tracing::info!("Fetching games from {}", config.chess_com_base_url);

    let store = SessionStore::new(config.session_ttl_secs, config.max_sessions);
    let app = server::app(Arc::new(provider), Arc::new(store));

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
