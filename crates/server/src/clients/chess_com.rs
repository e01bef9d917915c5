use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;
use std::time::Duration;

use chess_core::game_data::{ChessComGame, MonthlyArchive};
use chrono::{DateTime, Utc};
use reqwest::Client;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Request error: {0}")]
    Request(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("JSON parse error: {0}")]
    Decode(String),
}

/// Source of a player's games for one calendar month.
pub trait GameProvider {
    /// Games in the order the provider lists them. Unknown player or empty
    /// month yields an empty list.
    fn fetch_month(
        &self,
        username: &str,
        year: i32,
        month: u32,
    ) -> impl Future<Output = Result<Vec<ChessComGame>, ProviderError>> + Send;
}

type ArchiveKey = (String, i32, u32);

pub struct ChessComClient {
    client: Client,
    base_url: String,
    cache_ttl: chrono::Duration,
    cache: RwLock<HashMap<ArchiveKey, (DateTime<Utc>, Vec<ChessComGame>)>>,
}

impl ChessComClient {
    pub fn new(base_url: &str, timeout_secs: u64, cache_secs: i64) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent("GameReview/1.0")
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache_ttl: chrono::Duration::seconds(cache_secs),
            cache: RwLock::new(HashMap::new()),
        })
    }

    fn cached(&self, key: &ArchiveKey) -> Option<Vec<ChessComGame>> {
        let cache = self.cache.read().ok()?;
        let (fetched_at, games) = cache.get(key)?;
        (Utc::now() - *fetched_at < self.cache_ttl).then(|| games.clone())
    }

    fn store(&self, key: ArchiveKey, games: &[ChessComGame]) {
        if let Ok(mut cache) = self.cache.write() {
            let now = Utc::now();
            cache.retain(|_, (fetched_at, _)| now - *fetched_at < self.cache_ttl);
            cache.insert(key, (now, games.to_vec()));
        }
    }

    async fn request_month(&self, username: &str, year: i32, month: u32) -> Result<Vec<ChessComGame>, ProviderError> {
        let url = format!(
            "{}/player/{}/games/{}/{:02}",
            self.base_url,
            username.to_lowercase(),
            year,
            month
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(vec![]);
        }

        if !resp.status().is_success() {
            return Err(ProviderError::Status(resp.status().as_u16()));
        }

        let archive: MonthlyArchive = resp
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(archive.games)
    }
}

impl GameProvider for ChessComClient {
    async fn fetch_month(&self, username: &str, year: i32, month: u32) -> Result<Vec<ChessComGame>, ProviderError> {
        let key = (username.to_lowercase(), year, month);
        if let Some(games) = self.cached(&key) {
            tracing::debug!("Archive cache hit for {}/{}/{:02}", key.0, year, month);
            return Ok(games);
        }

        let games = self.request_month(username, year, month).await?;
        tracing::info!("Fetched {} games for {} in {}/{:02}", games.len(), username, year, month);
        self.store(key, &games);
        Ok(games)
    }
}
