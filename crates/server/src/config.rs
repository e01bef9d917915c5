use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Root of the chess.com public API (overridable for local mocks).
    pub chess_com_base_url: String,
    pub chess_com_timeout_secs: u64,
    /// How long a fetched monthly archive is served from memory.
    pub archive_cache_secs: i64,
    /// Review sessions idle longer than this are dropped.
    pub session_ttl_secs: i64,
    pub max_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            chess_com_base_url: "https://api.chess.com/pub".to_string(),
            chess_com_timeout_secs: 30,
            archive_cache_secs: 300,
            session_ttl_secs: 3600,
            max_sessions: 1000,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            chess_com_base_url: env::var("CHESS_COM_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.chess_com_base_url),
            chess_com_timeout_secs: env_or("CHESS_COM_TIMEOUT_SECS", defaults.chess_com_timeout_secs),
            archive_cache_secs: env_or("ARCHIVE_CACHE_SECS", defaults.archive_cache_secs),
            session_ttl_secs: env_or("SESSION_TTL_SECS", defaults.session_ttl_secs),
            max_sessions: env_or("MAX_SESSIONS", defaults.max_sessions),
        }
    }
}
