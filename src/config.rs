//! Runtime configuration.
//!
//! The cache itself is configured in code (`CacheConfig`); the search
//! index is configured from the environment, optionally through a
//! `.env` file, mirroring how the hosted deployment passes its
//! Meilisearch credentials.

use std::time::Duration;

/// Records fetched per page.
/// 20 rows fills a screen of the registry list with one fetch.
pub const PAGE_SIZE: usize = 20;

/// Debounce window for search keystrokes.
/// 500ms lets fast typists finish a word before a query is dispatched.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Maximum hits requested from the search index.
/// 50 covers several screens; beyond that operators refine the query.
pub const SEARCH_LIMIT: usize = 50;

/// Tuning knobs for a `SyncedVictims` instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub page_size: usize,
    pub debounce_window: Duration,
    pub search_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            debounce_window: DEBOUNCE_WINDOW,
            search_limit: SEARCH_LIMIT,
        }
    }
}

/// Connection settings for the search index.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Base URL of the Meilisearch instance. `None` disables remote
    /// search entirely (local fallback only).
    pub host: Option<String>,
    pub api_key: Option<String>,
    /// Index name holding the victim documents.
    pub index: String,
}

impl SearchConfig {
    /// Read configuration from the environment (`MEILISEARCH_HOST`,
    /// `MEILISEARCH_API_KEY`, `MEILISEARCH_INDEX`). A `.env` file is
    /// loaded first when present and silently ignored otherwise.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            host: std::env::var("MEILISEARCH_HOST").ok().filter(|h| !h.is_empty()),
            api_key: std::env::var("MEILISEARCH_API_KEY").ok().filter(|k| !k.is_empty()),
            index: std::env::var("MEILISEARCH_INDEX").unwrap_or_else(|_| "victims".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.debounce_window, Duration::from_millis(500));
        assert_eq!(config.search_limit, 50);
    }
}
