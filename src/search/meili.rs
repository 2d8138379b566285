//! Meilisearch-backed search gateway.
//!
//! Talks to a hosted Meilisearch instance over its REST API. The index
//! holds the same documents as the remote collection (synced out of
//! band); this client only ever reads.

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SearchConfig;
use crate::gateway::FilterStatus;
use crate::models::Victim;

use super::{SearchError, SearchGateway};

/// HTTP request timeout in seconds.
/// Search is interactive; fail fast and let the local fallback take over.
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    limit: usize,
    filter: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<Victim>,
}

/// Search client for a Meilisearch index.
/// Clone is cheap - reqwest::Client uses Arc internally.
#[derive(Clone)]
pub struct MeiliGateway {
    client: Client,
    host: String,
    api_key: Option<String>,
    index: String,
}

impl MeiliGateway {
    /// Build a gateway from configuration. Returns `NotConfigured` when
    /// no host is set, so callers can fall back without special cases.
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        let host = match config.host.as_deref() {
            Some(host) if !host.is_empty() => host.trim_end_matches('/').to_string(),
            _ => return Err(SearchError::NotConfigured),
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            host,
            api_key: config.api_key.clone(),
            index: config.index.clone(),
        })
    }

    fn search_url(&self) -> String {
        format!("{}/indexes/{}/search", self.host, self.index)
    }

    fn map_status(status: StatusCode, body: &str) -> SearchError {
        match status {
            // Wrong or missing API key, or a missing index: the
            // instance is misconfigured, not transiently failing.
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                SearchError::NotConfigured
            }
            _ => SearchError::BadResponse(format!("{status}: {body}")),
        }
    }
}

impl SearchGateway for MeiliGateway {
    async fn search(
        &self,
        query: &str,
        filter: FilterStatus,
        limit: usize,
    ) -> Result<Vec<Victim>, SearchError> {
        let body = SearchRequest {
            q: query,
            limit,
            filter: format!("checked = {}", filter.checked()),
        };

        let mut request = self.client.post(self.search_url()).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.header(header::AUTHORIZATION, format!("Bearer {key}"));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, &text));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::BadResponse(e.to_string()))?;

        debug!(query, hits = parsed.hits.len(), "Meilisearch query");
        Ok(parsed.hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_host_is_not_configured() {
        let config = SearchConfig {
            host: None,
            api_key: None,
            index: "victims".to_string(),
        };
        assert!(matches!(
            MeiliGateway::from_config(&config),
            Err(SearchError::NotConfigured)
        ));
    }

    #[test]
    fn test_search_url_normalizes_trailing_slash() {
        let config = SearchConfig {
            host: Some("http://localhost:7700/".to_string()),
            api_key: Some("masterKey".to_string()),
            index: "victims".to_string(),
        };
        let gw = MeiliGateway::from_config(&config).expect("configured");
        assert_eq!(gw.search_url(), "http://localhost:7700/indexes/victims/search");
    }

    #[test]
    fn test_auth_failure_maps_to_not_configured() {
        let err = MeiliGateway::map_status(StatusCode::FORBIDDEN, "invalid key");
        assert!(matches!(err, SearchError::NotConfigured));
        let err = MeiliGateway::map_status(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, SearchError::BadResponse(_)));
    }

    #[test]
    fn test_hits_parse_as_victims() {
        let json = r#"{"hits": [{"id": "123_456A", "nom": "Rakoto", "checked": false}],
                       "query": "rakoto", "processingTimeMs": 1}"#;
        let parsed: SearchResponse = serde_json::from_str(json).expect("parse hits");
        assert_eq!(parsed.hits.len(), 1);
        assert_eq!(parsed.hits[0].nom, "Rakoto");
    }
}
