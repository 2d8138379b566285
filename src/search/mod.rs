//! Full-text search over the victim index.
//!
//! Search is strictly best-effort: any failure here degrades to the
//! cache's local substring fallback and is never surfaced as a
//! user-visible error.

pub mod meili;

use thiserror::Error;

use crate::gateway::FilterStatus;
use crate::models::Victim;

pub use meili::MeiliGateway;

/// Failures from the search index. All of them are recovered
/// internally by falling back to the local filter.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search index not configured")]
    NotConfigured,

    #[error("Search transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Search index rejected the request: {0}")]
    BadResponse(String),
}

/// Abstract full-text search index over the victim collection.
pub trait SearchGateway {
    /// Ranked hits for `query`, restricted to the given verification
    /// side, at most `limit` of them.
    async fn search(
        &self,
        query: &str,
        filter: FilterStatus,
        limit: usize,
    ) -> Result<Vec<Victim>, SearchError>;
}

/// Search gateway for deployments without a search index. Every call
/// reports `NotConfigured`, which the cache answers with its local
/// substring fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSearch;

impl SearchGateway for NoSearch {
    async fn search(
        &self,
        _query: &str,
        _filter: FilterStatus,
        _limit: usize,
    ) -> Result<Vec<Victim>, SearchError> {
        Err(SearchError::NotConfigured)
    }
}
