//! Access to the remote victim collection.
//!
//! The registry core never talks to a concrete document store directly;
//! it goes through the `CollectionGateway` trait, which models a
//! paginated, filterable remote collection with a live delta
//! subscription. `MemoryGateway` is the in-process implementation used
//! offline and in tests.
//!
//! Deltas arrive as an explicit stream (`DeltaSubscription`) rather
//! than callbacks; dropping the subscription handle unsubscribes on
//! every exit path.

pub mod error;
pub mod memory;

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::models::{Victim, VictimPatch};

pub use error::GatewayError;
pub use memory::MemoryGateway;

/// Buffer size for a delta subscription channel.
/// 64 events absorbs a burst of batched writes without backpressure
/// on the gateway side.
pub(crate) const DELTA_CHANNEL_SIZE: usize = 64;

/// Which side of the binary verification flag a query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStatus {
    /// Records not yet verified (`checked == false`).
    Todo,
    /// Records already verified (`checked == true`).
    Verified,
}

impl FilterStatus {
    /// The `checked` value this filter selects.
    pub fn checked(self) -> bool {
        matches!(self, FilterStatus::Verified)
    }
}

impl std::fmt::Display for FilterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterStatus::Todo => write!(f, "todo"),
            FilterStatus::Verified => write!(f, "verified"),
        }
    }
}

/// Opaque pagination token referencing the last fetched item.
/// Only the gateway that produced it can interpret it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of query results.
#[derive(Debug, Clone)]
pub struct Page {
    /// Records in the gateway's stable sort order (by `nom`).
    pub records: Vec<Victim>,
    /// Token for the page after this one, if the gateway produced one.
    pub next_cursor: Option<Cursor>,
}

/// An incremental change to one document in the collection.
#[derive(Debug, Clone, PartialEq)]
pub enum DeltaEvent {
    Added(Victim),
    Modified(Victim),
    Removed { id: String },
}

impl DeltaEvent {
    /// Id of the document this delta concerns.
    pub fn id(&self) -> &str {
        match self {
            DeltaEvent::Added(v) | DeltaEvent::Modified(v) => &v.id,
            DeltaEvent::Removed { id } => id,
        }
    }
}

/// Live delta subscription handle.
///
/// Yields events in the order the gateway emitted them. Dropping the
/// handle releases the subscription; the gateway notices the closed
/// channel on its next send.
pub struct DeltaSubscription {
    rx: mpsc::Receiver<DeltaEvent>,
}

impl DeltaSubscription {
    pub(crate) fn new(rx: mpsc::Receiver<DeltaEvent>) -> Self {
        Self { rx }
    }

    /// Next delta, or `None` once the gateway closes the stream.
    pub async fn next_event(&mut self) -> Option<DeltaEvent> {
        self.rx.recv().await
    }
}

impl Stream for DeltaSubscription {
    type Item = DeltaEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<DeltaEvent>> {
        self.rx.poll_recv(cx)
    }
}

/// Abstract paginated, filterable, live-updating document collection.
///
/// Implementations are shared, stateless collaborators from the
/// cache's perspective; write contention is whatever the remote store
/// guarantees (per-document last-write-wins).
pub trait CollectionGateway {
    /// Fetch one page of victims where `checked == filter.checked()`,
    /// ordered by `nom`, starting after `after` when given.
    async fn query(
        &self,
        filter: FilterStatus,
        page_size: usize,
        after: Option<&Cursor>,
    ) -> Result<Page, GatewayError>;

    /// Subscribe to live deltas. `filter == None` watches the whole
    /// collection (what the registry view uses, so that toggles moving
    /// records across the filter boundary are still observed).
    ///
    /// Delivery is best-effort: a subscriber that stops draining its
    /// channel may be disconnected and should treat end-of-stream as a
    /// cue to resubscribe and reload.
    async fn subscribe(
        &self,
        filter: Option<FilterStatus>,
    ) -> Result<DeltaSubscription, GatewayError>;

    /// Merge a partial update into one document.
    async fn update(&self, id: &str, patch: VictimPatch) -> Result<(), GatewayError>;

    /// Upsert a batch of documents, all-or-nothing up to the store's
    /// own batch limits.
    async fn batch_upsert(&self, records: &[Victim]) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_status_checked_mapping() {
        assert!(!FilterStatus::Todo.checked());
        assert!(FilterStatus::Verified.checked());
    }

    #[test]
    fn test_delta_event_id() {
        let removed = DeltaEvent::Removed { id: "x9".to_string() };
        assert_eq!(removed.id(), "x9");
    }
}
