use std::cell::{Cell, RefCell};

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::gateway::{
    CollectionGateway, Cursor, DeltaEvent, DeltaSubscription, FilterStatus, GatewayError,
};
use crate::import::{normalize_rows, ImportError, ImportSummary, RawRow};
use crate::models::{Victim, VictimPatch};
use crate::search::{NoSearch, SearchGateway};

use super::debounce::Debouncer;

/// A single verification toggle failed.
#[derive(Error, Debug)]
pub enum MutationError {
    #[error("No record with id {0} in the current view")]
    UnknownId(String),

    #[error("Remote update failed for {id}")]
    Remote {
        id: String,
        #[source]
        source: GatewayError,
    },
}

/// Where the search side of the view currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    /// No query; the paginated, filtered view is shown.
    Idle,
    /// A query is typed, the debounce timer is running.
    Pending,
    /// The debounced query is out at the search gateway.
    Searching,
    /// Remote hits are being served.
    Results(Vec<Victim>),
    /// Remote search unavailable; serving the local substring filter.
    Fallback,
}

struct State {
    entries: Vec<Victim>,
    cursor: Option<Cursor>,
    has_more: bool,
    loading: bool,
    error: Option<String>,
    filter: FilterStatus,
    search_query: String,
    debounced_query: String,
    debounce: Debouncer,
    search_state: SearchState,
}

/// Synchronized, paginated view over the victim collection.
///
/// Owns the authoritative in-memory subset of records and merges three
/// input streams: page loads from the collection gateway, live deltas
/// from its subscription, and debounced search. Mutations go through
/// optimistic local updates before remote confirmation.
///
/// All state lives behind a `RefCell` and is only touched between
/// await points; the cache is single-threaded by design and hands
/// consumers cloned projections, never references into its state.
/// Dropping the cache (and any `DeltaSubscription` taken from it)
/// releases every remote resource.
pub struct SyncedVictims<G, S = NoSearch> {
    gateway: G,
    search: S,
    config: CacheConfig,
    state: RefCell<State>,
    generation: Cell<u64>,
}

impl<G: CollectionGateway> SyncedVictims<G, NoSearch> {
    /// Cache without a search index; queries use the local fallback.
    pub fn new(gateway: G, config: CacheConfig) -> Self {
        Self::with_search(gateway, NoSearch, config)
    }
}

impl<G: CollectionGateway, S: SearchGateway> SyncedVictims<G, S> {
    pub fn with_search(gateway: G, search: S, config: CacheConfig) -> Self {
        let debounce = Debouncer::new(config.debounce_window);
        Self {
            gateway,
            search,
            config,
            state: RefCell::new(State {
                entries: Vec::new(),
                cursor: None,
                has_more: false,
                loading: false,
                error: None,
                filter: FilterStatus::Todo,
                search_query: String::new(),
                debounced_query: String::new(),
                debounce,
                search_state: SearchState::Idle,
            }),
            generation: Cell::new(0),
        }
    }

    fn bump_generation(&self) -> u64 {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        next
    }

    // ===== Read-side accessors =====

    pub fn filter_status(&self) -> FilterStatus {
        self.state.borrow().filter
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn has_more(&self) -> bool {
        self.state.borrow().has_more
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn search_query(&self) -> String {
        self.state.borrow().search_query.clone()
    }

    pub fn search_state(&self) -> SearchState {
        self.state.borrow().search_state.clone()
    }

    /// Every record currently materialized, regardless of filter or
    /// search. This is what the export sink receives.
    pub fn all_entries(&self) -> Vec<Victim> {
        self.state.borrow().entries.clone()
    }

    /// The projection the view renders.
    ///
    /// With a debounced query active: remote hits when available,
    /// otherwise a local case-insensitive substring filter over the
    /// cached entries on the active side of the status filter.
    /// Without a query: the entries filtered by verification status
    /// (the gateway already pre-filters; this is defense in depth
    /// against deltas from the other side).
    pub fn displayed_records(&self) -> Vec<Victim> {
        let s = self.state.borrow();
        if !s.debounced_query.is_empty() {
            if let SearchState::Results(hits) = &s.search_state {
                return hits.clone();
            }
            let needle = s.debounced_query.to_lowercase();
            return s
                .entries
                .iter()
                .filter(|v| v.checked == s.filter.checked() && v.matches_query(&needle))
                .cloned()
                .collect();
        }
        s.entries
            .iter()
            .filter(|v| v.checked == s.filter.checked())
            .cloned()
            .collect()
    }

    // ===== Loading & pagination =====

    /// Fetch the first page for `filter`, replacing the entries
    /// wholesale. On failure the previous entries are preserved and
    /// `error` is set.
    pub async fn load(&self, filter: FilterStatus) -> Result<(), GatewayError> {
        let generation = self.bump_generation();
        {
            let mut s = self.state.borrow_mut();
            s.filter = filter;
            s.loading = true;
            s.error = None;
        }

        let result = self
            .gateway
            .query(filter, self.config.page_size, None)
            .await;

        if generation != self.generation.get() {
            // Superseded by a newer load; the newer view owns the state.
            return Ok(());
        }

        let mut s = self.state.borrow_mut();
        s.loading = false;
        match result {
            Ok(page) => {
                s.has_more = page.records.len() == self.config.page_size;
                s.cursor = page.next_cursor;
                debug!(filter = %filter, count = page.records.len(), "Loaded first page");
                s.entries = page.records;
                Ok(())
            }
            Err(e) => {
                warn!(filter = %filter, error = %e, "Initial load failed");
                s.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch the page after the current cursor and append it,
    /// de-duplicating by id. No-op while loading, exhausted, or with a
    /// search active.
    pub async fn load_more(&self) -> Result<(), GatewayError> {
        let (filter, cursor) = {
            let s = self.state.borrow();
            if s.loading || !s.has_more || !s.search_query.trim().is_empty() {
                return Ok(());
            }
            (s.filter, s.cursor.clone())
        };
        let generation = self.generation.get();
        self.state.borrow_mut().loading = true;

        let result = self
            .gateway
            .query(filter, self.config.page_size, cursor.as_ref())
            .await;

        if generation != self.generation.get() {
            // The filter changed while this page was in flight;
            // discard it entirely.
            return Ok(());
        }

        let mut s = self.state.borrow_mut();
        s.loading = false;
        match result {
            Ok(page) => {
                s.has_more = page.records.len() == self.config.page_size;
                if page.next_cursor.is_some() {
                    s.cursor = page.next_cursor;
                }
                for record in page.records {
                    if !s.entries.iter().any(|v| v.id == record.id) {
                        s.entries.push(record);
                    }
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Pagination fetch failed");
                s.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Switch the verification filter: clears the view and reloads.
    /// Any page still in flight under the old filter is invalidated.
    pub async fn set_filter_status(&self, status: FilterStatus) -> Result<(), GatewayError> {
        {
            let mut s = self.state.borrow_mut();
            s.cursor = None;
            s.has_more = false;
            s.entries.clear();
        }
        self.load(status).await
    }

    // ===== Search =====

    /// Record a keystroke. Updates the visible query immediately and
    /// (re)schedules the debounced dispatch; never touches the network
    /// by itself.
    pub fn set_search_query(&self, text: &str) {
        let mut s = self.state.borrow_mut();
        s.search_query = text.to_string();
        let trimmed = text.trim().to_string();
        if trimmed.is_empty() {
            s.debounced_query.clear();
            s.search_state = SearchState::Idle;
            s.debounce.press("", Instant::now());
        } else {
            s.search_state = SearchState::Pending;
            s.debounce.press(&trimmed, Instant::now());
        }
    }

    /// Drive the pending debounce to its dispatch: waits out the
    /// quiescence window (following the deadline as further keystrokes
    /// push it) and runs the search. Returns immediately when nothing
    /// is pending.
    pub async fn flush_search(&self) {
        loop {
            let deadline = match self.state.borrow().debounce.deadline() {
                Some(deadline) => deadline,
                None => return,
            };
            tokio::time::sleep_until(deadline).await;
            let fired = self.state.borrow_mut().debounce.fire(Instant::now());
            if let Some(query) = fired {
                self.dispatch_search(query).await;
                return;
            }
            // A newer keystroke moved the deadline; keep waiting.
        }
    }

    async fn dispatch_search(&self, query: String) {
        let generation = self.generation.get();
        let filter = {
            let mut s = self.state.borrow_mut();
            s.debounced_query = query.clone();
            s.search_state = SearchState::Searching;
            s.filter
        };

        let outcome = match self
            .search
            .search(&query, filter, self.config.search_limit)
            .await
        {
            Ok(hits) => {
                debug!(query = %query, hits = hits.len(), "Remote search succeeded");
                Some(hits)
            }
            Err(e) => {
                // Never user-visible; the local fallback takes over.
                debug!(query = %query, error = %e, "Remote search unavailable, using local fallback");
                None
            }
        };

        let mut s = self.state.borrow_mut();
        if generation != self.generation.get() || s.debounced_query != query {
            // A newer query or view superseded this search.
            return;
        }
        s.search_state = match outcome {
            Some(hits) => SearchState::Results(hits),
            None => SearchState::Fallback,
        };
    }

    // ===== Mutations =====

    /// Flip the verification flag of a record in the current view.
    ///
    /// The record is removed from the local view immediately (a flipped
    /// record no longer matches the binary filter) before the remote
    /// update resolves. On failure the removal is not rolled back; the
    /// next delta or reload is the source of truth.
    pub async fn toggle_checked(&self, id: &str) -> Result<(), MutationError> {
        let new_checked = {
            let mut s = self.state.borrow_mut();
            let pos = match s.entries.iter().position(|v| v.id == id) {
                Some(pos) => pos,
                None => return Err(MutationError::UnknownId(id.to_string())),
            };
            let current = s.entries[pos].checked;
            s.entries.remove(pos);
            !current
        };

        match self
            .gateway
            .update(id, VictimPatch::set_checked(new_checked))
            .await
        {
            Ok(()) => {
                debug!(id, checked = new_checked, "Verification toggle confirmed");
                Ok(())
            }
            Err(source) => {
                warn!(id, error = %source, "Verification toggle failed");
                self.state.borrow_mut().error = Some(source.to_string());
                Err(MutationError::Remote {
                    id: id.to_string(),
                    source,
                })
            }
        }
    }

    // ===== Live deltas =====

    /// Apply one delta from the live subscription. Idempotent: adds
    /// and modifies upsert by id (position preserved on modify,
    /// appended on add), removes delete by id.
    pub fn apply_delta(&self, event: DeltaEvent) {
        let mut s = self.state.borrow_mut();
        match event {
            DeltaEvent::Added(v) | DeltaEvent::Modified(v) => {
                match s.entries.iter().position(|e| e.id == v.id) {
                    Some(pos) => s.entries[pos] = v,
                    None => s.entries.push(v),
                }
            }
            DeltaEvent::Removed { id } => s.entries.retain(|v| v.id != id),
        }
    }

    /// Open the live delta subscription for the whole collection.
    pub async fn subscribe(&self) -> Result<DeltaSubscription, GatewayError> {
        self.gateway.subscribe(None).await
    }

    /// Apply deltas in arrival order until the subscription closes.
    pub async fn run_deltas(&self, subscription: &mut DeltaSubscription) {
        while let Some(event) = subscription.next_event().await {
            self.apply_delta(event);
        }
    }

    // ===== Import =====

    /// Normalize raw spreadsheet rows and bulk-upsert them through the
    /// gateway. Malformed rows are skipped; a gateway failure aborts
    /// the whole batch.
    pub async fn import_batch(
        &self,
        rows: impl IntoIterator<Item = RawRow>,
    ) -> Result<ImportSummary, ImportError> {
        let batch = normalize_rows(rows);
        self.state.borrow_mut().loading = true;

        let result = self.gateway.batch_upsert(&batch.victims).await;

        let mut s = self.state.borrow_mut();
        s.loading = false;
        match result {
            Ok(()) => {
                info!(
                    count = batch.victims.len(),
                    skipped = batch.skipped,
                    "Import committed"
                );
                Ok(ImportSummary {
                    count: batch.victims.len(),
                    skipped: batch.skipped,
                })
            }
            Err(e) => {
                warn!(error = %e, "Import aborted");
                s.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
