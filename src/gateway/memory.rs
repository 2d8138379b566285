//! In-memory collection gateway.
//!
//! Backs the registry when no remote store is configured and serves as
//! the test double for the cache. Documents are held in a map keyed by
//! id; queries sort by `(nom, id)` and paginate with seek-style
//! cursors, so a cursor survives concurrent inserts and deletes.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::models::{Victim, VictimPatch};

use super::{
    Cursor, DeltaEvent, DeltaSubscription, FilterStatus, GatewayError, Page, DELTA_CHANNEL_SIZE,
};

/// Separator between the sort key and the id inside a cursor token.
/// Unit separator never appears in census field values.
const CURSOR_SEP: char = '\u{1f}';

struct Inner {
    docs: BTreeMap<String, Victim>,
    subs: Vec<(Option<FilterStatus>, mpsc::Sender<DeltaEvent>)>,
}

/// Shared in-memory document collection.
/// Clone is cheap - the store is behind an `Arc`.
#[derive(Clone)]
pub struct MemoryGateway {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                docs: BTreeMap::new(),
                subs: Vec::new(),
            })),
        }
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("gateway lock").docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete a document, emitting a `Removed` delta. Models the
    /// external administrative deletion path; the cache itself never
    /// hard-deletes.
    pub fn remove(&self, id: &str) {
        let mut inner = self.inner.lock().expect("gateway lock");
        if inner.docs.remove(id).is_some() {
            Self::emit(&mut inner, DeltaEvent::Removed { id: id.to_string() });
        }
    }

    fn emit(inner: &mut Inner, event: DeltaEvent) {
        inner.subs.retain(|(filter, tx)| {
            let wanted = match (filter, &event) {
                (None, _) => true,
                // Removals are always delivered; the subscriber cannot
                // know which side of the filter the document was on.
                (Some(_), DeltaEvent::Removed { .. }) => true,
                (Some(f), DeltaEvent::Added(v) | DeltaEvent::Modified(v)) => {
                    v.checked == f.checked()
                }
            };
            if !wanted {
                return !tx.is_closed();
            }
            match tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("Delta channel full, dropping subscriber");
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
    }

    fn sort_key(v: &Victim) -> (String, String) {
        (v.nom.clone(), v.id.clone())
    }

    fn cursor_for(v: &Victim) -> Cursor {
        Cursor::new(format!("{}{}{}", v.nom, CURSOR_SEP, v.id))
    }

    fn decode_cursor(cursor: &Cursor) -> (String, String) {
        match cursor.as_str().split_once(CURSOR_SEP) {
            Some((nom, id)) => (nom.to_string(), id.to_string()),
            // Foreign token: resume from the start rather than fail.
            None => (String::new(), String::new()),
        }
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl super::CollectionGateway for MemoryGateway {
    async fn query(
        &self,
        filter: FilterStatus,
        page_size: usize,
        after: Option<&Cursor>,
    ) -> Result<Page, GatewayError> {
        let inner = self.inner.lock().expect("gateway lock");

        let mut matching: Vec<&Victim> = inner
            .docs
            .values()
            .filter(|v| v.checked == filter.checked())
            .collect();
        matching.sort_by_key(|v| Self::sort_key(v));

        let start = match after {
            Some(cursor) => {
                let key = Self::decode_cursor(cursor);
                matching.partition_point(|v| Self::sort_key(v) <= key)
            }
            None => 0,
        };

        let records: Vec<Victim> = matching
            .iter()
            .skip(start)
            .take(page_size)
            .map(|v| (*v).clone())
            .collect();
        let next_cursor = records.last().map(Self::cursor_for);

        debug!(
            filter = %filter,
            fetched = records.len(),
            total_matching = matching.len(),
            "Memory gateway query"
        );

        Ok(Page {
            records,
            next_cursor,
        })
    }

    async fn subscribe(
        &self,
        filter: Option<FilterStatus>,
    ) -> Result<DeltaSubscription, GatewayError> {
        let (tx, rx) = mpsc::channel(DELTA_CHANNEL_SIZE);
        self.inner
            .lock()
            .expect("gateway lock")
            .subs
            .push((filter, tx));
        Ok(DeltaSubscription::new(rx))
    }

    async fn update(&self, id: &str, patch: VictimPatch) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        let updated = match inner.docs.get_mut(id) {
            Some(doc) => {
                doc.checked = patch.checked;
                doc.last_modified = patch.last_modified;
                doc.clone()
            }
            None => {
                return Err(GatewayError::Update {
                    id: id.to_string(),
                    reason: "document not found".to_string(),
                })
            }
        };
        Self::emit(&mut inner, DeltaEvent::Modified(updated));
        Ok(())
    }

    async fn batch_upsert(&self, records: &[Victim]) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        for record in records {
            let event = if inner.docs.contains_key(&record.id) {
                DeltaEvent::Modified(record.clone())
            } else {
                DeltaEvent::Added(record.clone())
            };
            inner.docs.insert(record.id.clone(), record.clone());
            Self::emit(&mut inner, event);
        }
        Ok(())
    }
}
