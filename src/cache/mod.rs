//! The synchronized collection cache.
//!
//! `SyncedVictims` maintains a consistent, queryable, continuously
//! updated view of the victim collection: paginated loads from the
//! collection gateway, live delta merging, debounced remote search
//! with a local fallback, and optimistic verification toggles.
//!
//! Construct one per consumer scope and drop it when done; there is no
//! process-wide instance.

pub mod debounce;
pub mod sync;

pub use debounce::Debouncer;
pub use sync::{MutationError, SearchState, SyncedVictims};
