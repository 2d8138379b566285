//! sinistres-core - data layer of the sinistrés victim registry.
//!
//! The registry lets relief operators import census records from
//! spreadsheet sources, search and page through them, mark them as
//! verified, and export them back out, behind an admin-approval gate
//! on operator accounts. This crate is everything below the UI:
//!
//! - `models`: the `Victim` record and the account model
//! - `gateway`: the paginated remote collection seam, deltas included,
//!   with an in-memory implementation
//! - `search`: the full-text search seam and its Meilisearch client
//! - `cache`: `SyncedVictims`, the synchronized paginated view
//! - `import` / `export`: row normalization in, tabular rows out
//! - `users`: the admin-side account directory
//!
//! The cache is single-threaded by design; run it on a current-thread
//! runtime or inside one task. Gateways are async and shared.

#![allow(async_fn_in_trait)]

pub mod cache;
pub mod config;
pub mod export;
pub mod gateway;
pub mod import;
pub mod models;
pub mod search;
pub mod users;

pub use cache::{MutationError, SearchState, SyncedVictims};
pub use config::{CacheConfig, SearchConfig};
pub use gateway::{
    CollectionGateway, Cursor, DeltaEvent, DeltaSubscription, FilterStatus, GatewayError,
    MemoryGateway, Page,
};
pub use import::{ImportError, ImportSummary, RawRow};
pub use models::{AuthUser, Role, UserProfile, Victim, VictimPatch};
pub use search::{MeiliGateway, NoSearch, SearchError, SearchGateway};
pub use users::{UserDirectory, UserGateway};
