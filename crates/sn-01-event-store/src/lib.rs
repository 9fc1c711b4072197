//! # Event Store (sn-01)
//!
//! Persistence layer for event streams. Every stream is an ordered,
//! append-only log with a per-stream position marker (the sync cookie) and
//! a blocking multi-stream read.
//!
//! ## Backends
//!
//! | Kind | Storage | Long poll |
//! |------|---------|-----------|
//! | `log` | One table file per stream | LISTEN on `newevent_es_<id>`, race timer and close |
//! | `native` | One append-log per stream (`es:<id>`) | Blocking `xread` on a pooled connection |
//!
//! ## Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Append Order | Read order equals append order within a stream |
//! | 2 | Monotonic Cookies | Each append returns a strictly larger cookie |
//! | 3 | No Implicit Create | `add_events` never creates a stream |
//! | 4 | Guaranteed Release | Pooled connections return on every exit path |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Connection pool, backend selection, read helpers
//! - `ports/` - The `EventStore` trait
//! - `adapters/` - Backend implementations
//!
//! ## Usage
//!
//! ```ignore
//! use sn_01_event_store::{open_event_store, EventStoreKind, StoreSettings};
//!
//! let store = open_event_store(&StoreSettings::new(EventStoreKind::Log, "./data"))?;
//! let cookie = store.create_event_stream(&stream_id, &inception).await?;
//! let news = store.read_new_events(&[SyncPos::new(stream_id, cookie)], 30_000).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;

use std::sync::Arc;

pub use adapters::{LogEventStore, NativeStreamStore};
pub use domain::{
    EventStoreKind, StoreSettings, UnknownStoreKind, DEFAULT_LISTENER_POOL_SIZE,
    DEFAULT_READER_POOL_SIZE, DEFAULT_READ_COUNT,
};
pub use ports::EventStore;

use shared_types::StreamResult;

/// Open the backend named by `settings.kind`.
///
/// # Errors
///
/// `Storage` if Backend A cannot create or lock its data directory.
pub fn open_event_store(settings: &StoreSettings) -> StreamResult<Arc<dyn EventStore>> {
    let store: Arc<dyn EventStore> = match settings.kind {
        EventStoreKind::Log => Arc::new(LogEventStore::open(settings)?),
        EventStoreKind::Native => Arc::new(NativeStreamStore::open(settings)),
    };
    Ok(store)
}
