//! # EventStore Port
//!
//! The storage contract every backend implements. Callers hold an
//! `Arc<dyn EventStore>` selected at startup (see [`crate::open_event_store`]).

use crate::domain::settings::EventStoreKind;
use async_trait::async_trait;
use shared_types::{FullEvent, StreamAndCookie, StreamId, StreamResult, StreamsAndCookies, SyncCookie, SyncPos};

/// Ordered, append-only event log keyed by stream id.
///
/// ## Guarantees
///
/// - Within one stream, append order equals read order and cookies strictly
///   increase.
/// - No ordering across streams.
/// - `StreamNotFound` is distinct from storage failures
///   ([`shared_types::StreamError::is_not_found`]).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Create backing storage for `stream_id` and append `inception_events`.
    ///
    /// # Errors
    ///
    /// - `StreamAlreadyExists` if the stream's storage is already present
    /// - `InvalidArgument` if `inception_events` is empty
    ///
    /// # Returns
    ///
    /// Cookie of the last appended event.
    async fn create_event_stream(
        &self,
        stream_id: &str,
        inception_events: &[FullEvent],
    ) -> StreamResult<SyncCookie>;

    /// Append `events` in order to an existing stream. Never creates.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `events` is empty
    /// - `StreamNotFound` if the stream does not exist
    async fn add_events(&self, stream_id: &str, events: &[FullEvent]) -> StreamResult<SyncCookie>;

    /// Non-failing existence probe.
    async fn stream_exists(&self, stream_id: &str) -> bool;

    /// Full ordered event list and tail cookie.
    ///
    /// # Errors
    ///
    /// `StreamNotFound` if the stream has no events.
    async fn get_event_stream(&self, stream_id: &str) -> StreamResult<StreamAndCookie>;

    /// Events strictly after each position.
    ///
    /// With `timeout_ms == 0` never blocks. Otherwise, if nothing is new,
    /// suspends until one of the streams receives an append (only that
    /// stream is returned), the timeout elapses, or the store is closed
    /// (both return an empty map).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty `args` list or a malformed cookie.
    async fn read_new_events(
        &self,
        args: &[SyncPos],
        timeout_ms: u64,
    ) -> StreamResult<StreamsAndCookies>;

    /// Every stream present in the backend, sorted.
    async fn get_event_streams(&self) -> StreamResult<Vec<StreamId>>;

    /// Drop one stream's storage. Deleting a missing stream is not an error.
    async fn delete_event_stream(&self, stream_id: &str) -> StreamResult<()>;

    /// Drop every stream, returning the ids removed.
    async fn delete_all_event_streams(&self) -> StreamResult<Vec<StreamId>>;

    /// Release backend resources and wake pending long polls.
    ///
    /// Later calls fail with `StoreClosed`. Closing twice is a no-op.
    async fn close(&self);

    /// Which backend this is.
    fn kind(&self) -> EventStoreKind;
}
