//! # Native Stream Store (Backend B)
//!
//! One native log per stream under key `es:<streamId>`, one field `event`
//! per entry holding the JSON-encoded event. Cookies are entry ids.
//!
//! Long polls delegate to the engine's blocking `xread` on a pooled
//! connection. One deadline bounds both the checkout and the engine's wait.

use super::connection::NativeConnection;
use super::engine::{EntryId, Fields, KeyEntries, NativeEngine, StreamEntry};
use crate::domain::pool::ConnectionPool;
use crate::domain::reads::{decode_event, encode_event, ensure_events, ensure_positions, make_output};
use crate::domain::settings::{EventStoreKind, StoreSettings};
use crate::ports::EventStore;
use async_trait::async_trait;
use shared_types::{
    FullEvent, StreamAndCookie, StreamError, StreamId, StreamResult, StreamsAndCookies,
    SyncCookie, SyncPos,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Key prefix of every stream log.
pub const KEY_PREFIX: &str = "es:";

/// The single field of every entry.
pub const EVENT_FIELD: &str = "event";

fn stream_key(stream_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, stream_id)
}

/// Backend B.
pub struct NativeStreamStore {
    engine: Arc<NativeEngine>,
    shared: NativeConnection,
    readers: ConnectionPool<NativeConnection>,
    read_count: usize,
}

impl NativeStreamStore {
    /// Open a store on a fresh engine.
    #[must_use]
    pub fn open(settings: &StoreSettings) -> Self {
        Self::open_with_engine(settings, Arc::new(NativeEngine::new()))
    }

    /// Open a store on an existing engine.
    #[must_use]
    pub fn open_with_engine(settings: &StoreSettings, engine: Arc<NativeEngine>) -> Self {
        let readers = (0..settings.reader_pool_size.max(1))
            .map(|i| NativeConnection::new(engine.clone(), format!("reader-{}", i)))
            .collect();

        info!(
            reader_pool_size = settings.reader_pool_size,
            read_count = settings.read_count,
            "Native stream store opened"
        );

        Self {
            shared: NativeConnection::new(engine.clone(), "shared"),
            readers: ConnectionPool::new("reader", readers),
            read_count: settings.read_count.max(1),
            engine,
        }
    }

    /// The underlying engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<NativeEngine> {
        &self.engine
    }

    fn ensure_open(&self) -> StreamResult<()> {
        if self.engine.is_closed() {
            return Err(StreamError::StoreClosed);
        }
        Ok(())
    }

    fn entries_for(events: &[FullEvent]) -> StreamResult<Vec<Fields>> {
        events
            .iter()
            .map(|event| Ok(vec![(EVENT_FIELD.to_string(), encode_event(event)?)]))
            .collect()
    }

    /// Fold `xread` output into per-stream results, tracking the last id
    /// seen per stream as its new cookie.
    fn fold(
        entries: Vec<KeyEntries>,
        original: &HashMap<String, &SyncPos>,
    ) -> StreamResult<StreamsAndCookies> {
        let mut out = StreamsAndCookies::new();
        for (key, entries) in entries {
            let Some(pos) = original.get(&key) else {
                continue;
            };
            let mut events = Vec::with_capacity(entries.len());
            let mut last = None;
            for entry in &entries {
                events.push(decode_entry(&key, entry)?);
                last = Some(entry.id);
            }
            if let Some(last) = last {
                out.insert(
                    pos.stream_id.clone(),
                    make_output(events, last.to_string(), &pos.sync_cookie),
                );
            }
        }
        Ok(out)
    }
}

fn decode_entry(key: &str, entry: &StreamEntry) -> StreamResult<FullEvent> {
    let data = entry.field(EVENT_FIELD).ok_or_else(|| {
        StreamError::Storage(format!("entry {} of {} has no '{}' field", entry.id, key, EVENT_FIELD))
    })?;
    decode_event(data)
}

fn last_cookie(stream_id: &str, ids: Option<Vec<EntryId>>) -> StreamResult<SyncCookie> {
    match ids.and_then(|ids| ids.last().copied()) {
        Some(id) => Ok(id.to_string()),
        None => Err(StreamError::not_found(stream_id)),
    }
}

#[async_trait]
impl EventStore for NativeStreamStore {
    async fn create_event_stream(
        &self,
        stream_id: &str,
        inception_events: &[FullEvent],
    ) -> StreamResult<SyncCookie> {
        self.ensure_open()?;
        ensure_events(stream_id, inception_events)?;

        let key = stream_key(stream_id);
        if self.shared.exists(&key).await? {
            return Err(StreamError::already_exists(stream_id));
        }
        let ids = self
            .shared
            .xadd(&key, Self::entries_for(inception_events)?, false)
            .await?;
        let cookie = last_cookie(stream_id, ids)?;
        debug!(stream_id = %stream_id, cookie = %cookie, "Stream created");
        Ok(cookie)
    }

    async fn add_events(&self, stream_id: &str, events: &[FullEvent]) -> StreamResult<SyncCookie> {
        self.ensure_open()?;
        ensure_events(stream_id, events)?;

        let ids = self
            .shared
            .xadd(&stream_key(stream_id), Self::entries_for(events)?, true)
            .await?;
        let cookie = last_cookie(stream_id, ids)?;
        debug!(stream_id = %stream_id, events = events.len(), cookie = %cookie, "Events appended");
        Ok(cookie)
    }

    async fn stream_exists(&self, stream_id: &str) -> bool {
        match self.shared.exists(&stream_key(stream_id)).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(stream_id = %stream_id, error = %e, "Existence probe failed");
                false
            }
        }
    }

    async fn get_event_stream(&self, stream_id: &str) -> StreamResult<StreamAndCookie> {
        self.ensure_open()?;

        let key = stream_key(stream_id);
        let entries = self.shared.xrange(&key).await?;
        let Some(last) = entries.last().map(|e| e.id) else {
            return Err(StreamError::not_found(stream_id));
        };
        let events = entries
            .iter()
            .map(|entry| decode_entry(&key, entry))
            .collect::<StreamResult<Vec<_>>>()?;
        Ok(StreamAndCookie::new(events, last.to_string()))
    }

    async fn read_new_events(
        &self,
        args: &[SyncPos],
        timeout_ms: u64,
    ) -> StreamResult<StreamsAndCookies> {
        self.ensure_open()?;
        ensure_positions(args)?;

        let mut streams = Vec::with_capacity(args.len());
        let mut original = HashMap::with_capacity(args.len());
        for pos in args {
            let id = pos.sync_cookie.parse::<EntryId>().map_err(|e| {
                StreamError::InvalidArgument(format!("malformed sync cookie: {}", e))
            })?;
            let key = stream_key(&pos.stream_id);
            streams.push((key.clone(), id));
            original.insert(key, pos);
        }

        let entries = if timeout_ms == 0 {
            self.shared.xread(self.read_count, None, &streams).await?
        } else {
            let deadline = Instant::now() + Duration::from_millis(timeout_ms);
            let Some(conn) = self.readers.acquire_until(deadline).await? else {
                debug!(timeout_ms, "No reader free before the deadline");
                return Ok(StreamsAndCookies::new());
            };
            let remaining = deadline.saturating_duration_since(Instant::now());
            debug!(conn = %conn.name(), streams = streams.len(), ?remaining, "Blocking read");
            conn.xread(self.read_count, Some(remaining), &streams).await?
        };

        Self::fold(entries, &original)
    }

    async fn get_event_streams(&self) -> StreamResult<Vec<StreamId>> {
        self.ensure_open()?;
        let keys = self.shared.scan(KEY_PREFIX).await?;
        Ok(keys
            .iter()
            .filter_map(|k| k.strip_prefix(KEY_PREFIX).map(str::to_string))
            .collect())
    }

    async fn delete_event_stream(&self, stream_id: &str) -> StreamResult<()> {
        self.ensure_open()?;
        self.shared.del(&[stream_key(stream_id)]).await?;
        Ok(())
    }

    async fn delete_all_event_streams(&self) -> StreamResult<Vec<StreamId>> {
        self.ensure_open()?;
        let keys = self.shared.scan(KEY_PREFIX).await?;
        self.shared.del(&keys).await?;
        info!(count = keys.len(), "All stream logs deleted");
        Ok(keys
            .iter()
            .filter_map(|k| k.strip_prefix(KEY_PREFIX).map(str::to_string))
            .collect())
    }

    async fn close(&self) {
        if self.engine.is_closed() {
            return;
        }
        self.engine.close();
        self.readers.close();
        info!("Native stream store closed");
    }

    fn kind(&self) -> EventStoreKind {
        EventStoreKind::Native
    }
}
