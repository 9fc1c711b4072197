//! # Log-Structured Event Store (Backend A)
//!
//! One append-only [`Table`] per stream under a data directory. Every
//! committed row is announced on the bus channel `newevent_es_<streamId>`
//! with its `seq_num` as payload, which is what long polls wait on.
//!
//! ## Long poll
//!
//! ```text
//! checkout listener ─→ LISTEN all channels ─→ query all streams
//!                                                 │
//!                              new rows? ─yes─→ return them
//!                                  │ no
//!                   race { notification, timer, close }
//!                                  │
//!          notification: re-query only the stream that fired
//!          timer / close: return {}
//!                                  │
//!            UNLISTEN * ─→ listener back to the pool
//! ```

use super::table::{channel_name, stream_id_from_channel, stream_id_from_file_name, Table};
use crate::adapters::lock::DataDirLock;
use crate::domain::pool::{ConnectionPool, PooledConnection, Recycle};
use crate::domain::reads::{decode_event, encode_event, ensure_events, ensure_positions, make_output};
use crate::domain::settings::{EventStoreKind, StoreSettings};
use crate::ports::EventStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_bus::{InMemoryNotificationBus, Listener, NotificationPublisher, SubscriptionError};
use shared_types::{
    FullEvent, StreamAndCookie, StreamError, StreamId, StreamResult, StreamsAndCookies,
    SyncCookie, SyncPos,
};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

impl Recycle for Listener {
    fn recycle(&mut self) {
        self.unlisten_all();
        self.drain();
    }
}

/// Per-table append state. `last_seq == None` means not loaded from disk.
#[derive(Debug, Default)]
struct TableState {
    last_seq: Option<u64>,
}

/// Backend A.
pub struct LogEventStore {
    root: PathBuf,
    tables: Mutex<HashMap<StreamId, Arc<tokio::sync::Mutex<TableState>>>>,
    bus: Arc<InMemoryNotificationBus>,
    listeners: ConnectionPool<Listener>,
    closed: watch::Sender<bool>,
    _lock: DataDirLock,
}

impl LogEventStore {
    /// Open (creating if needed) the store rooted at `settings.data_dir`.
    ///
    /// # Errors
    ///
    /// `Storage` if the directory cannot be created or is locked by another store.
    pub fn open(settings: &StoreSettings) -> StreamResult<Self> {
        Self::open_with_bus(settings, Arc::new(InMemoryNotificationBus::new()))
    }

    /// Open the store publishing on an existing bus.
    pub fn open_with_bus(
        settings: &StoreSettings,
        bus: Arc<InMemoryNotificationBus>,
    ) -> StreamResult<Self> {
        std::fs::create_dir_all(&settings.data_dir)?;
        let lock = DataDirLock::acquire(&settings.data_dir)?;

        let listeners = (0..settings.listener_pool_size.max(1))
            .map(|_| bus.listener())
            .collect();
        let (closed, _) = watch::channel(false);

        info!(
            data_dir = %settings.data_dir.display(),
            listener_pool_size = settings.listener_pool_size,
            "Log event store opened"
        );

        Ok(Self {
            root: settings.data_dir.clone(),
            tables: Mutex::new(HashMap::new()),
            bus,
            listeners: ConnectionPool::new("listener", listeners),
            closed,
            _lock: lock,
        })
    }

    /// Root directory of the table files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The bus inserts are announced on.
    #[must_use]
    pub fn bus(&self) -> &Arc<InMemoryNotificationBus> {
        &self.bus
    }

    fn ensure_open(&self) -> StreamResult<()> {
        if *self.closed.borrow() {
            return Err(StreamError::StoreClosed);
        }
        Ok(())
    }

    fn table(&self, stream_id: &str) -> Table {
        Table::new(&self.root, stream_id)
    }

    fn table_state(&self, stream_id: &str) -> Arc<tokio::sync::Mutex<TableState>> {
        self.tables
            .lock()
            .entry(stream_id.to_string())
            .or_default()
            .clone()
    }

    /// Insert rows under the table lock, then fire the insert trigger.
    async fn insert_locked(
        &self,
        stream_id: &str,
        table: &Table,
        state: &mut TableState,
        rows: &[String],
    ) -> StreamResult<SyncCookie> {
        let result = async {
            let last = match state.last_seq {
                Some(seq) => seq,
                None => table.recover().await?,
            };
            let new_last = table.insert(last + 1, rows).await?;
            Ok::<_, io::Error>((last, new_last))
        }
        .await;

        let (last, new_last) = match result {
            Ok(seqs) => seqs,
            Err(e) => {
                state.last_seq = None;
                return Err(table_error(stream_id, e));
            }
        };
        state.last_seq = Some(new_last);

        let channel = channel_name(stream_id);
        for seq in (last + 1)..=new_last {
            self.bus.notify(&channel, &seq.to_string()).await;
        }
        debug!(stream_id = %stream_id, rows = rows.len(), cookie = new_last, "Rows inserted");
        Ok(new_last.to_string())
    }

    /// New rows for each position; streams with nothing new are omitted.
    async fn query_positions(&self, positions: &[(&SyncPos, u64)]) -> StreamResult<StreamsAndCookies> {
        let mut out = StreamsAndCookies::new();
        for (pos, after) in positions {
            let rows = match self.table(&pos.stream_id).select_after(*after).await {
                Ok(rows) => rows,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StreamError::from(e)),
            };
            let Some(last) = rows.last().map(|row| row.seq_num) else {
                continue;
            };
            let events = rows
                .iter()
                .map(|row| decode_event(&row.data))
                .collect::<StreamResult<Vec<_>>>()?;
            out.insert(
                pos.stream_id.clone(),
                make_output(events, last.to_string(), &pos.sync_cookie),
            );
        }
        Ok(out)
    }

    async fn wait_for_events(
        &self,
        conn: &mut PooledConnection<'_, Listener>,
        positions: &[(&SyncPos, u64)],
        deadline: Instant,
    ) -> StreamResult<StreamsAndCookies> {
        let mut closed = self.closed.subscribe();

        let initial = self.query_positions(positions).await?;
        if !initial.is_empty() || *closed.borrow() {
            return Ok(initial);
        }

        let sleep = tokio::time::sleep_until(deadline);
        tokio::pin!(sleep);
        debug!(streams = positions.len(), "Parking long poll");

        loop {
            tokio::select! {
                _ = &mut sleep => {
                    debug!("Long poll timed out");
                    return Ok(StreamsAndCookies::new());
                }
                _ = closed.changed() => {
                    debug!("Long poll released by close");
                    return Ok(StreamsAndCookies::new());
                }
                received = conn.recv() => match received {
                    Ok(notification) => {
                        let Some(pos) = stream_id_from_channel(&notification.channel)
                            .and_then(|id| positions.iter().find(|(p, _)| p.stream_id == id))
                        else {
                            continue;
                        };
                        let out = self.query_positions(std::slice::from_ref(pos)).await?;
                        if !out.is_empty() {
                            debug!(
                                stream_id = %pos.0.stream_id,
                                cookie = %notification.payload,
                                "Long poll woken"
                            );
                            return Ok(out);
                        }
                    }
                    Err(SubscriptionError::Lagged(dropped)) => {
                        warn!(dropped = dropped, "Listener lagged, re-checking all streams");
                        let out = self.query_positions(positions).await?;
                        if !out.is_empty() {
                            return Ok(out);
                        }
                    }
                    Err(SubscriptionError::Closed) => return Ok(StreamsAndCookies::new()),
                }
            }
        }
    }
}

fn table_error(stream_id: &str, e: io::Error) -> StreamError {
    if e.kind() == io::ErrorKind::NotFound {
        StreamError::not_found(stream_id)
    } else {
        StreamError::from(e)
    }
}

fn parse_cookie(cookie: &str) -> StreamResult<u64> {
    cookie
        .parse::<u64>()
        .map_err(|_| StreamError::InvalidArgument(format!("malformed sync cookie '{}'", cookie)))
}

#[async_trait]
impl EventStore for LogEventStore {
    async fn create_event_stream(
        &self,
        stream_id: &str,
        inception_events: &[FullEvent],
    ) -> StreamResult<SyncCookie> {
        self.ensure_open()?;
        ensure_events(stream_id, inception_events)?;

        let table = self.table(stream_id);
        if table.exists().await? {
            return Err(StreamError::already_exists(stream_id));
        }
        let rows = inception_events
            .iter()
            .map(encode_event)
            .collect::<StreamResult<Vec<_>>>()?;

        let state = self.table_state(stream_id);
        let mut state = state.lock().await;
        if table.create().await? {
            state.last_seq = Some(0);
        } else {
            // Relation already exists: a concurrent create won the race.
            debug!(stream_id = %stream_id, "Table created concurrently, retrying plain insert");
        }
        self.insert_locked(stream_id, &table, &mut state, &rows).await
    }

    async fn add_events(&self, stream_id: &str, events: &[FullEvent]) -> StreamResult<SyncCookie> {
        self.ensure_open()?;
        ensure_events(stream_id, events)?;

        let rows = events
            .iter()
            .map(encode_event)
            .collect::<StreamResult<Vec<_>>>()?;
        let table = self.table(stream_id);
        let state = self.table_state(stream_id);
        let mut state = state.lock().await;
        self.insert_locked(stream_id, &table, &mut state, &rows).await
    }

    async fn stream_exists(&self, stream_id: &str) -> bool {
        match self.table(stream_id).exists().await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(stream_id = %stream_id, error = %e, "Existence probe failed");
                false
            }
        }
    }

    async fn get_event_stream(&self, stream_id: &str) -> StreamResult<StreamAndCookie> {
        self.ensure_open()?;

        let rows = self
            .table(stream_id)
            .select_all()
            .await
            .map_err(|e| table_error(stream_id, e))?;
        let Some(last) = rows.last().map(|row| row.seq_num) else {
            return Err(StreamError::not_found(stream_id));
        };
        let events = rows
            .iter()
            .map(|row| decode_event(&row.data))
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
        let positions = args
            .iter()
            .map(|pos| Ok((pos, parse_cookie(&pos.sync_cookie)?)))
            .collect::<StreamResult<Vec<_>>>()?;

        if timeout_ms == 0 {
            return self.query_positions(&positions).await;
        }

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let Some(mut conn) = self.listeners.acquire_until(deadline).await? else {
            debug!(timeout_ms = timeout_ms, "No listener free before the deadline");
            return Ok(StreamsAndCookies::new());
        };
        conn.drain();
        for (pos, _) in &positions {
            conn.listen(&channel_name(&pos.stream_id));
        }

        let result = self.wait_for_events(&mut conn, &positions, deadline).await;

        conn.unlisten_all();
        debug!(streams = positions.len(), "UNLISTEN *");
        result
    }

    async fn get_event_streams(&self) -> StreamResult<Vec<StreamId>> {
        self.ensure_open()?;

        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if let Some(id) = name.to_str().and_then(stream_id_from_file_name) {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn delete_event_stream(&self, stream_id: &str) -> StreamResult<()> {
        self.ensure_open()?;

        let state = self.table_state(stream_id);
        let mut state = state.lock().await;
        let dropped = self.table(stream_id).drop_table().await?;
        state.last_seq = None;
        if dropped {
            debug!(stream_id = %stream_id, "Table dropped");
        }
        Ok(())
    }

    async fn delete_all_event_streams(&self) -> StreamResult<Vec<StreamId>> {
        let ids = self.get_event_streams().await?;
        for id in &ids {
            self.delete_event_stream(id).await?;
        }
        info!(count = ids.len(), "All tables dropped");
        Ok(ids)
    }

    async fn close(&self) {
        if self.closed.send_replace(true) {
            return;
        }
        self.listeners.close();
        info!(data_dir = %self.root.display(), "Log event store closed");
    }

    fn kind(&self) -> EventStoreKind {
        EventStoreKind::Log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::{make_event, make_events, SignerContext};
    use shared_types::{ErrorCode, InceptionData, Payload, StreamKind};
    use std::time::Instant as StdInstant;
    use tempfile::TempDir;

    fn open() -> (TempDir, Arc<LogEventStore>) {
        let dir = tempfile::tempdir().unwrap();
        let settings = StoreSettings::new(EventStoreKind::Log, dir.path());
        let store = Arc::new(LogEventStore::open(&settings).unwrap());
        (dir, store)
    }

    fn inception(signer: &SignerContext, stream_id: &str) -> Vec<FullEvent> {
        make_events(
            signer,
            vec![Payload::Inception {
                stream_id: stream_id.to_string(),
                data: InceptionData::new(StreamKind::Space),
            }],
            vec![],
        )
        .unwrap()
    }

    fn message(signer: &SignerContext, prev: &str, text: &str) -> FullEvent {
        make_event(
            signer,
            Payload::Message {
                text: text.to_string(),
            },
            vec![prev.to_string()],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_dir, store) = open();
        let signer = SignerContext::random();
        let events = inception(&signer, "spc-a");

        assert!(!store.stream_exists("spc-a").await);
        let cookie = store.create_event_stream("spc-a", &events).await.unwrap();
        assert_eq!(cookie, "1");
        assert!(store.stream_exists("spc-a").await);

        let stream = store.get_event_stream("spc-a").await.unwrap();
        assert_eq!(stream.events, events);
        assert_eq!(stream.sync_cookie, "1");
    }

    #[tokio::test]
    async fn test_create_twice_fails() {
        let (_dir, store) = open();
        let signer = SignerContext::random();
        let events = inception(&signer, "spc-a");
        store.create_event_stream("spc-a", &events).await.unwrap();

        let err = store.create_event_stream("spc-a", &events).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::StreamAlreadyExists);
        assert_eq!(store.get_event_stream("spc-a").await.unwrap().events.len(), 1);
    }

    #[tokio::test]
    async fn test_add_events_order_and_cookies() {
        let (_dir, store) = open();
        let signer = SignerContext::random();
        let events = inception(&signer, "spc-a");
        let c1 = store.create_event_stream("spc-a", &events).await.unwrap();

        let m1 = message(&signer, &events[0].hash, "one");
        let m2 = message(&signer, &m1.hash, "two");
        let m3 = message(&signer, &m2.hash, "three");
        let c2 = store.add_events("spc-a", &[m1.clone(), m2.clone()]).await.unwrap();
        let c3 = store.add_events("spc-a", &[m3.clone()]).await.unwrap();

        let parsed: Vec<u64> = [&c1, &c2, &c3].iter().map(|c| c.parse().unwrap()).collect();
        assert!(parsed.windows(2).all(|w| w[0] < w[1]));

        let stream = store.get_event_stream("spc-a").await.unwrap();
        assert_eq!(stream.events, vec![events[0].clone(), m1, m2, m3]);
        assert_eq!(stream.sync_cookie, c3);
    }

    #[tokio::test]
    async fn test_add_events_never_creates() {
        let (_dir, store) = open();
        let signer = SignerContext::random();
        let m = message(&signer, "0x00", "hi");

        let err = store.add_events("spc-missing", &[m]).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.stream_exists("spc-missing").await);
    }

    #[tokio::test]
    async fn test_empty_append_is_invalid() {
        let (_dir, store) = open();
        let signer = SignerContext::random();
        store
            .create_event_stream("spc-a", &inception(&signer, "spc-a"))
            .await
            .unwrap();

        let err = store.add_events("spc-a", &[]).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_get_missing_stream() {
        let (_dir, store) = open();
        let err = store.get_event_stream("spc-nope").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::StreamNotFound);
    }

    #[tokio::test]
    async fn test_read_your_writes() {
        let (_dir, store) = open();
        let signer = SignerContext::random();
        let events = inception(&signer, "spc-a");
        let before = store.create_event_stream("spc-a", &events).await.unwrap();

        let m = message(&signer, &events[0].hash, "hi");
        let after = store.add_events("spc-a", &[m.clone()]).await.unwrap();

        let out = store
            .read_new_events(&[SyncPos::new("spc-a", before.clone())], 0)
            .await
            .unwrap();
        let stream = &out["spc-a"];
        assert_eq!(stream.events, vec![m]);
        assert_eq!(stream.sync_cookie, after);
        assert_eq!(stream.original_sync_cookie.as_deref(), Some(before.as_str()));
    }

    #[tokio::test]
    async fn test_zero_timeout_never_blocks() {
        let (_dir, store) = open();
        let signer = SignerContext::random();
        let cookie = store
            .create_event_stream("spc-a", &inception(&signer, "spc-a"))
            .await
            .unwrap();

        let start = StdInstant::now();
        let out = store
            .read_new_events(&[SyncPos::new("spc-a", cookie)], 0)
            .await
            .unwrap();
        assert!(out.is_empty());
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_timeout_elapses_before_empty_return() {
        let (_dir, store) = open();
        let signer = SignerContext::random();
        let cookie = store
            .create_event_stream("spc-a", &inception(&signer, "spc-a"))
            .await
            .unwrap();

        let start = StdInstant::now();
        let out = store
            .read_new_events(&[SyncPos::new("spc-a", cookie)], 300)
            .await
            .unwrap();
        assert!(out.is_empty());
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert_eq!(store.listeners.available(), store.listeners.size());
        assert_eq!(store.bus().listener_count(&channel_name("spc-a")), 0);

        // The pool hands back the most recently returned listener.
        let conn = store.listeners.acquire().await.unwrap();
        assert!(!conn.is_listening(&channel_name("spc-a")));
        assert_eq!(conn.channel_count(), 0);
    }

    #[tokio::test]
    async fn test_wakes_on_one_of_three() {
        let (_dir, store) = open();
        let signer = SignerContext::random();
        let mut positions = Vec::new();
        let mut heads = Vec::new();
        for id in ["spc-1", "spc-2", "spc-3"] {
            let events = inception(&signer, id);
            let cookie = store.create_event_stream(id, &events).await.unwrap();
            positions.push(SyncPos::new(id, cookie));
            heads.push(events[0].hash.clone());
        }

        let reader = {
            let store = store.clone();
            let positions = positions.clone();
            tokio::spawn(async move { store.read_new_events(&positions, 2000).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let start = StdInstant::now();
        let m = message(&signer, &heads[1], "wake");
        store.add_events("spc-2", &[m.clone()]).await.unwrap();

        let out = reader.await.unwrap().unwrap();
        assert!(start.elapsed() < Duration::from_millis(1000));
        assert_eq!(out.len(), 1);
        assert_eq!(out["spc-2"].events, vec![m]);
        assert_eq!(store.bus().listener_count(&channel_name("spc-1")), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_busy_listener_pool_respects_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = StoreSettings::new(EventStoreKind::Log, dir.path());
        settings.listener_pool_size = 1;
        let store = Arc::new(LogEventStore::open(&settings).unwrap());
        let signer = SignerContext::random();
        let cookie = store
            .create_event_stream("spc-a", &inception(&signer, "spc-a"))
            .await
            .unwrap();

        let holder = {
            let store = store.clone();
            let cookie = cookie.clone();
            tokio::spawn(async move {
                store
                    .read_new_events(&[SyncPos::new("spc-a", cookie)], 3_000)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.listeners.available(), 0);

        let start = StdInstant::now();
        let out = store
            .read_new_events(&[SyncPos::new("spc-a", cookie)], 100)
            .await
            .unwrap();
        assert!(out.is_empty());
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert!(start.elapsed() < Duration::from_millis(1_000), "{:?}", start.elapsed());

        store.close().await;
        assert!(holder.await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_close_releases_long_poll() {
        let (_dir, store) = open();
        let signer = SignerContext::random();
        let cookie = store
            .create_event_stream("spc-a", &inception(&signer, "spc-a"))
            .await
            .unwrap();

        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .read_new_events(&[SyncPos::new("spc-a", cookie)], 5000)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let start = StdInstant::now();
        store.close().await;
        let out = reader.await.unwrap().unwrap();
        assert!(out.is_empty());
        assert!(start.elapsed() < Duration::from_millis(1000));

        let err = store.get_event_stream("spc-a").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::StoreClosed);
        store.close().await;
    }

    #[tokio::test]
    async fn test_read_arguments_validated() {
        let (_dir, store) = open();

        let err = store.read_new_events(&[], 0).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);

        let err = store
            .read_new_events(&[SyncPos::new("spc-a", "0-1")], 0)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let (_dir, store) = open();
        let signer = SignerContext::random();
        for id in ["spc-b", "spc-a", "chn-c"] {
            store
                .create_event_stream(id, &inception(&signer, id))
                .await
                .unwrap();
        }

        assert_eq!(
            store.get_event_streams().await.unwrap(),
            vec!["chn-c", "spc-a", "spc-b"]
        );

        store.delete_event_stream("spc-a").await.unwrap();
        store.delete_event_stream("spc-a").await.unwrap();
        assert!(!store.stream_exists("spc-a").await);

        let removed = store.delete_all_event_streams().await.unwrap();
        assert_eq!(removed, vec!["chn-c", "spc-b"]);
        assert!(store.get_event_streams().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reopen_continues_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let settings = StoreSettings::new(EventStoreKind::Log, dir.path());
        let signer = SignerContext::random();
        let events = inception(&signer, "spc-a");
        {
            let store = LogEventStore::open(&settings).unwrap();
            store.create_event_stream("spc-a", &events).await.unwrap();
            store.close().await;
        }

        let store = LogEventStore::open(&settings).unwrap();
        let m = message(&signer, &events[0].hash, "again");
        assert_eq!(store.add_events("spc-a", &[m]).await.unwrap(), "2");
    }

    #[tokio::test]
    async fn test_second_store_on_same_dir_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let settings = StoreSettings::new(EventStoreKind::Log, dir.path());
        let _first = LogEventStore::open(&settings).unwrap();

        let err = LogEventStore::open(&settings).err().unwrap();
        assert_eq!(err.code(), ErrorCode::StorageError);
    }
}
