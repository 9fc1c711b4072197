//! Client connection to the native engine.
//!
//! The store keeps one shared connection for non-blocking commands and a
//! pool of connections reserved for blocking reads, so a parked `xread`
//! never stalls appends.

use super::engine::{EngineError, EntryId, Fields, KeyEntries, NativeEngine, StreamEntry};
use crate::domain::pool::Recycle;
use shared_types::{StreamError, StreamResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

impl From<EngineError> for StreamError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Closed => StreamError::StoreClosed,
        }
    }
}

/// One client connection.
pub struct NativeConnection {
    engine: Arc<NativeEngine>,
    name: String,
}

impl NativeConnection {
    #[must_use]
    pub fn new(engine: Arc<NativeEngine>, name: impl Into<String>) -> Self {
        Self {
            engine,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn xadd(
        &self,
        key: &str,
        entries: Vec<Fields>,
        nomkstream: bool,
    ) -> StreamResult<Option<Vec<EntryId>>> {
        trace!(conn = %self.name, key = key, entries = entries.len(), nomkstream, "XADD");
        Ok(self.engine.xadd(key, entries, nomkstream)?)
    }

    pub async fn xrange(&self, key: &str) -> StreamResult<Vec<StreamEntry>> {
        trace!(conn = %self.name, key = key, "XRANGE - +");
        Ok(self.engine.xrange(key, None, None)?)
    }

    pub async fn xread(
        &self,
        count: usize,
        block: Option<Duration>,
        streams: &[(String, EntryId)],
    ) -> StreamResult<Vec<KeyEntries>> {
        trace!(
            conn = %self.name,
            count,
            block_ms = block.map(|d| d.as_millis() as u64),
            keys = streams.len(),
            "XREAD"
        );
        Ok(self.engine.xread(count, block, streams).await?)
    }

    pub async fn exists(&self, key: &str) -> StreamResult<bool> {
        Ok(self.engine.exists(key)?)
    }

    pub async fn del(&self, keys: &[String]) -> StreamResult<usize> {
        trace!(conn = %self.name, keys = keys.len(), "DEL");
        Ok(self.engine.del(keys)?)
    }

    pub async fn scan(&self, prefix: &str) -> StreamResult<Vec<String>> {
        Ok(self.engine.scan(prefix)?)
    }
}

impl Recycle for NativeConnection {
    // Blocking reads leave no state on the connection.
    fn recycle(&mut self) {}
}
