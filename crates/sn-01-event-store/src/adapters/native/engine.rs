//! # Native Append-Log Engine
//!
//! In-process engine with stream-log semantics: every key holds an ordered
//! log of entries, each entry a strictly increasing id `<millis>-<seq>` plus
//! a list of field/value pairs.
//!
//! | Command | Behavior |
//! |---------|----------|
//! | `xadd` | Append one or more entries atomically; `nomkstream` refuses to create the key |
//! | `xrange` | Inclusive id range of one key |
//! | `xread` | Entries after an id on several keys; optionally blocks until any key grows |
//! | `exists` / `del` / `scan` | Key management |
//!
//! Blocking reads register their wake-up before checking the keys, so an
//! append that lands between the check and the park still wakes them.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::Instant;

// =============================================================================
// ENTRY IDS
// =============================================================================

/// Entry id: milliseconds timestamp plus per-millisecond sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId {
    pub ms: u64,
    pub seq: u64,
}

impl EntryId {
    /// `0-0`, smaller than every real entry.
    pub const ZERO: EntryId = EntryId { ms: 0, seq: 0 };

    #[must_use]
    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }

    /// Next id after `self` given the current clock.
    fn next(self, now_ms: u64) -> Self {
        if now_ms > self.ms {
            Self::new(now_ms, 0)
        } else {
            Self::new(self.ms, self.seq + 1)
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

/// Malformed entry id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid stream ID specified as stream command argument: '{0}'")]
pub struct ParseEntryIdError(pub String);

impl FromStr for EntryId {
    type Err = ParseEntryIdError;

    /// Accepts `<ms>-<seq>` or a bare `<ms>` (sequence 0).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseEntryIdError(s.to_string());
        match s.split_once('-') {
            Some((ms, seq)) => Ok(Self::new(
                ms.parse().map_err(|_| err())?,
                seq.parse().map_err(|_| err())?,
            )),
            None => Ok(Self::new(s.parse().map_err(|_| err())?, 0)),
        }
    }
}

// =============================================================================
// ENTRIES
// =============================================================================

/// Field/value pairs of one entry.
pub type Fields = Vec<(String, String)>;

/// One log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: EntryId,
    pub fields: Fields,
}

impl StreamEntry {
    /// Value of `name`, if present.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Entries returned for one key by `xread`.
pub type KeyEntries = (String, Vec<StreamEntry>);

#[derive(Debug, Default)]
struct KeyLog {
    entries: Vec<StreamEntry>,
    last_id: EntryId,
}

impl KeyLog {
    fn after(&self, id: EntryId, count: usize) -> Vec<StreamEntry> {
        let start = self.entries.partition_point(|e| e.id <= id);
        self.entries[start..].iter().take(count).cloned().collect()
    }
}

/// Engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine was shut down.
    #[error("connection closed")]
    Closed,
}

// =============================================================================
// ENGINE
// =============================================================================

/// The append-log engine. Shared by every connection.
#[derive(Default)]
pub struct NativeEngine {
    keys: RwLock<BTreeMap<String, KeyLog>>,
    appended: Notify,
    closed: AtomicBool,
}

impl NativeEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<(), EngineError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(EngineError::Closed);
        }
        Ok(())
    }

    /// Append `entries` to `key` in one step.
    ///
    /// Returns `None` (nothing written) if `nomkstream` is set and the key
    /// does not exist.
    pub fn xadd(
        &self,
        key: &str,
        entries: Vec<Fields>,
        nomkstream: bool,
    ) -> Result<Option<Vec<EntryId>>, EngineError> {
        self.ensure_open()?;
        let ids = {
            let mut keys = self.keys.write();
            if nomkstream && !keys.contains_key(key) {
                return Ok(None);
            }
            let log = keys.entry(key.to_string()).or_default();
            let mut ids = Vec::with_capacity(entries.len());
            for fields in entries {
                let id = log.last_id.next(now_ms());
                log.last_id = id;
                log.entries.push(StreamEntry { id, fields });
                ids.push(id);
            }
            ids
        };
        self.appended.notify_waiters();
        Ok(Some(ids))
    }

    /// Entries of `key` with `start <= id <= end`; `None` bounds are open.
    pub fn xrange(
        &self,
        key: &str,
        start: Option<EntryId>,
        end: Option<EntryId>,
    ) -> Result<Vec<StreamEntry>, EngineError> {
        self.ensure_open()?;
        let keys = self.keys.read();
        let Some(log) = keys.get(key) else {
            return Ok(Vec::new());
        };
        Ok(log
            .entries
            .iter()
            .filter(|e| start.map_or(true, |s| e.id >= s) && end.map_or(true, |t| e.id <= t))
            .cloned()
            .collect())
    }

    /// Up to `count` entries after the given id, per key.
    ///
    /// Only keys with entries are returned. With `block = Some(d)` and
    /// nothing available, waits up to `d` for an append to any of the keys;
    /// an empty result means the wait timed out or the engine closed.
    pub async fn xread(
        &self,
        count: usize,
        block: Option<Duration>,
        streams: &[(String, EntryId)],
    ) -> Result<Vec<KeyEntries>, EngineError> {
        self.ensure_open()?;
        let Some(block) = block else {
            return Ok(self.collect(count, streams));
        };

        let sleep = tokio::time::sleep_until(Instant::now() + block);
        tokio::pin!(sleep);
        loop {
            let notified = self.appended.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.closed.load(Ordering::Acquire) {
                return Ok(Vec::new());
            }
            let ready = self.collect(count, streams);
            if !ready.is_empty() {
                return Ok(ready);
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = &mut sleep => return Ok(Vec::new()),
            }
        }
    }

    fn collect(&self, count: usize, streams: &[(String, EntryId)]) -> Vec<KeyEntries> {
        let keys = self.keys.read();
        streams
            .iter()
            .filter_map(|(key, id)| {
                let entries = keys.get(key)?.after(*id, count);
                (!entries.is_empty()).then(|| (key.clone(), entries))
            })
            .collect()
    }

    /// Whether `key` holds a log.
    pub fn exists(&self, key: &str) -> Result<bool, EngineError> {
        self.ensure_open()?;
        Ok(self.keys.read().contains_key(key))
    }

    /// Remove `keys`, returning how many existed.
    pub fn del(&self, keys: &[String]) -> Result<usize, EngineError> {
        self.ensure_open()?;
        let mut map = self.keys.write();
        Ok(keys.iter().filter(|k| map.remove(k.as_str()).is_some()).count())
    }

    /// Every key starting with `prefix`, sorted.
    pub fn scan(&self, prefix: &str) -> Result<Vec<String>, EngineError> {
        self.ensure_open()?;
        Ok(self
            .keys
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    /// Refuse further commands and release blocked readers.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.appended.notify_waiters();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
