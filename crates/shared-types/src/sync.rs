//! # Sync Positions
//!
//! Cookies and stream materializations exchanged between readers and the
//! event store.

use crate::entities::{FullEvent, StreamId, SyncCookie};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A reader's position in one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPos {
    pub stream_id: StreamId,
    pub sync_cookie: SyncCookie,
}

impl SyncPos {
    pub fn new(stream_id: impl Into<StreamId>, sync_cookie: impl Into<SyncCookie>) -> Self {
        Self {
            stream_id: stream_id.into(),
            sync_cookie: sync_cookie.into(),
        }
    }
}

/// Events of one stream plus its tail position.
///
/// `original_sync_cookie` is set on read results and echoes the cookie the
/// reader started from, so clients can detect gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamAndCookie {
    pub events: Vec<FullEvent>,
    pub sync_cookie: SyncCookie,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_sync_cookie: Option<SyncCookie>,
}

impl StreamAndCookie {
    /// A full materialization (no starting cookie).
    #[must_use]
    pub fn new(events: Vec<FullEvent>, sync_cookie: SyncCookie) -> Self {
        Self {
            events,
            sync_cookie,
            original_sync_cookie: None,
        }
    }
}

/// Read results keyed by stream id. Streams without new events are absent.
pub type StreamsAndCookies = BTreeMap<StreamId, StreamAndCookie>;
