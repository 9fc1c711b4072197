//! # Service Request/Response Payloads
//!
//! The calling contract of the stream service. The transport that carries
//! these (HTTP, JSON-RPC) lives outside this workspace; field names are
//! camelCase on the wire.

use crate::entities::{FullEvent, StreamId, SyncCookie};
use crate::sync::{StreamsAndCookies, SyncPos};
use serde::{Deserialize, Serialize};

/// `createUser` / `createSpace` / `createChannel` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStreamRequest {
    pub events: Vec<FullEvent>,
}

/// Cookie of the last event written by a create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStreamResponse {
    pub sync_cookie: SyncCookie,
}

/// `addEvent` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEventRequest {
    pub stream_id: StreamId,
    pub event: FullEvent,
}

/// `addEvent` has an empty response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddEventResponse {}

/// `getEventStream` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetEventStreamRequest {
    pub stream_id: StreamId,
}

/// `syncStreams` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStreamsRequest {
    pub sync_positions: Vec<SyncPos>,
    /// Long-poll budget; 0 never blocks.
    #[serde(default)]
    pub timeout_ms: u64,
}

/// `syncStreams` response. Only streams with new events are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStreamsResponse {
    pub streams: StreamsAndCookies,
}
