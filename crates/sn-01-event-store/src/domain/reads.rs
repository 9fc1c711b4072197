//! Helpers shared by both backends' read paths.

use shared_types::{FullEvent, StreamAndCookie, StreamError, StreamResult, SyncCookie, SyncPos};

/// Reject an empty position list.
pub fn ensure_positions(args: &[SyncPos]) -> StreamResult<()> {
    if args.is_empty() {
        return Err(StreamError::InvalidArgument(
            "read_new_events requires at least one sync position".to_string(),
        ));
    }
    Ok(())
}

/// Reject an empty append.
pub fn ensure_events(stream_id: &str, events: &[FullEvent]) -> StreamResult<()> {
    if events.is_empty() {
        return Err(StreamError::InvalidArgument(format!(
            "no events to append to {}",
            stream_id
        )));
    }
    Ok(())
}

/// Decode stored event JSON.
pub fn decode_event(data: &str) -> StreamResult<FullEvent> {
    serde_json::from_str(data).map_err(StreamError::from)
}

/// Encode an event for storage.
pub fn encode_event(event: &FullEvent) -> StreamResult<String> {
    serde_json::to_string(event).map_err(StreamError::from)
}

/// Shape one stream's new events as a read result.
pub fn make_output(
    events: Vec<FullEvent>,
    sync_cookie: SyncCookie,
    original_sync_cookie: &str,
) -> StreamAndCookie {
    StreamAndCookie {
        events,
        sync_cookie,
        original_sync_cookie: Some(original_sync_cookie.to_string()),
    }
}
