//! Leaf (DAG tip) computation.

use shared_types::{EventHash, FullEvent, StreamError, StreamResult};
use std::collections::HashSet;

/// Hashes of `events` not referenced by any event's `prev_events`.
///
/// These are the current heads of the stream and the `prev_events` of the
/// next event appended to it. Returned in stream order.
///
/// # Errors
///
/// `StreamNotFound` if `events` is empty.
pub fn find_leaf_event_hashes(stream_id: &str, events: &[FullEvent]) -> StreamResult<Vec<EventHash>> {
    if events.is_empty() {
        return Err(StreamError::not_found(stream_id));
    }

    let referenced: HashSet<&str> = events
        .iter()
        .flat_map(|e| e.prev_events().iter().map(String::as_str))
        .collect();

    let mut seen = HashSet::with_capacity(events.len());
    Ok(events
        .iter()
        .map(|e| e.hash.as_str())
        .filter(|hash| !referenced.contains(hash) && seen.insert(*hash))
        .map(str::to_string)
        .collect())
}
