//! Causal admission and per-kind gating for `addEvent`.

use shared_types::{FullEvent, StreamError, StreamKind, StreamResult};
use sn_02_stream_state::StreamStateView;

/// The event must reference at least one event and every reference must be
/// known to the target stream. Non-tip references are accepted, so forks
/// are tolerated.
///
/// # Errors
///
/// `BAD_PREV_EVENTS` on an empty list or an unknown hash.
pub fn check_prev_events(view: &StreamStateView, event: &FullEvent) -> StreamResult<()> {
    let prev = event.prev_events();
    if prev.is_empty() {
        return Err(StreamError::bad_prev_events(format!(
            "event {} has no prev events",
            event.hash
        )));
    }
    if let Some(unknown) = prev.iter().find(|hash| !view.has_event(hash)) {
        return Err(StreamError::bad_prev_events(format!(
            "prev event {} not found in {}",
            unknown, view.stream_id
        )));
    }
    Ok(())
}

/// Membership changes are only meaningful in spaces and channels.
///
/// # Errors
///
/// `BAD_EVENT` for user streams.
pub fn check_membership_target(view: &StreamStateView, event: &FullEvent) -> StreamResult<()> {
    match view.stream_kind {
        StreamKind::Space | StreamKind::Channel => Ok(()),
        StreamKind::User => Err(StreamError::bad_event(format!(
            "{} not allowed in {} stream {}",
            event.payload().kind(),
            view.stream_kind,
            view.stream_id
        ))),
    }
}

/// Messages go to channels, from members only.
///
/// # Errors
///
/// - `BAD_EVENT` if the stream is not a channel
/// - `USER_CANT_POST` if the creator has not joined
pub fn check_can_post(view: &StreamStateView, event: &FullEvent) -> StreamResult<()> {
    if view.stream_kind != StreamKind::Channel {
        return Err(StreamError::bad_event(format!(
            "messages not allowed in {} stream {}",
            view.stream_kind, view.stream_id
        )));
    }
    if !view.is_joined(event.creator()) {
        return Err(StreamError::UserCantPost {
            user_id: event.creator().to_string(),
            stream_id: view.stream_id.clone(),
        });
    }
    Ok(())
}
