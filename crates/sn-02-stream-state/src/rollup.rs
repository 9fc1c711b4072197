//! # Rollup
//!
//! Linear replay of a stream's events into a [`StreamStateView`].
//!
//! ```text
//! events[0]  must be inception  ─→ kind, creator, parent space
//! events[1..]
//!   join / user-joined          ─→ joined_users += user
//!   invite                      ─→ invited_users += user
//!   leave / user-left           ─→ joined_users -= user, invited_users -= user
//!   user-invited / -joined / -left ─→ user_*_streams
//!   channel-created / -deleted  ─→ space_channels
//! every event                   ─→ events += hash
//! ```

use crate::view::StreamStateView;
use shared_types::{FullEvent, Payload, StreamError, StreamResult};

/// Rebuild the state of `stream_id` from its full event list.
///
/// # Errors
///
/// - `StreamNotFound` if `events` is empty
/// - `BadEvent` if the first event is not an inception for `stream_id`
pub fn rollup_stream(stream_id: &str, events: &[FullEvent]) -> StreamResult<StreamStateView> {
    let Some((first, rest)) = events.split_first() else {
        return Err(StreamError::not_found(stream_id));
    };

    let mut view = match first.payload() {
        Payload::Inception {
            stream_id: declared,
            data,
        } => {
            if declared != stream_id {
                return Err(StreamError::bad_event(format!(
                    "inception declares stream {} but was read from {}",
                    declared, stream_id
                )));
            }
            StreamStateView::new(
                declared.clone(),
                data.stream_kind,
                first.creator().to_string(),
                data.space_id.clone(),
            )
        }
        other => {
            return Err(StreamError::bad_event(format!(
                "first event of {} is {}, not inception",
                stream_id,
                other.kind()
            )))
        }
    };
    view.events.insert(first.hash.clone());

    for event in rest {
        apply(&mut view, event);
        view.events.insert(event.hash.clone());
    }
    Ok(view)
}

fn apply(view: &mut StreamStateView, event: &FullEvent) {
    match event.payload() {
        Payload::Join { user_id } => {
            view.joined_users.insert(user_id.to_ascii_lowercase());
        }
        Payload::Invite { user_id } => {
            view.invited_users.insert(user_id.to_ascii_lowercase());
        }
        Payload::Leave { user_id } => {
            let user = user_id.to_ascii_lowercase();
            view.joined_users.remove(&user);
            view.invited_users.remove(&user);
        }
        Payload::UserJoined { stream_id, .. } => {
            view.user_joined_streams.insert(stream_id.clone());
            let owner = view.creator_address.clone();
            view.joined_users.insert(owner);
        }
        Payload::UserLeft { stream_id, .. } => {
            view.user_joined_streams.remove(stream_id);
            let owner = view.creator_address.clone();
            view.joined_users.remove(&owner);
        }
        Payload::UserInvited { stream_id, .. } => {
            view.user_invited_streams.insert(stream_id.clone());
        }
        Payload::ChannelCreated { channel_id, .. } => {
            view.space_channels.insert(channel_id.clone());
        }
        Payload::ChannelDeleted { channel_id, .. } => {
            view.space_channels.remove(channel_id);
        }
        // Later inceptions are ignored.
        Payload::Inception { .. } | Payload::Message { .. } => {}
    }
}
